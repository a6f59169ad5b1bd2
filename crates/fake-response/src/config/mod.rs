//! Configuration file for fake responses.
//!
//! ```yaml
//! production: false
//! headerName: X-Fake-Response
//! clients:
//!   payments:
//!     - name: gone-items
//!       header: { value: gone }
//!       path: /v1/items
//!       status: 410
//!       content: gone
//! ```

mod rules;

pub use rules::{HeaderConfig, RuleConfig};

use crate::options;
use crate::registry::ClientRegistry;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Config {
    /// Production gate. Defaults to true so a missing flag never fakes anything.
    #[serde(default = "default_production")]
    pub production: bool,

    /// Header name for rules that only set a header value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header_name: Option<String>,

    /// Rules per client name, in match priority order
    #[serde(default)]
    pub clients: BTreeMap<String, Vec<RuleConfig>>,
}

fn default_production() -> bool {
    true
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, anyhow::Error> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_yaml(&contents)
    }

    pub fn from_yaml(contents: &str) -> Result<Self, anyhow::Error> {
        let config: Config = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        let default_header = self.default_header();

        for (client, rules) in &self.clients {
            if client.trim().is_empty() {
                anyhow::bail!("client names must not be empty");
            }

            for (index, rule) in rules.iter().enumerate() {
                if rule.header.name.is_none() && default_header.is_none() {
                    anyhow::bail!(
                        "client '{client}' rule #{index}: no header name. \
                         Set 'header.name' or the top-level 'headerName'"
                    );
                }
                rule.to_rule(default_header)
                    .with_context(|| format!("client '{client}' rule #{index}"))?;
            }
        }

        Ok(())
    }

    /// Publish the process-wide settings of this file.
    ///
    /// Without `headerName` the default header name is cleared, so settings
    /// from an earlier file never carry over.
    pub fn apply(&self) {
        options::set_production_environment(self.production);
        options::set_default_header_name(self.header_name.clone().unwrap_or_default());
    }

    /// Register every configured rule in a new registry.
    ///
    /// Honors the production gate as currently set; call [`Config::apply`]
    /// first to use the file's own setting.
    pub fn build_registry(&self) -> Result<ClientRegistry, anyhow::Error> {
        let registry = ClientRegistry::new();
        let default_header = self.default_header();

        for (client, rules) in &self.clients {
            for (index, rule) in rules.iter().enumerate() {
                let rule = rule
                    .to_rule(default_header)
                    .with_context(|| format!("client '{client}' rule #{index}"))?;
                registry.register(client, rule);
            }
        }

        Ok(registry)
    }

    fn default_header(&self) -> Option<&str> {
        self.header_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
    }
}
