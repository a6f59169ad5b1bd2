//! Fake response rule configuration.

use crate::predicate::QueryPredicateConfig;
use crate::rule::{Rule, RuleBuilder};
use anyhow::Context;
use hyper::StatusCode;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RuleConfig {
    /// Label for logs and metrics
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    pub header: HeaderConfig,

    /// Exact path; empty matches any path
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub path: String,

    /// Literal query parameters, `*` for "present"
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub query: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub query_predicates: Vec<QueryPredicateConfig>,

    #[serde(default = "default_status")]
    pub status: u16,

    /// Plain text body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    /// JSON body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json: Option<serde_json::Value>,
}

fn default_status() -> u16 {
    200
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HeaderConfig {
    /// Falls back to the top-level `headerName`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub value: String,
}

impl RuleConfig {
    pub fn status_code(&self) -> Result<StatusCode, anyhow::Error> {
        StatusCode::from_u16(self.status)
            .with_context(|| format!("invalid status code {}", self.status))
    }

    /// Build the rule, using `default_header` when no header name is set.
    pub fn to_rule(&self, default_header: Option<&str>) -> Result<Rule, anyhow::Error> {
        let mut builder = RuleBuilder::new().return_status(self.status_code()?);

        if let Some(name) = &self.name {
            builder = builder.named(name);
        }

        builder = match self.header.name.as_deref().or(default_header) {
            Some(name) => builder.for_header(name, &self.header.value),
            None => builder.for_header_value(&self.header.value),
        };

        if !self.path.is_empty() {
            builder = builder.for_path(&self.path);
        }

        for (name, value) in &self.query {
            builder = builder.for_query_parameter(name, value);
        }

        for predicate in &self.query_predicates {
            let compiled = predicate.compile()?;
            builder = builder.for_query_predicate(&predicate.name, move |v: &str| compiled(v));
        }

        builder = match (&self.content, &self.json) {
            (Some(_), Some(_)) => anyhow::bail!("'content' and 'json' are mutually exclusive"),
            (Some(content), None) => builder.return_content(content),
            (None, Some(json)) => builder.return_json(json)?,
            (None, None) => builder,
        };

        Ok(builder.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::FakeContent;

    fn parse(yaml: &str) -> RuleConfig {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_full_rule() {
        let config = parse(
            r#"
name: gone-items
header: { name: X-Fake, value: gone }
path: /v1/items
query: { q: "*" }
queryPredicates:
  - { name: status, equals: active }
status: 410
content: gone
"#,
        );

        let rule = config.to_rule(None).unwrap();
        assert_eq!(rule.label(), "gone-items");
        assert_eq!(rule.header(), ("X-Fake", "gone"));
        assert_eq!(rule.path(), "/v1/items");
        assert_eq!(rule.query_parameters().get("q").map(String::as_str), Some("*"));
        assert!(rule.dynamic_query_parameters()["status"]("active"));
        assert!(!rule.dynamic_query_parameters()["status"]("inactive"));
        assert_eq!(rule.status(), StatusCode::GONE);
        assert_eq!(rule.content(), &FakeContent::Text("gone".to_string()));
    }

    #[test]
    fn test_defaults_and_header_fallback() {
        let config = parse("header: { value: enabled }\n");

        let rule = config.to_rule(Some("X-Fake-Response")).unwrap();
        assert_eq!(rule.header(), ("X-Fake-Response", "enabled"));
        assert_eq!(rule.status(), StatusCode::OK);
        assert!(rule.content().is_empty());
    }

    #[test]
    fn test_json_body() {
        let config = parse("header: { name: X-Fake, value: enabled }\njson: { id: 1 }\n");

        let rule = config.to_rule(None).unwrap();
        assert_eq!(rule.content(), &FakeContent::Json(r#"{"id":1}"#.into()));
    }

    #[test]
    fn test_content_and_json_conflict() {
        let config = parse("header: { name: X-Fake, value: enabled }\ncontent: x\njson: { id: 1 }\n");
        assert!(config.to_rule(None).is_err());
    }

    #[test]
    fn test_invalid_status() {
        let config = parse("header: { name: X-Fake, value: enabled }\nstatus: 42\n");
        let err = config.to_rule(None).unwrap_err();
        assert!(err.to_string().contains("invalid status code 42"));
    }
}
