//! Per-client registration of fake responses.
//!
//! Each named HTTP client can carry any number of rules. Every registration
//! gets its own [`RegistrationKey`], and rules keep their installation order,
//! which is also their match priority.
//!
//! While the production gate ([`options::is_production_environment`]) is on,
//! registering is a no-op and no layer is ever handed out, so production
//! clients are built exactly as if this crate was not there.

use crate::interceptor::FakeResponseLayer;
use crate::options;
use crate::rule::{Rule, RuleBuilder};
use crate::source::HeaderSource;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Identifies one registered rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegistrationKey(Uuid);

impl RegistrationKey {
    fn generate() -> Self {
        RegistrationKey(Uuid::new_v4())
    }
}

impl fmt::Display for RegistrationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

struct Registration {
    key: RegistrationKey,
    rule: Rule,
}

/// Fake response rules grouped by client name.
#[derive(Default)]
pub struct ClientRegistry {
    clients: RwLock<HashMap<String, Vec<Registration>>>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure a rule for `client` with a fresh builder.
    ///
    /// Returns `None` without calling `setup` when the production gate is on.
    pub fn add_fake_response<F>(&self, client: &str, setup: F) -> Option<RegistrationKey>
    where
        F: FnOnce(RuleBuilder) -> RuleBuilder,
    {
        if options::is_production_environment() {
            warn!(client = %client, "production environment, fake response not registered");
            return None;
        }
        self.register(client, setup(RuleBuilder::new()).build())
    }

    /// Register an already built rule for `client`.
    pub fn register(&self, client: &str, rule: Rule) -> Option<RegistrationKey> {
        if options::is_production_environment() {
            warn!(client = %client, "production environment, fake response not registered");
            return None;
        }

        let key = RegistrationKey::generate();
        info!(
            client = %client,
            key = %key,
            rule = %rule.label(),
            "registered fake response"
        );
        self.clients
            .write()
            .entry(client.to_string())
            .or_default()
            .push(Registration { key, rule });
        Some(key)
    }

    /// Remove one registration. Returns whether it existed.
    pub fn remove(&self, client: &str, key: RegistrationKey) -> bool {
        let mut clients = self.clients.write();
        let Some(registrations) = clients.get_mut(client) else {
            return false;
        };
        let before = registrations.len();
        registrations.retain(|r| r.key != key);
        let removed = registrations.len() != before;
        if registrations.is_empty() {
            clients.remove(client);
        }
        removed
    }

    /// Rules of `client` in installation order.
    pub fn rules_for(&self, client: &str) -> Vec<Rule> {
        self.clients
            .read()
            .get(client)
            .map(|registrations| registrations.iter().map(|r| r.rule.clone()).collect())
            .unwrap_or_default()
    }

    pub fn keys_for(&self, client: &str) -> Vec<RegistrationKey> {
        self.clients
            .read()
            .get(client)
            .map(|registrations| registrations.iter().map(|r| r.key).collect())
            .unwrap_or_default()
    }

    /// Client names, sorted.
    pub fn clients(&self) -> Vec<String> {
        let mut names: Vec<String> = self.clients.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Total number of registered rules.
    pub fn len(&self) -> usize {
        self.clients.read().values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Layer to install in front of `client`'s transport.
    ///
    /// `None` in production or when the client has no rules; pair it with
    /// `tower::ServiceBuilder::option_layer`.
    pub fn layer_for<H>(&self, client: &str, source: Arc<H>) -> Option<FakeResponseLayer<H>>
    where
        H: HeaderSource + ?Sized,
    {
        if options::is_production_environment() {
            return None;
        }
        let rules = self.rules_for(client);
        if rules.is_empty() {
            return None;
        }
        Some(FakeResponseLayer::with_shared_source(rules, source).for_client(client))
    }
}

impl fmt::Debug for ClientRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let clients = self.clients.read();
        let mut map = f.debug_map();
        for (client, registrations) in clients.iter() {
            let labels: Vec<&str> = registrations.iter().map(|r| r.rule.label()).collect();
            map.entry(client, &labels);
        }
        map.finish()
    }
}
