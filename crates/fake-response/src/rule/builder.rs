use super::{FakeContent, QueryPredicate, Rule};
use crate::error::Result;
use crate::options;
use bytes::Bytes;
use hyper::StatusCode;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

/// Fluent builder for [`Rule`].
///
/// Nothing is validated here: blank header fields simply produce a rule that
/// never fires. `build` can be called any number of times and every call
/// returns an independent rule.
#[derive(Clone)]
pub struct RuleBuilder {
    name: Option<String>,
    header_name: Option<String>,
    header_value: String,
    path: String,
    query_parameters: HashMap<String, String>,
    dynamic_query_parameters: HashMap<String, QueryPredicate>,
    status: StatusCode,
    content: FakeContent,
}

impl Default for RuleBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleBuilder {
    pub fn new() -> Self {
        RuleBuilder {
            name: None,
            header_name: None,
            header_value: String::new(),
            path: String::new(),
            query_parameters: HashMap::new(),
            dynamic_query_parameters: HashMap::new(),
            status: StatusCode::OK,
            content: FakeContent::default(),
        }
    }

    /// Label used in logs and metrics.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn for_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.header_name = Some(name.into());
        self.header_value = value.into();
        self
    }

    /// Match on the process-wide default header name, resolved at `build`.
    pub fn for_header_value(mut self, value: impl Into<String>) -> Self {
        self.header_name = None;
        self.header_value = value.into();
        self
    }

    pub fn for_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Require a query parameter equal to `value`, or present at all when
    /// `value` is [`WILDCARD`](super::WILDCARD).
    pub fn for_query_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_parameters.insert(name.into(), value.into());
        self
    }

    /// Require a query parameter whose value satisfies `predicate`.
    pub fn for_query_predicate<F>(mut self, name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.dynamic_query_parameters
            .insert(name.into(), Arc::new(predicate));
        self
    }

    pub fn return_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn return_content(mut self, content: impl Into<String>) -> Self {
        self.content = FakeContent::Text(content.into());
        self
    }

    /// Serialize `payload` to JSON and use it as the response body.
    pub fn return_json<T>(mut self, payload: &T) -> Result<Self>
    where
        T: Serialize + ?Sized,
    {
        let bytes = serde_json::to_vec(payload)?;
        self.content = FakeContent::Json(Bytes::from(bytes));
        Ok(self)
    }

    pub fn build(&self) -> Rule {
        let header_name = self
            .header_name
            .clone()
            .unwrap_or_else(options::default_header_name);

        let label = self
            .name
            .clone()
            .unwrap_or_else(|| format!("{}={}", header_name, self.header_value));

        Rule {
            label,
            header: (header_name, self.header_value.clone()),
            path: self.path.clone(),
            query_parameters: self.query_parameters.clone(),
            dynamic_query_parameters: self.dynamic_query_parameters.clone(),
            status: self.status,
            content: self.content.clone(),
        }
    }
}
