//! Rule data model.
//!
//! A [`Rule`] is one match condition plus the canned response returned when
//! it fires. Rules are built with [`RuleBuilder`] and never change afterwards;
//! cloning a rule only bumps the reference counts of its query predicates.

mod builder;

pub use builder::RuleBuilder;

use crate::matcher::{
    dynamic_query_matches, header_matches, parse_query_string, path_matches, query_matches,
};
use bytes::Bytes;
use hyper::{HeaderMap, StatusCode, Uri};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// Expected query value meaning "present with any value".
///
/// A parameter that is present but empty (`?q=`) satisfies the wildcard.
pub const WILDCARD: &str = "*";

/// Predicate evaluated against the raw (decoded) value of a query parameter.
pub type QueryPredicate = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Body of a fake response.
#[derive(Debug, Clone, PartialEq)]
pub enum FakeContent {
    /// Plain string body. An empty string means no body.
    Text(String),
    /// Payload serialized to JSON when the rule was built.
    Json(Bytes),
}

impl Default for FakeContent {
    fn default() -> Self {
        FakeContent::Text(String::new())
    }
}

impl FakeContent {
    pub fn is_empty(&self) -> bool {
        match self {
            FakeContent::Text(text) => text.is_empty(),
            FakeContent::Json(bytes) => bytes.is_empty(),
        }
    }

    pub fn to_bytes(&self) -> Bytes {
        match self {
            FakeContent::Text(text) => Bytes::copy_from_slice(text.as_bytes()),
            FakeContent::Json(bytes) => bytes.clone(),
        }
    }

    /// Content type sent with a non-empty body.
    pub fn content_type(&self) -> Option<&'static str> {
        if self.is_empty() {
            return None;
        }
        match self {
            FakeContent::Text(_) => Some("text/plain; charset=utf-8"),
            FakeContent::Json(_) => Some("application/json"),
        }
    }
}

/// One fake-response rule: a match condition and the response it produces.
#[derive(Clone)]
pub struct Rule {
    label: String,
    header: (String, String),
    path: String,
    query_parameters: HashMap<String, String>,
    dynamic_query_parameters: HashMap<String, QueryPredicate>,
    status: StatusCode,
    content: FakeContent,
}

impl Rule {
    /// Name used in logs and metrics. Defaults to `<header>=<value>`.
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn header(&self) -> (&str, &str) {
        (&self.header.0, &self.header.1)
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query_parameters(&self) -> &HashMap<String, String> {
        &self.query_parameters
    }

    pub fn dynamic_query_parameters(&self) -> &HashMap<String, QueryPredicate> {
        &self.dynamic_query_parameters
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn content(&self) -> &FakeContent {
        &self.content
    }

    /// Status and body of the fake response.
    pub fn produce(&self) -> (StatusCode, Bytes) {
        (self.status, self.content.to_bytes())
    }

    /// Evaluate the rule against the ambient headers and the outbound URI.
    ///
    /// Checks run cheapest first (header, path, query, dynamic query) and
    /// stop at the first failure. The query string is parsed at most once.
    pub fn matches(&self, headers: &HeaderMap, uri: Option<&Uri>) -> bool {
        if !header_matches(&self.header.0, &self.header.1, headers) {
            trace!(rule = %self.label, "header did not match");
            return false;
        }

        if !path_matches(&self.path, uri) {
            trace!(rule = %self.label, "path did not match");
            return false;
        }

        if self.query_parameters.is_empty() && self.dynamic_query_parameters.is_empty() {
            return true;
        }

        let params = uri.and_then(Uri::query).and_then(parse_query_string);

        if !query_matches(&self.query_parameters, params.as_ref()) {
            trace!(rule = %self.label, "query parameters did not match");
            return false;
        }

        if !dynamic_query_matches(&self.dynamic_query_parameters, params.as_ref()) {
            trace!(rule = %self.label, "query predicates did not match");
            return false;
        }

        true
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut dynamic: Vec<&str> = self
            .dynamic_query_parameters
            .keys()
            .map(String::as_str)
            .collect();
        dynamic.sort_unstable();

        f.debug_struct("Rule")
            .field("label", &self.label)
            .field("header", &self.header)
            .field("path", &self.path)
            .field("query_parameters", &self.query_parameters)
            .field("dynamic_query_parameters", &dynamic)
            .field("status", &self.status)
            .field("content", &self.content)
            .finish()
    }
}
