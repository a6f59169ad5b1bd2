//! Declarative query predicates.
//!
//! Rules built in code pass closures to
//! [`RuleBuilder::for_query_predicate`](crate::rule::RuleBuilder::for_query_predicate).
//! Rules loaded from configuration describe their predicates with the string
//! operators below, which compile into the same closures.

use crate::error::{FakeResponseError, Result};
use crate::rule::QueryPredicate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// String matching operator for a query parameter value.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum StringMatcher {
    /// Exact string equality
    Equals(String),

    /// String contains substring
    Contains(String),

    /// String starts with prefix
    StartsWith(String),

    /// String ends with suffix
    EndsWith(String),

    /// Regex pattern match
    Matches(String),

    /// Field existence check (value is whether field should exist)
    Exists(bool),
}

/// Options that modify predicate matching behavior.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PredicateOptions {
    #[serde(default = "default_case_sensitive")]
    pub case_sensitive: bool,

    /// Negate the match result
    #[serde(default, skip_serializing_if = "is_false")]
    pub not: bool,
}

fn is_false(b: &bool) -> bool {
    !*b
}

fn default_case_sensitive() -> bool {
    true
}

impl Default for PredicateOptions {
    fn default() -> Self {
        Self {
            case_sensitive: true,
            not: false,
        }
    }
}

/// A configured query predicate: `{ name: status, equals: active }`.
///
/// Exactly one operator key is accepted; unknown keys are rejected.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(try_from = "RawQueryPredicate")]
pub struct QueryPredicateConfig {
    pub name: String,
    #[serde(flatten)]
    pub matcher: StringMatcher,
    #[serde(flatten, default)]
    pub options: PredicateOptions,
}

/// Wire form of [`QueryPredicateConfig`], with every operator optional.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawQueryPredicate {
    name: String,
    equals: Option<String>,
    contains: Option<String>,
    starts_with: Option<String>,
    ends_with: Option<String>,
    matches: Option<String>,
    exists: Option<bool>,
    #[serde(default = "default_case_sensitive")]
    case_sensitive: bool,
    #[serde(default)]
    not: bool,
}

impl TryFrom<RawQueryPredicate> for QueryPredicateConfig {
    type Error = String;

    fn try_from(raw: RawQueryPredicate) -> std::result::Result<Self, Self::Error> {
        let mut operators: Vec<StringMatcher> = [
            raw.equals.map(StringMatcher::Equals),
            raw.contains.map(StringMatcher::Contains),
            raw.starts_with.map(StringMatcher::StartsWith),
            raw.ends_with.map(StringMatcher::EndsWith),
            raw.matches.map(StringMatcher::Matches),
            raw.exists.map(StringMatcher::Exists),
        ]
        .into_iter()
        .flatten()
        .collect();

        let matcher = match operators.len() {
            1 => operators.remove(0),
            0 => return Err(format!("query predicate '{}' has no operator", raw.name)),
            n => {
                return Err(format!(
                    "query predicate '{}' has {n} operators, expected exactly one",
                    raw.name
                ))
            }
        };

        Ok(QueryPredicateConfig {
            name: raw.name,
            matcher,
            options: PredicateOptions {
                case_sensitive: raw.case_sensitive,
                not: raw.not,
            },
        })
    }
}

impl QueryPredicateConfig {
    /// Compile into a closure usable by a rule.
    pub fn compile(&self) -> Result<QueryPredicate> {
        let matcher = CompiledStringMatcher::compile(&self.matcher, self.options.case_sensitive)
            .map_err(|source| FakeResponseError::Pattern {
                name: self.name.clone(),
                source,
            })?;
        let not = self.options.not;

        Ok(Arc::new(move |value: &str| matcher.matches(Some(value)) != not))
    }
}

/// A value with its lowercase form cached for case-insensitive matching.
#[derive(Debug, Clone, PartialEq)]
struct CachedValue {
    value: String,
    lower: String,
}

impl CachedValue {
    fn new(value: &str) -> Self {
        Self {
            value: value.to_string(),
            lower: value.to_lowercase(),
        }
    }
}

/// Compiled string matcher for efficient runtime evaluation.
#[derive(Debug, Clone)]
pub struct CompiledStringMatcher {
    op: CompiledOp,
    case_sensitive: bool,
}

#[derive(Debug, Clone)]
enum CompiledOp {
    Equals(CachedValue),
    Contains(CachedValue),
    StartsWith(CachedValue),
    EndsWith(CachedValue),
    Matches(Arc<Regex>),
    Exists(bool),
}

impl CompiledStringMatcher {
    pub fn compile(
        matcher: &StringMatcher,
        case_sensitive: bool,
    ) -> std::result::Result<Self, regex::Error> {
        let op = match matcher {
            StringMatcher::Equals(v) => CompiledOp::Equals(CachedValue::new(v)),
            StringMatcher::Contains(v) => CompiledOp::Contains(CachedValue::new(v)),
            StringMatcher::StartsWith(v) => CompiledOp::StartsWith(CachedValue::new(v)),
            StringMatcher::EndsWith(v) => CompiledOp::EndsWith(CachedValue::new(v)),
            StringMatcher::Matches(pattern) => CompiledOp::Matches(Arc::new(Regex::new(pattern)?)),
            StringMatcher::Exists(exists) => CompiledOp::Exists(*exists),
        };
        Ok(CompiledStringMatcher { op, case_sensitive })
    }

    /// Check a value (`None` if the field is absent).
    pub fn matches(&self, value: Option<&str>) -> bool {
        let Some(value) = value else {
            return matches!(self.op, CompiledOp::Exists(false));
        };

        match &self.op {
            CompiledOp::Equals(c) => self.compare(c, value, |v, p| v == p),
            CompiledOp::Contains(c) => self.compare(c, value, |v, p| v.contains(p)),
            CompiledOp::StartsWith(c) => self.compare(c, value, |v, p| v.starts_with(p)),
            CompiledOp::EndsWith(c) => self.compare(c, value, |v, p| v.ends_with(p)),
            // case sensitivity belongs in the pattern itself
            CompiledOp::Matches(regex) => regex.is_match(value),
            CompiledOp::Exists(should_exist) => *should_exist,
        }
    }

    fn compare(&self, cached: &CachedValue, value: &str, op: impl Fn(&str, &str) -> bool) -> bool {
        if self.case_sensitive {
            op(value, &cached.value)
        } else {
            op(&value.to_lowercase(), &cached.lower)
        }
    }
}
