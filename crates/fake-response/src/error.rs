//! Error types for building rules.
//!
//! Matching itself never fails; these only surface while a rule is being
//! put together.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FakeResponseError {
    #[error("failed to serialize fake response payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("invalid query predicate pattern for '{name}': {source}")]
    Pattern {
        name: String,
        #[source]
        source: regex::Error,
    },
}

pub type Result<T> = std::result::Result<T, FakeResponseError>;
