//! Fake responses for outbound HTTP clients.
//!
//! A [`FakeResponseLayer`] sits in front of a client's real transport (any
//! `tower::Service<Request<B>>`). For every outbound request it reads the
//! headers of the inbound request being served, evaluates its [`Rule`]s and,
//! on the first match, answers with the rule's canned status and body instead
//! of calling the transport. Everything that does not match flows through
//! untouched.
//!
//! ```ignore
//! let rule = RuleBuilder::new()
//!     .for_header("X-Fake", "gone")
//!     .for_path("/v1/items")
//!     .return_status(StatusCode::GONE)
//!     .return_content("gone")
//!     .build();
//!
//! let client = ServiceBuilder::new()
//!     .layer(FakeResponseLayer::new(rule, InboundHeaders))
//!     .service(transport);
//! ```
//!
//! # Module Structure
//!
//! - `rule` - Rule data model and its builder
//! - `matcher` - Header, path and query matching against a single rule
//! - `interceptor` - The tower layer/service that short-circuits matches
//! - `source` / `context` - Where the ambient inbound headers come from
//! - `registry` / `options` - Per-client registration behind the production gate
//! - `config` - YAML configuration for registries
//! - `predicate` - String operators for configured query predicates

pub mod config;
pub mod context;
pub mod error;
pub mod interceptor;
pub mod matcher;
pub mod metrics;
pub mod options;
pub mod predicate;
pub mod registry;
pub mod response;
pub mod rule;
pub mod source;

pub use context::{InboundHeaders, InboundHeadersLayer, InboundHeadersService};
pub use error::FakeResponseError;
pub use interceptor::{FakeResponseLayer, FakeResponseService};
pub use registry::{ClientRegistry, RegistrationKey};
pub use response::SyntheticBody;
pub use rule::{FakeContent, QueryPredicate, Rule, RuleBuilder, WILDCARD};
pub use source::{HeaderSource, StaticHeaders};
