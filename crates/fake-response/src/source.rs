//! Ambient header sources.
//!
//! The interceptor never receives inbound headers as an argument; it asks a
//! [`HeaderSource`] for "the headers of the request currently being served".
//! `None` is a normal answer (no inbound request in scope) and always leads
//! to the real transport.

use hyper::header::{HeaderName, HeaderValue};
use hyper::HeaderMap;
use std::sync::Arc;

/// Read access to the headers of the current inbound request.
///
/// Implementations must answer for the caller's own logical request and be
/// safe to call concurrently.
pub trait HeaderSource: Send + Sync {
    fn current(&self) -> Option<Arc<HeaderMap>>;
}

impl<F> HeaderSource for F
where
    F: Fn() -> Option<Arc<HeaderMap>> + Send + Sync,
{
    fn current(&self) -> Option<Arc<HeaderMap>> {
        self()
    }
}

/// A header source that always returns the same headers, or none at all.
#[derive(Debug, Clone, Default)]
pub struct StaticHeaders(Option<Arc<HeaderMap>>);

impl StaticHeaders {
    pub fn new(headers: HeaderMap) -> Self {
        StaticHeaders(Some(Arc::new(headers)))
    }

    /// A source with no inbound request in scope.
    pub fn absent() -> Self {
        StaticHeaders(None)
    }

    /// Build from name/value pairs, skipping pairs that are not valid HTTP.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut headers = HeaderMap::new();
        for (name, value) in pairs {
            if let (Ok(name), Ok(value)) = (
                HeaderName::from_bytes(name.as_ref().as_bytes()),
                HeaderValue::from_str(value.as_ref()),
            ) {
                headers.append(name, value);
            }
        }
        Self::new(headers)
    }
}

impl HeaderSource for StaticHeaders {
    fn current(&self) -> Option<Arc<HeaderMap>> {
        self.0.clone()
    }
}
