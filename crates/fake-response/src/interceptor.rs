//! The fake response interceptor.
//!
//! [`FakeResponseLayer`] wraps a client's real transport. For each outbound
//! request the resulting [`FakeResponseService`]:
//!
//! 1. asks its [`HeaderSource`] for the inbound headers (none: pass through),
//! 2. evaluates its rules in installation order,
//! 3. answers with the first matching rule's response without touching the
//!    transport, or
//! 4. hands the request to the transport and returns its future as is.
//!
//! The fake path resolves immediately. The passthrough path is the inner
//! service's own future, so dropping it cancels the real call and any
//! timeout layered around the client applies unchanged.

use crate::metrics::{self, Outcome};
use crate::response::{synthesize, SyntheticBody};
use crate::rule::Rule;
use crate::source::HeaderSource;
use futures::future::{ready, Either, Ready};
use hyper::{Request, Response, Uri};
use std::fmt;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};
use tracing::debug;

const DEFAULT_CLIENT: &str = "default";

/// Shared, immutable state of an installed interceptor.
struct Interceptor<H: ?Sized> {
    client: String,
    rules: Vec<Rule>,
    source: Arc<H>,
}

impl<H: HeaderSource + ?Sized> Interceptor<H> {
    fn evaluate(&self, uri: Option<&Uri>) -> Option<&Rule> {
        let Some(headers) = self.source.current() else {
            debug!(client = %self.client, "no inbound request in scope, passing through");
            metrics::record_outcome(&self.client, Outcome::NoContext);
            return None;
        };

        match self.rules.iter().find(|rule| rule.matches(&headers, uri)) {
            Some(rule) => {
                debug!(
                    client = %self.client,
                    rule = %rule.label(),
                    status = rule.status().as_u16(),
                    "serving fake response"
                );
                metrics::record_outcome(&self.client, Outcome::Fake);
                metrics::record_rule_hit(&self.client, rule.label());
                Some(rule)
            }
            None => {
                debug!(client = %self.client, "no fake response rule matched, passing through");
                metrics::record_outcome(&self.client, Outcome::Passthrough);
                None
            }
        }
    }
}

/// Layer installing fake response rules in front of a service.
pub struct FakeResponseLayer<H: ?Sized> {
    interceptor: Arc<Interceptor<H>>,
}

impl<H: HeaderSource> FakeResponseLayer<H> {
    /// Intercept with a single rule.
    pub fn new(rule: Rule, source: H) -> Self {
        Self::chain(vec![rule], source)
    }

    /// Intercept with several rules; the first matching rule wins.
    pub fn chain(rules: impl IntoIterator<Item = Rule>, source: H) -> Self {
        Self::with_shared_source(rules, Arc::new(source))
    }
}

impl<H: HeaderSource + ?Sized> FakeResponseLayer<H> {
    pub fn with_shared_source(rules: impl IntoIterator<Item = Rule>, source: Arc<H>) -> Self {
        FakeResponseLayer {
            interceptor: Arc::new(Interceptor {
                client: DEFAULT_CLIENT.to_string(),
                rules: rules.into_iter().collect(),
                source,
            }),
        }
    }

    /// Name of the client in logs and metrics.
    pub fn for_client(self, client: impl Into<String>) -> Self {
        let interceptor = &self.interceptor;
        FakeResponseLayer {
            interceptor: Arc::new(Interceptor {
                client: client.into(),
                rules: interceptor.rules.clone(),
                source: Arc::clone(&interceptor.source),
            }),
        }
    }

    pub fn client(&self) -> &str {
        &self.interceptor.client
    }

    pub fn rules(&self) -> &[Rule] {
        &self.interceptor.rules
    }
}

impl<H: ?Sized> Clone for FakeResponseLayer<H> {
    fn clone(&self) -> Self {
        FakeResponseLayer {
            interceptor: Arc::clone(&self.interceptor),
        }
    }
}

impl<H: ?Sized> fmt::Debug for FakeResponseLayer<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FakeResponseLayer")
            .field("client", &self.interceptor.client)
            .field("rules", &self.interceptor.rules)
            .finish()
    }
}

impl<S, H: ?Sized> Layer<S> for FakeResponseLayer<H> {
    type Service = FakeResponseService<S, H>;

    fn layer(&self, inner: S) -> Self::Service {
        FakeResponseService {
            inner,
            interceptor: Arc::clone(&self.interceptor),
        }
    }
}

/// Service produced by [`FakeResponseLayer`].
pub struct FakeResponseService<S, H: ?Sized> {
    inner: S,
    interceptor: Arc<Interceptor<H>>,
}

impl<S, H: HeaderSource + ?Sized> FakeResponseService<S, H> {
    /// The rule that would answer a request for `uri` right now, if any.
    pub fn matching_rule(&self, uri: Option<&Uri>) -> Option<&Rule> {
        self.interceptor.evaluate(uri)
    }

    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: Clone, H: ?Sized> Clone for FakeResponseService<S, H> {
    fn clone(&self) -> Self {
        FakeResponseService {
            inner: self.inner.clone(),
            interceptor: Arc::clone(&self.interceptor),
        }
    }
}

impl<S: fmt::Debug, H: ?Sized> fmt::Debug for FakeResponseService<S, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FakeResponseService")
            .field("inner", &self.inner)
            .field("client", &self.interceptor.client)
            .field("rules", &self.interceptor.rules.len())
            .finish()
    }
}

impl<S, H, ReqBody, ResBody> Service<Request<ReqBody>> for FakeResponseService<S, H>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
    H: HeaderSource + ?Sized,
    ResBody: SyntheticBody,
{
    type Response = Response<ResBody>;
    type Error = S::Error;
    type Future = Either<Ready<Result<Response<ResBody>, S::Error>>, S::Future>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        match self.interceptor.evaluate(Some(req.uri())) {
            Some(rule) => Either::Left(ready(Ok(synthesize(rule)))),
            None => Either::Right(self.inner.call(req)),
        }
    }
}
