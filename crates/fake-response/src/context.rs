//! Inbound request context.
//!
//! Server side code wraps its handlers in [`InboundHeadersLayer`]; while the
//! handler future runs, [`InboundHeaders`] answers with that request's
//! headers. The headers live in a task-local slot, so concurrent requests on
//! the same runtime never see each other's headers.
//!
//! Work moved onto a separately spawned task leaves the scope; wrap it in
//! [`InboundHeaders::scope`] again if it must see the inbound headers.

use crate::source::HeaderSource;
use hyper::{HeaderMap, Request};
use std::future::Future;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::task::futures::TaskLocalFuture;
use tower::{Layer, Service};

tokio::task_local! {
    static INBOUND_HEADERS: Arc<HeaderMap>;
}

/// Header source backed by the current inbound request scope.
#[derive(Debug, Clone, Copy, Default)]
pub struct InboundHeaders;

impl InboundHeaders {
    /// Run `future` with `headers` as the current inbound headers.
    pub fn scope<F>(headers: impl Into<Arc<HeaderMap>>, future: F) -> TaskLocalFuture<Arc<HeaderMap>, F>
    where
        F: Future,
    {
        INBOUND_HEADERS.scope(headers.into(), future)
    }

    /// Synchronous variant of [`InboundHeaders::scope`].
    pub fn sync_scope<R>(headers: impl Into<Arc<HeaderMap>>, f: impl FnOnce() -> R) -> R {
        INBOUND_HEADERS.sync_scope(headers.into(), f)
    }
}

impl HeaderSource for InboundHeaders {
    fn current(&self) -> Option<Arc<HeaderMap>> {
        INBOUND_HEADERS.try_with(Arc::clone).ok()
    }
}

/// Layer that exposes each inbound request's headers to [`InboundHeaders`].
#[derive(Debug, Clone, Copy, Default)]
pub struct InboundHeadersLayer;

impl<S> Layer<S> for InboundHeadersLayer {
    type Service = InboundHeadersService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        InboundHeadersService { inner }
    }
}

#[derive(Debug, Clone)]
pub struct InboundHeadersService<S> {
    inner: S,
}

impl<S, B> Service<Request<B>> for InboundHeadersService<S>
where
    S: Service<Request<B>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = TaskLocalFuture<Arc<HeaderMap>, S::Future>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<B>) -> Self::Future {
        let headers = Arc::new(req.headers().clone());
        // inner services may evaluate eagerly in `call`, before the future is polled
        let future = INBOUND_HEADERS.sync_scope(Arc::clone(&headers), || self.inner.call(req));
        INBOUND_HEADERS.scope(headers, future)
    }
}
