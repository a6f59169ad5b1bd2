//! Synthetic response construction.

use crate::rule::Rule;
use bytes::Bytes;
use http_body_util::combinators::{BoxBody, UnsyncBoxBody};
use http_body_util::{BodyExt, Full};
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::Response;
use std::convert::Infallible;

/// Response bodies that can carry a fake payload.
///
/// The interceptor answers with the same body type as the service it wraps,
/// so the body type has to be constructible from plain bytes.
pub trait SyntheticBody: Sized {
    fn synthetic(bytes: Bytes) -> Self;
}

impl SyntheticBody for Full<Bytes> {
    fn synthetic(bytes: Bytes) -> Self {
        Full::new(bytes)
    }
}

impl<E: 'static> SyntheticBody for BoxBody<Bytes, E> {
    fn synthetic(bytes: Bytes) -> Self {
        Full::new(bytes)
            .map_err(|never: Infallible| match never {})
            .boxed()
    }
}

impl<E: 'static> SyntheticBody for UnsyncBoxBody<Bytes, E> {
    fn synthetic(bytes: Bytes) -> Self {
        Full::new(bytes)
            .map_err(|never: Infallible| match never {})
            .boxed_unsync()
    }
}

impl SyntheticBody for Bytes {
    fn synthetic(bytes: Bytes) -> Self {
        bytes
    }
}

impl SyntheticBody for Vec<u8> {
    fn synthetic(bytes: Bytes) -> Self {
        bytes.to_vec()
    }
}

impl SyntheticBody for String {
    fn synthetic(bytes: Bytes) -> Self {
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

/// Build the fake response for `rule`.
///
/// Only a `content-type` header is set, and only when there is a body.
pub fn synthesize<B: SyntheticBody>(rule: &Rule) -> Response<B> {
    let (status, body) = rule.produce();
    let content_type = rule.content().content_type();

    let mut response = Response::new(B::synthetic(body));
    *response.status_mut() = status;
    if let Some(content_type) = content_type {
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::RuleBuilder;
    use hyper::StatusCode;
    use serde_json::json;

    #[test]
    fn test_synthesize_text() {
        let rule = RuleBuilder::new()
            .for_header("name", "value")
            .return_status(StatusCode::GONE)
            .return_content("content")
            .build();

        let response: Response<String> = synthesize(&rule);
        assert_eq!(response.status(), StatusCode::GONE);
        assert_eq!(response.body(), "content");
        assert_eq!(
            response.headers().get(CONTENT_TYPE),
            Some(&HeaderValue::from_static("text/plain; charset=utf-8"))
        );
        assert_eq!(response.headers().len(), 1);
    }

    #[test]
    fn test_synthesize_empty_body_has_no_headers() {
        let rule = RuleBuilder::new()
            .for_header("name", "value")
            .return_status(StatusCode::NO_CONTENT)
            .build();

        let response: Response<Bytes> = synthesize(&rule);
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(response.body().is_empty());
        assert!(response.headers().is_empty());
    }

    #[tokio::test]
    async fn test_synthesize_boxed_json() {
        let rule = RuleBuilder::new()
            .for_header("name", "value")
            .return_json(&json!({"ok": false}))
            .unwrap()
            .build();

        let response: Response<BoxBody<Bytes, hyper::Error>> = synthesize(&rule);
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(CONTENT_TYPE),
            Some(&HeaderValue::from_static("application/json"))
        );

        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], br#"{"ok":false}"#);
    }
}
