//! Request handling.
//!
//! # Responsibilities
//! - Generate a unique request ID (UUID v4) for every request
//! - Convert an axum request into a router `Request`
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - A client-supplied `x-request-id` is kept rather than replaced

use axum::body::Bytes;
use axum::http::{request::Parts, HeaderMap, HeaderValue, Request as HttpRequest};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

use crate::routing::Request;

/// Header carrying the request ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Generates a fresh UUID v4 request ID.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &HttpRequest<B>) -> Option<RequestId> {
        let id = Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// Request ID of a request, or `"unknown"` when absent.
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// Build a router request from the HTTP request head and its buffered body.
pub fn into_route_request(parts: Parts, body: Bytes) -> Request {
    let target = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");

    Request::new(parts.method.clone(), target)
        .with_headers(parts.headers)
        .with_body(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Method;

    #[test]
    fn test_make_request_id_is_uuid() {
        let request = HttpRequest::builder().body(()).unwrap();
        let id = MakeRequestUuid.make_request_id(&request).unwrap();
        let text = id.header_value().to_str().unwrap();
        assert!(Uuid::parse_str(text).is_ok());
    }

    #[test]
    fn test_into_route_request() {
        let (parts, _) = HttpRequest::builder()
            .method(Method::POST)
            .uri("http://example.com/user/42?verbose=1")
            .header(X_REQUEST_ID, "abc")
            .body(())
            .unwrap()
            .into_parts();

        let request = into_route_request(parts, Bytes::from_static(b"payload"));
        assert_eq!(request.method(), Method::POST);
        assert_eq!(request.path(), "/user/42");
        assert_eq!(request.query("verbose").as_deref(), Some("1"));
        assert_eq!(request_id(request.headers()), "abc");
        assert_eq!(request.body().as_ref(), b"payload");
    }

    #[test]
    fn test_missing_request_id() {
        assert_eq!(request_id(&HeaderMap::new()), "unknown");
    }
}
