//! Response handling.
//!
//! # Responsibilities
//! - Convert a router `Response` into an axum response
//! - Map handler errors to `500 Internal Server Error`
//! - Drop the body of responses to HEAD requests

use axum::body::Bytes;
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::routing::Response;

/// Response sent when a handler fails.
pub fn internal_error() -> Response {
    Response::text("Internal Server Error").with_status(StatusCode::INTERNAL_SERVER_ERROR)
}

/// Response sent when the request body exceeds the configured limit.
pub fn payload_too_large() -> Response {
    Response::text("Payload Too Large").with_status(StatusCode::PAYLOAD_TOO_LARGE)
}

/// Convert for the wire. `head` strips the body but keeps status and headers.
pub fn into_http_response(response: Response, head: bool) -> axum::response::Response {
    if head {
        response.with_body(Bytes::new()).into_response()
    } else {
        response.into_response()
    }
}
