//! Per-request values: the incoming `Request`, the handler `Context` and the
//! `Response` a handler produces.
//!
//! # Design Decisions
//! - A fresh `Context` is built for every dispatch and dropped afterwards
//! - Responses are transport-neutral; `IntoResponse` converts them for axum
//! - Status and headers staged on the `Context` apply to every response it builds

use std::borrow::Cow;

use axum::body::{Body, Bytes};
use axum::http::header::{self, HeaderMap, HeaderName, HeaderValue};
use axum::http::{Method, StatusCode};
use axum::response::IntoResponse;
use serde::Serialize;

use crate::routing::params::Params;

const TEXT_PLAIN: &str = "text/plain; charset=UTF-8";
const APPLICATION_JSON: &str = "application/json";

/// An incoming request as seen by the router.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    path: String,
    query: Option<String>,
    headers: HeaderMap,
    body: Bytes,
}

impl Request {
    /// Build a request from a method and a request target (`/path?query`).
    pub fn new(method: Method, target: &str) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path, Some(query.to_string())),
            None => (target, None),
        };

        Self {
            method,
            path: path.to_string(),
            query,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Path without the query string.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Raw query string, without the leading `?`.
    pub fn query_string(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// First value of query parameter `name`, form-urlencoding decoded.
    pub fn query(&self, name: &str) -> Option<String> {
        let query = self.query.as_deref()?;
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Header value as text; `None` if absent or not visible ASCII.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }
}

/// A response produced by a handler or by the router itself.
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl Response {
    /// Empty response with the given status.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    /// `200 OK` plain-text response.
    pub fn text(body: impl Into<String>) -> Self {
        Self::new(StatusCode::OK)
            .with_header(header::CONTENT_TYPE, HeaderValue::from_static(TEXT_PLAIN))
            .with_body(body.into())
    }

    /// `200 OK` JSON response.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self, serde_json::Error> {
        let body = serde_json::to_vec(value)?;
        Ok(Self::new(StatusCode::OK)
            .with_header(
                header::CONTENT_TYPE,
                HeaderValue::from_static(APPLICATION_JSON),
            )
            .with_body(body))
    }

    /// Default response for a request no route matches.
    pub fn not_found() -> Self {
        Self::text("404 Not Found").with_status(StatusCode::NOT_FOUND)
    }

    /// Response for a path that exists under other methods.
    pub fn method_not_allowed(allowed: &[Method]) -> Self {
        let allow = allowed
            .iter()
            .map(Method::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        let response =
            Self::text("405 Method Not Allowed").with_status(StatusCode::METHOD_NOT_ALLOWED);
        match HeaderValue::from_str(&allow) {
            Ok(value) => response.with_header(header::ALLOW, value),
            Err(_) => response,
        }
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Body decoded as UTF-8, lossily.
    pub fn body_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

impl IntoResponse for Response {
    fn into_response(self) -> axum::response::Response {
        let mut response = axum::response::Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

/// Handler view of one request: bound parameters plus response builders.
#[derive(Debug)]
pub struct Context {
    request: Request,
    params: Params,
    status: StatusCode,
    headers: HeaderMap,
}

impl Context {
    pub fn new(request: Request, params: Params) -> Self {
        Self {
            request,
            params,
            status: StatusCode::OK,
            headers: HeaderMap::new(),
        }
    }

    pub fn req(&self) -> &Request {
        &self.request
    }

    /// Value bound to path parameter `name`.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name)
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Stage a status for responses built from this context.
    pub fn status(&mut self, status: StatusCode) -> &mut Self {
        self.status = status;
        self
    }

    /// Stage a header for responses built from this context.
    pub fn header(&mut self, name: HeaderName, value: HeaderValue) -> &mut Self {
        self.headers.insert(name, value);
        self
    }

    pub fn text(&self, body: impl Into<String>) -> Response {
        self.apply(Response::text(body))
    }

    pub fn json<T: Serialize + ?Sized>(&self, value: &T) -> Result<Response, serde_json::Error> {
        Response::json(value).map(|response| self.apply(response))
    }

    /// Response with the staged status and headers and no body.
    pub fn empty(&self) -> Response {
        self.apply(Response::new(StatusCode::OK))
    }

    fn apply(&self, mut response: Response) -> Response {
        response.status = self.status;
        for (name, value) in &self.headers {
            response.headers.insert(name.clone(), value.clone());
        }
        response
    }
}
