//! Segment Router Library
//!
//! A small HTTP request router: static and `:param` path segments, method
//! dispatch and sub-router mounting, plus an axum front end to serve it.

pub mod app;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;

pub use config::schema::ServerConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use routing::{Context, Response, Router};
