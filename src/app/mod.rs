//! Demo application served by the binary.
//!
//! ```text
//! GET  /          → "Hello Hono!"
//! GET  /post      → "post!"
//! GET  /posts     → "GET /posts !!"
//! POST /users     → "POST /users !!"
//! /book/*         → book.rs (empty)
//! /user/*         → user.rs
//! ```

pub mod book;
pub mod user;

use crate::config::RoutingConfig;
use crate::routing::handler::text;
use crate::routing::{PatternError, Router};

/// Build the demo route table.
pub fn build(routing: &RoutingConfig) -> Result<Router, PatternError> {
    let mut app = Router::new().with_trailing_slash(routing.trailing_slash());
    app.get("/", text("Hello Hono!"))?
        .get("/post", text("post!"))?
        .get("/posts", text("GET /posts !!"))?
        .post("/users", text("POST /users !!"))?
        .mount("/book", book::router())?
        .mount("/user", user::router()?)?;

    tracing::info!(routes = app.routes().len(), "Route table compiled");
    Ok(app)
}
