//! Route handlers.
//!
//! Any `Fn(Context) -> impl Future<Output = HandlerResult>` is a handler.
//! Handlers are stored type-erased behind `Arc<dyn Handler>` so one route
//! table can hold closures of different types and be shared across tasks.

use std::future::Future;
use std::sync::Arc;

use futures_util::future::{self, BoxFuture, FutureExt, Ready};

use crate::routing::context::{Context, Response};

/// Error type handlers may return. Propagated unchanged by dispatch.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result every handler resolves to.
pub type HandlerResult = Result<Response, BoxError>;

/// Type-erased request handler.
pub trait Handler: Send + Sync + 'static {
    fn call(&self, ctx: Context) -> BoxFuture<'static, HandlerResult>;
}

impl<F, Fut> Handler for F
where
    F: Fn(Context) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn call(&self, ctx: Context) -> BoxFuture<'static, HandlerResult> {
        (self)(ctx).boxed()
    }
}

pub(crate) type SharedHandler = Arc<dyn Handler>;

/// Handler answering every request with the same plain-text body.
pub fn text(
    body: &'static str,
) -> impl Fn(Context) -> Ready<HandlerResult> + Clone + Send + Sync + 'static {
    move |ctx: Context| {
        let result: HandlerResult = Ok(ctx.text(body));
        future::ready(result)
    }
}
