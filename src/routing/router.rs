//! Route registration, lookup and dispatch.
//!
//! # Responsibilities
//! - Compile and store routes in registration order
//! - Flatten mounted sub-routers into the parent table
//! - Look up the route for a (method, path) pair
//! - Dispatch a request to the matched handler
//!
//! # Design Decisions
//! - Immutable after startup; `dispatch` takes `&self` (shared via `Arc`)
//! - First match wins, in registration order
//! - O(n) linear scan, acceptable for typical route counts
//! - Explicit `NotFound` / `MethodNotAllowed` rather than a silent default
//! - Handler errors are returned untouched

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use axum::http::Method;
use thiserror::Error;

use crate::routing::context::{Context, Request, Response};
use crate::routing::handler::{BoxError, HandlerResult, SharedHandler};
use crate::routing::matcher::{RequestPath, TrailingSlash};
use crate::routing::params::Params;
use crate::routing::pattern::{Pattern, PatternError};

/// Which request methods a route accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodFilter {
    Exact(Method),
    Any,
}

impl MethodFilter {
    pub fn accepts(&self, method: &Method) -> bool {
        match self {
            MethodFilter::Exact(expected) => expected == method,
            MethodFilter::Any => true,
        }
    }
}

impl fmt::Display for MethodFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MethodFilter::Exact(method) => f.write_str(method.as_str()),
            MethodFilter::Any => f.write_str("ALL"),
        }
    }
}

/// A registered (method, pattern, handler) triple.
#[derive(Clone)]
pub struct Route {
    method: MethodFilter,
    pattern: Pattern,
    handler: SharedHandler,
}

impl Route {
    pub fn method(&self) -> &MethodFilter {
        &self.method
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("pattern", &self.pattern.to_string())
            .finish_non_exhaustive()
    }
}

/// Why a lookup found no route.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchError {
    #[error("no route matches the requested path")]
    NotFound,

    #[error("method not allowed (allowed: {})", join_methods(allowed))]
    MethodNotAllowed { allowed: Vec<Method> },
}

fn join_methods(methods: &[Method]) -> String {
    methods
        .iter()
        .map(Method::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// A successful lookup: the route plus the parameters it bound.
#[derive(Debug)]
pub struct RouteMatch<'r> {
    route: &'r Route,
    params: Params,
}

impl<'r> RouteMatch<'r> {
    pub fn route(&self) -> &'r Route {
        self.route
    }

    pub fn params(&self) -> &Params {
        &self.params
    }
}

/// An ordered table of routes.
pub struct Router {
    routes: Vec<Route>,
    trailing_slash: TrailingSlash,
    not_found: Option<SharedHandler>,
}

impl Router {
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            trailing_slash: TrailingSlash::default(),
            not_found: None,
        }
    }

    /// Set how trailing slashes are treated when matching.
    pub fn with_trailing_slash(mut self, mode: TrailingSlash) -> Self {
        self.trailing_slash = mode;
        self
    }

    pub fn trailing_slash(&self) -> TrailingSlash {
        self.trailing_slash
    }

    /// Register `handler` for `method` requests matching `pattern`.
    pub fn register<F, Fut>(
        &mut self,
        method: Method,
        pattern: &str,
        handler: F,
    ) -> Result<&mut Self, PatternError>
    where
        F: Fn(Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.push(MethodFilter::Exact(method), pattern, Arc::new(handler))
    }

    /// Register `handler` for every method.
    pub fn all<F, Fut>(&mut self, pattern: &str, handler: F) -> Result<&mut Self, PatternError>
    where
        F: Fn(Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.push(MethodFilter::Any, pattern, Arc::new(handler))
    }

    pub fn get<F, Fut>(&mut self, pattern: &str, handler: F) -> Result<&mut Self, PatternError>
    where
        F: Fn(Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.register(Method::GET, pattern, handler)
    }

    pub fn post<F, Fut>(&mut self, pattern: &str, handler: F) -> Result<&mut Self, PatternError>
    where
        F: Fn(Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.register(Method::POST, pattern, handler)
    }

    pub fn put<F, Fut>(&mut self, pattern: &str, handler: F) -> Result<&mut Self, PatternError>
    where
        F: Fn(Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.register(Method::PUT, pattern, handler)
    }

    pub fn delete<F, Fut>(&mut self, pattern: &str, handler: F) -> Result<&mut Self, PatternError>
    where
        F: Fn(Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.register(Method::DELETE, pattern, handler)
    }

    pub fn patch<F, Fut>(&mut self, pattern: &str, handler: F) -> Result<&mut Self, PatternError>
    where
        F: Fn(Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.register(Method::PATCH, pattern, handler)
    }

    pub fn head<F, Fut>(&mut self, pattern: &str, handler: F) -> Result<&mut Self, PatternError>
    where
        F: Fn(Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.register(Method::HEAD, pattern, handler)
    }

    pub fn options<F, Fut>(&mut self, pattern: &str, handler: F) -> Result<&mut Self, PatternError>
    where
        F: Fn(Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.register(Method::OPTIONS, pattern, handler)
    }

    /// Replace the default `404 Not Found` response.
    ///
    /// A child router's not-found handler is not carried over by `mount`.
    pub fn not_found<F, Fut>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.not_found = Some(Arc::new(handler));
        self
    }

    /// Re-expose every route of `child` under `prefix`.
    ///
    /// Child routes are appended after the routes already registered here,
    /// keeping the child's own order. On error nothing is added.
    pub fn mount(&mut self, prefix: &str, child: Router) -> Result<&mut Self, PatternError> {
        let prefix_pattern = Pattern::parse(prefix)?;

        let mounted = child
            .routes
            .into_iter()
            .map(|route| -> Result<Route, PatternError> {
                Ok(Route {
                    pattern: prefix_pattern.join(&route.pattern)?,
                    ..route
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(
            prefix = %prefix_pattern,
            routes = mounted.len(),
            "Mounted sub-router"
        );
        self.routes.extend(mounted);
        Ok(self)
    }

    /// All routes, in precedence order.
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Find the first route accepting `method` whose pattern matches `path`.
    ///
    /// HEAD requests fall back to the first matching GET route when no
    /// HEAD route matches.
    pub fn match_route(&self, method: &Method, path: &str) -> Result<RouteMatch<'_>, MatchError> {
        let Some(request_path) = RequestPath::parse(path) else {
            tracing::trace!(path = %path, "Path is not absolute");
            return Err(MatchError::NotFound);
        };

        let mut allowed: Vec<Method> = Vec::new();
        let mut head_fallback = None;

        for route in &self.routes {
            if !route.pattern.is_match(&request_path, self.trailing_slash) {
                continue;
            }
            if route.method.accepts(method) {
                return Ok(RouteMatch {
                    route,
                    params: route.pattern.bind(&request_path),
                });
            }
            if let MethodFilter::Exact(other) = &route.method {
                if *method == Method::HEAD && *other == Method::GET && head_fallback.is_none() {
                    head_fallback = Some(route);
                }
                if !allowed.contains(other) {
                    allowed.push(other.clone());
                }
            }
        }

        if let Some(route) = head_fallback {
            return Ok(RouteMatch {
                route,
                params: route.pattern.bind(&request_path),
            });
        }

        if allowed.is_empty() {
            tracing::trace!(method = %method, path = %path, "No route matched");
            return Err(MatchError::NotFound);
        }

        if allowed.contains(&Method::GET) && !allowed.contains(&Method::HEAD) {
            allowed.push(Method::HEAD);
        }
        tracing::trace!(method = %method, path = %path, "Path matched under other methods");
        Err(MatchError::MethodNotAllowed { allowed })
    }

    /// Dispatch `method` + `target` (path with optional query) with no headers or body.
    pub async fn dispatch(&self, method: Method, target: &str) -> Result<Response, BoxError> {
        self.handle(Request::new(method, target)).await
    }

    /// Dispatch a request.
    ///
    /// Unmatched requests resolve to a 404 (or 405) response. Errors returned
    /// by the handler are passed through unchanged.
    pub async fn handle(&self, request: Request) -> Result<Response, BoxError> {
        match self.match_route(request.method(), request.path()) {
            Ok(RouteMatch { route, params }) => {
                let handler = route.handler.clone();
                handler.call(Context::new(request, params)).await
            }
            Err(MatchError::NotFound) => match &self.not_found {
                Some(handler) => handler.call(Context::new(request, Params::new())).await,
                None => Ok(Response::not_found()),
            },
            Err(MatchError::MethodNotAllowed { allowed }) => {
                Ok(Response::method_not_allowed(&allowed))
            }
        }
    }

    fn push(
        &mut self,
        method: MethodFilter,
        pattern: &str,
        handler: SharedHandler,
    ) -> Result<&mut Self, PatternError> {
        let pattern = Pattern::parse(pattern)?;
        tracing::debug!(method = %method, pattern = %pattern, "Registered route");
        self.routes.push(Route {
            method,
            pattern,
            handler,
        });
        Ok(self)
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("routes", &self.routes)
            .field("trailing_slash", &self.trailing_slash)
            .field("custom_not_found", &self.not_found.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::handler::text;
    use axum::http::StatusCode;
    use std::io;

    fn echo_id(
    ) -> impl Fn(Context) -> futures_util::future::Ready<HandlerResult> + Send + Sync + 'static {
        |ctx: Context| {
            let id = ctx.param("id").unwrap_or_default().to_string();
            let result: HandlerResult = Ok(ctx.text(format!("id={}", id)));
            futures_util::future::ready(result)
        }
    }

    #[tokio::test]
    async fn test_literal_routes_match_exactly() {
        let mut router = Router::new();
        router
            .get("/", text("root"))
            .unwrap()
            .get("/post", text("post"))
            .unwrap()
            .get("/posts", text("posts"))
            .unwrap()
            .post("/users", text("users"))
            .unwrap();

        for (method, path, body) in [
            (Method::GET, "/", "root"),
            (Method::GET, "/post", "post"),
            (Method::GET, "/posts", "posts"),
            (Method::POST, "/users", "users"),
        ] {
            let matched = router.match_route(&method, path).unwrap();
            assert_eq!(matched.route().pattern().to_string(), path);
            assert_eq!(matched.route().method(), &MethodFilter::Exact(method.clone()));

            let response = router.dispatch(method, path).await.unwrap();
            assert_eq!(response.body_text(), body);
        }
    }

    #[tokio::test]
    async fn test_param_binding() {
        let mut router = Router::new();
        router
            .get("/user/:id/posts/:post", |ctx: Context| async move {
                let body = format!(
                    "{}:{}",
                    ctx.param("id").unwrap_or_default(),
                    ctx.param("post").unwrap_or_default()
                );
                Ok::<_, BoxError>(ctx.text(body))
            })
            .unwrap();

        let matched = router.match_route(&Method::GET, "/user/42/posts/abc").unwrap();
        assert_eq!(matched.params().get("id"), Some("42"));
        assert_eq!(matched.params().get("post"), Some("abc"));

        let response = router.dispatch(Method::GET, "/user/42/posts/abc").await.unwrap();
        assert_eq!(response.body_text(), "42:abc");
    }

    #[tokio::test]
    async fn test_first_registered_wins() {
        let mut router = Router::new();
        router
            .get("/user/:id", echo_id())
            .unwrap()
            .get("/user/me", text("me"))
            .unwrap();

        let response = router.dispatch(Method::GET, "/user/me").await.unwrap();
        assert_eq!(response.body_text(), "id=me");

        let mut reversed = Router::new();
        reversed
            .get("/user/me", text("me"))
            .unwrap()
            .get("/user/:id", echo_id())
            .unwrap();

        let response = reversed.dispatch(Method::GET, "/user/me").await.unwrap();
        assert_eq!(response.body_text(), "me");
        let response = reversed.dispatch(Method::GET, "/user/7").await.unwrap();
        assert_eq!(response.body_text(), "id=7");
    }

    #[tokio::test]
    async fn test_not_found() {
        let mut router = Router::new();
        router.get("/", text("root")).unwrap();

        assert_eq!(
            router.match_route(&Method::GET, "/unknown").unwrap_err(),
            MatchError::NotFound
        );
        assert_eq!(
            router.match_route(&Method::GET, "relative").unwrap_err(),
            MatchError::NotFound
        );

        let response = router.dispatch(Method::GET, "/unknown").await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.body_text(), "404 Not Found");
    }

    #[tokio::test]
    async fn test_custom_not_found() {
        let mut router = Router::new();
        router.not_found(|ctx: Context| async move {
            let body = format!("nothing at {}", ctx.req().path());
            Ok::<_, BoxError>(Response::text(body).with_status(StatusCode::NOT_FOUND))
        });

        let response = router.dispatch(Method::GET, "/missing").await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.body_text(), "nothing at /missing");
    }

    #[tokio::test]
    async fn test_method_not_allowed() {
        let mut router = Router::new();
        router
            .get("/users", text("list"))
            .unwrap()
            .post("/users", text("create"))
            .unwrap();

        assert_eq!(
            router.match_route(&Method::DELETE, "/users").unwrap_err(),
            MatchError::MethodNotAllowed {
                allowed: vec![Method::GET, Method::POST, Method::HEAD],
            }
        );

        let response = router.dispatch(Method::DELETE, "/users").await.unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(
            response.headers().get("allow").unwrap(),
            "GET, POST, HEAD"
        );
    }

    #[tokio::test]
    async fn test_head_falls_back_to_get() {
        let mut router = Router::new();
        router.get("/page", text("page")).unwrap();

        let matched = router.match_route(&Method::HEAD, "/page").unwrap();
        assert_eq!(matched.route().method(), &MethodFilter::Exact(Method::GET));

        let mut explicit = Router::new();
        explicit
            .get("/page", text("get"))
            .unwrap()
            .head("/page", text("head"))
            .unwrap();
        let response = explicit.dispatch(Method::HEAD, "/page").await.unwrap();
        assert_eq!(response.body_text(), "head");
    }

    #[tokio::test]
    async fn test_all_accepts_every_method() {
        let mut router = Router::new();
        router.all("/any", text("any")).unwrap();

        for method in [Method::GET, Method::POST, Method::DELETE, Method::PATCH] {
            let response = router.dispatch(method, "/any").await.unwrap();
            assert_eq!(response.body_text(), "any");
        }
    }

    #[tokio::test]
    async fn test_mount_is_transparent() {
        let mut user = Router::new();
        user.get("/", text("List Users"))
            .unwrap()
            .get("/:id", echo_id())
            .unwrap()
            .post("/", text("Create User"))
            .unwrap();

        let mut child_only = Router::new();
        child_only.get("/:id", echo_id()).unwrap();
        let direct = child_only.dispatch(Method::GET, "/42").await.unwrap();

        let mut app = Router::new();
        app.get("/", text("root")).unwrap().mount("/user", user).unwrap();

        let mounted = app.dispatch(Method::GET, "/user/42").await.unwrap();
        assert_eq!(mounted.body_text(), direct.body_text());

        let patterns: Vec<String> = app
            .routes()
            .iter()
            .map(|route| format!("{} {}", route.method(), route.pattern()))
            .collect();
        assert_eq!(
            patterns,
            vec!["GET /", "GET /user", "GET /user/:id", "POST /user"]
        );

        for path in ["/user", "/user/"] {
            let response = app.dispatch(Method::POST, path).await.unwrap();
            assert_eq!(response.body_text(), "Create User");
            let response = app.dispatch(Method::GET, path).await.unwrap();
            assert_eq!(response.body_text(), "List Users");
        }
    }

    #[test]
    fn test_mount_rejects_bad_prefix_without_side_effects() {
        let mut child = Router::new();
        child.get("/:id", echo_id()).unwrap();

        let mut app = Router::new();
        assert!(matches!(
            app.mount("user", child),
            Err(PatternError::MissingLeadingSlash { .. })
        ));

        let mut child = Router::new();
        child.get("/ok", text("ok")).unwrap().get("/:id", echo_id()).unwrap();
        assert!(matches!(
            app.mount("/org/:id", child),
            Err(PatternError::DuplicateParam { .. })
        ));
        assert!(app.routes().is_empty());
    }

    #[test]
    fn test_register_rejects_malformed_pattern() {
        let mut router = Router::new();
        assert!(router.get("/a//b", text("x")).is_err());
        assert!(router.get("/a/:x/:x", text("x")).is_err());
        assert!(router.routes().is_empty());
    }

    #[tokio::test]
    async fn test_strict_trailing_slash() {
        let mut user = Router::new();
        user.get("/", text("List Users")).unwrap();

        let mut app = Router::new().with_trailing_slash(TrailingSlash::Strict);
        app.get("/about/", text("about")).unwrap().mount("/user", user).unwrap();

        let response = app.dispatch(Method::GET, "/user").await.unwrap();
        assert_eq!(response.body_text(), "List Users");
        let response = app.dispatch(Method::GET, "/user/").await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app.dispatch(Method::GET, "/about/").await.unwrap();
        assert_eq!(response.body_text(), "about");
        let response = app.dispatch(Method::GET, "/about").await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_handler_error_propagates_unchanged() {
        let mut router = Router::new();
        router
            .get("/boom", |_ctx: Context| async move {
                Err::<Response, BoxError>(Box::new(io::Error::new(
                    io::ErrorKind::Other,
                    "backend exploded",
                )))
            })
            .unwrap();

        let err = router.dispatch(Method::GET, "/boom").await.unwrap_err();
        let io_err = err.downcast_ref::<io::Error>().unwrap();
        assert_eq!(io_err.kind(), io::ErrorKind::Other);
        assert_eq!(io_err.to_string(), "backend exploded");
    }

    #[tokio::test]
    async fn test_query_reaches_context() {
        let mut router = Router::new();
        router
            .get("/search", |ctx: Context| async move {
                let q = ctx.req().query("q").unwrap_or_default();
                Ok::<_, BoxError>(ctx.text(q))
            })
            .unwrap();

        let response = router.dispatch(Method::GET, "/search?q=rust+router").await.unwrap();
        assert_eq!(response.body_text(), "rust router");
    }

    #[tokio::test]
    async fn test_concurrent_dispatch_shares_router() {
        let mut router = Router::new();
        router.get("/user/:id", echo_id()).unwrap();
        let router = Arc::new(router);

        let tasks: Vec<_> = (0..16)
            .map(|i| {
                let router = router.clone();
                tokio::spawn(async move {
                    let response = router
                        .dispatch(Method::GET, &format!("/user/{}", i))
                        .await
                        .unwrap();
                    assert_eq!(response.body_text(), format!("id={}", i));
                })
            })
            .collect();

        for task in tasks {
            task.await.unwrap();
        }
    }
}
