//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Wrap the route table in an axum app with a single fallback handler
//! - Wire up middleware (tracing, timeout, body limit, request ID)
//! - Bind server to listener and serve until shutdown
//! - Record per-request logs and metrics

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{Request, State},
    http::Method,
    Router as AxumRouter,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ServerConfig;
use crate::http::request::{into_route_request, request_id, MakeRequestUuid};
use crate::http::response::{internal_error, into_http_response, payload_too_large};
use crate::observability::metrics;
use crate::routing::Router;

/// Application state injected into the dispatch handler.
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<Router>,
    pub max_body_bytes: usize,
}

/// HTTP front end for a route table.
pub struct HttpServer {
    app: AxumRouter,
    config: ServerConfig,
}

impl HttpServer {
    /// Create a new HTTP server serving `router`.
    pub fn new(config: ServerConfig, router: Router) -> Self {
        let state = AppState {
            router: Arc::new(router),
            max_body_bytes: config.limits.max_body_bytes,
        };

        let app = Self::build_app(&config, state);
        Self { app, config }
    }

    /// Build the axum app with all middleware layers.
    #[allow(deprecated)]
    fn build_app(config: &ServerConfig, state: AppState) -> AxumRouter {
        let layers = ServiceBuilder::new()
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
                tracing::info_span!(
                    "request",
                    request_id = %request_id(request.headers()),
                    method = %request.method(),
                    uri = %request.uri(),
                )
            }))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(RequestBodyLimitLayer::new(config.limits.max_body_bytes))
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.timeouts.request_secs,
            )));

        AxumRouter::new()
            .fallback(dispatch_handler)
            .with_state(state)
            .layer(layers)
    }

    /// The axum app, for in-process use (tests, embedding).
    pub fn app(&self) -> AxumRouter {
        self.app.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Serve on `listener` until a shutdown signal is broadcast.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Forwards every request to the route table.
async fn dispatch_handler(
    State(state): State<AppState>,
    request: Request,
) -> axum::response::Response {
    let start_time = Instant::now();
    let request_id = request_id(request.headers()).to_string();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let (parts, body) = request.into_parts();
    let body = match axum::body::to_bytes(body, state.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(request_id = %request_id, error = %e, "Request body rejected");
            metrics::record_request(method.as_str(), 413, start_time);
            return into_http_response(payload_too_large(), false);
        }
    };

    let response = match state.router.handle(into_route_request(parts, body)).await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(
                request_id = %request_id,
                method = %method,
                path = %path,
                error = %e,
                "Handler failed"
            );
            internal_error()
        }
    };

    let status = response.status();
    tracing::debug!(
        request_id = %request_id,
        method = %method,
        path = %path,
        status = status.as_u16(),
        "Request dispatched"
    );
    metrics::record_request(method.as_str(), status.as_u16(), start_time);

    into_http_response(response, method == Method::HEAD)
}
