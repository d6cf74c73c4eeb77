//! Segment Router (v1)
//!
//! Serves the demo route table over HTTP, or inspects it offline.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌──────────────────────────────────────────────┐
//!                         │                 SEGMENT ROUTER               │
//!                         │                                              │
//!     Client Request      │  ┌─────────┐    ┌──────────┐    ┌─────────┐  │
//!     ────────────────────┼─▶│  http   │───▶│ routing  │───▶│ handler │  │
//!                         │  │ server  │    │  router  │    │ (app)   │  │
//!                         │  └─────────┘    └──────────┘    └────┬────┘  │
//!     Client Response     │       ▲                              │       │
//!     ◀───────────────────┼───────┴──────────── Response ◀───────┘       │
//!                         │                                              │
//!                         │  config · observability · lifecycle          │
//!                         └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use axum::http::Method;
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;

use segment_router::config::validation::validate_config;
use segment_router::config::{load_config, ConfigError, ServerConfig};
use segment_router::http::HttpServer;
use segment_router::lifecycle::{wait_for_signal, Shutdown};
use segment_router::observability::{logging, metrics};
use segment_router::routing::BoxError;

#[derive(Parser)]
#[command(name = "segment-router")]
#[command(about = "Serve or inspect the demo route table", long_about = None, version)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Override listener.bind_address
        #[arg(short, long)]
        bind: Option<String>,
    },
    /// Print the compiled route table
    Routes,
    /// Dispatch one request without starting a server
    Dispatch {
        /// HTTP method, e.g. GET
        method: String,
        /// Request target, e.g. /user/42?verbose=1
        target: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };

    if let Commands::Serve { bind: Some(bind) } = &cli.command {
        config.listener.bind_address = bind.clone();
        validate_config(&config).map_err(ConfigError::Validation)?;
    }

    logging::init_logging(&config.observability.log_level);

    let router = segment_router::app::build(&config.routing)?;

    match cli.command {
        Commands::Serve { .. } => serve(config, router).await?,
        Commands::Routes => {
            for route in router.routes() {
                println!("{:<8}{}", route.method().to_string(), route.pattern());
            }
        }
        Commands::Dispatch { method, target } => {
            let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())?;
            let response = router.dispatch(method, &target).await?;
            println!("{}", response.status());
            println!("{}", response.body_text());
        }
    }

    Ok(())
}

async fn serve(
    config: ServerConfig,
    router: segment_router::Router,
) -> Result<(), BoxError> {
    tracing::info!("segment-router v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        strict_trailing_slash = config.routing.strict_trailing_slash,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(wait_for_signal(shutdown));

    HttpServer::new(config, router)
        .run(listener, server_shutdown)
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
