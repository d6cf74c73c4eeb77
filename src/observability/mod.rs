//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! router + HTTP adapter produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (request counters, latency histograms)
//!
//! Consumers:
//!     → stdout log stream
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through every log line of a request
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;
