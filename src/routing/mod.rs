//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Registration (at startup):
//!     (method, "/user/:id", handler)
//!     → pattern.rs (compile into literal / param segments)
//!     → router.rs (append to ordered table)
//!     → mount: child routes copied with prefixed patterns
//!
//! Incoming Request (method, path?query)
//!     → context.rs (split query, wrap as Request)
//!     → router.rs (scan routes in order)
//!     → matcher.rs (segment-by-segment match, bind params)
//!     → handler.rs (invoke with fresh Context)
//!     → Response | NotFound (404) | MethodNotAllowed (405) | handler error
//! ```
//!
//! # Design Decisions
//! - Routes compiled at registration, immutable at runtime
//! - No regex in hot path
//! - Deterministic: first match in registration order wins
//! - Mounting is resolved eagerly by prefix rewriting

pub mod context;
pub mod handler;
pub mod matcher;
pub mod params;
pub mod pattern;
pub mod router;

pub use context::{Context, Request, Response};
pub use handler::{BoxError, Handler, HandlerResult};
pub use matcher::TrailingSlash;
pub use params::Params;
pub use pattern::{Pattern, PatternError, Segment};
pub use router::{MatchError, MethodFilter, Route, RouteMatch, Router};
