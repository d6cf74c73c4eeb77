//! `/book` sub-router. Mounted but has no handlers yet.

use crate::routing::Router;

pub fn router() -> Router {
    Router::new()
}
