//! `/user` sub-router.

use crate::routing::handler::text;
use crate::routing::{BoxError, Context, PatternError, Router};

/// Routes relative to the mount point: list, fetch by id, create.
pub fn router() -> Result<Router, PatternError> {
    let mut user = Router::new();
    user.get("/", text("List Users"))?
        .get("/:id", |ctx: Context| async move {
            let id = ctx.param("id").unwrap_or_default();
            Ok::<_, BoxError>(ctx.text(format!("Get User: {}", id)))
        })?
        .post("/", text("Create User"))?;
    Ok(user)
}
