//! Route definitions for change review.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::review;
use crate::state::AppState;

/// Review routes mounted at `/changes`.
///
/// ```text
/// GET  /pending   -> list_pending (?kind=add|modify|delete)
/// POST /approve   -> approve_changes
/// POST /reject    -> reject_changes
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/pending", get(review::list_pending))
        .route("/approve", post(review::approve_changes))
        .route("/reject", post(review::reject_changes))
}
