//! Route definitions for bulk import.

use axum::routing::post;
use axum::Router;

use crate::handlers::uploads;
use crate::state::AppState;

/// Upload routes mounted at `/uploads`.
///
/// ```text
/// POST /   -> upload_datasets (multipart)
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/", post(uploads::upload_datasets))
}
