//! Route definitions for chart asset management.

use axum::routing::{delete, get};
use axum::Router;

use crate::handlers::charts;
use crate::state::AppState;

/// Chart routes mounted at `/charts`.
///
/// ```text
/// GET    /        -> list_charts
/// POST   /        -> upload_chart (multipart)
/// DELETE /{id}    -> delete_chart
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(charts::list_charts).post(charts::upload_chart))
        .route("/{id}", delete(charts::delete_chart))
}
