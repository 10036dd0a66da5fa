//! Route definitions for the registry.

use axum::routing::get;
use axum::Router;

use crate::handlers::datasets;
use crate::state::AppState;

/// Dataset routes mounted at `/datasets`.
///
/// ```text
/// GET  /         -> list_datasets
/// GET  /export   -> export_datasets
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(datasets::list_datasets))
        .route("/export", get(datasets::export_datasets))
}
