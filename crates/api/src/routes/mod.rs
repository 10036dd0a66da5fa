pub mod audit;
pub mod charts;
pub mod datasets;
pub mod health;
pub mod review;
pub mod uploads;

use axum::routing::get;
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /datasets                      list registry records (GET)
/// /datasets/export               registry as CSV (GET)
///
/// /uploads                       CSV upload + diff + enqueue (POST)
///
/// /changes/pending               pending changes grouped by kind (GET)
/// /changes/approve               apply changes to registry (POST)
/// /changes/reject                reject changes (POST)
///
/// /audit-log                     recent audit entries, newest first (GET)
/// /audit-log/integrity-check     verify the hash chain (GET)
///
/// /config                        reviewer identity info (GET)
///
/// /charts                        list, upload (GET, POST)
/// /charts/{id}                   delete (DELETE)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Registry listing and tabular export.
        .nest("/datasets", datasets::router())
        // Bulk import: diff computation and change enqueueing.
        .nest("/uploads", uploads::router())
        // Change review: pending listing and decisions.
        .nest("/changes", review::router())
        // Audit trail.
        .nest("/audit-log", audit::router())
        // Reviewer configuration.
        .route("/config", get(handlers::review::reviewer_info))
        // Chart asset management.
        .nest("/charts", charts::router())
}
