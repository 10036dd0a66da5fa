//! Route definitions for the audit trail.

use axum::routing::get;
use axum::Router;

use crate::handlers::audit;
use crate::state::AppState;

/// Audit routes mounted at `/audit-log`.
///
/// ```text
/// GET  /                  -> list_audit_log (?limit=)
/// GET  /integrity-check   -> check_integrity
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(audit::list_audit_log))
        .route("/integrity-check", get(audit::check_integrity))
}
