//! Handlers for the audit trail: recent entries and chain verification.

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use dsreg_core::audit::{canonical_entry_data, compute_integrity_hash};
use dsreg_db::models::audit::{AuditEntry, IntegrityCheckResult};
use dsreg_db::repositories::AuditRepo;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// Query parameters for the audit log listing.
#[derive(Debug, Deserialize)]
pub struct AuditLogParams {
    pub limit: Option<i64>,
}

/// GET /audit-log
///
/// The most recent entries, newest first. `limit` defaults to the
/// configured value and is capped at 500.
pub async fn list_audit_log(
    State(state): State<AppState>,
    Query(params): Query<AuditLogParams>,
) -> AppResult<Json<DataResponse<Vec<AuditEntry>>>> {
    let limit = params
        .limit
        .unwrap_or(state.config.audit_log_limit)
        .clamp(1, 500);

    let entries = AuditRepo::list_recent(&state.pool, limit).await?;
    Ok(Json(DataResponse { data: entries }))
}

/// GET /audit-log/integrity-check
///
/// Walk the hash chain from the first entry and report the first break,
/// if any.
pub async fn check_integrity(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<IntegrityCheckResult>>> {
    let entries = AuditRepo::fetch_chain(&state.pool).await?;

    let mut verified: i64 = 0;
    let mut prev_hash: Option<String> = None;
    let mut first_break: Option<i64> = None;

    for entry in &entries {
        let entry_data = canonical_entry_data(
            entry.changed_at,
            &entry.changed_by,
            &entry.action,
            &entry.dataset_id,
        );
        let expected = compute_integrity_hash(prev_hash.as_deref(), &entry_data);

        if entry.integrity_hash != expected {
            first_break = Some(entry.id);
            break;
        }

        verified += 1;
        prev_hash = Some(entry.integrity_hash.clone());
    }

    Ok(Json(DataResponse {
        data: IntegrityCheckResult {
            verified_entries: verified,
            chain_valid: first_break.is_none(),
            first_break,
        },
    }))
}
