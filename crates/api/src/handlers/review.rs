//! Handlers for the change-review endpoints: pending listing, approval,
//! rejection, and reviewer configuration.

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use dsreg_core::change::{authorize_decision, ChangeKind, Decision};
use dsreg_core::types::DbId;
use dsreg_db::models::change::PendingChange;
use dsreg_db::repositories::{ChangeRepo, DecisionSummary, ReviewRepo};

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Pending changes
// ---------------------------------------------------------------------------

/// Query parameters for the pending listing.
#[derive(Debug, Deserialize)]
pub struct PendingParams {
    pub kind: Option<String>,
}

/// Pending changes grouped by kind.
#[derive(Debug, Default, Serialize)]
pub struct PendingGroups {
    pub added: Vec<PendingChange>,
    pub modified: Vec<PendingChange>,
    pub deleted: Vec<PendingChange>,
}

/// GET /changes/pending
///
/// All pending changes grouped by kind, optionally filtered (`?kind=add`).
pub async fn list_pending(
    State(state): State<AppState>,
    Query(params): Query<PendingParams>,
) -> AppResult<Json<DataResponse<PendingGroups>>> {
    let kind = match params.kind.as_deref() {
        Some(value) => Some(ChangeKind::parse(value)?),
        None => None,
    };

    let pending = ChangeRepo::list_pending(&state.pool, kind).await?;

    let mut groups = PendingGroups::default();
    for change in pending {
        match ChangeKind::parse(&change.change_kind)? {
            ChangeKind::Add => groups.added.push(change),
            ChangeKind::Modify => groups.modified.push(change),
            ChangeKind::Delete => groups.deleted.push(change),
        }
    }

    Ok(Json(DataResponse { data: groups }))
}

// ---------------------------------------------------------------------------
// Decisions
// ---------------------------------------------------------------------------

/// Request body for the approve/reject endpoints.
#[derive(Debug, Deserialize)]
pub struct DecisionRequest {
    pub change_ids: Vec<DbId>,
    pub actor: String,
}

/// POST /changes/approve
///
/// Apply every referenced pending change to the registry and record each
/// application in the audit trail. The whole call fails with an
/// authorization error before any state is touched unless `actor` is the
/// configured administrator.
pub async fn approve_changes(
    State(state): State<AppState>,
    Json(input): Json<DecisionRequest>,
) -> AppResult<Json<DataResponse<DecisionSummary>>> {
    decide(&state, input, Decision::Approve).await
}

/// POST /changes/reject
///
/// Mark every referenced pending change rejected. Same authorization rule
/// as approval; the registry is never touched.
pub async fn reject_changes(
    State(state): State<AppState>,
    Json(input): Json<DecisionRequest>,
) -> AppResult<Json<DataResponse<DecisionSummary>>> {
    decide(&state, input, Decision::Reject).await
}

async fn decide(
    state: &AppState,
    input: DecisionRequest,
    decision: Decision,
) -> AppResult<Json<DataResponse<DecisionSummary>>> {
    // All-or-nothing at the call level: authorization happens before the
    // transaction even starts.
    authorize_decision(&input.actor, &state.config.admin_user)?;

    let summary = ReviewRepo::decide(
        &state.pool,
        &state.schema,
        &input.change_ids,
        decision,
        &input.actor,
    )
    .await?;

    Ok(Json(DataResponse { data: summary }))
}

// ---------------------------------------------------------------------------
// Reviewer configuration
// ---------------------------------------------------------------------------

/// Reviewer identity info surfaced to clients.
#[derive(Debug, Serialize)]
pub struct ReviewerInfo {
    pub admin_user: String,
    pub message: String,
}

/// GET /config
///
/// Who may approve or reject pending changes.
pub async fn reviewer_info(
    State(state): State<AppState>,
) -> Json<DataResponse<ReviewerInfo>> {
    let admin_user = state.config.admin_user.clone();
    let message = format!("Only {admin_user} can approve or reject pending changes");
    Json(DataResponse {
        data: ReviewerInfo {
            admin_user,
            message,
        },
    })
}
