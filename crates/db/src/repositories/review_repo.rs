//! The decision pipeline: applying approve/reject decisions to batches of
//! pending changes.
//!
//! All referenced changes are processed inside one transaction. Rows are
//! locked `FOR UPDATE` while pending, so the pending-to-terminal
//! transition happens exactly once even under concurrent decisions, and
//! any failure mid-batch rolls every write back (no audit entry without
//! its registry change).

use serde::Serialize;
use sqlx::{PgConnection, PgPool};

use dsreg_core::change::{ChangeKind, Decision};
use dsreg_core::error::CoreError;
use dsreg_core::schema::SchemaConfig;
use dsreg_core::types::DbId;

use crate::models::audit::CreateAuditEntry;
use crate::models::change::{field_map_json, snapshot_field_map, PendingChange};
use crate::models::dataset::DatasetPatch;
use crate::repositories::{AuditRepo, ChangeRepo, DatasetRepo};

/// Error surfaced by the decision pipeline.
#[derive(Debug, thiserror::Error)]
pub enum ReviewError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

/// Outcome counts for one decision call.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct DecisionSummary {
    /// Changes moved into a terminal status.
    pub decided: usize,
    /// Referenced ids that were missing or no longer pending.
    pub skipped: usize,
}

/// Drives decision application for the change queue.
pub struct ReviewRepo;

impl ReviewRepo {
    /// Apply `decision` to every referenced change as `actor`.
    ///
    /// Missing or already-decided ids are skipped silently. Approvals
    /// mutate the registry and append exactly one audit entry per applied
    /// change; rejections only move the status. Callers authorize the
    /// actor *before* this runs — no state is touched on an authorization
    /// failure.
    pub async fn decide(
        pool: &PgPool,
        schema: &SchemaConfig,
        change_ids: &[DbId],
        decision: Decision,
        actor: &str,
    ) -> Result<DecisionSummary, ReviewError> {
        let mut tx = pool.begin().await?;
        let mut decided = 0;
        let mut skipped = 0;

        for &id in change_ids {
            let change = match ChangeRepo::find_pending_for_update(&mut tx, id).await? {
                Some(change) => change,
                None => {
                    skipped += 1;
                    continue;
                }
            };

            if decision.applies_to_registry() {
                Self::apply(&mut tx, schema, &change, actor).await?;
            }

            ChangeRepo::set_status(&mut tx, id, decision.resulting_status()).await?;
            decided += 1;
        }

        tx.commit().await?;

        tracing::info!(
            decision = ?decision,
            actor = %actor,
            decided,
            skipped,
            "Decision applied to change batch"
        );

        Ok(DecisionSummary { decided, skipped })
    }

    /// Apply one approved change to the registry and record it.
    async fn apply(
        conn: &mut PgConnection,
        schema: &SchemaConfig,
        change: &PendingChange,
        actor: &str,
    ) -> Result<(), ReviewError> {
        let kind = ChangeKind::parse(&change.change_kind)?;
        match kind {
            ChangeKind::Add => {
                let snapshot = change.new_data.as_ref().ok_or_else(|| {
                    CoreError::Validation("Add change carries no new data".to_string())
                })?;
                let snapshot = snapshot_field_map(snapshot)?;
                let patch = DatasetPatch::from_snapshot(schema, &snapshot)?;
                if !patch.sets_data_name() {
                    return Err(CoreError::Validation(
                        "Add change must provide a display name".to_string(),
                    )
                    .into());
                }

                DatasetRepo::upsert_from_patch(conn, &change.dataset_id, &patch).await?;
                AuditRepo::append(
                    conn,
                    &CreateAuditEntry {
                        action: ChangeKind::Add.as_str().to_string(),
                        dataset_id: change.dataset_id.clone(),
                        changed_by: actor.to_string(),
                        changes: Some(serde_json::json!({ "new": field_map_json(&snapshot) })),
                    },
                )
                .await?;
            }

            ChangeKind::Modify => {
                let snapshot = change.new_data.as_ref().ok_or_else(|| {
                    CoreError::Validation("Modify change carries no new data".to_string())
                })?;
                let snapshot = snapshot_field_map(snapshot)?;
                let patch = DatasetPatch::from_snapshot(schema, &snapshot)?;

                // Capture live values of the fields being overwritten; the
                // record may have drifted since the diff was computed.
                let before =
                    match DatasetRepo::find_by_dataset_id(conn, &change.dataset_id).await? {
                        Some(dataset) => dataset,
                        None => {
                            // Ghost change: target vanished between diff
                            // and approval. Accepted degraded behavior.
                            tracing::warn!(
                                dataset_id = %change.dataset_id,
                                change_id = change.id,
                                "Modify target no longer exists; skipping apply"
                            );
                            return Ok(());
                        }
                    };
                let old: dsreg_core::schema::FieldMap = snapshot
                    .keys()
                    .map(|field| {
                        (
                            field.clone(),
                            before.field_value(field).unwrap_or_default(),
                        )
                    })
                    .collect();

                DatasetRepo::merge_from_patch(conn, &change.dataset_id, &patch).await?;
                AuditRepo::append(
                    conn,
                    &CreateAuditEntry {
                        action: ChangeKind::Modify.as_str().to_string(),
                        dataset_id: change.dataset_id.clone(),
                        changed_by: actor.to_string(),
                        changes: Some(serde_json::json!({
                            "old": field_map_json(&old),
                            "new": field_map_json(&snapshot),
                        })),
                    },
                )
                .await?;
            }

            ChangeKind::Delete => {
                let removed =
                    match DatasetRepo::find_by_dataset_id(conn, &change.dataset_id).await? {
                        Some(dataset) => dataset,
                        None => {
                            tracing::warn!(
                                dataset_id = %change.dataset_id,
                                change_id = change.id,
                                "Delete target no longer exists; skipping apply"
                            );
                            return Ok(());
                        }
                    };

                DatasetRepo::delete_by_dataset_id(conn, &change.dataset_id).await?;
                AuditRepo::append(
                    conn,
                    &CreateAuditEntry {
                        action: ChangeKind::Delete.as_str().to_string(),
                        dataset_id: change.dataset_id.clone(),
                        changed_by: actor.to_string(),
                        changes: Some(serde_json::json!({
                            "deleted": field_map_json(&removed.field_map(schema)),
                        })),
                    },
                )
                .await?;
            }
        }

        Ok(())
    }
}
