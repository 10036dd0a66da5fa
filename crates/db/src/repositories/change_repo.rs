//! Repository for the `pending_changes` table (the change queue).

use sqlx::{PgConnection, PgPool};

use dsreg_core::change::{ChangeKind, ChangeStatus};

use crate::models::change::{CreatePendingChange, PendingChange};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str =
    "id, change_kind, dataset_id, old_data, new_data, submitted_by, submitted_at, status";

/// Column list for INSERT (excludes auto-generated `id`, `submitted_at`,
/// and the defaulted `status`).
const INSERT_COLUMNS: &str = "change_kind, dataset_id, old_data, new_data, submitted_by";

/// Provides enqueue, listing, and status-transition operations for
/// pending changes.
pub struct ChangeRepo;

impl ChangeRepo {
    /// Enqueue multiple pending changes in one statement.
    ///
    /// Uses a single INSERT with multiple value rows; every row starts in
    /// the pending status.
    pub async fn batch_insert(
        conn: &mut PgConnection,
        entries: &[CreatePendingChange],
    ) -> Result<Vec<PendingChange>, sqlx::Error> {
        if entries.is_empty() {
            return Ok(Vec::new());
        }

        let mut query = format!("INSERT INTO pending_changes ({INSERT_COLUMNS}) VALUES ");
        let mut param_idx = 1u32;
        for (row, _) in entries.iter().enumerate() {
            if row > 0 {
                query.push_str(", ");
            }
            query.push('(');
            for col in 0..5 {
                if col > 0 {
                    query.push_str(", ");
                }
                query.push_str(&format!("${param_idx}"));
                param_idx += 1;
            }
            query.push(')');
        }
        query.push_str(&format!(" RETURNING {COLUMNS}"));

        let mut q = sqlx::query_as::<_, PendingChange>(&query);
        for entry in entries {
            q = q
                .bind(&entry.change_kind)
                .bind(&entry.dataset_id)
                .bind(&entry.old_data)
                .bind(&entry.new_data)
                .bind(&entry.submitted_by);
        }

        q.fetch_all(&mut *conn).await
    }

    /// List all pending changes, optionally filtered by kind. No ordering
    /// is promised to callers; id order keeps output stable.
    pub async fn list_pending(
        pool: &PgPool,
        kind: Option<ChangeKind>,
    ) -> Result<Vec<PendingChange>, sqlx::Error> {
        match kind {
            Some(kind) => {
                let query = format!(
                    "SELECT {COLUMNS} FROM pending_changes \
                     WHERE status = $1 AND change_kind = $2 ORDER BY id"
                );
                sqlx::query_as::<_, PendingChange>(&query)
                    .bind(ChangeStatus::Pending.as_str())
                    .bind(kind.as_str())
                    .fetch_all(pool)
                    .await
            }
            None => {
                let query = format!(
                    "SELECT {COLUMNS} FROM pending_changes WHERE status = $1 ORDER BY id"
                );
                sqlx::query_as::<_, PendingChange>(&query)
                    .bind(ChangeStatus::Pending.as_str())
                    .fetch_all(pool)
                    .await
            }
        }
    }

    /// Fetch a change by id if it is still pending, locking the row for
    /// the rest of the transaction so a concurrent decision cannot move
    /// it out of pending twice.
    pub async fn find_pending_for_update(
        conn: &mut PgConnection,
        id: i64,
    ) -> Result<Option<PendingChange>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM pending_changes WHERE id = $1 AND status = $2 FOR UPDATE");
        sqlx::query_as::<_, PendingChange>(&query)
            .bind(id)
            .bind(ChangeStatus::Pending.as_str())
            .fetch_optional(&mut *conn)
            .await
    }

    /// Move a change into a terminal status.
    pub async fn set_status(
        conn: &mut PgConnection,
        id: i64,
        status: ChangeStatus,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE pending_changes SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(status.as_str())
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    /// Fetch a change by id regardless of status.
    pub async fn find_by_id(
        pool: &PgPool,
        id: i64,
    ) -> Result<Option<PendingChange>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM pending_changes WHERE id = $1");
        sqlx::query_as::<_, PendingChange>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}
