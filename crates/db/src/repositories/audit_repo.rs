//! Repository for the `audit_log` table.
//!
//! Append-only: this module exposes inserts and reads, nothing else.
//! Every insert extends the integrity hash chain, so entries are written
//! one at a time inside the decision transaction.

use chrono::SubsecRound;
use sqlx::{PgConnection, PgPool};

use dsreg_core::audit;

use crate::models::audit::{AuditEntry, CreateAuditEntry};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, action, dataset_id, changed_by, changed_at, changes, integrity_hash";

/// Advisory lock key serializing chain appends across transactions.
/// Without it, two concurrent decisions could both read the same chain
/// head and fork the hash chain.
const CHAIN_LOCK_KEY: i64 = 0x6473_7265_675f_6175;

/// Provides append and query operations for audit entries.
pub struct AuditRepo;

impl AuditRepo {
    /// Append one entry, chaining its integrity hash to the previous
    /// entry's hash.
    ///
    /// The timestamp is assigned here and truncated to microseconds so
    /// the value covered by the hash is exactly the value PostgreSQL
    /// stores and later verification reads back.
    pub async fn append(
        conn: &mut PgConnection,
        entry: &CreateAuditEntry,
    ) -> Result<AuditEntry, sqlx::Error> {
        let changed_at = chrono::Utc::now().trunc_subsecs(6);

        // Held until the surrounding transaction commits.
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(CHAIN_LOCK_KEY)
            .execute(&mut *conn)
            .await?;

        let prev_hash = Self::find_last_hash(conn).await?;
        let entry_data = audit::canonical_entry_data(
            changed_at,
            &entry.changed_by,
            &entry.action,
            &entry.dataset_id,
        );
        let integrity_hash = audit::compute_integrity_hash(prev_hash.as_deref(), &entry_data);

        let query = format!(
            "INSERT INTO audit_log (action, dataset_id, changed_by, changed_at, changes, integrity_hash)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AuditEntry>(&query)
            .bind(&entry.action)
            .bind(&entry.dataset_id)
            .bind(&entry.changed_by)
            .bind(changed_at)
            .bind(&entry.changes)
            .bind(&integrity_hash)
            .fetch_one(&mut *conn)
            .await
    }

    /// The most recent `limit` entries, newest first.
    pub async fn list_recent(pool: &PgPool, limit: i64) -> Result<Vec<AuditEntry>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM audit_log ORDER BY changed_at DESC, id DESC LIMIT $1"
        );
        sqlx::query_as::<_, AuditEntry>(&query)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Hash of the most recent entry (chain head), if any.
    pub async fn find_last_hash(conn: &mut PgConnection) -> Result<Option<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>(
            "SELECT integrity_hash FROM audit_log ORDER BY id DESC LIMIT 1",
        )
        .fetch_optional(&mut *conn)
        .await
    }

    /// All entries in chain order (id ascending) for integrity
    /// verification.
    pub async fn fetch_chain(pool: &PgPool) -> Result<Vec<AuditEntry>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM audit_log ORDER BY id ASC");
        sqlx::query_as::<_, AuditEntry>(&query).fetch_all(pool).await
    }
}
