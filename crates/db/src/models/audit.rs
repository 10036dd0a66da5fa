//! Audit trail entity model.
//!
//! Entries are immutable once created; there is no update DTO and no
//! UPDATE statement anywhere in the repository layer.

use serde::Serialize;
use sqlx::FromRow;

use dsreg_core::types::{DbId, Timestamp};

/// One applied change: who did what to which dataset, with the relevant
/// before/after snapshot and the chain hash linking it to its predecessor.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AuditEntry {
    pub id: DbId,
    pub action: String,
    pub dataset_id: String,
    pub changed_by: String,
    pub changed_at: Timestamp,
    pub changes: Option<serde_json::Value>,
    pub integrity_hash: String,
}

/// DTO for appending an audit entry. Timestamp and integrity hash are
/// assigned by the repository at insert time so the stored hash always
/// covers the stored timestamp.
#[derive(Debug, Clone)]
pub struct CreateAuditEntry {
    pub action: String,
    pub dataset_id: String,
    pub changed_by: String,
    pub changes: Option<serde_json::Value>,
}

/// Result of an audit log integrity verification.
#[derive(Debug, Clone, Serialize)]
pub struct IntegrityCheckResult {
    /// Number of entries verified.
    pub verified_entries: i64,
    /// Whether the entire chain is valid.
    pub chain_valid: bool,
    /// ID of the first entry where the chain breaks, if any.
    pub first_break: Option<DbId>,
}
