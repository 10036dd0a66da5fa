//! Audit trail constants and integrity hashing.
//!
//! This module lives in `core` (zero I/O) so both the repository layer and
//! any future CLI tooling can verify the chain the same way.

use crate::hashing;
use crate::types::Timestamp;

/// Known action values for audit entries. One entry is written per applied
/// pending change, using the change kind as the action.
pub mod actions {
    pub const ADD: &str = "add";
    pub const MODIFY: &str = "modify";
    pub const DELETE: &str = "delete";
}

/// Known seed value for the first entry in the hash chain.
const CHAIN_SEED: &str = "DSREG_AUDIT_CHAIN_SEED_V1";

/// Compute the SHA-256 integrity hash for an audit entry.
///
/// `prev_hash` is the integrity hash of the previous entry, or `None` for
/// the first entry in the chain (which uses a known seed value).
pub fn compute_integrity_hash(prev_hash: Option<&str>, entry_data: &str) -> String {
    let prev = prev_hash.unwrap_or(CHAIN_SEED);
    let combined = format!("{prev}|{entry_data}");
    hashing::sha256_hex(combined.as_bytes())
}

/// Canonical string representation of an entry's content, hashed into the
/// chain. Kept deliberately narrow: the fields every entry is guaranteed
/// to carry, in a fixed order.
pub fn canonical_entry_data(
    changed_at: Timestamp,
    changed_by: &str,
    action: &str,
    dataset_id: &str,
) -> String {
    format!(
        "{}|{}|{}|{}",
        changed_at.to_rfc3339(),
        changed_by,
        action,
        dataset_id
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_entry_uses_seed() {
        let hash = compute_integrity_hash(None, "entry");
        assert_eq!(hash.len(), 64);
    }

    #[test]
    fn chained_entry_uses_previous_hash() {
        let first = compute_integrity_hash(None, "entry_1");
        let second = compute_integrity_hash(Some(&first), "entry_2");
        assert_ne!(first, second);
        assert_eq!(second.len(), 64);
    }

    #[test]
    fn same_input_produces_same_hash() {
        let a = compute_integrity_hash(None, "same");
        let b = compute_integrity_hash(None, "same");
        assert_eq!(a, b);
    }

    #[test]
    fn different_prev_hash_produces_different_result() {
        let a = compute_integrity_hash(Some("hash_a"), "same");
        let b = compute_integrity_hash(Some("hash_b"), "same");
        assert_ne!(a, b);
    }

    #[test]
    fn canonical_data_is_order_stable() {
        let at = chrono::DateTime::parse_from_rfc3339("2025-06-01T12:00:00Z")
            .unwrap()
            .with_timezone(&chrono::Utc);
        let data = canonical_entry_data(at, "nadia", actions::ADD, "DS-000001");
        assert_eq!(data, "2025-06-01T12:00:00+00:00|nadia|add|DS-000001");
    }
}
