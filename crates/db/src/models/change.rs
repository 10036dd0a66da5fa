//! Pending change entity model and snapshot helpers.
//!
//! A pending change is created only by the import differ and mutated only
//! by the decision operation; its status column is CHECK-constrained to
//! the vocabulary in `dsreg_core::change`.

use serde::Serialize;
use sqlx::FromRow;

use dsreg_core::error::CoreError;
use dsreg_core::schema::FieldMap;
use dsreg_core::types::{DbId, Timestamp};

/// A proposed registry mutation awaiting a decision.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PendingChange {
    pub id: DbId,
    pub change_kind: String,
    pub dataset_id: String,
    pub old_data: Option<serde_json::Value>,
    pub new_data: Option<serde_json::Value>,
    pub submitted_by: String,
    pub submitted_at: Timestamp,
    pub status: String,
}

/// DTO for enqueueing a new pending change (status defaults to pending).
#[derive(Debug, Clone)]
pub struct CreatePendingChange {
    pub change_kind: String,
    pub dataset_id: String,
    pub old_data: Option<serde_json::Value>,
    pub new_data: Option<serde_json::Value>,
    pub submitted_by: String,
}

/// Decode a stored JSONB snapshot back into the normalized field map the
/// differ produced. Snapshots are flat string-to-string objects; anything
/// else is a malformed change.
pub fn snapshot_field_map(value: &serde_json::Value) -> Result<FieldMap, CoreError> {
    let object = value.as_object().ok_or_else(|| {
        CoreError::Validation("Change snapshot must be a JSON object".to_string())
    })?;

    let mut map = FieldMap::new();
    for (field, raw) in object {
        let raw = raw.as_str().ok_or_else(|| {
            CoreError::Validation(format!(
                "Change snapshot field '{field}' must hold a string value"
            ))
        })?;
        map.insert(field.clone(), raw.to_string());
    }
    Ok(map)
}

/// Encode a normalized field map as the JSONB snapshot stored on a change.
pub fn field_map_json(map: &FieldMap) -> serde_json::Value {
    serde_json::Value::Object(
        map.iter()
            .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_roundtrips_through_json() {
        let mut map = FieldMap::new();
        map.insert("data_name".into(), "Wiki".into());
        map.insert("token_count".into(), "20".into());

        let json = field_map_json(&map);
        assert_eq!(snapshot_field_map(&json).unwrap(), map);
    }

    #[test]
    fn non_object_snapshot_rejected() {
        assert!(snapshot_field_map(&serde_json::json!(["a", "b"])).is_err());
    }

    #[test]
    fn non_string_snapshot_value_rejected() {
        assert!(snapshot_field_map(&serde_json::json!({"token_count": 20})).is_err());
    }
}
