//! Registry entity model and the typed patch applied by approvals.

use serde::Serialize;
use sqlx::FromRow;

use dsreg_core::error::CoreError;
use dsreg_core::schema::{self, FieldKind, FieldMap, SchemaConfig, FIELD_DATA_NAME};
use dsreg_core::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Dataset entity
// ---------------------------------------------------------------------------

/// A live registry record. `dataset_id` is the external identifier,
/// unique across the registry and immutable once assigned.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Dataset {
    pub id: DbId,
    pub dataset_id: String,
    pub data_name: String,
    pub domain: Option<String>,
    pub token_count: Option<f64>,
    pub epochs: Option<f64>,
    pub desired_token_count: Option<f64>,
    pub training_stage: Option<String>,
    pub source_link: Option<String>,
    pub storage_path: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Dataset {
    /// Canonical string rendering of one field, or `None` for a field
    /// name this record does not carry.
    pub fn field_value(&self, field: &str) -> Option<String> {
        let text = |v: &Option<String>| v.clone().unwrap_or_default();
        let number = |v: Option<f64>| schema::render_opt_number(v);
        let value = match field {
            "dataset_id" => self.dataset_id.clone(),
            "data_name" => self.data_name.clone(),
            "domain" => text(&self.domain),
            "token_count" => number(self.token_count),
            "epochs" => number(self.epochs),
            "desired_token_count" => number(self.desired_token_count),
            "training_stage" => text(&self.training_stage),
            "source_link" => text(&self.source_link),
            "storage_path" => text(&self.storage_path),
            _ => return None,
        };
        Some(value)
    }

    /// Normalized attribute map for diffing and audit snapshots (every
    /// attribute column of the schema, identifier excluded).
    pub fn field_map(&self, schema: &SchemaConfig) -> FieldMap {
        schema
            .attribute_columns()
            .map(|col| {
                (
                    col.field.clone(),
                    self.field_value(&col.field).unwrap_or_default(),
                )
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Typed patch
// ---------------------------------------------------------------------------

/// One parsed attribute value, ready to bind.
#[derive(Debug, Clone, PartialEq)]
pub enum PatchValue {
    /// Text column; empty snapshot values become NULL.
    Text(Option<String>),
    /// Numeric column; empty snapshot values become NULL.
    Number(Option<f64>),
}

/// A schema-validated, typed set of column assignments parsed from a
/// change's attribute snapshot. Construction is the ingestion boundary:
/// unknown fields are rejected and numeric fields must parse.
#[derive(Debug, Clone)]
pub struct DatasetPatch {
    values: Vec<(String, PatchValue)>,
}

impl DatasetPatch {
    pub fn from_snapshot(schema: &SchemaConfig, snapshot: &FieldMap) -> Result<Self, CoreError> {
        schema.check_known_fields(snapshot)?;

        let mut values = Vec::with_capacity(snapshot.len());
        for (field, raw) in snapshot {
            // check_known_fields guarantees the column exists.
            let col = schema.column(field).expect("field validated against schema");
            let value = match col.kind {
                FieldKind::Text => {
                    if field == FIELD_DATA_NAME && raw.is_empty() {
                        return Err(CoreError::Validation(
                            "Field 'data_name' must not be empty".to_string(),
                        ));
                    }
                    PatchValue::Text((!raw.is_empty()).then(|| raw.clone()))
                }
                FieldKind::Number => PatchValue::Number(schema::parse_opt_number(field, raw)?),
            };
            values.push((field.clone(), value));
        }
        Ok(Self { values })
    }

    /// Column/value pairs in snapshot order.
    pub fn entries(&self) -> &[(String, PatchValue)] {
        &self.values
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Whether the patch assigns the display name (required for inserts).
    pub fn sets_data_name(&self) -> bool {
        self.values.iter().any(|(f, _)| f == FIELD_DATA_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(pairs: &[(&str, &str)]) -> FieldMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn patch_parses_typed_values() {
        let schema = SchemaConfig::registry_default();
        let patch = DatasetPatch::from_snapshot(
            &schema,
            &snapshot(&[("data_name", "Wiki"), ("token_count", "20"), ("epochs", "")]),
        )
        .unwrap();

        let get = |field: &str| {
            patch
                .entries()
                .iter()
                .find(|(f, _)| f == field)
                .map(|(_, v)| v.clone())
                .unwrap()
        };
        assert_eq!(get("data_name"), PatchValue::Text(Some("Wiki".into())));
        assert_eq!(get("token_count"), PatchValue::Number(Some(20.0)));
        assert_eq!(get("epochs"), PatchValue::Number(None));
    }

    #[test]
    fn patch_rejects_unknown_field() {
        let schema = SchemaConfig::registry_default();
        let err =
            DatasetPatch::from_snapshot(&schema, &snapshot(&[("surprise", "x")])).unwrap_err();
        assert!(err.to_string().contains("Unknown attribute field"));
    }

    #[test]
    fn patch_rejects_non_numeric_value() {
        let schema = SchemaConfig::registry_default();
        assert!(DatasetPatch::from_snapshot(&schema, &snapshot(&[("epochs", "many")])).is_err());
    }

    #[test]
    fn patch_rejects_empty_display_name() {
        let schema = SchemaConfig::registry_default();
        assert!(DatasetPatch::from_snapshot(&schema, &snapshot(&[("data_name", "")])).is_err());
    }

    #[test]
    fn empty_text_becomes_null() {
        let schema = SchemaConfig::registry_default();
        let patch =
            DatasetPatch::from_snapshot(&schema, &snapshot(&[("domain", "")])).unwrap();
        assert_eq!(patch.entries()[0].1, PatchValue::Text(None));
    }
}
