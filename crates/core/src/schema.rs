//! Column-mapping configuration for the dataset registry.
//!
//! The registry's tabular interface (CSV import/export) is driven by an
//! external configuration listing, for each logical column, its display
//! label, its internal field name, and the kind of value it holds. The
//! core consumes this mapping; it never defines columns of its own.
//!
//! Two field names are reserved: [`FIELD_DATASET_ID`] (the external
//! identifier) and [`FIELD_DATA_NAME`] (the display name a row must have
//! to be imported at all).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Reserved field name for the external dataset identifier column.
pub const FIELD_DATASET_ID: &str = "dataset_id";

/// Reserved field name for the dataset display name column.
pub const FIELD_DATA_NAME: &str = "data_name";

/// The fixed set of attribute fields a dataset record can hold, with the
/// value kind each one stores. A schema config may relabel or reorder
/// these, but it can never introduce a field outside this set: merges are
/// validated field-by-field against it, and unknown keys are rejected
/// rather than silently set.
pub const KNOWN_FIELDS: &[(&str, FieldKind)] = &[
    (FIELD_DATASET_ID, FieldKind::Text),
    (FIELD_DATA_NAME, FieldKind::Text),
    ("domain", FieldKind::Text),
    ("token_count", FieldKind::Number),
    ("epochs", FieldKind::Number),
    ("desired_token_count", FieldKind::Number),
    ("training_stage", FieldKind::Text),
    ("source_link", FieldKind::Text),
    ("storage_path", FieldKind::Text),
];

/// A normalized attribute snapshot: field name to canonical string value.
///
/// Snapshots are what the differ compares and what pending changes carry;
/// typed parsing happens only when a snapshot is applied to the registry.
pub type FieldMap = BTreeMap<String, String>;

// ---------------------------------------------------------------------------
// Column specification
// ---------------------------------------------------------------------------

/// The kind of value a column holds, parsed at the ingestion boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Number,
}

impl Default for FieldKind {
    fn default() -> Self {
        Self::Text
    }
}

/// One logical column of the registry's tabular interface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnSpec {
    /// Display label used as the CSV header (e.g. "Training Stage").
    pub label: String,
    /// Internal field name on the dataset record (e.g. "training_stage").
    pub field: String,
    /// Value kind. Defaults to text when the config omits it.
    #[serde(default)]
    pub kind: FieldKind,
}

// ---------------------------------------------------------------------------
// Schema configuration
// ---------------------------------------------------------------------------

/// Ordered set of logical columns driving import, diffing, and export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaConfig {
    pub columns: Vec<ColumnSpec>,
}

impl SchemaConfig {
    /// The built-in column set matching the `datasets` table.
    pub fn registry_default() -> Self {
        fn col(label: &str, field: &str, kind: FieldKind) -> ColumnSpec {
            ColumnSpec {
                label: label.to_string(),
                field: field.to_string(),
                kind,
            }
        }

        Self {
            columns: vec![
                col("Dataset ID", FIELD_DATASET_ID, FieldKind::Text),
                col("Data Name", FIELD_DATA_NAME, FieldKind::Text),
                col("Domain", "domain", FieldKind::Text),
                col("Token Count", "token_count", FieldKind::Number),
                col("Epochs", "epochs", FieldKind::Number),
                col("Desired Token Count", "desired_token_count", FieldKind::Number),
                col("Training Stage", "training_stage", FieldKind::Text),
                col("Link", "source_link", FieldKind::Text),
                col("Data Path", "storage_path", FieldKind::Text),
            ],
        }
    }

    /// Parse a schema config from its JSON representation and validate it.
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| CoreError::Validation(format!("Invalid schema config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Check structural invariants: every column maps onto the fixed
    /// known-field set with the right kind, the reserved columns exist,
    /// and no field name or label appears twice.
    pub fn validate(&self) -> Result<(), CoreError> {
        let mut fields = std::collections::HashSet::new();
        let mut labels = std::collections::HashSet::new();
        for col in &self.columns {
            match KNOWN_FIELDS.iter().find(|(field, _)| *field == col.field) {
                None => {
                    return Err(CoreError::Validation(format!(
                        "Unknown field '{}' in schema config",
                        col.field
                    )));
                }
                Some((_, kind)) if *kind != col.kind => {
                    return Err(CoreError::Validation(format!(
                        "Field '{}' must be declared as {:?}",
                        col.field, kind
                    )));
                }
                Some(_) => {}
            }
            if !fields.insert(col.field.as_str()) {
                return Err(CoreError::Validation(format!(
                    "Duplicate field '{}' in schema config",
                    col.field
                )));
            }
            if !labels.insert(col.label.as_str()) {
                return Err(CoreError::Validation(format!(
                    "Duplicate label '{}' in schema config",
                    col.label
                )));
            }
        }
        for required in [FIELD_DATASET_ID, FIELD_DATA_NAME] {
            if !fields.contains(required) {
                return Err(CoreError::Validation(format!(
                    "Schema config must contain the '{required}' column"
                )));
            }
        }
        Ok(())
    }

    /// Look up a column by its internal field name.
    pub fn column(&self, field: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.field == field)
    }

    /// Columns that form the attribute snapshot (everything except the
    /// identifier, which pending changes carry separately).
    pub fn attribute_columns(&self) -> impl Iterator<Item = &ColumnSpec> {
        self.columns.iter().filter(|c| c.field != FIELD_DATASET_ID)
    }

    /// Display labels in configured order (the CSV header row).
    pub fn labels(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.label.as_str()).collect()
    }

    /// Resolve a cell for `col` from an uploaded row, accepting either the
    /// display label or the internal field name as the header.
    pub fn row_value<'a>(
        &self,
        row: &'a BTreeMap<String, String>,
        col: &ColumnSpec,
    ) -> Option<&'a str> {
        row.get(&col.label)
            .or_else(|| row.get(&col.field))
            .map(String::as_str)
    }

    /// Reject snapshot keys that are not attribute fields of this schema.
    ///
    /// Applied before any snapshot is merged into the registry, so a stale
    /// or hand-crafted change can never set a column the schema does not
    /// know about.
    pub fn check_known_fields(&self, snapshot: &FieldMap) -> Result<(), CoreError> {
        for key in snapshot.keys() {
            match self.column(key) {
                Some(col) if col.field != FIELD_DATASET_ID => {}
                _ => {
                    return Err(CoreError::Validation(format!(
                        "Unknown attribute field '{key}' in change snapshot"
                    )));
                }
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Value normalization
// ---------------------------------------------------------------------------

/// Normalize a raw cell to its canonical string form.
///
/// Text is trimmed. Numbers are parsed and re-rendered so `"5.0"` in a CSV
/// compares equal to a stored `5`; missing or unparseable values become the
/// empty string.
pub fn normalize_value(kind: FieldKind, raw: &str) -> String {
    match kind {
        FieldKind::Text => raw.trim().to_string(),
        FieldKind::Number => raw
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(render_number)
            .unwrap_or_default(),
    }
}

/// Canonical rendering of a numeric attribute (shortest round-trip form).
pub fn render_number(value: f64) -> String {
    format!("{value}")
}

/// Canonical rendering of an optional numeric attribute (None renders empty).
pub fn render_opt_number(value: Option<f64>) -> String {
    value.map(render_number).unwrap_or_default()
}

/// Parse a normalized numeric value back out of a snapshot.
///
/// The empty string means "no value" (stored as NULL); anything else must
/// parse as a finite float.
pub fn parse_opt_number(field: &str, raw: &str) -> Result<Option<f64>, CoreError> {
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .map(Some)
        .ok_or_else(|| {
            CoreError::Validation(format!("Field '{field}' holds non-numeric value '{raw}'"))
        })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
