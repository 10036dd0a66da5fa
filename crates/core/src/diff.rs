//! The import differ: classifies uploaded rows against the current
//! registry as added, modified, or deleted.
//!
//! This is a pure read-and-compare operation. It never mutates the
//! registry; persisting the result as pending changes is the caller's
//! concern.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::identifier;
use crate::schema::{self, FieldMap, SchemaConfig, FIELD_DATASET_ID, FIELD_DATA_NAME};

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// An uploaded row: CSV header to raw cell value.
pub type UploadRow = std::collections::BTreeMap<String, String>;

/// Current registry state as seen by the differ, keyed by dataset
/// identifier. `attributes` holds the normalized string form of every
/// attribute column (including the display name).
#[derive(Debug, Clone)]
pub struct RegistryRecord {
    pub data_name: String,
    pub attributes: FieldMap,
}

/// Snapshot of the whole registry, keyed by dataset identifier. BTreeMap
/// keeps deletion output deterministically ordered.
pub type RegistrySnapshot = std::collections::BTreeMap<String, RegistryRecord>;

/// Bulk upload mode: Add-only never produces deletions; Full-replace
/// classifies every registry identifier missing from the upload as deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UploadMode {
    #[serde(rename = "add")]
    AddOnly,
    #[serde(rename = "replace")]
    FullReplace,
}

impl UploadMode {
    /// String form used on the wire (`add` / `replace`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AddOnly => "add",
            Self::FullReplace => "replace",
        }
    }

    pub fn parse(value: &str) -> Result<Self, CoreError> {
        match value {
            "add" => Ok(Self::AddOnly),
            "replace" => Ok(Self::FullReplace),
            other => Err(CoreError::Validation(format!(
                "Invalid upload mode '{other}'. Must be one of: add, replace"
            ))),
        }
    }
}

impl std::fmt::Display for UploadMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// A row whose identifier is absent from the registry.
#[derive(Debug, Clone, Serialize)]
pub struct AddedEntry {
    pub dataset_id: String,
    pub data_name: String,
    pub data: FieldMap,
}

/// A row whose identifier exists but whose normalized attributes differ.
#[derive(Debug, Clone, Serialize)]
pub struct ModifiedEntry {
    pub dataset_id: String,
    pub data_name: String,
    pub old: FieldMap,
    pub new: FieldMap,
}

/// A registry record absent from a full-replace upload.
#[derive(Debug, Clone, Serialize)]
pub struct DeletedEntry {
    pub dataset_id: String,
    pub data_name: String,
    pub data: FieldMap,
}

/// The three disjoint classification lists.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RegistryDiff {
    pub added: Vec<AddedEntry>,
    pub modified: Vec<ModifiedEntry>,
    pub deleted: Vec<DeletedEntry>,
}

/// Per-category counts returned alongside the diff.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct DiffSummary {
    pub added: usize,
    pub modified: usize,
    pub deleted: usize,
}

impl RegistryDiff {
    pub fn summary(&self) -> DiffSummary {
        DiffSummary {
            added: self.added.len(),
            modified: self.modified.len(),
            deleted: self.deleted.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.modified.is_empty() && self.deleted.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Diff computation
// ---------------------------------------------------------------------------

/// Classify uploaded rows against the registry.
///
/// Per row: the identifier column wins when present and non-empty,
/// otherwise the next unused sequential identifier is synthesized (seeded
/// past every identifier in the registry *and* the upload, so generated
/// ids never collide with explicit ones later in the file). Rows without
/// a resolvable display name contribute nothing. Duplicate identifiers
/// within one upload are folded last-row-wins before classification, so
/// the final row in file order decides the outcome for that identifier.
pub fn compute_diff(
    schema: &SchemaConfig,
    registry: &RegistrySnapshot,
    rows: &[UploadRow],
    mode: UploadMode,
) -> RegistryDiff {
    let id_col = schema
        .column(FIELD_DATASET_ID)
        .expect("schema validated to contain the identifier column");
    let name_col = schema
        .column(FIELD_DATA_NAME)
        .expect("schema validated to contain the display name column");

    // Seed sequence allocation past everything already taken.
    let explicit_ids = rows
        .iter()
        .filter_map(|row| schema.row_value(row, id_col))
        .map(str::trim)
        .filter(|id| !id.is_empty());
    let mut next_sequence = identifier::max_sequence(
        registry.keys().map(String::as_str).chain(explicit_ids),
    ) + 1;

    // Fold rows into (id -> folded row), last row in file order winning,
    // while keeping first-seen positions stable for deterministic output.
    let mut folded: Vec<(String, String, FieldMap)> = Vec::new();
    let mut index_by_id: HashMap<String, usize> = HashMap::new();

    for row in rows {
        let dataset_id = match schema.row_value(row, id_col).map(str::trim) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => {
                let id = identifier::format_dataset_id(next_sequence);
                next_sequence += 1;
                id
            }
        };

        // A row that resolves no display name contributes nothing.
        let data_name = match schema.row_value(row, name_col).map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => continue,
        };

        let mut data = FieldMap::new();
        for col in schema.attribute_columns() {
            let raw = schema.row_value(row, col).unwrap_or("");
            data.insert(col.field.clone(), schema::normalize_value(col.kind, raw));
        }
        data.insert(FIELD_DATA_NAME.to_string(), data_name.clone());

        match index_by_id.get(&dataset_id) {
            Some(&idx) => folded[idx] = (dataset_id, data_name, data),
            None => {
                index_by_id.insert(dataset_id.clone(), folded.len());
                folded.push((dataset_id, data_name, data));
            }
        }
    }

    let mut diff = RegistryDiff::default();

    for (dataset_id, data_name, new) in folded {
        match registry.get(&dataset_id) {
            Some(current) => {
                // Unordered map comparison: any differing field counts.
                if current.attributes != new {
                    diff.modified.push(ModifiedEntry {
                        dataset_id,
                        data_name,
                        old: current.attributes.clone(),
                        new,
                    });
                }
            }
            None => diff.added.push(AddedEntry {
                dataset_id,
                data_name,
                data: new,
            }),
        }
    }

    if mode == UploadMode::FullReplace {
        for (dataset_id, record) in registry {
            if !index_by_id.contains_key(dataset_id) {
                diff.deleted.push(DeletedEntry {
                    dataset_id: dataset_id.clone(),
                    data_name: record.data_name.clone(),
                    data: record.attributes.clone(),
                });
            }
        }
    }

    diff
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
