//! Chart asset metadata model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use dsreg_core::types::{DbId, Timestamp};

/// Metadata for one uploaded chart image. `filename` is the uniqueness
/// key: re-uploading the same filename overwrites this record.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Chart {
    pub id: DbId,
    pub name: String,
    pub category: Option<String>,
    pub group_label: Option<String>,
    pub filename: String,
    pub uploaded_by: String,
    pub uploaded_at: Timestamp,
}

/// DTO for creating or overwriting a chart record by filename.
#[derive(Debug, Clone, Deserialize)]
pub struct UpsertChart {
    pub name: String,
    pub category: Option<String>,
    pub group_label: Option<String>,
    pub filename: String,
    pub uploaded_by: String,
}
