//! Handler for the bulk CSV upload endpoint: parse, diff against the
//! registry, enqueue the result as pending changes.

use axum::extract::{Multipart, State};
use axum::Json;
use serde::Serialize;

use dsreg_core::change::ChangeKind;
use dsreg_core::diff::{
    self, DiffSummary, RegistryDiff, RegistrySnapshot, UploadMode, UploadRow,
};
use dsreg_core::error::CoreError;
use dsreg_db::models::change::{field_map_json, CreatePendingChange};
use dsreg_db::repositories::{ChangeRepo, DatasetRepo};

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Typed response for the upload endpoint.
#[derive(Debug, Serialize)]
pub struct UploadOutcome {
    pub diff: RegistryDiff,
    pub upload_mode: UploadMode,
    pub summary: DiffSummary,
}

/// POST /uploads
///
/// Accept a multipart CSV (`file`) plus `submitted_by` and `upload_mode`
/// fields, compute the diff against the current registry, and persist
/// each diff entry as a pending change. The registry itself is never
/// mutated here.
pub async fn upload_datasets(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Json<DataResponse<UploadOutcome>>> {
    let mut file: Option<Vec<u8>> = None;
    let mut submitted_by = "Unknown".to_string();
    let mut upload_mode = UploadMode::AddOnly;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                file = Some(data.to_vec());
            }
            "submitted_by" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                if !value.trim().is_empty() {
                    submitted_by = value.trim().to_string();
                }
            }
            "upload_mode" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                upload_mode = UploadMode::parse(value.trim())?;
            }
            _ => continue,
        }
    }

    let file = file.ok_or_else(|| {
        AppError::Core(CoreError::Validation("No file provided".to_string()))
    })?;

    let rows = parse_csv_rows(&file)?;

    // Read-and-compare only: the snapshot is taken once, and the diff
    // never writes to the registry.
    let datasets = DatasetRepo::list_all(&state.pool).await?;
    let registry: RegistrySnapshot = datasets
        .iter()
        .map(|d| {
            (
                d.dataset_id.clone(),
                diff::RegistryRecord {
                    data_name: d.data_name.clone(),
                    attributes: d.field_map(&state.schema),
                },
            )
        })
        .collect();

    let diff = diff::compute_diff(&state.schema, &registry, &rows, upload_mode);

    let mut entries: Vec<CreatePendingChange> = Vec::new();
    for item in &diff.added {
        entries.push(CreatePendingChange {
            change_kind: ChangeKind::Add.as_str().to_string(),
            dataset_id: item.dataset_id.clone(),
            old_data: None,
            new_data: Some(field_map_json(&item.data)),
            submitted_by: submitted_by.clone(),
        });
    }
    for item in &diff.modified {
        entries.push(CreatePendingChange {
            change_kind: ChangeKind::Modify.as_str().to_string(),
            dataset_id: item.dataset_id.clone(),
            old_data: Some(field_map_json(&item.old)),
            new_data: Some(field_map_json(&item.new)),
            submitted_by: submitted_by.clone(),
        });
    }
    for item in &diff.deleted {
        entries.push(CreatePendingChange {
            change_kind: ChangeKind::Delete.as_str().to_string(),
            dataset_id: item.dataset_id.clone(),
            old_data: Some(field_map_json(&item.data)),
            new_data: None,
            submitted_by: submitted_by.clone(),
        });
    }

    let mut tx = state.pool.begin().await.map_err(AppError::Database)?;
    ChangeRepo::batch_insert(&mut tx, &entries)
        .await
        .map_err(AppError::Database)?;
    tx.commit().await.map_err(AppError::Database)?;

    let summary = diff.summary();
    tracing::info!(
        submitted_by = %submitted_by,
        mode = %upload_mode,
        added = summary.added,
        modified = summary.modified,
        deleted = summary.deleted,
        "Upload diff enqueued"
    );

    Ok(Json(DataResponse {
        data: UploadOutcome {
            diff,
            upload_mode,
            summary,
        },
    }))
}

/// Parse CSV bytes into header-keyed rows.
fn parse_csv_rows(data: &[u8]) -> Result<Vec<UploadRow>, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(data);

    let headers = reader
        .headers()
        .map_err(|e| AppError::Core(CoreError::Validation(format!("Malformed CSV: {e}"))))?
        .clone();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record
            .map_err(|e| AppError::Core(CoreError::Validation(format!("Malformed CSV: {e}"))))?;
        let mut row = UploadRow::new();
        for (header, value) in headers.iter().zip(record.iter()) {
            row.insert(header.to_string(), value.to_string());
        }
        rows.push(row);
    }
    Ok(rows)
}
