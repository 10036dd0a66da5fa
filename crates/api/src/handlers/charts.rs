//! Handlers for chart asset management: straight CRUD over uploaded
//! images, no diffing or approval semantics.

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;

use dsreg_core::error::CoreError;
use dsreg_core::types::DbId;
use dsreg_db::models::chart::{Chart, UpsertChart};
use dsreg_db::repositories::ChartRepo;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /charts
///
/// All charts, newest first.
pub async fn list_charts(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<Chart>>>> {
    let charts = ChartRepo::list(&state.pool).await?;
    Ok(Json(DataResponse { data: charts }))
}

/// POST /charts
///
/// Multipart upload: an image file plus `name`, `category`, `group_label`,
/// and `uploaded_by` fields. The file is written to disk before the
/// metadata row is committed, so a failed write never leaves a record
/// pointing at a missing file. An existing filename is overwritten,
/// metadata and timestamp included.
pub async fn upload_chart(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<DataResponse<Chart>>)> {
    let mut file: Option<(String, Vec<u8>)> = None;
    let mut name = String::new();
    let mut category: Option<String> = None;
    let mut group_label: Option<String> = None;
    let mut uploaded_by = "Unknown".to_string();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let field_name = field.name().unwrap_or_default().to_string();
        match field_name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                file = Some((filename, data.to_vec()));
            }
            "name" => {
                name = text_field(field).await?;
            }
            "category" => {
                let value = text_field(field).await?;
                category = (!value.is_empty()).then_some(value);
            }
            "group_label" => {
                let value = text_field(field).await?;
                group_label = (!value.is_empty()).then_some(value);
            }
            "uploaded_by" => {
                let value = text_field(field).await?;
                if !value.is_empty() {
                    uploaded_by = value;
                }
            }
            _ => continue,
        }
    }

    let (filename, data) = file.ok_or_else(|| {
        AppError::Core(CoreError::Validation("No file provided".to_string()))
    })?;

    // Keep only the basename: uploads never choose their directory.
    let filename = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .to_string();
    if filename.is_empty() || filename == "." || filename == ".." {
        return Err(AppError::Core(CoreError::Validation(
            "No file selected".to_string(),
        )));
    }

    write_chart_file(&state.config.charts_dir, &filename, &data).await?;

    let chart = ChartRepo::upsert_by_filename(
        &state.pool,
        &UpsertChart {
            name,
            category,
            group_label,
            filename,
            uploaded_by,
        },
    )
    .await?;

    tracing::info!(filename = %chart.filename, uploaded_by = %chart.uploaded_by, "Chart uploaded");

    Ok((StatusCode::CREATED, Json(DataResponse { data: chart })))
}

/// DELETE /charts/{id}
///
/// Remove a chart's metadata row and its stored file. Unknown ids are
/// Not-Found. The row goes first: a failed unlink leaves an orphaned file
/// (logged, harmless), never a record pointing at a missing file.
pub async fn delete_chart(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Chart>>> {
    let chart = ChartRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Chart",
            id,
        }))?;

    ChartRepo::delete(&state.pool, id).await?;

    let path = std::path::Path::new(&state.config.charts_dir).join(&chart.filename);
    if let Err(e) = tokio::fs::remove_file(&path).await {
        tracing::warn!(path = %path.display(), error = %e, "Failed to remove chart file");
    }

    Ok(Json(DataResponse { data: chart }))
}

/// Read a multipart text field.
async fn text_field(field: axum::extract::multipart::Field<'_>) -> Result<String, AppError> {
    field
        .text()
        .await
        .map(|s| s.trim().to_string())
        .map_err(|e| AppError::BadRequest(e.to_string()))
}

/// Write the uploaded bytes under `charts_dir`, creating the directory on
/// first use. The write goes to a temporary sibling first and is renamed
/// into place, so a partial write never sits at the final path.
async fn write_chart_file(charts_dir: &str, filename: &str, data: &[u8]) -> Result<(), AppError> {
    let dir = std::path::Path::new(charts_dir);
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| AppError::InternalError(format!("Failed to create charts dir: {e}")))?;

    let tmp = dir.join(format!("{filename}.part"));
    let dest = dir.join(filename);

    tokio::fs::write(&tmp, data)
        .await
        .map_err(|e| AppError::InternalError(format!("Failed to write chart file: {e}")))?;
    tokio::fs::rename(&tmp, &dest)
        .await
        .map_err(|e| AppError::InternalError(format!("Failed to finalize chart file: {e}")))?;

    Ok(())
}
