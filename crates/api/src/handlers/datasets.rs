//! Handlers for the registry itself: listing and tabular export.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

use dsreg_db::repositories::DatasetRepo;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /datasets
///
/// List the current registry records.
pub async fn list_datasets(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let datasets = DatasetRepo::list_all(&state.pool).await?;
    Ok(Json(DataResponse { data: datasets }))
}

/// GET /datasets/export
///
/// The full registry as a CSV file, using the same column mapping as
/// import: headers are the configured display labels, in configured order.
pub async fn export_datasets(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let datasets = DatasetRepo::list_all(&state.pool).await?;

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(state.schema.labels())
        .map_err(|e| AppError::InternalError(format!("CSV write failed: {e}")))?;
    for dataset in &datasets {
        let row: Vec<String> = state
            .schema
            .columns
            .iter()
            .map(|col| dataset.field_value(&col.field).unwrap_or_default())
            .collect();
        writer
            .write_record(&row)
            .map_err(|e| AppError::InternalError(format!("CSV write failed: {e}")))?;
    }
    let csv_output = writer
        .into_inner()
        .map_err(|e| AppError::InternalError(format!("CSV write failed: {e}")))?;

    let filename = format!(
        "datasets_{}.csv",
        chrono::Utc::now().format("%Y%m%d_%H%M%S")
    );

    Ok(axum::response::Response::builder()
        .status(200)
        .header("Content-Type", "text/csv")
        .header(
            "Content-Disposition",
            format!("attachment; filename=\"{filename}\""),
        )
        .body(axum::body::Body::from(csv_output))
        .map_err(|e| AppError::InternalError(e.to_string()))?
        .into_response())
}
