//! Repository for the `charts` table.

use sqlx::PgPool;

use dsreg_core::types::DbId;

use crate::models::chart::{Chart, UpsertChart};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, name, category, group_label, filename, uploaded_by, uploaded_at";

/// Provides CRUD operations for chart metadata.
pub struct ChartRepo;

impl ChartRepo {
    /// List all charts, newest first.
    pub async fn list(pool: &PgPool) -> Result<Vec<Chart>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM charts ORDER BY uploaded_at DESC, id DESC");
        sqlx::query_as::<_, Chart>(&query).fetch_all(pool).await
    }

    /// Find a chart by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Chart>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM charts WHERE id = $1");
        sqlx::query_as::<_, Chart>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Insert a chart record, or overwrite the existing record carrying
    /// the same filename (metadata and timestamp both refresh).
    pub async fn upsert_by_filename(
        pool: &PgPool,
        input: &UpsertChart,
    ) -> Result<Chart, sqlx::Error> {
        let query = format!(
            "INSERT INTO charts (name, category, group_label, filename, uploaded_by)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (filename) DO UPDATE SET
                name = EXCLUDED.name,
                category = EXCLUDED.category,
                group_label = EXCLUDED.group_label,
                uploaded_by = EXCLUDED.uploaded_by,
                uploaded_at = NOW()
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Chart>(&query)
            .bind(&input.name)
            .bind(&input.category)
            .bind(&input.group_label)
            .bind(&input.filename)
            .bind(&input.uploaded_by)
            .fetch_one(pool)
            .await
    }

    /// Delete a chart record by ID. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM charts WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
