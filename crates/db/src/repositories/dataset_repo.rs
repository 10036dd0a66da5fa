//! Repository for the `datasets` table (the registry).

use sqlx::{PgConnection, PgPool};

use crate::models::dataset::{Dataset, DatasetPatch, PatchValue};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, dataset_id, data_name, domain, token_count, epochs, \
    desired_token_count, training_stage, source_link, storage_path, created_at, updated_at";

/// Provides read and mutation operations for registry records. Mutations
/// take an open connection because they only ever run inside the decision
/// transaction.
pub struct DatasetRepo;

impl DatasetRepo {
    /// List the full registry ordered by external identifier.
    pub async fn list_all(pool: &PgPool) -> Result<Vec<Dataset>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM datasets ORDER BY dataset_id");
        sqlx::query_as::<_, Dataset>(&query).fetch_all(pool).await
    }

    /// Find a registry record by its external identifier.
    pub async fn find_by_dataset_id(
        conn: &mut PgConnection,
        dataset_id: &str,
    ) -> Result<Option<Dataset>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM datasets WHERE dataset_id = $1");
        sqlx::query_as::<_, Dataset>(&query)
            .bind(dataset_id)
            .fetch_optional(&mut *conn)
            .await
    }

    /// Insert a record from an approved Add snapshot.
    ///
    /// An existing identifier is overwritten rather than failed: the diff
    /// that produced the change was computed against a possibly-stale
    /// snapshot, so last approval wins and the registry stays consistent.
    pub async fn upsert_from_patch(
        conn: &mut PgConnection,
        dataset_id: &str,
        patch: &DatasetPatch,
    ) -> Result<Dataset, sqlx::Error> {
        let mut columns = vec!["dataset_id".to_string()];
        let mut placeholders = vec!["$1".to_string()];
        let mut updates = Vec::new();
        for (idx, (field, _)) in patch.entries().iter().enumerate() {
            columns.push(field.clone());
            placeholders.push(format!("${}", idx + 2));
            updates.push(format!("{field} = EXCLUDED.{field}"));
        }
        updates.push("updated_at = NOW()".to_string());

        let query = format!(
            "INSERT INTO datasets ({}) VALUES ({})
             ON CONFLICT (dataset_id) DO UPDATE SET {}
             RETURNING {COLUMNS}",
            columns.join(", "),
            placeholders.join(", "),
            updates.join(", "),
        );

        bind_patch(sqlx::query_as::<_, Dataset>(&query).bind(dataset_id), patch)
            .fetch_one(&mut *conn)
            .await
    }

    /// Overwrite only the fields present in an approved Modify snapshot.
    ///
    /// Returns `None` when the record no longer exists (the change is a
    /// ghost and the merge is a no-op).
    pub async fn merge_from_patch(
        conn: &mut PgConnection,
        dataset_id: &str,
        patch: &DatasetPatch,
    ) -> Result<Option<Dataset>, sqlx::Error> {
        if patch.is_empty() {
            return Self::find_by_dataset_id(conn, dataset_id).await;
        }

        let mut sets: Vec<String> = patch
            .entries()
            .iter()
            .enumerate()
            .map(|(idx, (field, _))| format!("{field} = ${}", idx + 2))
            .collect();
        sets.push("updated_at = NOW()".to_string());

        let query = format!(
            "UPDATE datasets SET {} WHERE dataset_id = $1 RETURNING {COLUMNS}",
            sets.join(", "),
        );

        bind_patch(sqlx::query_as::<_, Dataset>(&query).bind(dataset_id), patch)
            .fetch_optional(&mut *conn)
            .await
    }

    /// Remove a record by external identifier. Returns `true` if a row
    /// was deleted.
    pub async fn delete_by_dataset_id(
        conn: &mut PgConnection,
        dataset_id: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM datasets WHERE dataset_id = $1")
            .bind(dataset_id)
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// Bind a patch's typed values in entry order, after the `$1` identifier.
fn bind_patch<'q>(
    mut q: sqlx::query::QueryAs<'q, sqlx::Postgres, Dataset, sqlx::postgres::PgArguments>,
    patch: &'q DatasetPatch,
) -> sqlx::query::QueryAs<'q, sqlx::Postgres, Dataset, sqlx::postgres::PgArguments> {
    for (_, value) in patch.entries() {
        match value {
            PatchValue::Text(v) => q = q.bind(v.as_deref()),
            PatchValue::Number(v) => q = q.bind(*v),
        }
    }
    q
}
