use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Record, RecordRow};

pub async fn create(pool: &PgPool, record: &Record) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO records (id, endpoint_id, payload, created_at)
         VALUES ($1, $2, $3, $4)",
    )
    .bind(record.id)
    .bind(record.endpoint_id)
    .bind(sqlx::types::Json(&record.payload))
    .bind(record.created_at)
    .execute(pool)
    .await?;
    Ok(())
}

/// Non-empty records of the given endpoints, newest first.
///
/// A row whose payload is not a JSON object is skipped with a warning so one
/// bad record never hides its siblings.
pub async fn list(pool: &PgPool, endpoint_ids: &[Uuid]) -> Result<Vec<Record>, sqlx::Error> {
    if endpoint_ids.is_empty() {
        return Ok(Vec::new());
    }

    let rows = sqlx::query_as::<_, RecordRow>(
        "SELECT * FROM records WHERE endpoint_id = ANY($1)
         ORDER BY created_at DESC, id DESC",
    )
    .bind(endpoint_ids)
    .fetch_all(pool)
    .await?;

    let records = rows
        .into_iter()
        .filter_map(|row| match Record::try_from(row) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!("Skipping malformed record: {e}");
                None
            }
        })
        .filter(|record| !record.is_empty())
        .collect();

    Ok(records)
}

/// Removes one record by id, whichever endpoint owns it.
pub async fn delete(pool: &PgPool, id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM records WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

pub async fn delete_all(pool: &PgPool, endpoint_id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM records WHERE endpoint_id = $1")
        .bind(endpoint_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
