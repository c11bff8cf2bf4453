use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{NewRequestLog, RequestLogEntry};

pub async fn create(pool: &PgPool, entry: &NewRequestLog) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO request_logs (id, endpoint_id, path, method, request, status, response)
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(Uuid::now_v7())
    .bind(entry.endpoint_id)
    .bind(&entry.path)
    .bind(&entry.method)
    .bind(entry.request.as_ref())
    .bind(i32::from(entry.status))
    .bind(&entry.response)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn list_recent(
    pool: &PgPool,
    endpoint_id: Uuid,
    limit: i64,
) -> Result<Vec<RequestLogEntry>, sqlx::Error> {
    sqlx::query_as::<_, RequestLogEntry>(
        "SELECT * FROM request_logs WHERE endpoint_id = $1
         ORDER BY created_at DESC, id DESC LIMIT $2",
    )
    .bind(endpoint_id)
    .bind(limit)
    .fetch_all(pool)
    .await
}
