use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Endpoint, FieldDefinition, HttpMethod};

/// Every endpoint in declaration order; the first match wins during routing.
pub async fn list_all(pool: &PgPool) -> Result<Vec<Endpoint>, sqlx::Error> {
    sqlx::query_as::<_, Endpoint>("SELECT * FROM endpoints ORDER BY created_at ASC, id ASC")
        .fetch_all(pool)
        .await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Endpoint>, sqlx::Error> {
    sqlx::query_as::<_, Endpoint>("SELECT * FROM endpoints WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Insert, or replace the definition stored under `id`. `created_at` survives a replace.
pub async fn upsert(
    pool: &PgPool,
    id: Uuid,
    name: &str,
    path: &str,
    method: HttpMethod,
    fields: &[FieldDefinition],
) -> Result<Endpoint, sqlx::Error> {
    sqlx::query_as::<_, Endpoint>(
        "INSERT INTO endpoints (id, name, path, method, fields)
         VALUES ($1, $2, $3, $4, $5)
         ON CONFLICT (id) DO UPDATE
         SET name = EXCLUDED.name, path = EXCLUDED.path, method = EXCLUDED.method,
             fields = EXCLUDED.fields, updated_at = now()
         RETURNING *",
    )
    .bind(id)
    .bind(name)
    .bind(path)
    .bind(method.as_str())
    .bind(Json(fields))
    .fetch_one(pool)
    .await
}

/// Partial update in a single statement; `None` keeps the stored column.
pub async fn update(
    pool: &PgPool,
    id: Uuid,
    name: Option<&str>,
    path: Option<&str>,
    method: Option<HttpMethod>,
    fields: Option<&[FieldDefinition]>,
) -> Result<Option<Endpoint>, sqlx::Error> {
    sqlx::query_as::<_, Endpoint>(
        "UPDATE endpoints
         SET name = COALESCE($2, name),
             path = COALESCE($3, path),
             method = COALESCE($4, method),
             fields = COALESCE($5, fields),
             updated_at = now()
         WHERE id = $1
         RETURNING *",
    )
    .bind(id)
    .bind(name)
    .bind(path)
    .bind(method.map(|m| m.as_str()))
    .bind(fields.map(Json))
    .fetch_optional(pool)
    .await
}

/// Records, request logs and table links go with it via `ON DELETE CASCADE`.
pub async fn delete(pool: &PgPool, id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM endpoints WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
