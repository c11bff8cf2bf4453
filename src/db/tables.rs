use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::models::{FieldDefinition, Table, TableEndpoint};

pub async fn list_all(pool: &PgPool) -> Result<Vec<Table>, sqlx::Error> {
    sqlx::query_as::<_, Table>("SELECT * FROM tables ORDER BY created_at ASC, id ASC")
        .fetch_all(pool)
        .await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Table>, sqlx::Error> {
    sqlx::query_as::<_, Table>("SELECT * FROM tables WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn create(
    conn: &mut PgConnection,
    id: Uuid,
    name: &str,
    description: Option<&str>,
    fields: &[FieldDefinition],
) -> Result<Table, sqlx::Error> {
    sqlx::query_as::<_, Table>(
        "INSERT INTO tables (id, name, description, fields)
         VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(id)
    .bind(name)
    .bind(description)
    .bind(Json(fields))
    .fetch_one(&mut *conn)
    .await
}

/// `description` is tri-state: `None` keeps it, `Some(None)` clears it.
pub async fn update(
    conn: &mut PgConnection,
    id: Uuid,
    name: Option<&str>,
    description: Option<Option<&str>>,
    fields: Option<&[FieldDefinition]>,
) -> Result<Option<Table>, sqlx::Error> {
    sqlx::query_as::<_, Table>(
        "UPDATE tables
         SET name = COALESCE($2, name),
             description = CASE WHEN $3 THEN $4 ELSE description END,
             fields = COALESCE($5, fields),
             updated_at = now()
         WHERE id = $1
         RETURNING *",
    )
    .bind(id)
    .bind(name)
    .bind(description.is_some())
    .bind(description.flatten())
    .bind(fields.map(Json))
    .fetch_optional(&mut *conn)
    .await
}

pub async fn delete(pool: &PgPool, id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM tables WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

/// Associations of one table in association order.
pub async fn associations(
    pool: &PgPool,
    table_id: Uuid,
) -> Result<Vec<TableEndpoint>, sqlx::Error> {
    sqlx::query_as::<_, TableEndpoint>(
        "SELECT * FROM table_endpoints WHERE table_id = $1 ORDER BY position ASC, endpoint_id ASC",
    )
    .bind(table_id)
    .fetch_all(pool)
    .await
}

pub async fn endpoint_ids(pool: &PgPool, table_id: Uuid) -> Result<Vec<Uuid>, sqlx::Error> {
    Ok(associations(pool, table_id)
        .await?
        .into_iter()
        .map(|a| a.endpoint_id)
        .collect())
}

/// Replace a table's association set. Run inside a transaction so readers
/// never see the table with its old links removed and the new ones missing.
pub async fn replace_endpoints(
    conn: &mut PgConnection,
    table_id: Uuid,
    endpoint_ids: &[Uuid],
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM table_endpoints WHERE table_id = $1")
        .bind(table_id)
        .execute(&mut *conn)
        .await?;

    for (position, endpoint_id) in endpoint_ids.iter().enumerate() {
        sqlx::query(
            "INSERT INTO table_endpoints (table_id, endpoint_id, position)
             VALUES ($1, $2, $3)
             ON CONFLICT (table_id, endpoint_id) DO NOTHING",
        )
        .bind(table_id)
        .bind(endpoint_id)
        .bind(position as i32)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

/// Append one endpoint to the end of a table's association order.
pub async fn attach_endpoint(
    conn: &mut PgConnection,
    table_id: Uuid,
    endpoint_id: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO table_endpoints (table_id, endpoint_id, position)
         SELECT $1, $2, COALESCE(MAX(position) + 1, 0) FROM table_endpoints WHERE table_id = $1
         ON CONFLICT (table_id, endpoint_id) DO NOTHING",
    )
    .bind(table_id)
    .bind(endpoint_id)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub async fn detach_endpoint(conn: &mut PgConnection, endpoint_id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM table_endpoints WHERE endpoint_id = $1")
        .bind(endpoint_id)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected())
}

/// The oldest table containing the endpoint; its membership drives GET expansion.
pub async fn first_table_for_endpoint(
    pool: &PgPool,
    endpoint_id: Uuid,
) -> Result<Option<Uuid>, sqlx::Error> {
    sqlx::query_scalar::<_, Uuid>(
        "SELECT t.id FROM tables t
         JOIN table_endpoints te ON te.table_id = t.id
         WHERE te.endpoint_id = $1
         ORDER BY t.created_at ASC, t.id ASC
         LIMIT 1",
    )
    .bind(endpoint_id)
    .fetch_optional(pool)
    .await
}

pub async fn table_ids_for_endpoint(
    pool: &PgPool,
    endpoint_id: Uuid,
) -> Result<Vec<Uuid>, sqlx::Error> {
    sqlx::query_scalar::<_, Uuid>(
        "SELECT t.id FROM tables t
         JOIN table_endpoints te ON te.table_id = t.id
         WHERE te.endpoint_id = $1
         ORDER BY t.created_at ASC, t.id ASC",
    )
    .bind(endpoint_id)
    .fetch_all(pool)
    .await
}
