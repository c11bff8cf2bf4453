use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::db;
use crate::dispatch::aggregate;
use crate::error::AppError;
use crate::models::field::check_definitions;
use crate::models::{Endpoint, FieldDefinition, Record, Table};
use crate::state::SharedState;

use super::double_option;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTable {
    pub id: Option<Uuid>,
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
    #[serde(default)]
    pub endpoint_ids: Vec<Uuid>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTable {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    pub fields: Option<Vec<FieldDefinition>>,
    /// Replaces the whole association set when present.
    pub endpoint_ids: Option<Vec<Uuid>>,
}

/// A table with its member endpoints and their unioned records.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableView {
    #[serde(flatten)]
    pub table: Table,
    pub endpoint_ids: Vec<Uuid>,
    pub endpoints: Vec<Endpoint>,
    /// Raw records of every member endpoint.
    pub data: Vec<Value>,
    /// `data` projected onto the table's own fields.
    pub rows: Vec<Map<String, Value>>,
}

pub async fn list(State(state): State<SharedState>) -> Result<Json<Vec<TableView>>, AppError> {
    let tables = db::tables::list_all(&state.pool).await?;

    let mut views = Vec::with_capacity(tables.len());
    for table in tables {
        views.push(view(&state, table).await?);
    }
    Ok(Json(views))
}

pub async fn get(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TableView>, AppError> {
    let table = db::tables::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Table not found".to_string()))?;
    Ok(Json(view(&state, table).await?))
}

pub async fn create(
    State(state): State<SharedState>,
    Json(req): Json<CreateTable>,
) -> Result<(StatusCode, Json<TableView>), AppError> {
    let name = req
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| AppError::BadRequest("Table name is required".to_string()))?;
    check_definitions(&req.fields).map_err(AppError::BadRequest)?;
    ensure_endpoints_exist(&state, &req.endpoint_ids).await?;

    let mut tx = state.pool.begin().await?;
    let table = db::tables::create(
        &mut tx,
        req.id.unwrap_or_else(Uuid::now_v7),
        name,
        req.description.as_deref(),
        &req.fields,
    )
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
            AppError::BadRequest("A table with this id already exists".to_string())
        }
        _ => AppError::Database(e),
    })?;
    db::tables::replace_endpoints(&mut tx, table.id, &req.endpoint_ids).await?;
    tx.commit().await?;

    tracing::info!(
        "Table created {} ({}) with {} endpoint(s)",
        table.name,
        table.id,
        req.endpoint_ids.len()
    );

    Ok((StatusCode::CREATED, Json(view(&state, table).await?)))
}

/// Fields, description and associations update independently; any subset may be sent.
pub async fn update(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateTable>,
) -> Result<Json<TableView>, AppError> {
    let name = match req.name.as_deref().map(str::trim) {
        Some("") => {
            return Err(AppError::BadRequest("Table name must not be empty".to_string()));
        }
        other => other,
    };
    if let Some(fields) = &req.fields {
        check_definitions(fields).map_err(AppError::BadRequest)?;
    }
    if db::tables::find_by_id(&state.pool, id).await?.is_none() {
        return Err(AppError::NotFound("Table not found".to_string()));
    }
    if let Some(endpoint_ids) = &req.endpoint_ids {
        ensure_endpoints_exist(&state, endpoint_ids).await?;
    }

    let mut tx = state.pool.begin().await?;
    let table = db::tables::update(
        &mut tx,
        id,
        name,
        req.description.as_ref().map(|d| d.as_deref()),
        req.fields.as_deref(),
    )
    .await?
    .ok_or_else(|| AppError::NotFound("Table not found".to_string()))?;

    if let Some(endpoint_ids) = &req.endpoint_ids {
        db::tables::replace_endpoints(&mut tx, table.id, endpoint_ids).await?;
    }
    tx.commit().await?;

    tracing::info!("Table updated {} ({})", table.name, table.id);

    Ok(Json(view(&state, table).await?))
}

/// Deleting a missing table is not an error.
pub async fn delete(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let deleted = db::tables::delete(&state.pool, id).await?;
    if deleted > 0 {
        tracing::info!("Table deleted ({id})");
    }
    Ok(Json(serde_json::json!({ "message": "Deleted" })))
}

async fn view(state: &SharedState, table: Table) -> Result<TableView, sqlx::Error> {
    let endpoint_ids = db::tables::endpoint_ids(&state.pool, table.id).await?;

    let registered = state.registry.snapshot().await;
    let endpoints = endpoint_ids
        .iter()
        .filter_map(|id| registered.iter().find(|e| e.id == *id).cloned())
        .collect();

    let records = aggregate::collect(&state.pool, &endpoint_ids).await?;
    let rows = records
        .iter()
        .map(|record| aggregate::project_row(record, &table.fields))
        .collect();
    let data = records.into_iter().map(Record::into_value).collect();

    Ok(TableView {
        table,
        endpoint_ids,
        endpoints,
        data,
        rows,
    })
}

async fn ensure_endpoints_exist(state: &SharedState, ids: &[Uuid]) -> Result<(), AppError> {
    let unknown = state.registry.unknown_ids(ids).await;
    if unknown.is_empty() {
        return Ok(());
    }
    let list: Vec<String> = unknown.iter().map(Uuid::to_string).collect();
    Err(AppError::BadRequest(format!(
        "Unknown endpoint ids: {}",
        list.join(", ")
    )))
}
