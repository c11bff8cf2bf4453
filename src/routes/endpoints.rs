use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db;
use crate::error::AppError;
use crate::models::field::check_definitions;
use crate::models::{Endpoint, FieldDefinition, HttpMethod, Record, RequestLogEntry};
use crate::state::SharedState;

use super::double_option;

/// Paths served by the management API; a declared endpoint on one of these is unreachable.
const RESERVED_PATHS: [&str; 2] = ["/endpoints", "/tables"];

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEndpoint {
    pub id: Option<Uuid>,
    pub name: String,
    pub path: String,
    pub method: HttpMethod,
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
    pub table_id: Option<Uuid>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEndpoint {
    pub name: Option<String>,
    pub path: Option<String>,
    pub method: Option<HttpMethod>,
    pub fields: Option<Vec<FieldDefinition>>,
    /// `null` removes the endpoint from every table.
    #[serde(default, deserialize_with = "double_option")]
    pub table_id: Option<Option<Uuid>>,
}

/// An endpoint with its stored records and recent request log.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointView {
    #[serde(flatten)]
    pub endpoint: Endpoint,
    pub table_ids: Vec<Uuid>,
    pub records: Vec<Value>,
    pub logs: Vec<RequestLogEntry>,
    /// Set when the endpoint was saved but linking it to a table failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

pub async fn list(State(state): State<SharedState>) -> Result<Json<Vec<EndpointView>>, AppError> {
    let endpoints = state.registry.snapshot().await;

    let mut views = Vec::with_capacity(endpoints.len());
    for endpoint in endpoints {
        views.push(view(&state, endpoint).await?);
    }
    Ok(Json(views))
}

pub async fn get(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<EndpointView>, AppError> {
    let endpoint = state
        .registry
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound("Endpoint not found".to_string()))?;
    Ok(Json(view(&state, endpoint).await?))
}

/// Creates the endpoint, or replaces the one already stored under `id`.
pub async fn create(
    State(state): State<SharedState>,
    Json(req): Json<CreateEndpoint>,
) -> Result<(StatusCode, Json<EndpointView>), AppError> {
    let name = validate_name(&req.name)?;
    let path = validate_path(&req.path)?;
    check_definitions(&req.fields).map_err(AppError::BadRequest)?;

    let id = req.id.unwrap_or_else(Uuid::now_v7);

    let (existed, endpoint) = {
        let _writes = state.registry.lock_writes().await;
        let existed = db::endpoints::find_by_id(&state.pool, id).await?.is_some();
        let endpoint =
            db::endpoints::upsert(&state.pool, id, name, &path, req.method, &req.fields).await?;
        state.registry.upsert(endpoint.clone()).await;
        (existed, endpoint)
    };

    tracing::info!(
        "Endpoint {} {} {} ({})",
        if existed { "replaced" } else { "created" },
        endpoint.method,
        endpoint.path,
        endpoint.id
    );

    let warning = match req.table_id {
        Some(table_id) => link_table(&state.pool, endpoint.id, Some(table_id), false).await,
        None => None,
    };

    let mut view = view(&state, endpoint).await?;
    view.warning = warning;

    let status = if existed {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    Ok((status, Json(view)))
}

pub async fn update(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateEndpoint>,
) -> Result<Json<EndpointView>, AppError> {
    let name = req.name.as_deref().map(validate_name).transpose()?;
    let path = req.path.as_deref().map(validate_path).transpose()?;
    if let Some(fields) = &req.fields {
        check_definitions(fields).map_err(AppError::BadRequest)?;
    }

    let endpoint = {
        let _writes = state.registry.lock_writes().await;
        let endpoint = db::endpoints::update(
            &state.pool,
            id,
            name,
            path.as_deref(),
            req.method,
            req.fields.as_deref(),
        )
        .await?
        .ok_or_else(|| AppError::NotFound("Endpoint not found".to_string()))?;
        state.registry.upsert(endpoint.clone()).await;
        endpoint
    };

    tracing::info!("Endpoint updated {} {} ({})", endpoint.method, endpoint.path, endpoint.id);

    let warning = match req.table_id {
        Some(table_id) => link_table(&state.pool, endpoint.id, table_id, true).await,
        None => None,
    };

    let mut view = view(&state, endpoint).await?;
    view.warning = warning;
    Ok(Json(view))
}

pub async fn delete(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    {
        let _writes = state.registry.lock_writes().await;
        let deleted = db::endpoints::delete(&state.pool, id).await?;
        if deleted == 0 {
            return Err(AppError::NotFound("Endpoint not found".to_string()));
        }
        state.registry.remove(id).await;
    }

    tracing::info!("Endpoint deleted ({id})");

    Ok(Json(serde_json::json!({ "message": "Deleted" })))
}

async fn view(state: &SharedState, endpoint: Endpoint) -> Result<EndpointView, sqlx::Error> {
    let table_ids = db::tables::table_ids_for_endpoint(&state.pool, endpoint.id).await?;
    let records = db::records::list(&state.pool, &[endpoint.id]).await?;
    let logs =
        db::request_logs::list_recent(&state.pool, endpoint.id, state.config.request_log_limit)
            .await?;

    Ok(EndpointView {
        endpoint,
        table_ids,
        records: records.into_iter().map(Record::into_value).collect(),
        logs,
        warning: None,
    })
}

/// Link the endpoint to `table_id`; with `exclusive` its other table links
/// are dropped first. The endpoint itself is already saved, so a failure is
/// reported back as a warning instead of failing the request.
async fn link_table(
    pool: &PgPool,
    endpoint_id: Uuid,
    table_id: Option<Uuid>,
    exclusive: bool,
) -> Option<String> {
    let result = async {
        let mut tx = pool.begin().await?;
        if exclusive {
            db::tables::detach_endpoint(&mut tx, endpoint_id).await?;
        }
        if let Some(table_id) = table_id {
            db::tables::attach_endpoint(&mut tx, table_id, endpoint_id).await?;
        }
        tx.commit().await
    }
    .await;

    match result {
        Ok(()) => None,
        Err(sqlx::Error::Database(ref db_err)) if db_err.is_foreign_key_violation() => {
            let table = table_id.map(|t| t.to_string()).unwrap_or_default();
            tracing::warn!("Endpoint {endpoint_id} saved but table {table} does not exist");
            Some(format!("Endpoint saved but table {table} was not found"))
        }
        Err(e) => {
            tracing::warn!("Endpoint {endpoint_id} saved but table link failed: {e}");
            Some(format!("Endpoint saved but table link failed: {e}"))
        }
    }
}

fn validate_name(name: &str) -> Result<&str, AppError> {
    let name = name.trim();
    if name.is_empty() || name.len() > 200 {
        return Err(AppError::BadRequest(
            "Name must be between 1 and 200 characters".to_string(),
        ));
    }
    Ok(name)
}

/// Returns the path in stored form, without a trailing `/`.
fn validate_path(path: &str) -> Result<String, AppError> {
    let path = path.trim();
    if !path.starts_with('/') {
        return Err(AppError::BadRequest("Path must start with '/'".to_string()));
    }
    if path.len() > 200 {
        return Err(AppError::BadRequest(
            "Path must be at most 200 characters".to_string(),
        ));
    }
    if !path
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | '-' | '_' | '.'))
    {
        return Err(AppError::BadRequest(
            "Path must contain only letters, numbers, '/', '-', '_' and '.'".to_string(),
        ));
    }
    if path.contains("//") {
        return Err(AppError::BadRequest(
            "Path must not contain empty segments".to_string(),
        ));
    }

    let path = match path.trim_end_matches('/') {
        "" => "/".to_string(),
        trimmed => trimmed.to_string(),
    };
    if RESERVED_PATHS.iter().any(|r| path == *r || path.starts_with(&format!("{r}/"))) {
        tracing::warn!("Declared path {path} is shadowed by the management API");
    }
    Ok(path)
}
