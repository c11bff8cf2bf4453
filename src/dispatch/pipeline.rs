use axum::http::{HeaderMap, Method, StatusCode};
use bytes::Bytes;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::db;
use crate::error::AppError;
use crate::models::{Endpoint, HttpMethod, NewRequestLog, Record};
use crate::state::SharedState;

use super::aggregate;
use super::fields;
use super::filter;
use super::journal;
use super::parser;
use super::resolve::Resolution;

/// A request addressed to a declared endpoint, prefix already stripped.
pub struct Inbound {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

pub struct Outcome {
    pub status: StatusCode,
    pub body: Value,
}

pub async fn run(state: &SharedState, inbound: Inbound) -> Result<Outcome, AppError> {
    let endpoint = match state.registry.resolve(&inbound.method, &inbound.path).await {
        Resolution::Found(endpoint) => endpoint,
        Resolution::MethodNotAllowed(endpoint) => {
            return Err(AppError::MethodNotAllowed(format!(
                "Method {} is not supported on {}",
                inbound.method, endpoint.path
            )));
        }
        Resolution::NotFound => {
            return Err(AppError::NotFound(format!(
                "No endpoint matches {} {}",
                inbound.method, inbound.path
            )));
        }
    };

    match HttpMethod::from_http(&inbound.method) {
        Some(HttpMethod::Get) => read(state, &endpoint, &inbound).await,
        Some(method @ (HttpMethod::Post | HttpMethod::Put)) => {
            write(state, &endpoint, method, inbound).await
        }
        Some(HttpMethod::Delete) => remove(state, &endpoint, &inbound).await,
        None => Err(AppError::MethodNotAllowed(format!(
            "Method {} is not supported on {}",
            inbound.method, endpoint.path
        ))),
    }
}

async fn read(state: &SharedState, endpoint: &Endpoint, inbound: &Inbound) -> Result<Outcome, AppError> {
    let read_set = aggregate::read_set(&state.pool, endpoint.id).await?;
    let records = aggregate::collect(&state.pool, &read_set).await?;
    let records = filter::apply(records, &endpoint.fields, &inbound.query);

    tracing::debug!(
        "GET {} returned {} records from {} endpoint(s)",
        inbound.path,
        records.len(),
        read_set.len()
    );

    let body = Value::Array(records.into_iter().map(Record::into_value).collect());

    journal::record(
        &state.pool,
        NewRequestLog {
            endpoint_id: endpoint.id,
            path: inbound.path.clone(),
            method: HttpMethod::Get.to_string(),
            request: parser::query_object(&inbound.query),
            status: StatusCode::OK.as_u16(),
            response: body.clone(),
        },
    )
    .await;

    Ok(Outcome {
        status: StatusCode::OK,
        body,
    })
}

async fn write(
    state: &SharedState,
    endpoint: &Endpoint,
    method: HttpMethod,
    inbound: Inbound,
) -> Result<Outcome, AppError> {
    let payload = match parser::parse_body(&inbound.headers, inbound.body).await {
        Ok(payload) => payload,
        Err(e) => {
            return Err(reject(state, endpoint, &inbound.path, method, None, AppError::BadRequest(e)).await);
        }
    };
    let request = Value::Object(payload.clone());

    let missing = fields::missing_required(&endpoint.fields, &payload);
    if !missing.is_empty() {
        return Err(reject(
            state,
            endpoint,
            &inbound.path,
            method,
            Some(request),
            AppError::Validation(missing),
        )
        .await);
    }

    let warnings = fields::type_warnings(&endpoint.fields, &payload);
    if !warnings.is_empty() {
        tracing::debug!("Validation warnings for endpoint {}: {:?}", endpoint.id, warnings);
    }

    let record = Record::new(endpoint.id, payload);
    db::records::create(&state.pool, &record).await?;
    tracing::debug!("Stored record {} on {} {}", record.id, method, inbound.path);

    let body = record.into_value();

    journal::record(
        &state.pool,
        NewRequestLog {
            endpoint_id: endpoint.id,
            path: inbound.path,
            method: method.to_string(),
            request: Some(request),
            status: StatusCode::CREATED.as_u16(),
            response: body.clone(),
        },
    )
    .await;

    Ok(Outcome {
        status: StatusCode::CREATED,
        body,
    })
}

async fn remove(state: &SharedState, endpoint: &Endpoint, inbound: &Inbound) -> Result<Outcome, AppError> {
    let target = inbound
        .query
        .iter()
        .find(|(name, _)| name == "id")
        .map(|(_, value)| value.as_str());

    let (deleted, message) = match target {
        Some(raw) => {
            let deleted = match Uuid::parse_str(raw) {
                Ok(id) => db::records::delete(&state.pool, id).await?,
                Err(_) => 0,
            };
            let message = if deleted > 0 {
                format!("Record {raw} deleted")
            } else {
                format!("No record {raw}")
            };
            (deleted, message)
        }
        None => {
            let deleted = db::records::delete_all(&state.pool, endpoint.id).await?;
            (deleted, format!("All records deleted from {}", endpoint.path))
        }
    };

    let body = json!({ "message": message, "deleted": deleted });

    journal::record(
        &state.pool,
        NewRequestLog {
            endpoint_id: endpoint.id,
            path: inbound.path.clone(),
            method: HttpMethod::Delete.to_string(),
            request: parser::query_object(&inbound.query),
            status: StatusCode::OK.as_u16(),
            response: body.clone(),
        },
    )
    .await;

    Ok(Outcome {
        status: StatusCode::OK,
        body,
    })
}

/// Log a refused write and hand the error back for the response.
async fn reject(
    state: &SharedState,
    endpoint: &Endpoint,
    path: &str,
    method: HttpMethod,
    request: Option<Value>,
    err: AppError,
) -> AppError {
    journal::record(
        &state.pool,
        NewRequestLog {
            endpoint_id: endpoint.id,
            path: path.to_string(),
            method: method.to_string(),
            request,
            status: err.status().as_u16(),
            response: err.body(),
        },
    )
    .await;
    err
}
