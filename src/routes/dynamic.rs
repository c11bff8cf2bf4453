use axum::body::Bytes;
use axum::extract::{OriginalUri, State};
use axum::http::{HeaderMap, Method};
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::dispatch::pipeline::{self, Inbound};
use crate::dispatch::{parser, resolve};
use crate::error::AppError;
use crate::state::SharedState;

/// Catch-all handler serving every declared endpoint.
pub async fn dispatch(
    State(state): State<SharedState>,
    method: Method,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    let path = resolve::normalize_path(&state.config.api_prefix, uri.path())
        .ok_or_else(|| AppError::NotFound(format!("No route for {}", uri.path())))?;

    let inbound = Inbound {
        method,
        path,
        query: parser::parse_query(uri.query()),
        headers,
        body,
    };

    let outcome = pipeline::run(&state, inbound).await?;
    Ok((outcome.status, Json(outcome.body)).into_response())
}
