pub mod config;
pub mod db;
pub mod dispatch;
pub mod error;
pub mod models;
pub mod registry;
pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderName, HeaderValue};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::registry::EndpointRegistry;
use crate::state::{AppState, SharedState};

/// Build the application router. Endpoint definitions are loaded from the
/// database here, so migrations must already have run.
pub async fn build_app(pool: PgPool, config: Config) -> Result<(Router, SharedState), sqlx::Error> {
    let registry = EndpointRegistry::load(&pool).await?;
    tracing::info!("Loaded {} endpoint definition(s)", registry.len().await);

    let max_body_size = config.max_body_size;
    let state: SharedState = Arc::new(AppState {
        pool,
        config,
        registry,
    });

    let app = Router::new()
        .merge(routes::api_routes(&state.config.api_prefix))
        .route("/health", get(health))
        .fallback(routes::dynamic::dispatch)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(DefaultBodyLimit::max(max_body_size))
                .layer(SetResponseHeaderLayer::overriding(
                    HeaderName::from_static("x-content-type-options"),
                    HeaderValue::from_static("nosniff"),
                )),
        )
        .with_state(state.clone());

    Ok((app, state))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
