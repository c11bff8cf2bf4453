pub mod dynamic;
pub mod endpoints;
pub mod tables;

use axum::routing::get;
use axum::Router;
use serde::{Deserialize, Deserializer};

use crate::state::SharedState;

/// Management API, mounted under the configured prefix. Everything else
/// under the prefix falls through to [`dynamic::dispatch`].
pub fn api_routes(prefix: &str) -> Router<SharedState> {
    Router::new()
        // Endpoints
        .route(
            &format!("{prefix}/endpoints"),
            get(endpoints::list).post(endpoints::create),
        )
        .route(
            &format!("{prefix}/endpoints/{{id}}"),
            get(endpoints::get)
                .put(endpoints::update)
                .delete(endpoints::delete),
        )
        // Tables
        .route(
            &format!("{prefix}/tables"),
            get(tables::list).post(tables::create),
        )
        .route(
            &format!("{prefix}/tables/{{id}}"),
            get(tables::get).put(tables::update).delete(tables::delete),
        )
}

/// Distinguishes an absent key (`None`) from an explicit `null` (`Some(None)`).
/// Use with `#[serde(default, deserialize_with = "double_option")]`.
pub(crate) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
