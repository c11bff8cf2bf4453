use sqlx::PgPool;

use crate::models::NewRequestLog;

/// Append a request/response pair to the endpoint's request log. Runs after
/// the response is computed; a failure here never changes the response.
pub async fn record(pool: &PgPool, entry: NewRequestLog) {
    if let Err(e) = crate::db::request_logs::create(pool, &entry).await {
        tracing::error!(
            "Failed to log {} {} for endpoint {}: {e}",
            entry.method,
            entry.path,
            entry.endpoint_id
        );
    }
}
