use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestLogEntry {
    pub id: Uuid,
    pub endpoint_id: Uuid,
    pub path: String,
    pub method: String,
    pub request: Option<serde_json::Value>,
    pub status: i32,
    pub response: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

pub struct NewRequestLog {
    pub endpoint_id: Uuid,
    pub path: String,
    pub method: String,
    pub request: Option<serde_json::Value>,
    pub status: u16,
    pub response: serde_json::Value,
}
