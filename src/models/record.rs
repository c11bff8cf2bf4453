use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Payload key holding the synthesized record identifier.
pub const ID_KEY: &str = "id";
/// Payload key holding the synthesized creation timestamp.
pub const CREATED_AT_KEY: &str = "createdAt";

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RecordRow {
    pub id: Uuid,
    pub endpoint_id: Uuid,
    pub payload: Value,
    pub created_at: DateTime<Utc>,
}

/// A stored record whose payload is known to be a JSON object.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub id: Uuid,
    pub endpoint_id: Uuid,
    pub payload: Map<String, Value>,
    pub created_at: DateTime<Utc>,
}

impl Record {
    /// Merges the synthesized id and timestamp into `body`, overwriting any
    /// client-sent keys of the same name.
    pub fn new(endpoint_id: Uuid, mut body: Map<String, Value>) -> Self {
        let id = Uuid::now_v7();
        let created_at = Utc::now();

        body.insert(ID_KEY.to_string(), Value::String(id.to_string()));
        body.insert(
            CREATED_AT_KEY.to_string(),
            Value::String(created_at.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)),
        );

        Record {
            id,
            endpoint_id,
            payload: body,
            created_at,
        }
    }

    pub fn is_empty(&self) -> bool {
        is_empty_payload(&self.payload)
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.payload)
    }
}

impl TryFrom<RecordRow> for Record {
    type Error = String;

    fn try_from(row: RecordRow) -> Result<Self, Self::Error> {
        match row.payload {
            Value::Object(payload) => Ok(Record {
                id: row.id,
                endpoint_id: row.endpoint_id,
                payload,
                created_at: row.created_at,
            }),
            other => Err(format!(
                "record {} payload is not an object: {}",
                row.id,
                json_kind(&other)
            )),
        }
    }
}

/// True when nothing besides the id and timestamp carries a value.
pub fn is_empty_payload(payload: &Map<String, Value>) -> bool {
    payload
        .iter()
        .filter(|(key, _)| key.as_str() != ID_KEY && key.as_str() != CREATED_AT_KEY)
        .all(|(_, value)| match value {
            Value::Null => true,
            Value::String(s) => s.is_empty(),
            _ => false,
        })
}

pub fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
