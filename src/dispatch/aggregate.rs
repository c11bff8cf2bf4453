use serde_json::{Map, Value};
use sqlx::PgPool;
use uuid::Uuid;

use crate::db;
use crate::models::record::{CREATED_AT_KEY, ID_KEY};
use crate::models::{FieldDefinition, Record};

/// Resolve `name` in a payload: exact key first, then the first key equal
/// ignoring ASCII case. Stored keys are never rewritten.
pub fn lookup_field<'a>(payload: &'a Map<String, Value>, name: &str) -> Option<&'a Value> {
    payload.get(name).or_else(|| {
        payload
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    })
}

/// Endpoints a GET on `endpoint_id` reads from: every member of the oldest
/// table containing it, in association order, or just the endpoint itself.
pub async fn read_set(pool: &PgPool, endpoint_id: Uuid) -> Result<Vec<Uuid>, sqlx::Error> {
    let Some(table_id) = db::tables::first_table_for_endpoint(pool, endpoint_id).await? else {
        return Ok(vec![endpoint_id]);
    };

    let members = db::tables::endpoint_ids(pool, table_id).await?;
    if members.is_empty() {
        // association removed between the two queries
        return Ok(vec![endpoint_id]);
    }
    Ok(members)
}

/// Non-empty records of every endpoint in `endpoint_ids`, concatenated in
/// that order, each endpoint's contribution newest first.
pub async fn collect(pool: &PgPool, endpoint_ids: &[Uuid]) -> Result<Vec<Record>, sqlx::Error> {
    let records = db::records::list(pool, endpoint_ids).await?;
    Ok(order_by_endpoint(records, endpoint_ids))
}

/// Stable regrouping of newest-first records by position of their endpoint
/// in `endpoint_ids`.
pub fn order_by_endpoint(mut records: Vec<Record>, endpoint_ids: &[Uuid]) -> Vec<Record> {
    records.sort_by_key(|r| {
        endpoint_ids
            .iter()
            .position(|id| *id == r.endpoint_id)
            .unwrap_or(usize::MAX)
    });
    records
}

/// Display row of an aggregated record under a table's own schema.
pub fn project_row(record: &Record, fields: &[FieldDefinition]) -> Map<String, Value> {
    let mut row = Map::new();
    row.insert(ID_KEY.to_string(), Value::String(record.id.to_string()));
    row.insert(
        CREATED_AT_KEY.to_string(),
        record
            .payload
            .get(CREATED_AT_KEY)
            .cloned()
            .unwrap_or_else(|| Value::String(record.created_at.to_rfc3339())),
    );
    row.insert(
        "endpointId".to_string(),
        Value::String(record.endpoint_id.to_string()),
    );

    for field in fields {
        let value = lookup_field(&record.payload, &field.name)
            .cloned()
            .unwrap_or(Value::Null);
        row.insert(field.name.clone(), value);
    }

    row
}
