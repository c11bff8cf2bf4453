use serde_json::{Map, Value};

use super::aggregate::lookup_field;
use crate::models::{FieldDefinition, Record};

/// Keep the records satisfying every applicable query parameter.
///
/// When the endpoint declares filterable fields, parameters naming none of
/// them are ignored. With no filterable fields declared, every parameter
/// applies.
pub fn apply(
    records: Vec<Record>,
    fields: &[FieldDefinition],
    params: &[(String, String)],
) -> Vec<Record> {
    if params.is_empty() {
        return records;
    }

    let filterable: Vec<&str> = fields
        .iter()
        .filter(|f| f.filterable)
        .map(|f| f.name.as_str())
        .collect();

    let applied: Vec<&(String, String)> = params
        .iter()
        .filter(|(name, _)| {
            filterable.is_empty() || filterable.iter().any(|f| f.eq_ignore_ascii_case(name))
        })
        .collect();

    if applied.is_empty() {
        return records;
    }

    records
        .into_iter()
        .filter(|record| {
            applied
                .iter()
                .all(|(name, wanted)| matches_param(&record.payload, name, wanted))
        })
        .collect()
}

pub fn matches_param(payload: &Map<String, Value>, name: &str, wanted: &str) -> bool {
    match lookup_field(payload, name) {
        Some(value) => value_matches(value, wanted),
        None => false,
    }
}

/// Strings match as a case-insensitive substring, anything else by exact
/// equality of its JSON text.
pub fn value_matches(value: &Value, wanted: &str) -> bool {
    match value {
        Value::String(s) => s.to_lowercase().contains(&wanted.to_lowercase()),
        other => other.to_string() == wanted,
    }
}
