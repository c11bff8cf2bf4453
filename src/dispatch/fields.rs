use serde_json::{Map, Value};

use crate::models::record::json_kind;
use crate::models::{FieldDefinition, FieldType};

/// Names of required fields that are absent, null or an empty string.
pub fn missing_required(defs: &[FieldDefinition], body: &Map<String, Value>) -> Vec<String> {
    defs.iter()
        .filter(|def| def.required)
        .filter(|def| match body.get(&def.name) {
            None | Some(Value::Null) => true,
            Some(Value::String(s)) => s.is_empty(),
            Some(_) => false,
        })
        .map(|def| def.name.clone())
        .collect()
}

/// Type mismatches against the declared schema. Advisory only: writes are
/// never rejected for these.
pub fn type_warnings(defs: &[FieldDefinition], body: &Map<String, Value>) -> Vec<String> {
    let mut warnings = Vec::new();

    for def in defs {
        let name = &def.name;
        let Some(value) = body.get(name) else {
            continue;
        };

        match (def.field_type, value) {
            (_, Value::Null) => {}
            (FieldType::String, Value::Object(_) | Value::Array(_)) => {
                warnings.push(format!("Expected string, got structured value: {name}"));
            }
            (FieldType::Number, Value::String(s)) if s.parse::<f64>().is_err() => {
                warnings.push(format!("Invalid number format: {name}"));
            }
            (FieldType::Number, Value::Bool(_)) => {
                warnings.push(format!("Expected number, got boolean: {name}"));
            }
            (FieldType::Boolean, Value::String(s))
                if !matches!(s.as_str(), "true" | "false" | "1" | "0" | "yes" | "no") =>
            {
                warnings.push(format!("Invalid boolean format: {name}"));
            }
            (FieldType::Boolean, Value::Number(_)) => {
                warnings.push(format!("Expected boolean, got number: {name}"));
            }
            (FieldType::Date, Value::String(s)) if !looks_like_date(s) => {
                warnings.push(format!("Invalid date format: {name}"));
            }
            (FieldType::Date, Value::Bool(_) | Value::Object(_) | Value::Array(_)) => {
                warnings.push(format!("Expected date, got {}: {name}", json_kind(value)));
            }
            (FieldType::Object, v) if !v.is_object() => {
                warnings.push(format!("Expected object, got {}: {name}", json_kind(v)));
            }
            (FieldType::Array, v) if !v.is_array() => {
                warnings.push(format!("Expected array, got {}: {name}", json_kind(v)));
            }
            (FieldType::Object, Value::Object(inner)) => {
                if let Some(nested) = &def.fields {
                    warnings.extend(
                        type_warnings(nested, inner)
                            .into_iter()
                            .map(|w| format!("{w} (in {name})")),
                    );
                }
            }
            _ => {}
        }
    }

    warnings
}

/// Accepts ISO 8601 dates: `YYYY-MM-DD` optionally followed by a time part.
fn looks_like_date(s: &str) -> bool {
    let bytes = s.as_bytes();
    let digits = |range: std::ops::Range<usize>| {
        bytes
            .get(range)
            .is_some_and(|b| b.iter().all(u8::is_ascii_digit))
    };
    digits(0..4)
        && bytes.get(4) == Some(&b'-')
        && digits(5..7)
        && bytes.get(7) == Some(&b'-')
        && digits(8..10)
}
