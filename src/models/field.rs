use serde::{Deserialize, Serialize};

/// One declared field of an endpoint or table schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
    /// Only consulted when the owning endpoint is read with query parameters.
    #[serde(default)]
    pub filterable: bool,
    /// Free-form hint such as a date pattern or `email`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Nested schema for `object` and `array` fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<FieldDefinition>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Number,
    Boolean,
    Date,
    Object,
    Array,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::Date => "date",
            FieldType::Object => "object",
            FieldType::Array => "array",
        }
    }
}

/// Rejects blank or duplicate names, recursing into nested lists.
pub fn check_definitions(fields: &[FieldDefinition]) -> Result<(), String> {
    let mut seen: Vec<&str> = Vec::with_capacity(fields.len());

    for field in fields {
        let name = field.name.trim();
        if name.is_empty() {
            return Err("Field names must not be empty".to_string());
        }
        if seen.contains(&name) {
            return Err(format!("Duplicate field name: {name}"));
        }
        seen.push(name);

        if let Some(nested) = &field.fields {
            if !matches!(field.field_type, FieldType::Object | FieldType::Array) {
                return Err(format!(
                    "Field '{name}' of type {} cannot declare nested fields",
                    field.field_type.as_str()
                ));
            }
            check_definitions(nested)?;
        }
    }

    Ok(())
}
