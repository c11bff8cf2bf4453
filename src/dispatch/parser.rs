use axum::http::HeaderMap;
use bytes::Bytes;
use serde_json::{Map, Value};

/// Decode a write body by Content-Type. An empty body is an empty object.
pub async fn parse_body(headers: &HeaderMap, body: Bytes) -> Result<Map<String, Value>, String> {
    let content_type = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/json");

    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Map::new());
    }

    let value = if content_type.contains("multipart/form-data") {
        parse_multipart(content_type, body).await?
    } else if content_type.contains("application/x-www-form-urlencoded") {
        Value::Object(parse_pairs(&body))
    } else if content_type.contains("application/json") {
        serde_json::from_slice(&body).map_err(|e| format!("Invalid JSON: {e}"))?
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| format!("Unable to parse body: {e}"))?
    };

    match value {
        Value::Object(map) => Ok(map),
        _ => Err("Request body must be a JSON object".to_string()),
    }
}

/// Query string as ordered `(name, value)` pairs. Repeated names are kept.
pub fn parse_query(query: Option<&str>) -> Vec<(String, String)> {
    query
        .map(|q| {
            form_urlencoded::parse(q.as_bytes())
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect()
        })
        .unwrap_or_default()
}

/// Query pairs as the object stored in the request log; the last value of a
/// repeated name wins. `None` when there is no query.
pub fn query_object(pairs: &[(String, String)]) -> Option<Value> {
    if pairs.is_empty() {
        return None;
    }
    let map: Map<String, Value> = pairs
        .iter()
        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
        .collect();
    Some(Value::Object(map))
}

fn parse_pairs(body: &[u8]) -> Map<String, Value> {
    form_urlencoded::parse(body)
        .map(|(k, v)| (k.into_owned(), Value::String(v.into_owned())))
        .collect()
}

async fn parse_multipart(content_type: &str, body: Bytes) -> Result<Value, String> {
    let boundary =
        multer::parse_boundary(content_type).map_err(|_| "Missing multipart boundary".to_string())?;

    let stream = futures_util::stream::once(async { Ok::<_, std::io::Error>(body) });
    let mut multipart = multer::Multipart::new(stream, boundary);

    let mut map = Map::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| format!("Multipart error: {e}"))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        let value = field
            .text()
            .await
            .map_err(|e| format!("Field read error: {e}"))?;
        map.insert(name, Value::String(value));
    }

    Ok(Value::Object(map))
}
