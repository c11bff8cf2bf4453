use axum::http::{HeaderMap, HeaderValue, Method};
use bytes::Bytes;
use chrono::Utc;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use mockapi::config::normalize_prefix;
use mockapi::dispatch::aggregate::{lookup_field, order_by_endpoint, project_row};
use mockapi::dispatch::fields::{missing_required, type_warnings};
use mockapi::dispatch::filter;
use mockapi::dispatch::parser::{parse_body, parse_query, query_object};
use mockapi::dispatch::resolve::{normalize_path, resolve, Resolution};
use mockapi::models::field::check_definitions;
use mockapi::models::record::is_empty_payload;
use mockapi::models::{Endpoint, FieldDefinition, FieldType, HttpMethod, Record};

fn endpoint(path: &str, method: HttpMethod) -> Endpoint {
    Endpoint {
        id: Uuid::now_v7(),
        name: format!("{method} {path}"),
        path: path.to_string(),
        method,
        fields: Vec::new(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn field(name: &str, field_type: FieldType) -> FieldDefinition {
    FieldDefinition {
        name: name.to_string(),
        field_type,
        required: false,
        filterable: false,
        format: None,
        fields: None,
    }
}

fn required(name: &str) -> FieldDefinition {
    FieldDefinition {
        required: true,
        ..field(name, FieldType::String)
    }
}

fn filterable(name: &str, field_type: FieldType) -> FieldDefinition {
    FieldDefinition {
        filterable: true,
        ..field(name, field_type)
    }
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

fn record(endpoint_id: Uuid, body: Value) -> Record {
    Record::new(endpoint_id, object(body))
}

fn params(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

// ── Path normalization ──────────────────────────────────────────

#[test]
fn normalize_strips_prefix_and_trailing_slash() {
    assert_eq!(normalize_path("/api", "/api/users"), Some("/users".to_string()));
    assert_eq!(normalize_path("/api", "/api/users/"), Some("/users".to_string()));
    assert_eq!(normalize_path("/api", "/api/a/b"), Some("/a/b".to_string()));
    assert_eq!(normalize_path("/api", "/api"), Some("/".to_string()));
    assert_eq!(normalize_path("/api", "/api/"), Some("/".to_string()));
}

#[test]
fn normalize_rejects_paths_outside_prefix() {
    assert_eq!(normalize_path("/api", "/users"), None);
    assert_eq!(normalize_path("/api", "/apiusers"), None);
}

#[test]
fn normalize_without_prefix() {
    assert_eq!(normalize_path("", "/users/"), Some("/users".to_string()));
    assert_eq!(normalize_path("", "/"), Some("/".to_string()));
}

#[test]
fn prefix_normalization() {
    assert_eq!(normalize_prefix("/api").unwrap(), "/api");
    assert_eq!(normalize_prefix("api/").unwrap(), "/api");
    assert_eq!(normalize_prefix(" /mock/v1/ ").unwrap(), "/mock/v1");
    assert_eq!(normalize_prefix("/").unwrap(), "");
    assert_eq!(normalize_prefix("").unwrap(), "");
    assert!(normalize_prefix("/api/{x}").is_err());
}

// ── Resolution ──────────────────────────────────────────────────

#[test]
fn get_matches_any_declared_method() {
    let endpoints = vec![endpoint("/users", HttpMethod::Post)];

    match resolve(&endpoints, &Method::GET, "/users") {
        Resolution::Found(e) => assert_eq!(e.id, endpoints[0].id),
        other => panic!("expected Found, got {other:?}"),
    }
    assert!(matches!(
        resolve(&endpoints, &Method::DELETE, "/users"),
        Resolution::Found(_)
    ));
}

#[test]
fn writes_need_the_declared_method() {
    let endpoints = vec![endpoint("/users", HttpMethod::Get)];

    assert_eq!(resolve(&endpoints, &Method::POST, "/users"), Resolution::NotFound);
    assert_eq!(resolve(&endpoints, &Method::PUT, "/users"), Resolution::NotFound);
}

#[test]
fn first_declared_endpoint_wins() {
    let first = endpoint("/items", HttpMethod::Post);
    let second = endpoint("/items", HttpMethod::Put);
    let third = endpoint("/items", HttpMethod::Post);
    let endpoints = vec![first.clone(), second.clone(), third];

    match resolve(&endpoints, &Method::GET, "/items") {
        Resolution::Found(e) => assert_eq!(e.id, first.id),
        other => panic!("expected Found, got {other:?}"),
    }
    match resolve(&endpoints, &Method::POST, "/items") {
        Resolution::Found(e) => assert_eq!(e.id, first.id),
        other => panic!("expected Found, got {other:?}"),
    }
    match resolve(&endpoints, &Method::PUT, "/items") {
        Resolution::Found(e) => assert_eq!(e.id, second.id),
        other => panic!("expected Found, got {other:?}"),
    }
}

#[test]
fn unsupported_verb_on_declared_path() {
    let endpoints = vec![endpoint("/users", HttpMethod::Post)];

    assert!(matches!(
        resolve(&endpoints, &Method::PATCH, "/users"),
        Resolution::MethodNotAllowed(_)
    ));
    assert_eq!(resolve(&endpoints, &Method::PATCH, "/other"), Resolution::NotFound);
}

#[test]
fn paths_match_exactly() {
    let endpoints = vec![endpoint("/users", HttpMethod::Get)];

    assert_eq!(resolve(&endpoints, &Method::GET, "/Users"), Resolution::NotFound);
    assert_eq!(resolve(&endpoints, &Method::GET, "/users/1"), Resolution::NotFound);
    assert_eq!(resolve(&[], &Method::GET, "/users"), Resolution::NotFound);
}

// ── Field checks ────────────────────────────────────────────────

#[test]
fn missing_required_reports_absent_null_and_empty() {
    let defs = vec![
        required("a"),
        required("b"),
        required("c"),
        required("d"),
        field("e", FieldType::String),
    ];
    let body = object(json!({ "b": null, "c": "", "d": 0 }));

    assert_eq!(missing_required(&defs, &body), ["a", "b", "c"]);
}

#[test]
fn missing_required_accepts_falsy_non_strings() {
    let defs = vec![required("flag"), required("count"), required("list")];
    let body = object(json!({ "flag": false, "count": 0, "list": [] }));

    assert!(missing_required(&defs, &body).is_empty());
}

#[test]
fn type_warnings_flag_mismatches() {
    let defs = vec![
        field("age", FieldType::Number),
        field("active", FieldType::Boolean),
        field("born", FieldType::Date),
        field("tags", FieldType::Array),
        field("meta", FieldType::Object),
        field("title", FieldType::String),
    ];
    let body = object(json!({
        "age": "old",
        "active": "maybe",
        "born": "yesterday",
        "tags": "a,b",
        "meta": 5,
        "title": { "x": 1 }
    }));

    assert_eq!(type_warnings(&defs, &body).len(), 6);
}

#[test]
fn type_warnings_accept_lenient_values() {
    let defs = vec![
        field("age", FieldType::Number),
        field("active", FieldType::Boolean),
        field("born", FieldType::Date),
        field("missing", FieldType::Number),
        field("nothing", FieldType::Object),
    ];
    let body = object(json!({
        "age": "42.5",
        "active": "yes",
        "born": "2024-02-29T10:00:00Z",
        "nothing": null
    }));

    assert!(type_warnings(&defs, &body).is_empty());
}

#[test]
fn type_warnings_recurse_into_objects() {
    let defs = vec![FieldDefinition {
        fields: Some(vec![field("zip", FieldType::Number)]),
        ..field("address", FieldType::Object)
    }];
    let body = object(json!({ "address": { "zip": "abc" } }));

    let warnings = type_warnings(&defs, &body);
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("zip"));
    assert!(warnings[0].contains("address"));
}

#[test]
fn date_check_does_not_panic_on_multibyte() {
    let defs = vec![field("when", FieldType::Date)];
    let body = object(json!({ "when": "2024-01-é" }));

    assert_eq!(type_warnings(&defs, &body).len(), 1);
}

#[test]
fn definitions_reject_blank_and_duplicate_names() {
    assert!(check_definitions(&[field("a", FieldType::String), field("b", FieldType::Number)]).is_ok());
    assert!(check_definitions(&[field(" ", FieldType::String)]).is_err());
    assert!(check_definitions(&[field("a", FieldType::String), field("a", FieldType::Date)]).is_err());
}

#[test]
fn definitions_only_nest_under_containers() {
    let nested = FieldDefinition {
        fields: Some(vec![field("x", FieldType::String)]),
        ..field("obj", FieldType::Object)
    };
    assert!(check_definitions(&[nested]).is_ok());

    let bad = FieldDefinition {
        fields: Some(vec![field("x", FieldType::String)]),
        ..field("name", FieldType::String)
    };
    assert!(check_definitions(&[bad]).is_err());

    let duplicate_inside = FieldDefinition {
        fields: Some(vec![field("x", FieldType::String), field("x", FieldType::String)]),
        ..field("list", FieldType::Array)
    };
    assert!(check_definitions(&[duplicate_inside]).is_err());
}

#[test]
fn field_definitions_deserialize_with_defaults() {
    let def: FieldDefinition =
        serde_json::from_value(json!({ "name": "email", "type": "string" })).unwrap();
    assert!(!def.required);
    assert!(!def.filterable);
    assert_eq!(def.field_type, FieldType::String);

    assert!(serde_json::from_value::<FieldDefinition>(json!({ "name": "x", "type": "uuid" })).is_err());
}

#[test]
fn http_method_parses_case_insensitively() {
    assert_eq!(HttpMethod::try_from("post".to_string()), Ok(HttpMethod::Post));
    assert_eq!(serde_json::from_value::<HttpMethod>(json!("Delete")).unwrap(), HttpMethod::Delete);
    assert!(serde_json::from_value::<HttpMethod>(json!("PATCH")).is_err());
    assert_eq!(serde_json::to_value(HttpMethod::Put).unwrap(), json!("PUT"));
}

// ── Records ─────────────────────────────────────────────────────

#[test]
fn new_record_synthesizes_id_and_timestamp() {
    let endpoint_id = Uuid::now_v7();
    let rec = record(endpoint_id, json!({ "id": "mine", "createdAt": "then", "name": "x" }));

    assert_eq!(rec.payload["id"], json!(rec.id.to_string()));
    assert_ne!(rec.payload["createdAt"], json!("then"));
    assert!(rec.payload["createdAt"].as_str().unwrap().ends_with('Z'));
    assert_eq!(rec.payload["name"], "x");
    assert_eq!(rec.endpoint_id, endpoint_id);
}

#[test]
fn empty_payload_detection() {
    assert!(is_empty_payload(&object(json!({}))));
    assert!(is_empty_payload(&object(json!({ "id": "1", "createdAt": "t" }))));
    assert!(is_empty_payload(&object(json!({ "a": null, "b": "" }))));

    assert!(!is_empty_payload(&object(json!({ "a": 0 }))));
    assert!(!is_empty_payload(&object(json!({ "a": false }))));
    assert!(!is_empty_payload(&object(json!({ "a": [] }))));
    assert!(!is_empty_payload(&object(json!({ "a": "x" }))));

    assert!(record(Uuid::now_v7(), json!({ "a": "" })).is_empty());
}

// ── Filtering ───────────────────────────────────────────────────

#[test]
fn value_matching() {
    assert!(filter::value_matches(&json!("Alice"), "ali"));
    assert!(filter::value_matches(&json!("Alice"), "ALICE"));
    assert!(!filter::value_matches(&json!("Alice"), "bob"));

    assert!(filter::value_matches(&json!(30), "30"));
    assert!(!filter::value_matches(&json!(30), "3"));
    assert!(filter::value_matches(&json!(true), "true"));
    assert!(filter::value_matches(&json!(null), "null"));
}

#[test]
fn filter_ands_filterable_params() {
    let ep = Uuid::now_v7();
    let defs = vec![
        filterable("name", FieldType::String),
        filterable("age", FieldType::Number),
    ];
    let records = vec![
        record(ep, json!({ "name": "Alice", "age": 30 })),
        record(ep, json!({ "name": "Bob", "age": 30 })),
        record(ep, json!({ "name": "Alina", "age": 25 })),
    ];

    let kept = filter::apply(records.clone(), &defs, &params(&[("name", "ali"), ("age", "30")]));
    assert_eq!(kept.len(), 1);
    assert_eq!(kept[0].payload["name"], "Alice");

    let kept = filter::apply(records.clone(), &defs, &params(&[("age", "31")]));
    assert!(kept.is_empty());

    let kept = filter::apply(records.clone(), &defs, &params(&[]));
    assert_eq!(kept.len(), 3);
}

#[test]
fn filter_ignores_unknown_params_when_some_are_filterable() {
    let ep = Uuid::now_v7();
    let defs = vec![
        filterable("name", FieldType::String),
        field("city", FieldType::String),
    ];
    let records = vec![
        record(ep, json!({ "name": "Alice", "city": "Oslo" })),
        record(ep, json!({ "name": "Bob", "city": "Rome" })),
    ];

    let kept = filter::apply(records.clone(), &defs, &params(&[("city", "oslo")]));
    assert_eq!(kept.len(), 2);

    let kept = filter::apply(records, &defs, &params(&[("Name", "BOB"), ("page", "1")]));
    assert_eq!(kept.len(), 1);
    assert_eq!(kept[0].payload["name"], "Bob");
}

#[test]
fn filter_applies_every_param_without_filterable_fields() {
    let ep = Uuid::now_v7();
    let records = vec![
        record(ep, json!({ "kind": "dog" })),
        record(ep, json!({ "kind": "cat" })),
    ];

    let kept = filter::apply(records.clone(), &[], &params(&[("kind", "dog")]));
    assert_eq!(kept.len(), 1);

    // a record lacking the key never matches
    let kept = filter::apply(records, &[], &params(&[("owner", "x")]));
    assert!(kept.is_empty());
}

// ── Aggregation ─────────────────────────────────────────────────

#[test]
fn lookup_prefers_exact_key() {
    let payload = object(json!({ "Name": "upper", "name": "lower" }));
    assert_eq!(lookup_field(&payload, "name"), Some(&json!("lower")));
    assert_eq!(lookup_field(&payload, "Name"), Some(&json!("upper")));

    let payload = object(json!({ "EMAIL": "a@b.c" }));
    assert_eq!(lookup_field(&payload, "email"), Some(&json!("a@b.c")));
    assert_eq!(lookup_field(&payload, "phone"), None);
}

#[test]
fn order_groups_by_endpoint_and_keeps_recency() {
    let a = Uuid::now_v7();
    let b = Uuid::now_v7();

    // newest first, as storage returns them
    let records = vec![
        record(b, json!({ "n": "b2" })),
        record(a, json!({ "n": "a2" })),
        record(b, json!({ "n": "b1" })),
        record(a, json!({ "n": "a1" })),
    ];

    let ordered = order_by_endpoint(records, &[a, b]);
    let seen: Vec<&str> = ordered
        .iter()
        .map(|r| r.payload["n"].as_str().unwrap())
        .collect();
    assert_eq!(seen, ["a2", "a1", "b2", "b1"]);
}

#[test]
fn projected_rows_follow_table_fields() {
    let ep = Uuid::now_v7();
    let rec = record(ep, json!({ "FullName": "Ann", "extra": 1 }));
    let defs = vec![
        field("fullname", FieldType::String),
        field("phone", FieldType::String),
    ];

    let row = project_row(&rec, &defs);
    assert_eq!(row["id"], json!(rec.id.to_string()));
    assert_eq!(row["createdAt"], rec.payload["createdAt"]);
    assert_eq!(row["endpointId"], json!(ep.to_string()));
    assert_eq!(row["fullname"], "Ann");
    assert_eq!(row["phone"], Value::Null);
    assert!(!row.contains_key("extra"));
}

// ── Body and query parsing ──────────────────────────────────────

fn headers(content_type: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("content-type", HeaderValue::from_str(content_type).unwrap());
    headers
}

#[tokio::test]
async fn empty_body_is_empty_object() {
    let body = parse_body(&headers("application/json"), Bytes::new()).await.unwrap();
    assert!(body.is_empty());

    let body = parse_body(&HeaderMap::new(), Bytes::from_static(b"  \n")).await.unwrap();
    assert!(body.is_empty());
}

#[tokio::test]
async fn json_body_must_be_an_object() {
    let body = parse_body(&headers("application/json"), Bytes::from_static(br#"{"a":1}"#))
        .await
        .unwrap();
    assert_eq!(body["a"], 1);

    assert!(parse_body(&headers("application/json"), Bytes::from_static(b"[1]")).await.is_err());
    assert!(parse_body(&headers("application/json"), Bytes::from_static(b"{oops")).await.is_err());
}

#[tokio::test]
async fn urlencoded_body_becomes_strings() {
    let body = parse_body(
        &headers("application/x-www-form-urlencoded"),
        Bytes::from_static(b"name=Ann+Lee&age=30"),
    )
    .await
    .unwrap();
    assert_eq!(body["name"], "Ann Lee");
    assert_eq!(body["age"], "30");
}

#[tokio::test]
async fn multipart_body_fields() {
    let raw = "--XYZ\r\n\
        Content-Disposition: form-data; name=\"email\"\r\n\r\n\
        a@b.c\r\n\
        --XYZ--\r\n";
    let body = parse_body(
        &headers("multipart/form-data; boundary=XYZ"),
        Bytes::from(raw),
    )
    .await
    .unwrap();
    assert_eq!(body["email"], "a@b.c");
}

#[test]
fn query_pairs_and_log_object() {
    let pairs = parse_query(Some("name=al%20i&age=30&age=31"));
    assert_eq!(pairs.len(), 3);
    assert_eq!(pairs[0], ("name".to_string(), "al i".to_string()));

    assert_eq!(
        query_object(&pairs),
        Some(json!({ "name": "al i", "age": "31" }))
    );
    assert!(parse_query(None).is_empty());
    assert_eq!(query_object(&[]), None);
}
