use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Verbs a declared endpoint can be called with, advertised on 405 responses.
pub const ALLOWED_METHODS: &str = "GET, POST, PUT, DELETE";

#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    BadRequest(String),
    /// Required fields absent from a write; carries every missing name.
    Validation(Vec<String>),
    MethodNotAllowed(String),
    Internal(String),
    Database(sqlx::Error),
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::NotFound(msg) => write!(f, "Not Found: {msg}"),
            AppError::BadRequest(msg) => write!(f, "Bad Request: {msg}"),
            AppError::Validation(missing) => {
                write!(f, "Missing required fields: {}", missing.join(", "))
            }
            AppError::MethodNotAllowed(msg) => write!(f, "Method Not Allowed: {msg}"),
            AppError::Internal(msg) => write!(f, "Internal Error: {msg}"),
            AppError::Database(err) => write!(f, "Database Error: {err}"),
        }
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            AppError::Internal(_) | AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// JSON body sent to the client. Also used as the request log snapshot.
    pub fn body(&self) -> serde_json::Value {
        match self {
            AppError::NotFound(msg)
            | AppError::BadRequest(msg)
            | AppError::MethodNotAllowed(msg)
            | AppError::Internal(msg) => json!({ "error": msg }),
            AppError::Validation(missing) => json!({
                "error": format!("Missing required fields: {}", missing.join(", ")),
                "missingFields": missing,
            }),
            AppError::Database(err) => json!({ "error": format!("Database error: {err}") }),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Internal(msg) => tracing::error!("Internal error: {msg}"),
            AppError::Database(err) => tracing::error!("Database error: {err}"),
            _ => {}
        }

        let mut response = (self.status(), axum::Json(self.body())).into_response();
        if matches!(self, AppError::MethodNotAllowed(_)) {
            response
                .headers_mut()
                .insert(header::ALLOW, HeaderValue::from_static(ALLOWED_METHODS));
        }
        response
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err)
    }
}
