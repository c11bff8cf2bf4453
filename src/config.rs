use std::net::IpAddr;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: IpAddr,
    pub port: u16,
    /// Prefix stripped from every request path before dispatch, e.g. `/api`.
    pub api_prefix: String,
    pub max_body_size: usize,
    /// How many request log entries are surfaced per endpoint.
    pub request_log_limit: i64,
    pub db_max_connections: u32,
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let database_url = env_required("DATABASE_URL")?;

        let host: IpAddr = env_or("MOCKAPI_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid MOCKAPI_HOST: {e}"))?;

        let port: u16 = env_or("MOCKAPI_PORT", "3000")
            .parse()
            .map_err(|e| format!("Invalid MOCKAPI_PORT: {e}"))?;

        let api_prefix = normalize_prefix(&env_or("MOCKAPI_API_PREFIX", "/api"))?;

        let max_body_size: usize = env_or("MOCKAPI_MAX_BODY_SIZE", "1048576")
            .parse()
            .map_err(|e| format!("Invalid MOCKAPI_MAX_BODY_SIZE: {e}"))?;

        let request_log_limit: i64 = env_or("MOCKAPI_REQUEST_LOG_LIMIT", "50")
            .parse()
            .map_err(|e| format!("Invalid MOCKAPI_REQUEST_LOG_LIMIT: {e}"))?;
        if request_log_limit < 1 {
            return Err("MOCKAPI_REQUEST_LOG_LIMIT must be at least 1".to_string());
        }

        let db_max_connections: u32 = env_or("MOCKAPI_DB_MAX_CONNECTIONS", "10")
            .parse()
            .map_err(|e| format!("Invalid MOCKAPI_DB_MAX_CONNECTIONS: {e}"))?;

        let log_level = env_or("MOCKAPI_LOG_LEVEL", "info");

        Ok(Config {
            database_url,
            host,
            port,
            api_prefix,
            max_body_size,
            request_log_limit,
            db_max_connections,
            log_level,
        })
    }
}

/// `api/` and `/api/` both become `/api`; an empty value means no prefix.
pub fn normalize_prefix(raw: &str) -> Result<String, String> {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        return Ok(String::new());
    }
    if trimmed.contains(['?', '#', '{', '}', '*']) {
        return Err(format!("Invalid MOCKAPI_API_PREFIX: '{raw}'"));
    }
    Ok(format!("/{trimmed}"))
}

fn env_required(key: &str) -> Result<String, String> {
    std::env::var(key).map_err(|_| format!("Missing required environment variable: {key}"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
