use axum::http::Method;

use crate::models::{Endpoint, HttpMethod};

#[derive(Debug, Clone, PartialEq)]
pub enum Resolution<T> {
    Found(T),
    /// A path matched but the verb is not one an endpoint can serve.
    MethodNotAllowed(T),
    NotFound,
}

impl<T: Clone> Resolution<&T> {
    pub fn cloned(self) -> Resolution<T> {
        match self {
            Resolution::Found(e) => Resolution::Found(e.clone()),
            Resolution::MethodNotAllowed(e) => Resolution::MethodNotAllowed(e.clone()),
            Resolution::NotFound => Resolution::NotFound,
        }
    }
}

/// Strip `prefix` from a request path and normalize it to the form
/// declared paths are stored in: leading `/`, no trailing `/`.
///
/// Returns `None` when the path lies outside the prefix.
pub fn normalize_path(prefix: &str, raw: &str) -> Option<String> {
    let rest = if prefix.is_empty() {
        raw
    } else {
        let rest = raw.strip_prefix(prefix)?;
        if !rest.is_empty() && !rest.starts_with('/') {
            return None;
        }
        rest
    };

    let trimmed = rest.trim_end_matches('/');
    if trimmed.is_empty() {
        return Some("/".to_string());
    }
    if trimmed.starts_with('/') {
        Some(trimmed.to_string())
    } else {
        Some(format!("/{trimmed}"))
    }
}

/// Pick the endpoint serving `method` on `path`, first declared wins.
///
/// GET and DELETE match on path alone, whatever verb the endpoint was
/// declared with, so every declared path can be read back and cleared.
/// POST and PUT need the exact declared verb.
pub fn resolve<'a>(endpoints: &'a [Endpoint], method: &Method, path: &str) -> Resolution<&'a Endpoint> {
    let mut on_path = endpoints.iter().filter(|e| e.path == path);

    match HttpMethod::from_http(method) {
        Some(HttpMethod::Get | HttpMethod::Delete) => match on_path.next() {
            Some(endpoint) => Resolution::Found(endpoint),
            None => Resolution::NotFound,
        },
        Some(declared @ (HttpMethod::Post | HttpMethod::Put)) => {
            match on_path.find(|e| e.method == declared) {
                Some(endpoint) => Resolution::Found(endpoint),
                None => Resolution::NotFound,
            }
        }
        None => match on_path.next() {
            Some(endpoint) => Resolution::MethodNotAllowed(endpoint),
            None => Resolution::NotFound,
        },
    }
}
