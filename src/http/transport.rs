//! Transport contract consumed by the flag service client.
//!
//! A transport issues one HTTP-like request and reports either a decoded
//! body or a normalized error, always alongside the response headers so
//! callers can read the `ETag` validator.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;

use crate::error::NumeratorError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    /// Path relative to the base URL, optionally with a query string.
    pub endpoint: String,
    pub headers: HeaderMap,
    pub data: Option<Value>,
}

impl ApiRequest {
    pub fn get(endpoint: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            endpoint: endpoint.into(),
            headers: HeaderMap::new(),
            data: None,
        }
    }

    pub fn post(endpoint: impl Into<String>, data: Value) -> Self {
        Self {
            method: Method::Post,
            endpoint: endpoint.into(),
            headers: HeaderMap::new(),
            data: Some(data),
        }
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        insert_header(&mut self.headers, name, value);
        self
    }
}

/// Response envelope: at most one of `data` and `error` is set.
///
/// Both empty means the server answered without a body, which includes a
/// `304 Not Modified`.
#[derive(Debug, Default)]
pub struct ApiResponse {
    pub data: Option<Value>,
    pub error: Option<NumeratorError>,
    pub headers: HeaderMap,
}

impl ApiResponse {
    pub fn ok(data: Value) -> Self {
        Self {
            data: Some(data),
            ..Default::default()
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn failure(error: NumeratorError) -> Self {
        Self {
            error: Some(error),
            ..Default::default()
        }
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        insert_header(&mut self.headers, name, value);
        self
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn request(&self, request: ApiRequest) -> ApiResponse;
}

/// Case-insensitive header lookup; non-UTF-8 values are treated as absent.
pub fn get_header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string())
}

fn insert_header(headers: &mut HeaderMap, name: &str, value: &str) {
    match (
        HeaderName::from_bytes(name.as_bytes()),
        HeaderValue::from_str(value),
    ) {
        (Ok(name), Ok(value)) => {
            headers.insert(name, value);
        }
        _ => tracing::warn!("Dropping invalid header {}", name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let response = ApiResponse::empty().header("ETag", "\"abc\"");

        assert_eq!(get_header_value(&response.headers, "etag"), Some("\"abc\"".to_string()));
        assert_eq!(get_header_value(&response.headers, "ETAG"), Some("\"abc\"".to_string()));
        assert_eq!(get_header_value(&response.headers, "If-None-Match"), None);
    }

    #[test]
    fn test_invalid_header_is_dropped() {
        let request = ApiRequest::get("x").header("If-None-Match", "bad\nvalue");
        assert!(request.headers.is_empty());
    }
}
