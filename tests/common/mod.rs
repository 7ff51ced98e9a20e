#![allow(dead_code)]

use async_trait::async_trait;
use numerator::{ApiRequest, ApiResponse, NumeratorError, NumeratorOptions, Transport};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::time::Duration;

pub const LISTING: &str = "api/sdk/feature-flag/listing";
pub const BY_KEY: &str = "api/sdk/feature-flag/by-key";
pub const POLLING: &str = "api/sdk/feature-flag/polling";

type Responder = Box<dyn Fn(&ApiRequest) -> ApiResponse + Send + Sync>;

/// Transport that replays queued responses per endpoint and records every
/// request it sees.
///
/// Queued responses are used once, in order. Once an endpoint's queue is
/// empty its fallback responder answers, and without one the response is
/// empty.
#[derive(Default)]
pub struct ScriptedTransport {
    queued: Mutex<HashMap<String, VecDeque<(Duration, ApiResponse)>>>,
    fallback: Mutex<HashMap<String, Responder>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, endpoint: &str, response: ApiResponse) {
        self.push_delayed(endpoint, Duration::ZERO, response);
    }

    pub fn push_delayed(&self, endpoint: &str, delay: Duration, response: ApiResponse) {
        self.queued
            .lock()
            .entry(endpoint.to_string())
            .or_default()
            .push_back((delay, response));
    }

    pub fn respond_with<F>(&self, endpoint: &str, responder: F)
    where
        F: Fn(&ApiRequest) -> ApiResponse + Send + Sync + 'static,
    {
        self.fallback
            .lock()
            .insert(endpoint.to_string(), Box::new(responder));
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().clone()
    }

    pub fn requests_to(&self, endpoint: &str) -> Vec<ApiRequest> {
        self.requests
            .lock()
            .iter()
            .filter(|r| path_of(&r.endpoint) == endpoint)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn request(&self, request: ApiRequest) -> ApiResponse {
        self.requests.lock().push(request.clone());
        let path = path_of(&request.endpoint).to_string();

        let queued = self
            .queued
            .lock()
            .get_mut(&path)
            .and_then(|queue| queue.pop_front());

        match queued {
            Some((delay, response)) => {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                response
            }
            None => match self.fallback.lock().get(&path) {
                Some(responder) => responder(&request),
                None => ApiResponse::empty(),
            },
        }
    }
}

fn path_of(endpoint: &str) -> &str {
    endpoint.split('?').next().unwrap_or(endpoint)
}

/// Options for an engine that never polls on its own.
pub fn quiet_options() -> NumeratorOptions {
    NumeratorOptions::builder("test-key")
        .load_polling_on_start(false)
        .build()
}

pub fn bool_entry(key: &str, value: bool) -> Value {
    json!({"key": key, "value": {"boolean_value": value}, "value_type": "BOOLEAN"})
}

pub fn string_entry(key: &str, value: &str) -> Value {
    json!({"key": key, "value": {"string_value": value}, "value_type": "STRING"})
}

pub fn poll_response(entries: Vec<Value>, etag: &str) -> ApiResponse {
    ApiResponse::ok(json!({ "flags": entries })).header("ETag", etag)
}

pub fn variation(key: &str, value: Value) -> ApiResponse {
    ApiResponse::ok(json!({"key": key, "status": "ON", "value": value}))
}

pub fn flag_config(key: &str) -> Value {
    json!({
        "id": format!("id-{}", key),
        "name": key,
        "key": key,
        "organization_id": "org",
        "project_id": "project",
        "status": "ON",
        "default_on_variation_id": "on",
        "default_off_variation_id": "off",
        "value_type": "BOOLEAN",
        "created_at": "2024-01-01T00:00:00Z"
    })
}

pub fn server_error() -> ApiResponse {
    ApiResponse::failure(NumeratorError::unknown())
}
