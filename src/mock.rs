//! In-memory test double for offline use.
//!
//! [`MockTransport`] answers the by-key and polling endpoints from a
//! [`MockFlagStore`] and returns an empty listing, so a [`FlagsManager`](crate::FlagsManager) built on it
//! behaves exactly as with the real service minus the network.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::client::{END_POINT_CONFIG_LISTING, END_POINT_POLLING, END_POINT_VALUE_BY_KEY};
use crate::context::EvaluationContext;
use crate::error::{ErrorCode, NumeratorError, NOT_FOUND_STATUS};
use crate::http::{ApiRequest, ApiResponse, Method, Transport};
use crate::types::{
    FlagCollectionEntry, FlagStatus, FlagValue, FlagVariationValue, ValueByKeyRequest,
    VariationValue,
};

/// One mocked answer: `key` evaluates to `value` for exactly `context`.
#[derive(Debug, Clone, PartialEq)]
pub struct MockFlag {
    pub key: String,
    pub value: FlagValue,
    pub context: EvaluationContext,
}

impl MockFlag {
    pub fn new(key: impl Into<String>, value: impl Into<FlagValue>, context: EvaluationContext) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            context,
        }
    }

    fn matches(&self, key: &str, context: &EvaluationContext) -> bool {
        self.key == key && self.context == *context
    }

    fn to_variation(&self) -> FlagVariationValue {
        let (value, value_type) = VariationValue::from_flag_value(&self.value);
        FlagVariationValue {
            key: self.key.clone(),
            status: Some(FlagStatus::On),
            value,
            value_type: Some(value_type),
        }
    }

    fn to_entry(&self) -> FlagCollectionEntry {
        let (value, value_type) = VariationValue::from_flag_value(&self.value);
        FlagCollectionEntry::new(self.key.clone(), value, value_type)
    }
}

/// Shared list of mocked flags. Clones see the same list.
#[derive(Debug, Clone, Default)]
pub struct MockFlagStore {
    flags: Arc<RwLock<Vec<MockFlag>>>,
}

impl MockFlagStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_flags(flags: Vec<MockFlag>) -> Self {
        Self {
            flags: Arc::new(RwLock::new(flags)),
        }
    }

    /// Replaces every mocked flag.
    pub fn mock_flags(&self, flags: Vec<MockFlag>) {
        *self.flags.write() = flags;
    }

    pub fn add(&self, flag: MockFlag) {
        self.flags.write().push(flag);
    }

    /// Drops every mocked flag for `key`, whatever its context.
    pub fn remove(&self, key: &str) {
        self.flags.write().retain(|flag| flag.key != key);
    }

    pub fn remove_for_context(&self, key: &str, context: &EvaluationContext) {
        self.flags.write().retain(|flag| !flag.matches(key, context));
    }

    pub fn flags(&self) -> Vec<MockFlag> {
        self.flags.read().clone()
    }

    /// First mocked flag for `key` under exactly `context`.
    pub fn find(&self, key: &str, context: &EvaluationContext) -> Option<MockFlag> {
        self.flags
            .read()
            .iter()
            .find(|flag| flag.matches(key, context))
            .cloned()
    }

    pub fn for_context(&self, context: &EvaluationContext) -> Vec<MockFlag> {
        self.flags
            .read()
            .iter()
            .filter(|flag| flag.context == *context)
            .cloned()
            .collect()
    }
}

/// [`Transport`] backed by a [`MockFlagStore`].
pub struct MockTransport {
    store: MockFlagStore,
}

impl MockTransport {
    pub fn new(store: MockFlagStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &MockFlagStore {
        &self.store
    }

    fn value_by_key(&self, data: Option<Value>) -> ApiResponse {
        let request = match data.map(serde_json::from_value::<ValueByKeyRequest>) {
            Some(Ok(request)) => request,
            _ => return ApiResponse::failure(NumeratorError::unknown()),
        };
        let context = request.context.unwrap_or_default();

        match self.store.find(&request.key, &context) {
            Some(flag) => to_response(&flag.to_variation()),
            None => ApiResponse::empty(),
        }
    }

    fn polling(&self, data: Option<Value>) -> ApiResponse {
        let context = data
            .and_then(|body| body.get("context").cloned())
            .map(serde_json::from_value::<EvaluationContext>)
            .transpose();
        let context = match context {
            Ok(context) => context.unwrap_or_default(),
            Err(_) => return ApiResponse::failure(NumeratorError::unknown()),
        };

        let flags: Vec<FlagCollectionEntry> = self
            .store
            .for_context(&context)
            .iter()
            .map(MockFlag::to_entry)
            .collect();
        to_response(&json!({ "flags": flags }))
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn request(&self, request: ApiRequest) -> ApiResponse {
        let path = request
            .endpoint
            .split('?')
            .next()
            .unwrap_or_default()
            .to_string();

        match (request.method, path.as_str()) {
            (Method::Post, END_POINT_VALUE_BY_KEY) => self.value_by_key(request.data),
            (Method::Post, END_POINT_POLLING) => self.polling(request.data),
            (Method::Post, END_POINT_CONFIG_LISTING) => {
                ApiResponse::ok(json!({ "count": 0, "data": [] }))
            }
            _ => ApiResponse::failure(
                NumeratorError::new(
                    ErrorCode::FeatureFlagNotFound,
                    format!("No mock for {} {}", request.method.as_str(), path),
                )
                .with_status(NOT_FOUND_STATUS),
            ),
        }
    }
}

fn to_response<T: serde::Serialize>(body: &T) -> ApiResponse {
    match serde_json::to_value(body) {
        Ok(data) => ApiResponse::ok(data),
        Err(_) => ApiResponse::failure(NumeratorError::unknown()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn android() -> EvaluationContext {
        EvaluationContext::new().attribute("platform", "android")
    }

    fn ios() -> EvaluationContext {
        EvaluationContext::new().attribute("platform", "ios")
    }

    #[test]
    fn test_store_add_and_remove() {
        let store = MockFlagStore::new();
        store.add(MockFlag::new("a", true, android()));
        store.add(MockFlag::new("a", false, ios()));
        store.add(MockFlag::new("b", "x", android()));

        store.remove_for_context("a", &ios());
        assert_eq!(store.flags().len(), 2);
        assert!(store.find("a", &android()).is_some());

        store.remove("a");
        assert_eq!(store.flags(), vec![MockFlag::new("b", "x", android())]);
    }

    #[test]
    fn test_store_clones_share_flags() {
        let store = MockFlagStore::new();
        let other = store.clone();

        other.mock_flags(vec![MockFlag::new("a", 1, android())]);

        assert_eq!(store.flags().len(), 1);
    }

    #[tokio::test]
    async fn test_value_by_key_requires_exact_context() {
        let transport = MockTransport::new(MockFlagStore::with_flags(vec![MockFlag::new(
            "a",
            true,
            android(),
        )]));

        let hit = transport
            .request(ApiRequest::post(
                END_POINT_VALUE_BY_KEY,
                json!({"key": "a", "context": {"platform": "android"}}),
            ))
            .await;
        assert_eq!(hit.data.unwrap()["value"]["boolean_value"], json!(true));

        let miss = transport
            .request(ApiRequest::post(
                END_POINT_VALUE_BY_KEY,
                json!({"key": "a", "context": {"platform": "ios"}}),
            ))
            .await;
        assert!(miss.data.is_none());
        assert!(miss.error.is_none());
    }

    #[tokio::test]
    async fn test_polling_filters_by_context() {
        let transport = MockTransport::new(MockFlagStore::with_flags(vec![
            MockFlag::new("a", true, android()),
            MockFlag::new("b", 2.5, android()),
            MockFlag::new("c", "x", ios()),
        ]));

        let response = transport
            .request(ApiRequest::post(
                END_POINT_POLLING,
                json!({"context": {"platform": "android"}}),
            ))
            .await;

        let flags = response.data.unwrap()["flags"].as_array().unwrap().len();
        assert_eq!(flags, 2);
    }

    #[tokio::test]
    async fn test_unknown_endpoint_fails() {
        let transport = MockTransport::new(MockFlagStore::new());
        let response = transport
            .request(ApiRequest::get("api/sdk/feature-flag/detail-by-key?key=a"))
            .await;

        assert!(response.error.unwrap().is_not_found());
    }
}
