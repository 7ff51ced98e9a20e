use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::context::EvaluationContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FlagStatus {
    On,
    Off,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FlagValueType {
    Boolean,
    String,
    Long,
    Double,
}

/// Where a lookup got its answer from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationReason {
    Cached,
    Server,
    Default,
}

/// Static metadata for a flag, as returned by the listing and detail endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlagConfig {
    pub id: String,
    pub name: String,
    pub key: String,
    pub organization_id: String,
    pub project_id: String,
    pub status: FlagStatus,
    #[serde(default)]
    pub description: Option<String>,
    pub default_on_variation_id: String,
    pub default_off_variation_id: String,
    pub value_type: FlagValueType,
    pub created_at: DateTime<Utc>,
}

/// A flag's concrete value. At most one field is meaningful, chosen by the
/// owning flag's [`FlagValueType`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VariationValue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub string_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boolean_value: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long_value: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub double_value: Option<f64>,
}

impl VariationValue {
    pub fn boolean(value: bool) -> Self {
        Self {
            boolean_value: Some(value),
            ..Default::default()
        }
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self {
            string_value: Some(value.into()),
            ..Default::default()
        }
    }

    pub fn long(value: i64) -> Self {
        Self {
            long_value: Some(value),
            ..Default::default()
        }
    }

    pub fn double(value: f64) -> Self {
        Self {
            double_value: Some(value),
            ..Default::default()
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        self.boolean_value
    }

    pub fn as_str(&self) -> Option<&str> {
        self.string_value.as_deref()
    }

    /// Numeric view: the long field wins over the double field.
    pub fn as_number(&self) -> Option<f64> {
        self.long_value
            .map(|v| v as f64)
            .or(self.double_value)
    }

    /// Reads the field selected by `value_type`, never by probing.
    pub fn typed(&self, value_type: FlagValueType) -> Option<FlagValue> {
        match value_type {
            FlagValueType::Boolean => self.boolean_value.map(FlagValue::Boolean),
            FlagValueType::String => self.string_value.clone().map(FlagValue::String),
            FlagValueType::Long => self.long_value.map(|v| FlagValue::Number(v as f64)),
            FlagValueType::Double => self.double_value.map(FlagValue::Number),
        }
    }

    /// Encodes a [`FlagValue`], picking `LONG` for integral numbers.
    pub fn from_flag_value(value: &FlagValue) -> (Self, FlagValueType) {
        match value {
            FlagValue::Boolean(b) => (Self::boolean(*b), FlagValueType::Boolean),
            FlagValue::String(s) => (Self::string(s.clone()), FlagValueType::String),
            FlagValue::Number(n)
                if n.fract() == 0.0 && *n >= i64::MIN as f64 && *n <= i64::MAX as f64 =>
            {
                (Self::long(*n as i64), FlagValueType::Long)
            }
            FlagValue::Number(n) => (Self::double(*n), FlagValueType::Double),
        }
    }
}

/// A flag's variation for one context, as returned by the by-key endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlagVariationValue {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub status: Option<FlagStatus>,
    pub value: VariationValue,
    #[serde(default)]
    pub value_type: Option<FlagValueType>,
}

impl FlagVariationValue {
    pub fn is_on(&self) -> bool {
        self.status == Some(FlagStatus::On)
    }
}

/// One cached flag for the polled default context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlagCollectionEntry {
    #[serde(default)]
    pub id: Option<String>,
    pub key: String,
    pub value: VariationValue,
    pub value_type: FlagValueType,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl FlagCollectionEntry {
    pub fn new(key: impl Into<String>, value: VariationValue, value_type: FlagValueType) -> Self {
        Self {
            id: None,
            key: key.into(),
            value,
            value_type,
            created_at: None,
        }
    }
}

/// Cache contents keyed by flag key.
pub type FlagCollection = HashMap<String, FlagCollectionEntry>;

/// A caller-facing flag value, also used to state which kind a lookup expects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FlagValue {
    Boolean(bool),
    Number(f64),
    String(String),
}

impl FlagValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FlagValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            FlagValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FlagValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<bool> for FlagValue {
    fn from(value: bool) -> Self {
        FlagValue::Boolean(value)
    }
}

impl From<f64> for FlagValue {
    fn from(value: f64) -> Self {
        FlagValue::Number(value)
    }
}

impl From<i64> for FlagValue {
    fn from(value: i64) -> Self {
        FlagValue::Number(value as f64)
    }
}

impl From<i32> for FlagValue {
    fn from(value: i32) -> Self {
        FlagValue::Number(value as f64)
    }
}

impl From<String> for FlagValue {
    fn from(value: String) -> Self {
        FlagValue::String(value)
    }
}

impl From<&str> for FlagValue {
    fn from(value: &str) -> Self {
        FlagValue::String(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FlagEvaluationDetail<T> {
    pub key: String,
    pub value: T,
    pub reason: EvaluationReason,
}

impl<T> FlagEvaluationDetail<T> {
    pub fn new(key: impl Into<String>, value: T, reason: EvaluationReason) -> Self {
        Self {
            key: key.into(),
            value,
            reason,
        }
    }
}

// Wire request/response bodies

#[derive(Debug, Clone, Serialize)]
pub struct ListingRequest {
    pub page: u32,
    pub size: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListingResponse<T> {
    #[serde(default)]
    pub count: usize,
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueByKeyRequest {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<EvaluationContext>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PollingRequest<'a> {
    pub context: &'a EvaluationContext,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<&'a HashMap<String, serde_json::Value>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PollingBody {
    #[serde(default)]
    pub flags: Option<Vec<FlagCollectionEntry>>,
}

/// Outcome of one poll: `flags` is `None` when the server reported no change.
#[derive(Debug, Clone, Default)]
pub struct PollingResult {
    pub flags: Option<Vec<FlagCollectionEntry>>,
    pub etag: Option<String>,
}
