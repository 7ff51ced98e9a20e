use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Status reported for failures that never produced an HTTP response.
pub const UNKNOWN_ERROR_STATUS: u16 = 500;

/// Status reported when a by-key lookup comes back empty.
pub const NOT_FOUND_STATUS: u16 = 404;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Transport errors
    UnknownError,
    InvalidResponse,
    HttpClientInit,

    // Service errors
    Application,
    FeatureFlagNotFound,

    // Evaluation errors
    UnsupportedFlagType,
    Timeout,

    // Lifecycle errors
    RuntimeUnavailable,

    // Configuration errors
    ConfigInvalidApiKey,
    ConfigInvalidBaseUrl,
    ConfigInvalidPollingInterval,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::UnknownError => "unknown_error",
            ErrorCode::InvalidResponse => "invalid_response",
            ErrorCode::HttpClientInit => "http_client_init",
            ErrorCode::Application => "application_error",
            ErrorCode::FeatureFlagNotFound => "FEATURE_FLAG_NOT_FOUND",
            ErrorCode::UnsupportedFlagType => "UNSUPPORTED_FLAG_TYPE",
            ErrorCode::Timeout => "operation_timed_out",
            ErrorCode::RuntimeUnavailable => "runtime_unavailable",
            ErrorCode::ConfigInvalidApiKey => "CONFIG_INVALID_API_KEY",
            ErrorCode::ConfigInvalidBaseUrl => "CONFIG_INVALID_BASE_URL",
            ErrorCode::ConfigInvalidPollingInterval => "CONFIG_INVALID_POLLING_INTERVAL",
        }
    }

    /// Errors that a flag lookup swallows and answers with the caller's default.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ErrorCode::UnknownError
                | ErrorCode::InvalidResponse
                | ErrorCode::Application
                | ErrorCode::FeatureFlagNotFound
                | ErrorCode::Timeout
        )
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error body the service returns alongside a non-2xx status.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error_code: Option<String>,
}

/// Normalized error envelope handed back by the flag service client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
    pub error_code: String,
    pub error_status: u16,
}

#[derive(Error, Debug)]
#[error("[{}] {message}", wire_code(.remote_code, .code))]
pub struct NumeratorError {
    pub code: ErrorCode,
    pub message: String,
    pub status: u16,
    /// Error code string reported by the service, for application errors.
    remote_code: Option<String>,
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl NumeratorError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            status: UNKNOWN_ERROR_STATUS,
            remote_code: None,
            source: None,
        }
    }

    pub fn with_source(
        code: ErrorCode,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            source: Some(Box::new(source)),
            ..Self::new(code, message)
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// Transport failure with no usable response body.
    pub fn unknown() -> Self {
        Self::new(ErrorCode::UnknownError, "Unknown Error")
    }

    /// Error reported by the service in its `{message, error_code}` body.
    ///
    /// Missing fields fall back to the unknown-error message and code.
    pub fn application(body: ErrorBody, status: u16) -> Self {
        Self {
            code: ErrorCode::Application,
            message: body.message.unwrap_or_else(|| "Unknown Error".to_string()),
            status,
            remote_code: Some(
                body.error_code
                    .unwrap_or_else(|| ErrorCode::UnknownError.as_str().to_string()),
            ),
            source: None,
        }
    }

    pub fn flag_not_found() -> Self {
        Self::new(ErrorCode::FeatureFlagNotFound, "Feature Flag not found")
            .with_status(NOT_FOUND_STATUS)
    }

    pub fn unsupported_flag_type(key: &str) -> Self {
        Self::new(
            ErrorCode::UnsupportedFlagType,
            format!("Unsupported flag type for key '{}'", key),
        )
    }

    pub fn config_error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::new(code, message)
    }

    /// Wire-compatible error code: the service's own code when it sent one.
    pub fn error_code(&self) -> &str {
        wire_code(&self.remote_code, &self.code)
    }

    pub fn error_status(&self) -> u16 {
        self.status
    }

    pub fn to_error_response(&self) -> ErrorResponse {
        ErrorResponse {
            message: self.message.clone(),
            error_code: self.error_code().to_string(),
            error_status: self.status,
        }
    }

    pub fn is_recoverable(&self) -> bool {
        self.code.is_recoverable()
    }

    pub fn is_not_found(&self) -> bool {
        self.code == ErrorCode::FeatureFlagNotFound
    }

    pub fn is_config_error(&self) -> bool {
        matches!(
            self.code,
            ErrorCode::ConfigInvalidApiKey
                | ErrorCode::ConfigInvalidBaseUrl
                | ErrorCode::ConfigInvalidPollingInterval
        )
    }
}

impl From<ErrorResponse> for NumeratorError {
    fn from(response: ErrorResponse) -> Self {
        let code = if response.error_code == ErrorCode::FeatureFlagNotFound.as_str() {
            ErrorCode::FeatureFlagNotFound
        } else {
            ErrorCode::Application
        };
        Self {
            code,
            message: response.message,
            status: response.error_status,
            remote_code: Some(response.error_code),
            source: None,
        }
    }
}

fn wire_code<'a>(remote_code: &'a Option<String>, code: &ErrorCode) -> &'a str {
    remote_code.as_deref().unwrap_or_else(|| code.as_str())
}

pub type Result<T> = std::result::Result<T, NumeratorError>;
