use std::collections::HashMap;
use std::time::Duration;

use crate::context::EvaluationContext;
use crate::error::{ErrorCode, NumeratorError, Result};

pub const DEFAULT_BASE_URL: &str = "https://service-platform.numerator.io";
pub const DEFAULT_POLLING_INTERVAL: Duration = Duration::from_secs(30);
pub const DEFAULT_STARTUP_DELAY: Duration = Duration::from_millis(10);
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct NumeratorOptions {
    pub api_key: String,
    pub base_url: String,
    pub polling_interval: Duration,
    /// Grace delay before the first poll after polling starts.
    pub startup_delay: Duration,
    pub timeout: Duration,
    pub default_context: EvaluationContext,
    pub properties: Option<HashMap<String, serde_json::Value>>,
    pub load_polling_on_start: bool,
    /// Drop poll responses that started before the last `stop_polling` or
    /// that lost the race to a later poll.
    pub discard_stale_polls: bool,
}

impl NumeratorOptions {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            polling_interval: DEFAULT_POLLING_INTERVAL,
            startup_delay: DEFAULT_STARTUP_DELAY,
            timeout: DEFAULT_TIMEOUT,
            default_context: EvaluationContext::new(),
            properties: None,
            load_polling_on_start: true,
            discard_stale_polls: false,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(NumeratorError::config_error(
                ErrorCode::ConfigInvalidApiKey,
                "API key is required",
            ));
        }

        if url::Url::parse(&self.base_url).is_err() {
            return Err(NumeratorError::config_error(
                ErrorCode::ConfigInvalidBaseUrl,
                format!("Invalid base URL: {}", self.base_url),
            ));
        }

        if self.polling_interval.is_zero() {
            return Err(NumeratorError::config_error(
                ErrorCode::ConfigInvalidPollingInterval,
                "Polling interval must be positive",
            ));
        }

        Ok(())
    }

    pub fn builder(api_key: impl Into<String>) -> NumeratorOptionsBuilder {
        NumeratorOptionsBuilder::new(api_key)
    }
}

pub struct NumeratorOptionsBuilder {
    options: NumeratorOptions,
}

impl NumeratorOptionsBuilder {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            options: NumeratorOptions::new(api_key),
        }
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.options.base_url = url.into();
        self
    }

    pub fn polling_interval(mut self, interval: Duration) -> Self {
        self.options.polling_interval = interval;
        self
    }

    pub fn startup_delay(mut self, delay: Duration) -> Self {
        self.options.startup_delay = delay;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.options.timeout = timeout;
        self
    }

    pub fn default_context(mut self, context: EvaluationContext) -> Self {
        self.options.default_context = context;
        self
    }

    pub fn properties(mut self, properties: HashMap<String, serde_json::Value>) -> Self {
        self.options.properties = Some(properties);
        self
    }

    pub fn load_polling_on_start(mut self, enabled: bool) -> Self {
        self.options.load_polling_on_start = enabled;
        self
    }

    pub fn discard_stale_polls(mut self, enabled: bool) -> Self {
        self.options.discard_stale_polls = enabled;
        self
    }

    pub fn build(self) -> NumeratorOptions {
        self.options
    }
}
