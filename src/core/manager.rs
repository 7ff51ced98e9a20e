//! The flags manager: polling engine, cache and typed lookups.

use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Weak};

use super::cache::FlagCache;
use super::config::NumeratorOptions;
use super::default_context::DefaultContextStore;
use super::listeners::{
    FlagUpdatedCallback, FlagUpdatedErrorCallback, ListenerHandle, ListenerRegistry,
};
use super::polling_manager::{PollCallback, PollingConfig, PollingManager};
use crate::client::NumeratorClient;
use crate::context::EvaluationContext;
use crate::error::{NumeratorError, Result};
use crate::http::{HttpTransport, Transport};
use crate::types::{
    EvaluationReason, FlagCollection, FlagCollectionEntry, FlagConfig, FlagEvaluationDetail,
    FlagValue, FlagValueType, FlagVariationValue, ValueByKeyRequest, VariationValue,
};

const BOOLEAN_TYPES: &[FlagValueType] = &[FlagValueType::Boolean];
const NUMBER_TYPES: &[FlagValueType] = &[FlagValueType::Long, FlagValueType::Double];
const STRING_TYPES: &[FlagValueType] = &[FlagValueType::String];

/// Per-call context selection for flag lookups.
#[derive(Debug, Clone)]
pub struct LookupOptions {
    /// Attributes for this lookup only.
    pub context: Option<EvaluationContext>,
    /// Fall back to the default context when `context` is absent. Default: true
    pub use_default_context: bool,
}

impl Default for LookupOptions {
    fn default() -> Self {
        Self {
            context: None,
            use_default_context: true,
        }
    }
}

impl LookupOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_context(context: EvaluationContext) -> Self {
        Self {
            context: Some(context),
            ..Self::default()
        }
    }

    pub fn use_default_context(mut self, enabled: bool) -> Self {
        self.use_default_context = enabled;
        self
    }
}

/// Ordering state for the stale-poll guard.
#[derive(Default)]
struct PollSequence {
    /// Bumped by `stop_polling`; polls issued under an older epoch are stale.
    epoch: u64,
    issued: u64,
    applied: u64,
}

#[derive(Clone, Copy)]
struct PollTicket {
    epoch: u64,
    seq: u64,
}

struct Inner {
    client: NumeratorClient,
    options: NumeratorOptions,
    cache: FlagCache,
    default_context: DefaultContextStore,
    registered_defaults: RwLock<HashMap<String, FlagValue>>,
    update_listeners: ListenerRegistry<dyn Fn(&FlagCollection) + Send + Sync>,
    error_listeners: ListenerRegistry<dyn Fn(&FlagCollection, &NumeratorError) + Send + Sync>,
    polling: Mutex<PollingManager>,
    sequence: Mutex<PollSequence>,
}

/// Client-side flag engine.
///
/// Polls the service for the default context's flag collection, keeps it in
/// a single-context cache and answers typed lookups from that cache when the
/// lookup's context matches, falling back to a per-key network evaluation
/// and then to the caller's default.
///
/// Cloning is cheap and every clone drives the same engine. Background
/// polling holds only a weak reference, so dropping the last clone stops it.
///
/// # Example
///
/// ```rust,no_run
/// use numerator::{FlagsManager, LookupOptions, NumeratorOptions};
///
/// # async fn run() -> numerator::Result<()> {
/// let manager = FlagsManager::new(NumeratorOptions::new("sdk-key"))?;
/// manager.add_default_context_value("platform", "android");
///
/// let enabled = manager
///     .get_boolean_flag("new-checkout", false, LookupOptions::default())
///     .await;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct FlagsManager {
    inner: Arc<Inner>,
}

impl FlagsManager {
    /// Builds a manager over [`HttpTransport`].
    pub fn new(options: NumeratorOptions) -> Result<Self> {
        options.validate()?;
        let transport = Arc::new(HttpTransport::new(&options)?);
        Self::with_transport(options, transport)
    }

    /// Builds a manager over any [`Transport`], e.g. the in-memory mock.
    ///
    /// Starts polling right away when `load_polling_on_start` is set, which
    /// requires a Tokio runtime.
    pub fn with_transport(options: NumeratorOptions, transport: Arc<dyn Transport>) -> Result<Self> {
        options.validate()?;

        let inner = Inner {
            client: NumeratorClient::new(transport),
            cache: FlagCache::new(),
            default_context: DefaultContextStore::with_context(options.default_context.clone()),
            registered_defaults: RwLock::new(HashMap::new()),
            update_listeners: ListenerRegistry::new(),
            error_listeners: ListenerRegistry::new(),
            polling: Mutex::new(PollingManager::new(PollingConfig::from(&options))),
            sequence: Mutex::new(PollSequence::default()),
            options,
        };
        let manager = Self {
            inner: Arc::new(inner),
        };

        if manager.inner.options.load_polling_on_start {
            manager.start_polling()?;
        }

        Ok(manager)
    }

    pub fn options(&self) -> &NumeratorOptions {
        &self.inner.options
    }

    pub fn client(&self) -> &NumeratorClient {
        &self.inner.client
    }

    // Polling lifecycle

    /// Starts background polling, replacing any timer already running.
    pub fn start_polling(&self) -> Result<()> {
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        let on_poll: PollCallback = Arc::new(move || {
            let weak = weak.clone();
            Box::pin(async move {
                if let Some(inner) = weak.upgrade() {
                    FlagsManager { inner }.fetch_polling_feature_flag().await;
                }
            })
        });

        self.inner.polling.lock().start(on_poll)
    }

    /// Stops the timer and empties the cache.
    ///
    /// Polls already in flight still complete; with `discard_stale_polls`
    /// their results are dropped instead of repopulating the cache.
    pub fn stop_polling(&self) {
        self.inner.polling.lock().stop();
        self.inner.sequence.lock().epoch += 1;
        self.inner.cache.clear();
        tracing::debug!("Polling stopped, flag cache cleared");
    }

    pub fn restart_polling(&self) -> Result<()> {
        self.stop_polling();
        self.start_polling()
    }

    pub fn is_polling(&self) -> bool {
        self.inner.polling.lock().is_running()
    }

    /// Runs one poll cycle for the current default context.
    ///
    /// A changed collection replaces the cache and notifies update
    /// listeners. An unchanged one is a no-op. A failure leaves the cache
    /// alone and notifies error listeners with the current collection.
    pub async fn fetch_polling_feature_flag(&self) {
        let ticket = self.issue_ticket();
        let context = self.inner.default_context.get();
        let etag = self.inner.cache.etag();

        let result = self
            .inner
            .client
            .poll_collection(
                &context,
                self.inner.options.properties.as_ref(),
                etag.as_deref(),
            )
            .await;

        match result {
            Ok(polled) => match polled.flags {
                Some(flags) => {
                    if let Some(published) = self.apply_poll(ticket, flags, polled.etag) {
                        tracing::debug!("Flag collection updated with {} flags", published.len());
                        for listener in self.inner.update_listeners.snapshot() {
                            listener(&published);
                        }
                    }
                }
                None => tracing::debug!("Flag collection unchanged"),
            },
            Err(error) => {
                tracing::warn!("Polling feature flags failed: {}", error);
                let current = self.inner.cache.snapshot();
                for listener in self.inner.error_listeners.snapshot() {
                    listener(&current, &error);
                }
            }
        }
    }

    fn issue_ticket(&self) -> PollTicket {
        let mut sequence = self.inner.sequence.lock();
        sequence.issued += 1;
        PollTicket {
            epoch: sequence.epoch,
            seq: sequence.issued,
        }
    }

    fn apply_poll(
        &self,
        ticket: PollTicket,
        flags: Vec<FlagCollectionEntry>,
        etag: Option<String>,
    ) -> Option<Arc<FlagCollection>> {
        let mut sequence = self.inner.sequence.lock();

        if self.inner.options.discard_stale_polls
            && (ticket.epoch != sequence.epoch || ticket.seq < sequence.applied)
        {
            tracing::debug!("Discarding stale poll response #{}", ticket.seq);
            return None;
        }

        sequence.applied = sequence.applied.max(ticket.seq);
        Some(self.inner.cache.replace(flags, etag))
    }

    // Listeners

    /// Registers a callback fired after each cache replacement.
    pub fn handle_flag_updated<F>(&self, callback: F) -> ListenerHandle
    where
        F: Fn(&FlagCollection) + Send + Sync + 'static,
    {
        let callback: FlagUpdatedCallback = Arc::new(callback);
        self.inner.update_listeners.register(callback)
    }

    /// Registers a callback fired when a poll fails.
    pub fn handle_flag_updated_error<F>(&self, callback: F) -> ListenerHandle
    where
        F: Fn(&FlagCollection, &NumeratorError) + Send + Sync + 'static,
    {
        let callback: FlagUpdatedErrorCallback = Arc::new(callback);
        self.inner.error_listeners.register(callback)
    }

    // Cache inspection

    pub fn cache_flags(&self) -> Arc<FlagCollection> {
        self.inner.cache.snapshot()
    }

    pub fn cached_flag(&self, key: &str) -> Option<FlagCollectionEntry> {
        self.inner.cache.get(key)
    }

    pub fn current_etag(&self) -> Option<String> {
        self.inner.cache.etag()
    }

    // Default context

    pub fn default_context(&self) -> Arc<EvaluationContext> {
        self.inner.default_context.get()
    }

    pub fn clear_default_context(&self) {
        self.inner.default_context.clear()
    }

    pub fn add_default_context_value(&self, key: impl Into<String>, value: impl Into<Value>) {
        self.inner.default_context.add(key, value)
    }

    pub fn remove_default_context_value(&self, key: &str) {
        self.inner.default_context.remove(key)
    }

    // Pass-through service calls

    /// Every flag config the service knows about.
    pub async fn feature_flags(&self) -> Result<Vec<FlagConfig>> {
        self.inner.client.all_flag_configs().await
    }

    /// Evaluates `key` on the service for exactly `context`.
    pub async fn flag_value_by_key(
        &self,
        key: &str,
        context: Option<EvaluationContext>,
    ) -> Result<FlagVariationValue> {
        let request = ValueByKeyRequest {
            key: key.to_string(),
            context,
        };
        self.inner.client.evaluate_by_key(&request).await
    }

    // Typed lookups

    pub async fn get_boolean_flag(&self, key: &str, default: bool, options: LookupOptions) -> bool {
        self.boolean_flag_detail(key, default, options).await.value
    }

    pub async fn get_number_flag(&self, key: &str, default: f64, options: LookupOptions) -> f64 {
        self.number_flag_detail(key, default, options).await.value
    }

    pub async fn get_string_flag(&self, key: &str, default: &str, options: LookupOptions) -> String {
        self.string_flag_detail(key, default, options).await.value
    }

    /// Boolean lookup with the source of the answer.
    pub async fn boolean_flag_detail(
        &self,
        key: &str,
        default: bool,
        options: LookupOptions,
    ) -> FlagEvaluationDetail<bool> {
        self.lookup(key, default, false, &options, BOOLEAN_TYPES, VariationValue::as_bool)
            .await
    }

    pub async fn number_flag_detail(
        &self,
        key: &str,
        default: f64,
        options: LookupOptions,
    ) -> FlagEvaluationDetail<f64> {
        self.lookup(key, default, 0.0, &options, NUMBER_TYPES, VariationValue::as_number)
            .await
    }

    pub async fn string_flag_detail(
        &self,
        key: &str,
        default: &str,
        options: LookupOptions,
    ) -> FlagEvaluationDetail<String> {
        self.lookup(
            key,
            default.to_string(),
            String::new(),
            &options,
            STRING_TYPES,
            |value: &VariationValue| value.as_str().map(str::to_string),
        )
        .await
    }

    /// Always evaluates on the service, never consulting the cache.
    pub async fn boolean_flag_variation_detail(
        &self,
        key: &str,
        default: bool,
        options: LookupOptions,
    ) -> FlagEvaluationDetail<bool> {
        self.evaluate_remote(key, default, false, &options, VariationValue::as_bool)
            .await
    }

    pub async fn number_flag_variation_detail(
        &self,
        key: &str,
        default: f64,
        options: LookupOptions,
    ) -> FlagEvaluationDetail<f64> {
        self.evaluate_remote(key, default, 0.0, &options, VariationValue::as_number)
            .await
    }

    pub async fn string_flag_variation_detail(
        &self,
        key: &str,
        default: &str,
        options: LookupOptions,
    ) -> FlagEvaluationDetail<String> {
        self.evaluate_remote(
            key,
            default.to_string(),
            String::new(),
            &options,
            |value: &VariationValue| value.as_str().map(str::to_string),
        )
        .await
    }

    /// Registers the default `get_feature_flag` uses when called without one.
    pub fn init_feature_flag(&self, key: impl Into<String>, default: impl Into<FlagValue>) {
        self.inner
            .registered_defaults
            .write()
            .insert(key.into(), default.into());
    }

    /// Lookup whose kind follows the default's kind.
    ///
    /// Without a default, the one registered via [`init_feature_flag`] is
    /// used; with neither the kind is unknown and the call fails.
    ///
    /// [`init_feature_flag`]: FlagsManager::init_feature_flag
    pub async fn get_feature_flag(
        &self,
        key: &str,
        default: Option<FlagValue>,
        options: LookupOptions,
    ) -> Result<FlagValue> {
        let default = match default {
            Some(default) => default,
            None => self
                .inner
                .registered_defaults
                .read()
                .get(key)
                .cloned()
                .ok_or_else(|| NumeratorError::unsupported_flag_type(key))?,
        };

        Ok(match default {
            FlagValue::Boolean(b) => FlagValue::Boolean(self.get_boolean_flag(key, b, options).await),
            FlagValue::Number(n) => FlagValue::Number(self.get_number_flag(key, n, options).await),
            FlagValue::String(s) => FlagValue::String(self.get_string_flag(key, &s, options).await),
        })
    }

    async fn lookup<T, E>(
        &self,
        key: &str,
        default: T,
        zero: T,
        options: &LookupOptions,
        accepted: &[FlagValueType],
        extract: E,
    ) -> FlagEvaluationDetail<T>
    where
        E: Fn(&VariationValue) -> Option<T>,
    {
        if let Some(entry) = self.cached_entry(key, options) {
            // The type tag picks the field; other fields on the entry are ignored.
            let value = accepted
                .contains(&entry.value_type)
                .then(|| extract(&entry.value))
                .flatten();
            return match value {
                Some(value) => FlagEvaluationDetail::new(key, value, EvaluationReason::Cached),
                None => FlagEvaluationDetail::new(key, default, EvaluationReason::Default),
            };
        }

        self.evaluate_remote(key, default, zero, options, extract)
            .await
    }

    async fn evaluate_remote<T, E>(
        &self,
        key: &str,
        default: T,
        zero: T,
        options: &LookupOptions,
        extract: E,
    ) -> FlagEvaluationDetail<T>
    where
        E: Fn(&VariationValue) -> Option<T>,
    {
        let request = ValueByKeyRequest {
            key: key.to_string(),
            context: Some(self.request_context(options)),
        };

        match self.inner.client.evaluate_by_key(&request).await {
            Ok(variation) => {
                let value = extract(&variation.value).unwrap_or(zero);
                FlagEvaluationDetail::new(key, value, EvaluationReason::Server)
            }
            Err(error) => {
                tracing::warn!("Evaluating flag '{}' failed, using default: {}", key, error);
                FlagEvaluationDetail::new(key, default, EvaluationReason::Default)
            }
        }
    }

    /// The cache only serves lookups whose explicit context equals the
    /// default context it was polled for.
    fn cached_entry(&self, key: &str, options: &LookupOptions) -> Option<FlagCollectionEntry> {
        let context = options.context.as_ref()?;
        if *context != *self.inner.default_context.get() {
            return None;
        }
        self.inner.cache.get(key)
    }

    /// The explicit context when given, else the default context unless
    /// the caller opted out. Never a merge of the two.
    fn request_context(&self, options: &LookupOptions) -> EvaluationContext {
        match &options.context {
            Some(context) => context.clone(),
            None if options.use_default_context => {
                EvaluationContext::clone(&self.inner.default_context.get())
            }
            None => EvaluationContext::new(),
        }
    }
}
