//! Default evaluation context shared by polling and cached lookups.

use parking_lot::RwLock;
use serde_json::Value;
use std::sync::Arc;

use crate::context::EvaluationContext;

/// Holds the context the engine polls for.
///
/// Every mutation publishes a new [`Arc`], so a reader holding an earlier
/// snapshot keeps seeing the old attributes and can tell a change happened
/// with [`Arc::ptr_eq`].
///
/// # Example
///
/// ```rust
/// use numerator::core::DefaultContextStore;
///
/// let store = DefaultContextStore::new();
/// store.add("platform", "android");
///
/// assert_eq!(store.get().get("platform"), Some(&serde_json::json!("android")));
/// ```
pub struct DefaultContextStore {
    context: RwLock<Arc<EvaluationContext>>,
}

impl Default for DefaultContextStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DefaultContextStore {
    pub fn new() -> Self {
        Self::with_context(EvaluationContext::new())
    }

    pub fn with_context(context: EvaluationContext) -> Self {
        Self {
            context: RwLock::new(Arc::new(context)),
        }
    }

    /// Current snapshot of the default context.
    pub fn get(&self) -> Arc<EvaluationContext> {
        Arc::clone(&self.context.read())
    }

    pub fn clear(&self) {
        *self.context.write() = Arc::new(EvaluationContext::new());
        tracing::debug!("Default context cleared");
    }

    /// Sets one attribute, replacing any previous value for `key`.
    pub fn add(&self, key: impl Into<String>, value: impl Into<Value>) {
        let mut guard = self.context.write();
        let mut next = EvaluationContext::clone(&guard);
        next.insert(key, value);
        *guard = Arc::new(next);
    }

    /// Removes one attribute. Absent keys leave the snapshot untouched.
    pub fn remove(&self, key: &str) {
        let mut guard = self.context.write();
        if !guard.contains_key(key) {
            return;
        }
        let mut next = EvaluationContext::clone(&guard);
        next.remove(key);
        *guard = Arc::new(next);
    }
}
