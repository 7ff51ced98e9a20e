use parking_lot::RwLock;
use std::sync::Arc;

use crate::types::{FlagCollection, FlagCollectionEntry};

struct CacheState {
    flags: Arc<FlagCollection>,
    etag: Option<String>,
}

/// Single-context flag cache plus the validator token that produced it.
///
/// Readers only ever get an immutable [`Arc`] snapshot. Every replace swaps
/// in a fresh map, so a snapshot taken earlier never changes underneath its
/// holder.
pub struct FlagCache {
    state: RwLock<CacheState>,
}

impl Default for FlagCache {
    fn default() -> Self {
        Self::new()
    }
}

impl FlagCache {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(CacheState {
                flags: Arc::new(FlagCollection::new()),
                etag: None,
            }),
        }
    }

    pub fn snapshot(&self) -> Arc<FlagCollection> {
        Arc::clone(&self.state.read().flags)
    }

    pub fn get(&self, key: &str) -> Option<FlagCollectionEntry> {
        self.state.read().flags.get(key).cloned()
    }

    pub fn has(&self, key: &str) -> bool {
        self.state.read().flags.contains_key(key)
    }

    pub fn etag(&self) -> Option<String> {
        self.state.read().etag.clone()
    }

    pub fn len(&self) -> usize {
        self.state.read().flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().flags.is_empty()
    }

    /// Replaces the whole collection and the validator token.
    ///
    /// Entries absent from `entries` are dropped; nothing is merged.
    pub fn replace(
        &self,
        entries: Vec<FlagCollectionEntry>,
        etag: Option<String>,
    ) -> Arc<FlagCollection> {
        let flags: Arc<FlagCollection> = Arc::new(
            entries
                .into_iter()
                .map(|entry| (entry.key.clone(), entry))
                .collect(),
        );

        let mut state = self.state.write();
        state.flags = Arc::clone(&flags);
        state.etag = etag;
        flags
    }

    /// Empties the collection and forgets the validator token, so the next
    /// poll asks for the full collection.
    pub fn clear(&self) {
        let mut state = self.state.write();
        state.flags = Arc::new(FlagCollection::new());
        state.etag = None;
    }
}
