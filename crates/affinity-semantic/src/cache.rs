//! In-process embedding cache keyed by normalized text.
//!
//! Bounded by entry count with no eviction: once full, new texts are still
//! embedded but not admitted, so cold texts are recomputed on every lookup.
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tracing::debug;

/// Cache key for `text`: trimmed and lowercased.
pub fn normalize_text(text: &str) -> String {
    text.trim().to_lowercase()
}

pub struct EmbeddingCache {
    entries: RwLock<HashMap<String, Arc<Vec<f32>>>>,
    capacity: usize,
}

impl EmbeddingCache {
    pub fn new(capacity: usize) -> Self {
        Self { entries: RwLock::new(HashMap::new()), capacity }
    }

    pub fn capacity(&self) -> usize { self.capacity }

    /// A poisoned lock reads as a miss.
    pub fn get(&self, key: &str) -> Option<Arc<Vec<f32>>> {
        self.entries.read().ok()?.get(key).cloned()
    }

    /// Store `vector` under `key` unless the cache is full. Re-writing an
    /// existing key is always allowed. Returns whether the entry is cached.
    pub fn insert(&self, key: String, vector: Arc<Vec<f32>>) -> bool {
        let Ok(mut entries) = self.entries.write() else { return false };
        if !entries.contains_key(&key) && entries.len() >= self.capacity {
            debug!(capacity = self.capacity, "embedding cache full; not admitting entry");
            return false;
        }
        entries.insert(key, vector);
        true
    }

    /// `None` when the lock is poisoned.
    pub fn len(&self) -> Option<usize> {
        self.entries.read().ok().map(|e| e.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len().unwrap_or(0) == 0
    }

    pub fn clear(&self) {
        match self.entries.write() {
            Ok(mut entries) => entries.clear(),
            Err(poisoned) => poisoned.into_inner().clear(),
        }
    }
}
