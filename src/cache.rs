use lru::LruCache;
use serde::Serialize;
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

use crate::result::TranslationResult;

pub const DEFAULT_CACHE_CAPACITY: usize = 200;

/// Build the key shared by the cache and the translation memory.
pub fn cache_key(source_language: &str, target_language: &str, text: &str) -> String {
    format!("{}:{}:{}", source_language, target_language, text)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub size: usize,
    pub capacity: usize,
}

/// Fixed-capacity least-recently-used cache of resolved translations.
///
/// Every operation takes the internal lock once, so each call is atomic on its
/// own; a `get` followed by a `set` is not.
pub struct BoundedCache {
    entries: Mutex<LruCache<String, TranslationResult>>,
    capacity: NonZeroUsize,
}

impl BoundedCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or_else(|| {
            warn!("Cache capacity 0 is not usable, using 1");
            NonZeroUsize::MIN
        });

        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            capacity,
        }
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<String, TranslationResult>> {
        // A panic while holding the lock cannot leave the LRU list half-updated
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Look up a key, marking it as most recently used on a hit.
    pub fn get(&self, key: &str) -> Option<TranslationResult> {
        let hit = self.lock().get(key).cloned();
        if hit.is_some() {
            debug!("Translation cache hit: {}", key);
        }
        hit
    }

    /// Store a result. Results carrying an error are never cached.
    ///
    /// Inserting a new key at capacity evicts the least recently used entry;
    /// overwriting an existing key only refreshes its recency.
    pub fn set(&self, key: &str, result: TranslationResult) {
        if result.has_error() {
            debug!("Not caching failed translation for {}", key);
            return;
        }

        if let Some((evicted, _)) = self.lock().push(key.to_string(), result) {
            if evicted != key {
                debug!("Evicted least recently used translation: {}", evicted);
            }
        }
    }

    pub fn remove(&self, key: &str) {
        self.lock().pop(key);
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            size: self.lock().len(),
            capacity: self.capacity.get(),
        }
    }
}

impl Default for BoundedCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}
