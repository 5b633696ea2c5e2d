//! In-memory caches: a TTL response cache and a bounded memo for lookups
//! whose answers never change (timezone by coordinates, image by title).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Entry count at which a write first sweeps expired entries.
pub const DEFAULT_PRUNE_THRESHOLD: usize = 512;

#[derive(Debug, Clone)]
struct CacheEntry {
    body: String,
    expires_at: Instant,
}

#[derive(Debug)]
struct CacheInner {
    map: HashMap<String, CacheEntry>,
    enabled: bool,
    prune_at: usize,
}

impl CacheInner {
    fn get(&self, key: &str) -> Option<String> {
        self.map.get(key).and_then(|entry| {
            if Instant::now() <= entry.expires_at {
                Some(entry.body.clone())
            } else {
                None
            }
        })
    }

    fn put(&mut self, key: String, body: String, ttl: Duration) {
        if self.map.len() >= self.prune_at && !self.map.contains_key(&key) {
            let before = self.map.len();
            self.clear_expired();
            tracing::debug!(before, after = self.map.len(), "pruned expired responses");
        }
        let expires_at = Instant::now() + ttl;
        self.map.insert(key, CacheEntry { body, expires_at });
    }

    fn clear_expired(&mut self) {
        let now = Instant::now();
        self.map.retain(|_, entry| entry.expires_at > now);
    }
}

/// Thread-safe cache of successful response bodies keyed by request URL.
///
/// Each provider writes with its own revalidation horizon, from 15 seconds
/// for live timing up to a day for geocoding.
#[derive(Debug, Clone)]
pub struct ResponseCache {
    inner: Arc<tokio::sync::RwLock<CacheInner>>,
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::with_settings(true, DEFAULT_PRUNE_THRESHOLD)
    }

    /// A cache that never stores anything.
    pub fn disabled() -> Self {
        Self::with_settings(false, DEFAULT_PRUNE_THRESHOLD)
    }

    fn with_settings(enabled: bool, prune_at: usize) -> Self {
        Self {
            inner: Arc::new(tokio::sync::RwLock::new(CacheInner {
                map: HashMap::new(),
                enabled,
                prune_at,
            })),
        }
    }

    /// An enabled cache that sweeps expired entries on writes once `entries`
    /// are stored.
    pub fn with_prune_threshold(entries: usize) -> Self {
        Self::with_settings(true, entries.max(1))
    }

    /// Returns the cached body if present and not expired.
    pub async fn get(&self, key: &str) -> Option<String> {
        let store = self.inner.read().await;
        store.get(key)
    }

    /// Stores `body` for `ttl`. No-op when disabled or `ttl` is zero.
    pub async fn put(&self, key: String, body: String, ttl: Duration) {
        let mut store = self.inner.write().await;
        if !store.enabled || ttl.is_zero() {
            return;
        }
        store.put(key, body, ttl);
    }

    pub async fn clear_expired(&self) {
        let mut store = self.inner.write().await;
        store.clear_expired();
    }

    /// Number of entries, expired ones included.
    pub async fn len(&self) -> usize {
        self.inner.read().await.map.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Process-lifetime memo with a bounded key space and no eviction.
///
/// Once `capacity` keys are stored, new keys are not remembered; existing
/// keys keep answering. Writes are idempotent so concurrent fills are harmless.
#[derive(Debug, Clone)]
pub struct MemoCache<V> {
    inner: Arc<tokio::sync::RwLock<HashMap<String, V>>>,
    capacity: usize,
}

impl<V: Clone> MemoCache<V> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Arc::new(tokio::sync::RwLock::new(HashMap::new())),
            capacity,
        }
    }

    /// Starts with `entries` already remembered, up to `capacity` of them.
    pub fn seeded(capacity: usize, entries: impl IntoIterator<Item = (String, V)>) -> Self {
        let mut map = HashMap::new();
        for (key, value) in entries {
            if map.len() >= capacity && !map.contains_key(&key) {
                break;
            }
            map.insert(key, value);
        }
        Self {
            inner: Arc::new(tokio::sync::RwLock::new(map)),
            capacity,
        }
    }

    pub async fn get(&self, key: &str) -> Option<V> {
        self.inner.read().await.get(key).cloned()
    }

    /// Remembers `value`; returns `false` when the key space is full.
    pub async fn insert(&self, key: impl Into<String>, value: V) -> bool {
        let key = key.into();
        let mut map = self.inner.write().await;
        if map.len() >= self.capacity && !map.contains_key(&key) {
            tracing::debug!(capacity = self.capacity, key = %key, "memo cache full; not storing");
            return false;
        }
        map.insert(key, value);
        true
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}
