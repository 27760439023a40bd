//! The cache store contract and the volatile in-process store

use crate::cache::{
    config::CacheConfig,
    entry::CacheEntry,
    invalidation::{InvalidationEvent, InvalidationReason},
    types::{CacheKey, CacheStats},
};
use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Operations shared by every cache backend.
///
/// Writes never fail from the caller's point of view: backends that can fail
/// underneath log the problem and behave as if nothing was written.
pub trait CacheBackend<T>: Send + Sync {
    /// Store `value` under `key`, replacing any entry and resetting its hits.
    /// `None` (or a zero TTL) uses the store's default.
    fn set(&self, key: &str, value: T, ttl: Option<Duration>) -> impl Future<Output = ()> + Send;

    /// Read a value. Expired entries are deleted and reported as absent;
    /// successful reads increment the entry's hit count.
    fn get(&self, key: &str) -> impl Future<Output = Option<T>> + Send;

    /// Existence check with the same side effects as [`get`](Self::get).
    fn has(&self, key: &str) -> impl Future<Output = bool> + Send {
        async move { self.get(key).await.is_some() }
    }

    /// Existence check without side effects: no hit increment, no deletion.
    fn peek(&self, key: &str) -> impl Future<Output = bool> + Send;

    /// Remove an entry; returns whether one was removed.
    fn delete(&self, key: &str) -> impl Future<Output = bool> + Send;

    /// Remove every entry owned by this store.
    fn clear(&self) -> impl Future<Output = ()> + Send;

    /// Number of stored entries, expired ones included.
    fn len(&self) -> impl Future<Output = usize> + Send;

    /// Stored keys in no particular order.
    fn keys(&self) -> impl Future<Output = Vec<CacheKey>> + Send;
}

/// Resolve the TTL for a write. Zero means "use the default".
pub(crate) fn effective_ttl(ttl: Option<Duration>, default: impl FnOnce() -> Duration) -> Duration {
    match ttl {
        Some(ttl) if !ttl.is_zero() => ttl,
        _ => default(),
    }
}

/// Volatile cache with TTL expiry and a capacity bound
///
/// Capacity eviction removes the front of an eviction queue. By default the
/// queue is in insertion order (overwrites keep their slot), which is a plain
/// capacity bound and not LRU. With `enable_lru_eviction` reads move entries
/// to the back, giving least-recently-used eviction.
pub struct MemoryCache<T> {
    config: CacheConfig,

    /// Internal storage
    store: Arc<RwLock<MemoryStore<T>>>,
}

/// Internal cache storage
struct MemoryStore<T> {
    /// Main storage: key -> entry
    entries: HashMap<CacheKey, CacheEntry<T>>,

    /// Eviction order, front is evicted first
    order: VecDeque<CacheKey>,

    /// Running counters; `size` and `hits` are computed on demand
    stats: CacheStats,
}

impl<T> MemoryStore<T> {
    fn remove_entry(&mut self, key: &str) -> Option<CacheEntry<T>> {
        let entry = self.entries.remove(key)?;
        self.order.retain(|k| k != key);
        Some(entry)
    }

    fn touch(&mut self, key: &str) {
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            if let Some(k) = self.order.remove(pos) {
                self.order.push_back(k);
            }
        }
    }
}

impl<T> Clone for MemoryCache<T> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            store: self.store.clone(),
        }
    }
}

impl<T> MemoryCache<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create a new cache with the given configuration
    pub fn new(config: CacheConfig) -> Self {
        info!("Initializing memory cache with config: {:?}", config);

        let store = MemoryStore {
            entries: HashMap::new(),
            order: VecDeque::new(),
            stats: CacheStats::default(),
        };

        Self {
            config,
            store: Arc::new(RwLock::new(store)),
        }
    }

    /// The configuration this cache was built with
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Insert a value into the cache
    pub async fn insert(&self, key: &str, value: T, ttl: Option<Duration>) {
        let ttl = effective_ttl(ttl, || self.config.ttl_with_jitter());
        let entry = CacheEntry::new(value, ttl);

        let mut store = self.store.write().await;

        if let Some(existing) = store.entries.get_mut(key) {
            debug!("Updating existing cache entry: {}", key);
            *existing = entry;
            if self.config.enable_lru_eviction {
                store.touch(key);
            }
            return;
        }

        while store.entries.len() >= self.config.max_entries {
            let Some(oldest) = store.order.pop_front() else {
                break;
            };
            if store.entries.remove(&oldest).is_some() {
                debug!("Evicting entry ({}): {}", InvalidationReason::Capacity, oldest);
                store.stats.evictions_capacity += 1;
            }
        }

        debug!("Inserting new cache entry: {}", key);
        store.entries.insert(key.to_string(), entry);
        store.order.push_back(key.to_string());
    }

    /// Get a value from the cache
    pub async fn lookup(&self, key: &str) -> Option<T> {
        let mut store = self.store.write().await;

        let expired = match store.entries.get(key).map(|entry| entry.is_expired()) {
            Some(expired) => expired,
            None => {
                debug!("Cache miss: {}", key);
                store.stats.misses += 1;
                return None;
            }
        };

        if expired {
            debug!("Cache entry expired: {}", key);
            store.remove_entry(key);
            store.stats.misses += 1;
            store.stats.evictions_ttl += 1;
            return None;
        }

        let entry = store.entries.get_mut(key)?;
        entry.mark_hit();
        let value = entry.value.clone();

        if self.config.enable_lru_eviction {
            store.touch(key);
        }

        debug!("Cache hit: {}", key);
        Some(value)
    }

    /// Check for a live entry without touching hit counts or evicting it
    pub async fn contains_key(&self, key: &str) -> bool {
        let store = self.store.read().await;
        store
            .entries
            .get(key)
            .map(|entry| !entry.is_expired())
            .unwrap_or(false)
    }

    /// Remove a specific entry from the cache
    pub async fn remove(&self, key: &str) -> Option<T> {
        let mut store = self.store.write().await;
        let entry = store.remove_entry(key)?;
        store.stats.invalidations += 1;
        debug!("Removed cache entry ({}): {}", InvalidationReason::Manual, key);
        Some(entry.value)
    }

    /// Clear all entries from the cache
    pub async fn clear_all(&self) -> InvalidationEvent {
        let mut store = self.store.write().await;

        let keys: Vec<CacheKey> = store.order.drain(..).collect();
        store.entries.clear();
        store.stats.invalidations += keys.len() as u64;

        info!("Cleared {} entries from cache", keys.len());
        InvalidationEvent::new(InvalidationReason::Cleared, keys)
    }

    /// Remove every entry whose key contains `pattern` as a substring
    pub async fn remove_matching(&self, pattern: &str) -> InvalidationEvent {
        let mut store = self.store.write().await;

        let keys: Vec<CacheKey> = store
            .entries
            .keys()
            .filter(|key| key.contains(pattern))
            .cloned()
            .collect();

        for key in &keys {
            store.remove_entry(key);
        }
        store.stats.invalidations += keys.len() as u64;

        let event = InvalidationEvent::new(
            InvalidationReason::PatternMatch {
                pattern: pattern.to_string(),
            },
            keys,
        );
        debug!("Invalidated {} entries ({})", event.count(), event.reason);
        event
    }

    /// Remove all expired entries.
    ///
    /// Reads already drop expired entries lazily; this lets a caller reclaim
    /// memory held by entries nobody reads any more.
    pub async fn purge_expired(&self) -> InvalidationEvent {
        let mut store = self.store.write().await;

        let keys: Vec<CacheKey> = store
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect();

        for key in &keys {
            store.remove_entry(key);
        }
        store.stats.evictions_ttl += keys.len() as u64;

        if !keys.is_empty() {
            debug!("Purged {} expired entries", keys.len());
        }
        InvalidationEvent::new(InvalidationReason::Expired, keys)
    }

    /// Get cache statistics
    pub async fn stats(&self) -> CacheStats {
        let store = self.store.read().await;
        CacheStats {
            size: store.entries.len(),
            hits: store.entries.values().map(|entry| entry.hits).sum(),
            ..store.stats.clone()
        }
    }

    /// Hit count of a single entry, if present
    pub async fn hits_for(&self, key: &str) -> Option<u64> {
        let store = self.store.read().await;
        store.entries.get(key).map(|entry| entry.hits)
    }

    /// Get number of entries in cache
    pub async fn entry_count(&self) -> usize {
        self.store.read().await.entries.len()
    }

    /// Check if cache is empty
    pub async fn is_empty(&self) -> bool {
        self.store.read().await.entries.is_empty()
    }
}

impl<T> CacheBackend<T> for MemoryCache<T>
where
    T: Clone + Send + Sync + 'static,
{
    async fn set(&self, key: &str, value: T, ttl: Option<Duration>) {
        self.insert(key, value, ttl).await
    }

    async fn get(&self, key: &str) -> Option<T> {
        self.lookup(key).await
    }

    async fn peek(&self, key: &str) -> bool {
        self.contains_key(key).await
    }

    async fn delete(&self, key: &str) -> bool {
        self.remove(key).await.is_some()
    }

    async fn clear(&self) {
        self.clear_all().await;
    }

    async fn len(&self) -> usize {
        self.entry_count().await
    }

    async fn keys(&self) -> Vec<CacheKey> {
        self.store.read().await.order.iter().cloned().collect()
    }
}
