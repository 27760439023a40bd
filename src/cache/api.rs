//! Request-coalescing cache for API calls
//!
//! [`ApiCache::get`] serves a cached value when one is live, and otherwise
//! makes sure at most one fetch per key is in flight: callers that arrive while
//! a fetch is pending await the same shared result instead of starting their
//! own.
//!
//! ```rust
//! use lullaby_core::cache::ApiCache;
//!
//! # async fn example() -> lullaby_core::Result<()> {
//! let api: ApiCache<Vec<String>> = ApiCache::new();
//!
//! let sessions = api
//!     .get("sessions:u42", || async { anyhow::Ok(vec!["Evening calm".to_string()]) }, None)
//!     .await?;
//! assert_eq!(sessions.len(), 1);
//!
//! // After a mutation, drop everything cached for this user
//! api.invalidate("u42").await;
//! # Ok(())
//! # }
//! ```

use crate::cache::{
    config::CacheConfig,
    invalidation::InvalidationEvent,
    store::MemoryCache,
    types::{CacheKey, CacheStats},
};
use crate::error::{CoreError, Result};
use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

type FetchResult<T> = std::result::Result<T, Arc<anyhow::Error>>;
type SharedFetch<T> = Shared<BoxFuture<'static, FetchResult<T>>>;

/// A fetch that callers can join
struct PendingFetch<T> {
    /// Distinguishes this fetch from a later one for the same key
    id: u64,
    future: SharedFetch<T>,
}

type PendingMap<T> = Arc<Mutex<HashMap<CacheKey, PendingFetch<T>>>>;

/// API response cache with at-most-one in-flight fetch per key
pub struct ApiCache<T> {
    cache: MemoryCache<T>,
    pending: PendingMap<T>,
    next_id: AtomicU64,
}

impl<T> Default for ApiCache<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ApiCache<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Cache with the default API settings (5 minutes, 200 entries)
    pub fn new() -> Self {
        Self::with_config(CacheConfig::api())
    }

    pub fn with_config(config: CacheConfig) -> Self {
        info!(
            "Initializing API cache (ttl: {:?}, capacity: {})",
            config.default_ttl, config.max_entries
        );

        Self {
            cache: MemoryCache::new(config),
            pending: Arc::new(Mutex::new(HashMap::new())),
            next_id: AtomicU64::new(0),
        }
    }

    /// Return the cached value for `key`, or the result of `fetcher`.
    ///
    /// The fetch runs on its own task, so it completes (and populates the
    /// cache) even if every caller stops waiting. Only successes are cached.
    /// On failure every waiting caller receives the same error and the next
    /// call starts a fresh fetch.
    pub async fn get<F, Fut>(&self, key: &str, fetcher: F, ttl: Option<Duration>) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        let shared = {
            let mut pending = self.pending.lock().await;

            if let Some(value) = self.cache.lookup(key).await {
                return Ok(value);
            }

            match pending.get(key) {
                Some(inflight) => {
                    debug!("Joining in-flight request: {}", key);
                    inflight.future.clone()
                }
                None => {
                    let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                    debug!("Starting request {} for {}", id, key);

                    let future = self.spawn_fetch(key, id, fetcher(), ttl);
                    pending.insert(
                        key.to_string(),
                        PendingFetch {
                            id,
                            future: future.clone(),
                        },
                    );
                    future
                }
            }
        };

        shared.await.map_err(CoreError::Fetch)
    }

    fn spawn_fetch<Fut>(&self, key: &str, id: u64, fetch: Fut, ttl: Option<Duration>) -> SharedFetch<T>
    where
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        let cache = self.cache.clone();
        let pending = self.pending.clone();
        let key = key.to_string();

        let task = {
            let pending = pending.clone();
            let key = key.clone();
            tokio::spawn(async move {
                let result = fetch.await;
                match &result {
                    Ok(value) => cache.insert(&key, value.clone(), ttl).await,
                    Err(e) => warn!("Request for {} failed: {}", key, e),
                }
                release(&pending, &key, id).await;
                result.map_err(Arc::new)
            })
        };

        async move {
            match task.await {
                Ok(result) => result,
                Err(e) => {
                    // The task died before it could clean up after itself
                    release(&pending, &key, id).await;
                    Err(Arc::new(anyhow::anyhow!("request task for {} failed: {}", key, e)))
                }
            }
        }
        .boxed()
        .shared()
    }

    /// Delete every cached key containing `pattern` as a substring.
    ///
    /// Requests already in flight are not affected and will still populate
    /// the cache when they finish.
    pub async fn invalidate(&self, pattern: &str) -> InvalidationEvent {
        let event = self.cache.remove_matching(pattern).await;
        info!("Invalidated {} API cache entries matching '{}'", event.count(), pattern);
        event
    }

    /// Drop every cached value and forget in-flight requests
    pub async fn clear(&self) {
        let mut pending = self.pending.lock().await;
        pending.clear();
        self.cache.clear_all().await;
    }

    /// Number of requests currently in flight
    pub async fn pending_count(&self) -> usize {
        self.pending.lock().await.len()
    }

    pub async fn stats(&self) -> CacheStats {
        self.cache.stats().await
    }

    /// The underlying response store
    pub fn cache(&self) -> &MemoryCache<T> {
        &self.cache
    }
}

/// Remove the pending entry for `key` if it still belongs to fetch `id`
async fn release<T>(pending: &PendingMap<T>, key: &str, id: u64) {
    let mut pending = pending.lock().await;
    if pending.get(key).map(|p| p.id == id).unwrap_or(false) {
        pending.remove(key);
    }
}
