//! Strategy-routed façade over the three cache backends
//!
//! Every call names (or defaults to) a [`CacheStrategy`] and goes to exactly
//! one backend. A miss in one backend is a miss; the others are never
//! consulted.

use crate::cache::{
    config::{CacheConfig, DurableConfig},
    persistent::PersistentCache,
    storage::{KeyValueStorage, MemoryStorage},
    store::{CacheBackend, MemoryCache},
    types::{CacheStrategy, ManagerStats},
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Where and for how long a value is cached
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheOptions {
    pub strategy: CacheStrategy,
    pub ttl: Option<Duration>,
}

impl CacheOptions {
    pub fn new(strategy: CacheStrategy) -> Self {
        Self {
            strategy,
            ttl: None,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }
}

impl From<CacheStrategy> for CacheOptions {
    fn from(strategy: CacheStrategy) -> Self {
        Self::new(strategy)
    }
}

/// Dispatch `$body` to the backend selected by `$strategy`, bound as `$store`
macro_rules! route {
    ($self:ident, $strategy:expr, |$store:ident| $body:expr) => {
        match $strategy {
            CacheStrategy::Volatile => {
                let $store = &$self.volatile;
                $body
            }
            CacheStrategy::TabDurable => {
                let $store = &$self.tab_durable;
                $body
            }
            CacheStrategy::SessionDurable => {
                let $store = &$self.session_durable;
                $body
            }
        }
    };
}

/// Cache manager owning one store per strategy
pub struct CacheManager {
    volatile: MemoryCache<Value>,
    tab_durable: PersistentCache<Value>,
    session_durable: PersistentCache<Value>,
}

impl CacheManager {
    /// Build a manager over the given storage areas
    pub fn new(
        volatile: CacheConfig,
        tab_storage: Arc<dyn KeyValueStorage>,
        tab: &DurableConfig,
        session_storage: Arc<dyn KeyValueStorage>,
        session: &DurableConfig,
    ) -> Self {
        info!(
            "Initializing cache manager (tab prefix: {}, session prefix: {})",
            tab.key_prefix, session.key_prefix
        );

        Self {
            volatile: MemoryCache::new(volatile),
            tab_durable: PersistentCache::new(tab_storage, tab),
            session_durable: PersistentCache::new(session_storage, session),
        }
    }

    /// Manager with default configs and both durable areas held in memory
    pub fn in_memory() -> Self {
        let tab = DurableConfig::tab_durable();
        let session = DurableConfig::session_durable();
        Self::new(
            CacheConfig::volatile(),
            Arc::new(MemoryStorage::with_optional_quota(tab.quota_bytes)),
            &tab,
            Arc::new(MemoryStorage::with_optional_quota(session.quota_bytes)),
            &session,
        )
    }

    /// Store a value. Values that cannot be represented as JSON are dropped
    /// with a warning.
    pub async fn set<V: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &V,
        options: impl Into<CacheOptions>,
    ) {
        let options = options.into();

        let value = match serde_json::to_value(value) {
            Ok(value) => value,
            Err(e) => {
                warn!("Failed to serialize value for {} ({}): {}", key, options.strategy, e);
                return;
            }
        };

        route!(self, options.strategy, |store| store.set(key, value, options.ttl).await)
    }

    /// Read a value. A stored value that does not match `V` reads as a miss.
    pub async fn get<V: DeserializeOwned>(&self, key: &str, strategy: CacheStrategy) -> Option<V> {
        let value = route!(self, strategy, |store| store.get(key).await)?;

        match serde_json::from_value(value) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Cached value for {} ({}) has unexpected shape: {}", key, strategy, e);
                None
            }
        }
    }

    /// Existence check with read side effects (see [`CacheBackend::has`])
    pub async fn has(&self, key: &str, strategy: CacheStrategy) -> bool {
        route!(self, strategy, |store| store.has(key).await)
    }

    /// Existence check without side effects
    pub async fn peek(&self, key: &str, strategy: CacheStrategy) -> bool {
        route!(self, strategy, |store| store.peek(key).await)
    }

    pub async fn delete(&self, key: &str, strategy: CacheStrategy) -> bool {
        route!(self, strategy, |store| store.delete(key).await)
    }

    /// Clear one backend, or all of them when `strategy` is `None`
    pub async fn clear(&self, strategy: Option<CacheStrategy>) {
        match strategy {
            Some(strategy) => route!(self, strategy, |store| store.clear().await),
            None => {
                for strategy in CacheStrategy::ALL {
                    route!(self, strategy, |store| store.clear().await)
                }
            }
        }
    }

    /// Keys stored in one backend
    pub async fn keys(&self, strategy: CacheStrategy) -> Vec<String> {
        route!(self, strategy, |store| store.keys().await)
    }

    pub async fn stats(&self) -> ManagerStats {
        ManagerStats {
            volatile: self.volatile.stats().await,
            tab_durable: self.tab_durable.len().await,
            session_durable: self.session_durable.len().await,
        }
    }

    /// The volatile backend, for callers that need its richer API
    pub fn volatile(&self) -> &MemoryCache<Value> {
        &self.volatile
    }
}
