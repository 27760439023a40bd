//! Cache store over a key/value storage area
//!
//! Entries are JSON-serialized [`CacheEntry`] values stored under
//! `prefix + key`. The store only ever touches keys under its own prefix, so
//! several stores (and unrelated users) can share one storage area.
//!
//! Every failure of the storage area or of serialization is logged and turned
//! into a no-op or a miss.

use crate::cache::{
    config::DurableConfig,
    entry::CacheEntry,
    storage::KeyValueStorage,
    store::{effective_ttl, CacheBackend},
    types::CacheKey,
};
use serde::{de::DeserializeOwned, Serialize};
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Durable cache store
pub struct PersistentCache<T> {
    storage: Arc<dyn KeyValueStorage>,
    key_prefix: String,
    default_ttl: Duration,
    _value: PhantomData<fn() -> T>,
}

impl<T> Clone for PersistentCache<T> {
    fn clone(&self) -> Self {
        Self {
            storage: self.storage.clone(),
            key_prefix: self.key_prefix.clone(),
            default_ttl: self.default_ttl,
            _value: PhantomData,
        }
    }
}

impl<T> PersistentCache<T>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    /// Create a store over `storage` using the prefix and TTL from `config`
    pub fn new(storage: Arc<dyn KeyValueStorage>, config: &DurableConfig) -> Self {
        Self::with_prefix(storage, config.key_prefix.clone(), config.default_ttl)
    }

    pub fn with_prefix(
        storage: Arc<dyn KeyValueStorage>,
        key_prefix: impl Into<String>,
        default_ttl: Duration,
    ) -> Self {
        Self {
            storage,
            key_prefix: key_prefix.into(),
            default_ttl,
            _value: PhantomData,
        }
    }

    /// Prefix applied to every physical key
    pub fn key_prefix(&self) -> &str {
        &self.key_prefix
    }

    fn storage_key(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }

    /// Physical keys owned by this store
    fn owned_keys(&self) -> Vec<String> {
        match self.storage.keys() {
            Ok(keys) => keys
                .into_iter()
                .filter(|key| key.starts_with(&self.key_prefix))
                .collect(),
            Err(e) => {
                warn!("Failed to list {} cache keys: {}", self.key_prefix, e);
                Vec::new()
            }
        }
    }

    fn write_entry(&self, key: &str, entry: &CacheEntry<T>) {
        let raw = match serde_json::to_string(entry) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Failed to serialize cache entry {}: {}", key, e);
                return;
            }
        };

        if let Err(e) = self.storage.set_item(&self.storage_key(key), &raw) {
            warn!("Failed to write cache entry {}: {}", key, e);
        }
    }

    /// Load the entry for `key`; unreadable entries count as absent
    fn read_entry(&self, key: &str) -> Option<CacheEntry<T>> {
        let raw = match self.storage.get_item(&self.storage_key(key)) {
            Ok(raw) => raw?,
            Err(e) => {
                warn!("Failed to read cache entry {}: {}", key, e);
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Failed to parse cache entry {}: {}", key, e);
                None
            }
        }
    }

    fn remove_key(&self, key: &str) -> bool {
        let storage_key = self.storage_key(key);
        match self.storage.get_item(&storage_key) {
            Ok(Some(_)) => match self.storage.remove_item(&storage_key) {
                Ok(()) => true,
                Err(e) => {
                    warn!("Failed to delete cache entry {}: {}", key, e);
                    false
                }
            },
            Ok(None) => false,
            Err(e) => {
                warn!("Failed to delete cache entry {}: {}", key, e);
                false
            }
        }
    }
}

impl<T> CacheBackend<T> for PersistentCache<T>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    async fn set(&self, key: &str, value: T, ttl: Option<Duration>) {
        let entry = CacheEntry::new(value, effective_ttl(ttl, || self.default_ttl));
        self.write_entry(key, &entry);
    }

    async fn get(&self, key: &str) -> Option<T> {
        let mut entry = self.read_entry(key)?;

        if entry.is_expired() {
            debug!("Cache entry expired: {}{}", self.key_prefix, key);
            self.remove_key(key);
            return None;
        }

        // Hit counts are persisted so they survive a restart
        entry.mark_hit();
        self.write_entry(key, &entry);

        Some(entry.value)
    }

    async fn peek(&self, key: &str) -> bool {
        self.read_entry(key)
            .map(|entry| !entry.is_expired())
            .unwrap_or(false)
    }

    async fn delete(&self, key: &str) -> bool {
        self.remove_key(key)
    }

    async fn clear(&self) {
        let keys = self.owned_keys();
        for key in &keys {
            if let Err(e) = self.storage.remove_item(key) {
                warn!("Failed to clear cache entry {}: {}", key, e);
            }
        }
        debug!("Cleared {} entries under prefix {}", keys.len(), self.key_prefix);
    }

    async fn len(&self) -> usize {
        self.owned_keys().len()
    }

    async fn keys(&self) -> Vec<CacheKey> {
        self.owned_keys()
            .into_iter()
            .map(|key| key[self.key_prefix.len()..].to_string())
            .collect()
    }
}
