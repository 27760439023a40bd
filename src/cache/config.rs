//! Configuration for the cache stores

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for a volatile cache store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Time-to-live used when `set` is called without one
    pub default_ttl: Duration,

    /// Maximum number of entries held at once
    pub max_entries: usize,

    /// TTL jitter factor (0.0 - 1.0)
    /// Adds random variation to the default TTL so entries written together
    /// do not all expire in the same instant
    pub ttl_jitter: f64,

    /// When true, reads move an entry to the back of the eviction queue so
    /// capacity eviction removes the least recently used entry. When false
    /// the oldest inserted entry is evicted.
    pub enable_lru_eviction: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: Duration::from_secs(5 * 60),
            max_entries: 100,
            ttl_jitter: 0.0,
            enable_lru_eviction: false,
        }
    }
}

impl CacheConfig {
    /// Create a new builder for cache configuration
    pub fn builder() -> CacheConfigBuilder {
        CacheConfigBuilder::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_entries == 0 {
            return Err("max_entries must be greater than 0".to_string());
        }

        if self.default_ttl.is_zero() {
            return Err("default_ttl must be greater than 0".to_string());
        }

        if !(0.0..=1.0).contains(&self.ttl_jitter) {
            return Err("ttl_jitter must be between 0.0 and 1.0".to_string());
        }

        Ok(())
    }

    /// Calculate actual TTL with jitter applied
    pub fn ttl_with_jitter(&self) -> Duration {
        if self.ttl_jitter == 0.0 {
            return self.default_ttl;
        }

        let base_ms = self.default_ttl.as_secs_f64() * 1000.0;
        let jitter_range = base_ms * self.ttl_jitter;
        let jitter = (rand::random::<f64>() * 2.0 - 1.0) * jitter_range;
        let final_ms = (base_ms + jitter).max(1.0);

        Duration::from_secs_f64(final_ms / 1000.0)
    }

    /// Volatile store behind the cache manager: 5 minutes, 100 entries
    pub fn volatile() -> Self {
        Self::default()
    }

    /// Store behind the API cache: 5 minutes, 200 entries
    pub fn api() -> Self {
        Self {
            max_entries: 200,
            ..Self::default()
        }
    }
}

/// Builder for cache configuration
#[derive(Debug, Default)]
pub struct CacheConfigBuilder {
    default_ttl: Option<Duration>,
    max_entries: Option<usize>,
    ttl_jitter: Option<f64>,
    enable_lru_eviction: Option<bool>,
}

impl CacheConfigBuilder {
    /// Set default TTL for cache entries
    pub fn default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = Some(ttl);
        self
    }

    /// Set maximum number of cache entries
    pub fn max_entries(mut self, max: usize) -> Self {
        self.max_entries = Some(max);
        self
    }

    /// Set TTL jitter factor (0.0 - 1.0)
    pub fn ttl_jitter(mut self, jitter: f64) -> Self {
        self.ttl_jitter = Some(jitter);
        self
    }

    /// Enable or disable LRU eviction
    pub fn enable_lru_eviction(mut self, enable: bool) -> Self {
        self.enable_lru_eviction = Some(enable);
        self
    }

    /// Build the cache configuration
    pub fn build(self) -> CacheConfig {
        let defaults = CacheConfig::default();

        CacheConfig {
            default_ttl: self.default_ttl.unwrap_or(defaults.default_ttl),
            max_entries: self.max_entries.unwrap_or(defaults.max_entries),
            ttl_jitter: self.ttl_jitter.unwrap_or(defaults.ttl_jitter),
            enable_lru_eviction: self
                .enable_lru_eviction
                .unwrap_or(defaults.enable_lru_eviction),
        }
    }
}

/// Configuration for a durable (storage-backed) cache store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DurableConfig {
    /// Prefix applied to every physical storage key
    pub key_prefix: String,

    /// Time-to-live used when `set` is called without one
    pub default_ttl: Duration,

    /// Byte quota of the storage area (keys plus values)
    pub quota_bytes: Option<usize>,

    /// Backing file for file storage; `None` picks the platform data dir
    pub path: Option<PathBuf>,
}

/// Web storage areas typically allow about 5 MiB per origin
const DEFAULT_QUOTA_BYTES: usize = 5 * 1024 * 1024;

impl DurableConfig {
    /// Tab-durable area: prefix `cache_`, 5 minutes
    pub fn tab_durable() -> Self {
        Self {
            key_prefix: "cache_".to_string(),
            default_ttl: Duration::from_secs(5 * 60),
            quota_bytes: Some(DEFAULT_QUOTA_BYTES),
            path: None,
        }
    }

    /// Session-durable area: prefix `session_cache_`, 30 minutes
    pub fn session_durable() -> Self {
        Self {
            key_prefix: "session_cache_".to_string(),
            default_ttl: Duration::from_secs(30 * 60),
            quota_bytes: Some(DEFAULT_QUOTA_BYTES),
            path: None,
        }
    }

    /// Set the backing file path
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Set the key prefix
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.key_prefix.is_empty() {
            return Err("key_prefix must not be empty".to_string());
        }

        if self.default_ttl.is_zero() {
            return Err("default_ttl must be greater than 0".to_string());
        }

        if self.quota_bytes == Some(0) {
            return Err("quota_bytes must be greater than 0".to_string());
        }

        Ok(())
    }

    /// Resolve the file used for file-backed storage
    pub fn resolved_path(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(|| {
            dirs::data_local_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("lullaby")
                .join(format!("{}storage.json", self.key_prefix))
        })
    }
}
