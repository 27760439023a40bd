//! Top-level configuration
//!
//! [`CoreConfig`] gathers the settings of every subsystem. Defaults match the
//! values the client has always shipped with; `from_env` lets a deployment
//! override them through `LULLABY_*` variables (a `.env` file is honoured).
//!
//! | Variable | Meaning |
//! |---|---|
//! | `LULLABY_CACHE_TTL_SECS` | volatile store default TTL |
//! | `LULLABY_CACHE_MAX_ENTRIES` | volatile store capacity |
//! | `LULLABY_CACHE_TTL_JITTER` | TTL jitter factor for volatile and API stores |
//! | `LULLABY_CACHE_LRU` | opt into LRU eviction for volatile and API stores |
//! | `LULLABY_API_CACHE_TTL_SECS` | API cache default TTL |
//! | `LULLABY_API_CACHE_MAX_ENTRIES` | API cache capacity |
//! | `LULLABY_STORAGE_PATH` | file backing the tab-durable area |
//! | `LULLABY_STORAGE_QUOTA_BYTES` | quota of each durable area |
//! | `LULLABY_TAB_CACHE_TTL_SECS` | tab-durable default TTL |
//! | `LULLABY_SESSION_CACHE_TTL_SECS` | session-durable default TTL |
//! | `LULLABY_AUDIO_VOLUME` | initial global volume |
//! | `LULLABY_AMBIENT_PREFIX` | id prefix of ambient sources |

use crate::audio::AudioConfig;
use crate::cache::{CacheConfig, DurableConfig};
use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// Configuration for every subsystem of the client core
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Volatile store behind the cache manager
    pub volatile: CacheConfig,

    /// Store behind the API cache
    pub api: CacheConfig,

    pub tab_durable: DurableConfig,

    pub session_durable: DurableConfig,

    pub audio: AudioConfig,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            volatile: CacheConfig::volatile(),
            api: CacheConfig::api(),
            tab_durable: DurableConfig::tab_durable(),
            session_durable: DurableConfig::session_durable(),
            audio: AudioConfig::default(),
        }
    }
}

impl CoreConfig {
    /// Defaults overridden by `LULLABY_*` environment variables
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(secs) = parse_var::<u64, _>(&lookup, "LULLABY_CACHE_TTL_SECS")? {
            config.volatile.default_ttl = Duration::from_secs(secs);
        }
        if let Some(max) = parse_var(&lookup, "LULLABY_CACHE_MAX_ENTRIES")? {
            config.volatile.max_entries = max;
        }
        if let Some(jitter) = parse_var::<f64, _>(&lookup, "LULLABY_CACHE_TTL_JITTER")? {
            config.volatile.ttl_jitter = jitter;
            config.api.ttl_jitter = jitter;
        }
        if let Some(lru) = parse_var::<bool, _>(&lookup, "LULLABY_CACHE_LRU")? {
            config.volatile.enable_lru_eviction = lru;
            config.api.enable_lru_eviction = lru;
        }

        if let Some(secs) = parse_var::<u64, _>(&lookup, "LULLABY_API_CACHE_TTL_SECS")? {
            config.api.default_ttl = Duration::from_secs(secs);
        }
        if let Some(max) = parse_var(&lookup, "LULLABY_API_CACHE_MAX_ENTRIES")? {
            config.api.max_entries = max;
        }

        if let Some(path) = lookup("LULLABY_STORAGE_PATH") {
            config.tab_durable.path = Some(path.into());
        }
        if let Some(quota) = parse_var::<usize, _>(&lookup, "LULLABY_STORAGE_QUOTA_BYTES")? {
            config.tab_durable.quota_bytes = Some(quota);
            config.session_durable.quota_bytes = Some(quota);
        }
        if let Some(secs) = parse_var::<u64, _>(&lookup, "LULLABY_TAB_CACHE_TTL_SECS")? {
            config.tab_durable.default_ttl = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_var::<u64, _>(&lookup, "LULLABY_SESSION_CACHE_TTL_SECS")? {
            config.session_durable.default_ttl = Duration::from_secs(secs);
        }

        if let Some(volume) = parse_var(&lookup, "LULLABY_AUDIO_VOLUME")? {
            config.audio.initial_volume = volume;
        }
        if let Some(prefix) = lookup("LULLABY_AMBIENT_PREFIX") {
            config.audio.ambient_prefix = prefix;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate every section
    pub fn validate(&self) -> Result<()> {
        let sections: [(&str, std::result::Result<(), String>); 5] = [
            ("volatile cache", self.volatile.validate()),
            ("api cache", self.api.validate()),
            ("tab-durable cache", self.tab_durable.validate()),
            ("session-durable cache", self.session_durable.validate()),
            ("audio", self.audio.validate()),
        ];

        for (section, result) in sections {
            result.map_err(|e| CoreError::ConfigError(format!("{}: {}", section, e)))?;
        }

        if self.tab_durable.key_prefix == self.session_durable.key_prefix {
            return Err(CoreError::ConfigError(
                "tab-durable and session-durable caches must use different key prefixes"
                    .to_string(),
            ));
        }

        Ok(())
    }
}

fn parse_var<T, F>(lookup: &F, name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| CoreError::ConfigError(format!("{} = {:?}: {}", name, raw, e))),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = CoreConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.volatile.max_entries, 100);
        assert_eq!(config.api.max_entries, 200);
        assert_eq!(config.tab_durable.key_prefix, "cache_");
        assert_eq!(config.session_durable.default_ttl, Duration::from_secs(30 * 60));
        assert_eq!(config.audio.ambient_prefix, "ambient-");
    }

    #[test]
    fn test_overrides() {
        let config = CoreConfig::from_lookup(lookup(&[
            ("LULLABY_CACHE_TTL_SECS", "60"),
            ("LULLABY_API_CACHE_MAX_ENTRIES", "50"),
            ("LULLABY_CACHE_LRU", "true"),
            ("LULLABY_STORAGE_PATH", "/tmp/lullaby.json"),
            ("LULLABY_AUDIO_VOLUME", "0.5"),
        ]))
        .unwrap();

        assert_eq!(config.volatile.default_ttl, Duration::from_secs(60));
        assert_eq!(config.api.max_entries, 50);
        assert!(config.volatile.enable_lru_eviction);
        assert!(config.api.enable_lru_eviction);
        assert_eq!(
            config.tab_durable.resolved_path(),
            std::path::PathBuf::from("/tmp/lullaby.json")
        );
        assert_eq!(config.audio.initial_volume, 0.5);
    }

    #[test]
    fn test_unparseable_value() {
        let err = CoreConfig::from_lookup(lookup(&[("LULLABY_CACHE_MAX_ENTRIES", "lots")]))
            .unwrap_err();
        assert!(err.to_string().contains("LULLABY_CACHE_MAX_ENTRIES"));
    }

    #[test]
    fn test_invalid_value() {
        let err = CoreConfig::from_lookup(lookup(&[("LULLABY_AUDIO_VOLUME", "3")])).unwrap_err();
        assert!(matches!(err, CoreError::ConfigError(_)));

        let mut config = CoreConfig::default();
        config.session_durable.key_prefix = "cache_".to_string();
        assert!(config.validate().is_err());
    }
}
