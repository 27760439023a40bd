//! Core type definitions for the cache system

use serde::{Deserialize, Serialize};
use std::fmt;

/// Cache key type. Callers build keys as `"<resource>:<discriminators>"`
/// (see [`CacheKeyBuilder`](crate::cache::CacheKeyBuilder)).
pub type CacheKey = String;

/// Statistics for a volatile cache store
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct CacheStats {
    /// Number of entries currently stored (stale entries included)
    pub size: usize,

    /// Sum of the hit counts of all stored entries
    pub hits: u64,

    /// Lookups that found nothing or found an expired entry
    pub misses: u64,

    /// Entries evicted to respect the capacity bound
    pub evictions_capacity: u64,

    /// Entries dropped because their TTL ran out
    pub evictions_ttl: u64,

    /// Entries removed by `delete`, `clear` or pattern invalidation
    pub invalidations: u64,
}

impl CacheStats {
    /// Hits per stored entry (`hits / size`, 0 when empty).
    ///
    /// This is not a request hit ratio: entries that were evicted take their
    /// hits with them, and misses are not part of the denominator.
    pub fn hit_rate(&self) -> f64 {
        if self.size == 0 {
            0.0
        } else {
            self.hits as f64 / self.size as f64
        }
    }

    /// Calculate total evictions
    pub fn total_evictions(&self) -> u64 {
        self.evictions_capacity + self.evictions_ttl
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CacheStats {{ size: {}, hits: {}, hit_rate: {:.2}, misses: {}, evictions: {} }}",
            self.size,
            self.hits,
            self.hit_rate(),
            self.misses,
            self.total_evictions()
        )
    }
}

/// Which backend a cache manager call is routed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheStrategy {
    /// In-process map, lost when the client exits
    #[default]
    Volatile,

    /// File-backed storage area that survives a restart
    TabDurable,

    /// Storage area that lives as long as the client session
    SessionDurable,
}

impl CacheStrategy {
    pub const ALL: [CacheStrategy; 3] = [
        CacheStrategy::Volatile,
        CacheStrategy::TabDurable,
        CacheStrategy::SessionDurable,
    ];
}

impl fmt::Display for CacheStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheStrategy::Volatile => write!(f, "volatile"),
            CacheStrategy::TabDurable => write!(f, "tab_durable"),
            CacheStrategy::SessionDurable => write!(f, "session_durable"),
        }
    }
}

/// Aggregated statistics across the cache manager's backends
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ManagerStats {
    pub volatile: CacheStats,

    /// Entry count of the tab-durable store
    pub tab_durable: usize,

    /// Entry count of the session-durable store
    pub session_durable: usize,
}

impl fmt::Display for ManagerStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "volatile: {}, tab_durable: {} entries, session_durable: {} entries",
            self.volatile, self.tab_durable, self.session_durable
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_rate_is_hits_per_entry() {
        let stats = CacheStats {
            size: 4,
            hits: 10,
            ..Default::default()
        };
        assert_eq!(stats.hit_rate(), 2.5);
    }

    #[test]
    fn test_hit_rate_empty() {
        let stats = CacheStats::default();
        assert_eq!(stats.hit_rate(), 0.0);
    }

    #[test]
    fn test_cache_stats_display() {
        let stats = CacheStats {
            size: 2,
            hits: 3,
            misses: 1,
            evictions_capacity: 1,
            evictions_ttl: 2,
            invalidations: 0,
        };

        let display = format!("{}", stats);
        assert!(display.contains("hits: 3"));
        assert!(display.contains("evictions: 3"));
    }

    #[test]
    fn test_strategy_display_and_default() {
        assert_eq!(CacheStrategy::default(), CacheStrategy::Volatile);
        assert_eq!(format!("{}", CacheStrategy::TabDurable), "tab_durable");
        assert_eq!(format!("{}", CacheStrategy::SessionDurable), "session_durable");
        assert_eq!(
            serde_json::to_string(&CacheStrategy::SessionDurable).unwrap(),
            "\"session_durable\""
        );
    }
}
