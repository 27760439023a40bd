//! Records of why cache entries were dropped
//!
//! Entries leave a store in a handful of ways: their TTL runs out, capacity
//! eviction pushes them out, or a caller removes them by key, by pattern or
//! wholesale. Bulk operations report what they removed as an
//! [`InvalidationEvent`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Reason for cache invalidation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InvalidationReason {
    /// Entry expired based on TTL
    Expired,

    /// Evicted to respect the capacity bound
    Capacity,

    /// Manual invalidation by key
    Manual,

    /// Key contained the given substring
    PatternMatch { pattern: String },

    /// Whole store cleared
    Cleared,
}

impl std::fmt::Display for InvalidationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvalidationReason::Expired => write!(f, "TTL expired"),
            InvalidationReason::Capacity => write!(f, "capacity eviction"),
            InvalidationReason::Manual => write!(f, "manual invalidation"),
            InvalidationReason::PatternMatch { pattern } => write!(f, "pattern match: {}", pattern),
            InvalidationReason::Cleared => write!(f, "cache cleared"),
        }
    }
}

/// Event for cache invalidation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvalidationEvent {
    /// Reason for invalidation
    pub reason: InvalidationReason,

    /// When the invalidation occurred
    pub timestamp: DateTime<Utc>,

    /// Keys that were invalidated
    pub keys: Vec<String>,
}

impl InvalidationEvent {
    /// Create a new invalidation event
    pub fn new(reason: InvalidationReason, keys: Vec<String>) -> Self {
        Self {
            reason,
            timestamp: Utc::now(),
            keys,
        }
    }

    /// Number of keys removed
    pub fn count(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalidation_reason_display() {
        assert_eq!(InvalidationReason::Expired.to_string(), "TTL expired");

        let reason = InvalidationReason::PatternMatch {
            pattern: "user1".to_string(),
        };
        assert!(reason.to_string().contains("user1"));
    }

    #[test]
    fn test_invalidation_event() {
        let event = InvalidationEvent::new(
            InvalidationReason::Manual,
            vec!["key1".to_string(), "key2".to_string()],
        );

        assert_eq!(event.count(), 2);
        assert!(!event.is_empty());
        assert!(matches!(event.reason, InvalidationReason::Manual));
    }
}
