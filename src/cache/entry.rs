//! Cache entry management with TTL support

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A cached value with its insertion time, lifetime and hit count.
///
/// Durable stores persist this as
/// `{"value": .., "timestamp": <epoch ms>, "ttl": <ms>, "hits": <n>}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    /// The cached value
    pub value: T,

    /// When the entry was written
    #[serde(rename = "timestamp", with = "chrono::serde::ts_milliseconds")]
    pub stored_at: DateTime<Utc>,

    /// Lifetime of the entry
    #[serde(with = "duration_ms")]
    pub ttl: Duration,

    /// Successful reads of this entry
    pub hits: u64,
}

impl<T> CacheEntry<T> {
    /// Create a fresh entry stored now
    pub fn new(value: T, ttl: Duration) -> Self {
        Self {
            value,
            stored_at: Utc::now(),
            ttl,
            hits: 0,
        }
    }

    /// Time elapsed since the entry was written
    pub fn age(&self) -> Duration {
        (Utc::now() - self.stored_at)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }

    /// Check if the entry has expired
    pub fn is_expired(&self) -> bool {
        self.age() >= self.ttl
    }

    /// Get time until expiration
    pub fn time_until_expiration(&self) -> Option<Duration> {
        self.ttl.checked_sub(self.age()).filter(|left| !left.is_zero())
    }

    /// Record a successful read
    pub fn mark_hit(&mut self) {
        self.hits += 1;
    }
}

/// Serialize a `Duration` as whole milliseconds
mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(ttl: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(ttl.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
