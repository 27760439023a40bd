//! Cache key construction
//!
//! Keys read `"<resource>:<discriminator>:<discriminator>..."`, for example
//! `usage-month:u42:2024-01-01:2024-01-31:meditation`. Pattern invalidation
//! relies on this shape: removing every key that contains `u42` busts all
//! cached resources of that user after a mutation.

use crate::cache::types::CacheKey;

/// Builder for cache keys following the resource/discriminator convention
#[derive(Debug, Clone)]
pub struct CacheKeyBuilder {
    resource: String,
    parts: Vec<String>,
}

impl CacheKeyBuilder {
    /// Start a key for `resource`
    pub fn new(resource: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            parts: Vec::new(),
        }
    }

    /// Append a discriminator
    pub fn part(mut self, part: impl ToString) -> Self {
        self.parts.push(part.to_string());
        self
    }

    /// Append a discriminator only when present
    pub fn optional_part(self, part: Option<impl ToString>) -> Self {
        match part {
            Some(part) => self.part(part),
            None => self,
        }
    }

    /// Build the cache key
    pub fn build(self) -> CacheKey {
        let mut key = self.resource;
        for part in self.parts {
            key.push(':');
            key.push_str(&part);
        }
        key
    }
}
