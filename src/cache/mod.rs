//! # Client Caching Layer
//!
//! Time-bounded caching for API responses and derived data, with three
//! interchangeable storage strategies and a request-coalescing front for
//! remote calls.
//!
//! ## Features
//!
//! - **TTL-Based Expiration**: entries expire lazily on read once their age reaches the TTL
//! - **Hit Counting**: every successful read increments the entry's hit count
//! - **Capacity Bound**: the volatile store evicts the oldest entry when full (LRU is opt-in)
//! - **Durable Stores**: prefixed JSON entries over a Web-Storage-like key/value area
//! - **Request Coalescing**: at most one fetch per key is in flight at a time
//! - **Pattern Invalidation**: substring matching over cache keys
//!
//! ## Architecture
//!
//! - [`MemoryCache`]: volatile store, in-process map
//! - [`PersistentCache`]: durable store over a [`KeyValueStorage`]
//! - [`CacheManager`]: routes each call to one store by [`CacheStrategy`]
//! - [`ApiCache`]: coalescing cache for fetch results
//!
//! ## Example
//!
//! ```rust
//! use lullaby_core::cache::{CacheManager, CacheOptions, CacheStrategy};
//! use std::time::Duration;
//!
//! # async fn example() {
//! let manager = CacheManager::in_memory();
//!
//! manager
//!     .set(
//!         "streak:u42",
//!         &12u32,
//!         CacheOptions::new(CacheStrategy::SessionDurable).with_ttl(Duration::from_secs(60)),
//!     )
//!     .await;
//!
//! let streak: Option<u32> = manager.get("streak:u42", CacheStrategy::SessionDurable).await;
//! assert_eq!(streak, Some(12));
//! # }
//! ```

pub mod api;
pub mod config;
pub mod entry;
pub mod invalidation;
pub mod keys;
pub mod manager;
pub mod persistent;
pub mod storage;
pub mod store;
pub mod types;

pub use api::ApiCache;
pub use config::{CacheConfig, CacheConfigBuilder, DurableConfig};
pub use entry::CacheEntry;
pub use invalidation::{InvalidationEvent, InvalidationReason};
pub use keys::CacheKeyBuilder;
pub use manager::{CacheManager, CacheOptions};
pub use persistent::PersistentCache;
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage};
pub use store::{CacheBackend, MemoryCache};
pub use types::{CacheKey, CacheStats, CacheStrategy, ManagerStats};
