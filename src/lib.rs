//! # Lullaby Core (lullaby-core)
//!
//! Client-side coordination core of the Lullaby meditation and sleep-story
//! player.
//!
//! ## Features
//!
//! - TTL caching with volatile, tab-durable and session-durable stores
//! - Request coalescing: one in-flight fetch per key, shared by every caller
//! - Substring-based cache invalidation after mutations
//! - Audio ownership: one foreground source at a time, ambient bed exempt
//! - Global volume applied immediately to the tracked slot and current source
//!
//! ## Getting Started
//!
//! ```no_run
//! use lullaby_core::{ClientCore, CoreConfig};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> lullaby_core::Result<()> {
//!     lullaby_core::telemetry::init_tracing("lullaby_core=info");
//!
//!     let core = ClientCore::bootstrap(CoreConfig::from_env()?)?;
//!
//!     let sessions = core
//!         .api()
//!         .get("sessions:u42", || async { anyhow::Ok(json!(["Evening calm"])) }, None)
//!         .await?;
//!     println!("Sessions: {}", sessions);
//!
//!     // A new session was generated: drop everything cached for this user
//!     core.api().invalidate("u42").await;
//!     Ok(())
//! }
//! ```

pub mod audio;
pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod telemetry;

// Re-export main types for convenience
pub use audio::{AudioCategory, AudioConfig, AudioCoordinator, AudioHandle, SourceId};
pub use cache::{
    ApiCache, CacheBackend, CacheConfig, CacheConfigBuilder, CacheEntry, CacheKey,
    CacheKeyBuilder, CacheManager, CacheOptions, CacheStats, CacheStrategy, DurableConfig,
    FileStorage, InvalidationEvent, InvalidationReason, KeyValueStorage, ManagerStats,
    MemoryCache, MemoryStorage, PersistentCache,
};
pub use client::ClientCore;
pub use config::CoreConfig;
pub use error::{CoreError, PlaybackError, Result, StorageError};
