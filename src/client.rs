//! Application-level wiring
//!
//! [`ClientCore`] owns one instance of every service for the lifetime of the
//! client and hands out shared references, so components receive their
//! caches and the audio coordinator explicitly instead of reaching for
//! globals.

use crate::audio::AudioCoordinator;
use crate::cache::{ApiCache, CacheManager, FileStorage, KeyValueStorage, MemoryStorage};
use crate::config::CoreConfig;
use crate::error::Result;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

/// Owner of the client's caches and audio coordinator
pub struct ClientCore {
    config: CoreConfig,
    caches: Arc<CacheManager>,
    api: Arc<ApiCache<Value>>,
    audio: Arc<AudioCoordinator>,
}

impl ClientCore {
    /// Build the services, opening the file that backs the tab-durable area
    pub fn bootstrap(config: CoreConfig) -> Result<Self> {
        config.validate()?;

        let path = config.tab_durable.resolved_path();
        let tab_storage = FileStorage::open(&path, config.tab_durable.quota_bytes)?;
        info!("Tab-durable storage at {}", path.display());

        let session_storage = MemoryStorage::with_optional_quota(config.session_durable.quota_bytes);

        Ok(Self::assemble(config, Arc::new(tab_storage), Arc::new(session_storage)))
    }

    /// Build the services with both durable areas held in memory
    pub fn in_memory(config: CoreConfig) -> Result<Self> {
        config.validate()?;

        let tab_storage = MemoryStorage::with_optional_quota(config.tab_durable.quota_bytes);
        let session_storage = MemoryStorage::with_optional_quota(config.session_durable.quota_bytes);

        Ok(Self::assemble(config, Arc::new(tab_storage), Arc::new(session_storage)))
    }

    fn assemble(
        config: CoreConfig,
        tab_storage: Arc<dyn KeyValueStorage>,
        session_storage: Arc<dyn KeyValueStorage>,
    ) -> Self {
        let caches = CacheManager::new(
            config.volatile.clone(),
            tab_storage,
            &config.tab_durable,
            session_storage,
            &config.session_durable,
        );
        let api = ApiCache::with_config(config.api.clone());
        let audio = AudioCoordinator::new(config.audio.clone());

        Self {
            config,
            caches: Arc::new(caches),
            api: Arc::new(api),
            audio: Arc::new(audio),
        }
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    pub fn caches(&self) -> Arc<CacheManager> {
        self.caches.clone()
    }

    pub fn api(&self) -> Arc<ApiCache<Value>> {
        self.api.clone()
    }

    pub fn audio(&self) -> Arc<AudioCoordinator> {
        self.audio.clone()
    }

    /// Return every service to its initial state, e.g. on sign-out
    pub async fn reset(&self) {
        self.caches.clear(None).await;
        self.api.clear().await;
        self.audio.stop_all_audio().await;
        self.audio.pause_all().await;
        info!("Client core reset");
    }
}
