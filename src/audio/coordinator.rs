//! Audio ownership coordinator
//!
//! One service arbitrates every audio source in the client. Sources carry an
//! [`AudioCategory`]: starting a foreground source pauses every other
//! foreground source, while ambient sources never pause anything and are never
//! paused by foreground arbitration.
//!
//! Two views are offered over the same state:
//! - a registry of named sources (`play_audio`, `pause_all_except`, ...) for
//!   screens that mount many potential players at once
//! - a single tracked slot (`play_tracked`, `is_playing`, ...) for the common
//!   case of one ambient bed versus one session player
//!
//! The registry holds weak references: the UI owns its audio elements and the
//! coordinator only remembers them for pausing.

use crate::audio::{
    handle::AudioHandle,
    types::{AudioCategory, AudioConfig, SourceId},
};
use crate::error::PlaybackError;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

struct RegisteredSource {
    handle: Weak<dyn AudioHandle>,
    category: AudioCategory,
}

struct TrackedAudio {
    handle: Arc<dyn AudioHandle>,
    category: AudioCategory,
}

struct CoordinatorState {
    registry: HashMap<SourceId, RegisteredSource>,

    /// Most recently started registered source
    currently_playing: Option<SourceId>,

    slot: Option<TrackedAudio>,

    global_volume: f32,
}

impl CoordinatorState {
    /// Pause live foreground registry sources other than `except`.
    /// Dead entries are dropped along the way.
    fn pause_foreground_except(&mut self, except: Option<&str>) -> usize {
        self.registry.retain(|_, source| source.handle.strong_count() > 0);

        let mut paused = 0;
        for (id, source) in &self.registry {
            if source.category.is_ambient() || Some(id.as_str()) == except {
                continue;
            }
            if let Some(handle) = source.handle.upgrade() {
                if !handle.is_paused() {
                    debug!("Pausing audio source: {}", id);
                    handle.pause();
                    paused += 1;
                }
            }
        }
        paused
    }

    fn current_is_foreground(&self) -> bool {
        self.currently_playing
            .as_ref()
            .and_then(|id| self.registry.get(id))
            .map(|source| !source.category.is_ambient())
            .unwrap_or(false)
    }

    fn current_registered_handle(&self) -> Option<Arc<dyn AudioHandle>> {
        let id = self.currently_playing.as_ref()?;
        self.registry.get(id)?.handle.upgrade()
    }
}

/// Pause and rewind
fn stop(handle: &dyn AudioHandle) {
    handle.pause();
    handle.set_current_time(Duration::ZERO);
}

/// Single arbiter of audio playback
pub struct AudioCoordinator {
    config: AudioConfig,
    state: Mutex<CoordinatorState>,
}

impl Default for AudioCoordinator {
    fn default() -> Self {
        Self::new(AudioConfig::default())
    }
}

impl AudioCoordinator {
    pub fn new(config: AudioConfig) -> Self {
        info!(
            "Initializing audio coordinator (volume: {}, ambient prefix: {})",
            config.initial_volume, config.ambient_prefix
        );

        let state = CoordinatorState {
            registry: HashMap::new(),
            currently_playing: None,
            slot: None,
            global_volume: config.initial_volume.clamp(0.0, 1.0),
        };

        Self {
            config,
            state: Mutex::new(state),
        }
    }

    pub fn config(&self) -> &AudioConfig {
        &self.config
    }

    /// Classify `id` by the configured ambient prefix
    pub fn category_for(&self, id: &str) -> AudioCategory {
        AudioCategory::for_source(id, &self.config.ambient_prefix)
    }

    /// Register `handle` under `id` and claim playback for it.
    ///
    /// A foreground source first pauses every other foreground source,
    /// including the tracked slot. An ambient source pauses nothing. The
    /// caller starts playback itself once this returns.
    pub async fn play_audio(&self, id: &str, handle: &Arc<dyn AudioHandle>, category: AudioCategory) {
        let named = self.category_for(id);
        if named != category {
            warn!(
                "Source {} is registered as {} but its id marks it {}",
                id, category, named
            );
        }

        let mut state = self.state.lock().await;

        state.registry.insert(
            id.to_string(),
            RegisteredSource {
                handle: Arc::downgrade(handle),
                category,
            },
        );
        handle.set_volume(state.global_volume);

        if category == AudioCategory::Foreground {
            let paused = state.pause_foreground_except(Some(id));

            if let Some(slot) = &state.slot {
                let same = Arc::ptr_eq(&slot.handle, handle);
                if !same && slot.category == AudioCategory::Foreground && !slot.handle.is_paused() {
                    debug!("Pausing tracked {} audio for {}", slot.category, id);
                    slot.handle.pause();
                }
            }

            debug!("Foreground source {} took playback ({} paused)", id, paused);
        } else {
            debug!("Ambient source {} started", id);
        }

        state.currently_playing = Some(id.to_string());
    }

    /// [`play_audio`](Self::play_audio) with the category taken from the id's
    /// prefix
    pub async fn play_named(&self, id: &str, handle: &Arc<dyn AudioHandle>) {
        self.play_audio(id, handle, self.category_for(id)).await
    }

    /// Pause every registered foreground source except `except_id`.
    ///
    /// Ambient sources are left alone; use [`pause_all`](Self::pause_all) to
    /// silence them too. Returns the number of handles paused.
    pub async fn pause_all_except(&self, except_id: &str) -> usize {
        let mut state = self.state.lock().await;
        state.pause_foreground_except(Some(except_id))
    }

    /// Pause every registered source, ambient included, and the tracked slot
    pub async fn pause_all(&self) {
        let mut state = self.state.lock().await;

        for (id, source) in &state.registry {
            if let Some(handle) = source.handle.upgrade() {
                if !handle.is_paused() {
                    debug!("Pausing audio source: {}", id);
                    handle.pause();
                }
            }
        }
        if let Some(slot) = &state.slot {
            slot.handle.pause();
        }

        state.currently_playing = None;
        info!("Paused all audio");
    }

    /// Forget a source, typically once it has ended or its player unmounted
    pub async fn release(&self, id: &str) -> bool {
        let mut state = self.state.lock().await;

        let removed = state.registry.remove(id).is_some();
        if state.currently_playing.as_deref() == Some(id) {
            state.currently_playing = None;
        }
        removed
    }

    pub async fn currently_playing(&self) -> Option<SourceId> {
        self.state.lock().await.currently_playing.clone()
    }

    /// Whether `id` is ambient, by its registered category or else its name
    pub async fn is_ambient_source(&self, id: &str) -> bool {
        let state = self.state.lock().await;
        match state.registry.get(id) {
            Some(source) => source.category.is_ambient(),
            None => self.category_for(id).is_ambient(),
        }
    }

    /// Stop whatever occupies the tracked slot and start `handle` in it.
    ///
    /// If the platform rejects playback the slot is cleared, so the handle is
    /// never left current but silent. There is no retry.
    pub async fn play_tracked(
        &self,
        handle: Arc<dyn AudioHandle>,
        category: AudioCategory,
    ) -> Result<(), PlaybackError> {
        let start = {
            let mut state = self.state.lock().await;

            if let Some(previous) = state.slot.take() {
                debug!("Stopping tracked {} audio", previous.category);
                stop(previous.handle.as_ref());
            }

            handle.set_volume(state.global_volume);
            if category == AudioCategory::Foreground {
                state.pause_foreground_except(None);
                if state.current_is_foreground() {
                    state.currently_playing = None;
                }
            }

            state.slot = Some(TrackedAudio {
                handle: handle.clone(),
                category,
            });

            // Requested under the lock so a concurrent play_tracked cannot
            // stop this handle before its play request is issued
            handle.play()
        };

        match start.await {
            Ok(()) => {
                debug!("Tracked {} audio started", category);
                Ok(())
            }
            Err(e) => {
                warn!("Failed to start {} audio: {}", category, e);
                let mut state = self.state.lock().await;
                if state
                    .slot
                    .as_ref()
                    .map(|slot| Arc::ptr_eq(&slot.handle, &handle))
                    .unwrap_or(false)
                {
                    state.slot = None;
                }
                Err(e)
            }
        }
    }

    /// Pause and rewind the tracked slot, then clear it
    pub async fn stop_all_audio(&self) {
        let mut state = self.state.lock().await;
        if let Some(slot) = state.slot.take() {
            stop(slot.handle.as_ref());
            debug!("Stopped tracked {} audio", slot.category);
        }
    }

    /// True only when the tracked slot holds `category` and is not paused
    pub async fn is_playing(&self, category: AudioCategory) -> bool {
        let state = self.state.lock().await;
        state
            .slot
            .as_ref()
            .map(|slot| slot.category == category && !slot.handle.is_paused())
            .unwrap_or(false)
    }

    /// Set the shared volume and apply it at once to the tracked slot and the
    /// currently playing registered source. Values are clamped to `[0, 1]`.
    pub async fn set_global_volume(&self, volume: f32) {
        if volume.is_nan() {
            warn!("Ignoring NaN volume");
            return;
        }
        let volume = volume.clamp(0.0, 1.0);

        let mut state = self.state.lock().await;
        state.global_volume = volume;

        if let Some(slot) = &state.slot {
            slot.handle.set_volume(volume);
        }
        if let Some(handle) = state.current_registered_handle() {
            handle.set_volume(volume);
        }
        debug!("Global volume set to {}", volume);
    }

    pub async fn global_volume(&self) -> f32 {
        self.state.lock().await.global_volume
    }

    /// Category of the tracked slot, if occupied
    pub async fn current_category(&self) -> Option<AudioCategory> {
        self.state.lock().await.slot.as_ref().map(|slot| slot.category)
    }
}
