//! Shared helpers for integration tests

#![allow(dead_code)]

use futures::future::{BoxFuture, FutureExt};
use lullaby_core::{AudioHandle, PlaybackError};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Audio element double that records what the coordinator did to it
pub struct MockAudio {
    paused: AtomicBool,
    pause_calls: AtomicU32,
    play_calls: AtomicU32,
    volume_bits: AtomicU32,
    position_ms: AtomicU64,
    reject_play: AtomicBool,
    play_delay_ms: AtomicU64,
}

impl MockAudio {
    /// A paused element, like a freshly created audio element
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            paused: AtomicBool::new(true),
            pause_calls: AtomicU32::new(0),
            play_calls: AtomicU32::new(0),
            volume_bits: AtomicU32::new(1.0f32.to_bits()),
            position_ms: AtomicU64::new(0),
            reject_play: AtomicBool::new(false),
            play_delay_ms: AtomicU64::new(0),
        })
    }

    /// An element whose `play` is refused, as under an autoplay policy
    pub fn rejecting() -> Arc<Self> {
        let audio = Self::new();
        audio.reject_play.store(true, Ordering::SeqCst);
        audio
    }

    /// Like [`rejecting`](Self::rejecting), but the refusal arrives after `delay`
    pub fn rejecting_after(delay: Duration) -> Arc<Self> {
        let audio = Self::rejecting();
        audio
            .play_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
        audio
    }

    /// Simulate the UI starting playback outside the coordinator
    pub fn start(&self) {
        self.paused.store(false, Ordering::SeqCst);
    }

    pub fn seek(&self, position: Duration) {
        self.position_ms
            .store(position.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn pause_calls(&self) -> u32 {
        self.pause_calls.load(Ordering::SeqCst)
    }

    pub fn play_calls(&self) -> u32 {
        self.play_calls.load(Ordering::SeqCst)
    }

    pub fn volume(&self) -> f32 {
        f32::from_bits(self.volume_bits.load(Ordering::SeqCst))
    }

    pub fn position(&self) -> Duration {
        Duration::from_millis(self.position_ms.load(Ordering::SeqCst))
    }
}

impl AudioHandle for MockAudio {
    fn play(&self) -> BoxFuture<'_, Result<(), PlaybackError>> {
        async move {
            self.play_calls.fetch_add(1, Ordering::SeqCst);
            let delay = self.play_delay_ms.load(Ordering::SeqCst);
            if delay > 0 {
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }
            if self.reject_play.load(Ordering::SeqCst) {
                return Err(PlaybackError::NotAllowed(
                    "user has not interacted with the page".to_string(),
                ));
            }
            self.paused.store(false, Ordering::SeqCst);
            Ok(())
        }
        .boxed()
    }

    fn pause(&self) {
        self.pause_calls.fetch_add(1, Ordering::SeqCst);
        self.paused.store(true, Ordering::SeqCst);
    }

    fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    fn set_current_time(&self, position: Duration) {
        self.seek(position);
    }

    fn set_volume(&self, volume: f32) {
        self.volume_bits.store(volume.to_bits(), Ordering::SeqCst);
    }
}

/// View a mock as the trait object the coordinator stores
pub fn as_handle(audio: &Arc<MockAudio>) -> Arc<dyn AudioHandle> {
    audio.clone()
}
