//! The audio element contract consumed by the coordinator

use crate::error::PlaybackError;
use futures::future::BoxFuture;
use std::time::Duration;

/// A playable audio element.
///
/// The coordinator never owns playback resources; it only pauses, rewinds and
/// adjusts the volume of handles the UI hands it. `play` resolves once the
/// platform has accepted (or rejected) the request to start.
pub trait AudioHandle: Send + Sync {
    fn play(&self) -> BoxFuture<'_, Result<(), PlaybackError>>;

    fn pause(&self);

    fn is_paused(&self) -> bool;

    /// Seek to `position` from the start of the media
    fn set_current_time(&self, position: Duration);

    /// Set the output volume, already clamped to `[0, 1]`
    fn set_volume(&self, volume: f32);
}
