//! # Audio Ownership
//!
//! Arbitration between the audio sources of the client: the ambient music
//! bar, session players, voice notes and previews.
//!
//! ## Rules
//!
//! - Starting a **foreground** source pauses every other foreground source
//! - **Ambient** sources never pause anything and are never paused by
//!   foreground arbitration (only by an explicit `pause_all`)
//! - One **tracked slot** holds the audio the player chrome reflects; starting
//!   new tracked audio stops and rewinds the previous one
//! - A **global volume** is applied to a handle when it is registered or
//!   tracked. Changing it updates only the tracked slot and the currently
//!   playing registered source; other registered handles keep their volume
//!   until they are started again
//!
//! ## Example
//!
//! ```rust,no_run
//! use lullaby_core::audio::{AudioCategory, AudioCoordinator, AudioHandle};
//! use std::sync::Arc;
//!
//! # async fn example(rain: Arc<dyn AudioHandle>, session: Arc<dyn AudioHandle>) {
//! let audio = AudioCoordinator::default();
//!
//! audio.play_audio("ambient-rain", &rain, AudioCategory::Ambient).await;
//! audio.play_audio("session-42", &session, AudioCategory::Foreground).await;
//!
//! // The rain keeps playing under the session
//! audio.set_global_volume(0.5).await;
//! # }
//! ```

pub mod coordinator;
pub mod handle;
pub mod types;

pub use coordinator::AudioCoordinator;
pub use handle::AudioHandle;
pub use types::{AudioCategory, AudioConfig, SourceId};
