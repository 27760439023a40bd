//! Core type definitions for audio coordination

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a registered audio source
pub type SourceId = String;

/// Playback category of an audio source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioCategory {
    /// Background bed that may play alongside one foreground source
    Ambient,

    /// Session players, voice notes and previews; only one plays at a time
    Foreground,
}

impl AudioCategory {
    /// Classify a source by id: ids starting with `ambient_prefix` are ambient
    pub fn for_source(id: &str, ambient_prefix: &str) -> Self {
        if !ambient_prefix.is_empty() && id.starts_with(ambient_prefix) {
            AudioCategory::Ambient
        } else {
            AudioCategory::Foreground
        }
    }

    pub fn is_ambient(self) -> bool {
        self == AudioCategory::Ambient
    }
}

impl fmt::Display for AudioCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AudioCategory::Ambient => write!(f, "ambient"),
            AudioCategory::Foreground => write!(f, "foreground"),
        }
    }
}

/// Configuration for the audio coordinator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Volume applied to handles until `set_global_volume` is called
    pub initial_volume: f32,

    /// Source ids starting with this prefix are classified as ambient
    pub ambient_prefix: String,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            initial_volume: 0.8,
            ambient_prefix: "ambient-".to_string(),
        }
    }
}

impl AudioConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.initial_volume) {
            return Err("initial_volume must be between 0.0 and 1.0".to_string());
        }

        if self.ambient_prefix.is_empty() {
            return Err("ambient_prefix must not be empty".to_string());
        }

        Ok(())
    }
}
