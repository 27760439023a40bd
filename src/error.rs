//! Error types for the caching and audio coordination core
//!
//! Cache and storage failures are normally swallowed at the call site and only
//! logged; these types exist so the storage media and fetch paths can report
//! what went wrong before that decision is made.

use std::sync::Arc;
use thiserror::Error;

/// Main error type for the crate
#[derive(Error, Debug, Clone)]
pub enum CoreError {
    /// A storage medium failed (only surfaced at bootstrap)
    #[error("Storage error: {0}")]
    Storage(Arc<StorageError>),

    /// The fetcher behind an API cache request failed.
    ///
    /// All callers that shared the request receive the same `Arc`.
    #[error("Fetch failed: {0}")]
    Fetch(Arc<anyhow::Error>),

    /// Audio playback was rejected by the platform
    #[error("Playback error: {0}")]
    Playback(#[from] PlaybackError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Generic error with context
    #[error("Error: {0}")]
    Other(String),
}

/// Result type alias for crate operations
pub type Result<T> = std::result::Result<T, CoreError>;

impl From<StorageError> for CoreError {
    fn from(e: StorageError) -> Self {
        CoreError::Storage(Arc::new(e))
    }
}

impl From<String> for CoreError {
    fn from(s: String) -> Self {
        CoreError::Other(s)
    }
}

impl From<&str> for CoreError {
    fn from(s: &str) -> Self {
        CoreError::Other(s.to_string())
    }
}

/// Failures of a key/value storage medium
#[derive(Error, Debug)]
pub enum StorageError {
    /// Writing would exceed the configured quota
    #[error("Storage quota exceeded writing '{key}': {needed} bytes needed, limit is {limit}")]
    QuotaExceeded {
        key: String,
        needed: usize,
        limit: usize,
    },

    /// Underlying file I/O failed
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A value could not be serialized or parsed
    #[error("Storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The medium is disabled or its lock is poisoned
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Reasons an audio handle refuses to start
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlaybackError {
    /// Blocked by an autoplay policy
    #[error("playback not allowed: {0}")]
    NotAllowed(String),

    /// The media could not be decoded
    #[error("decode error: {0}")]
    Decode(String),

    #[error("playback failed: {0}")]
    Other(String),
}
