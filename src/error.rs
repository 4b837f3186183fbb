use thiserror::Error;

use crate::audio_system::Channel;

/// Engine-level errors using thiserror for structured error handling.
///
/// None of these are fatal. The director logs them and the request that
/// caused them becomes a no-op; producers on the event bus never see them.

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AudioError {
    #[error("{catalog} track {track} not found")]
    TrackNotFound { catalog: String, track: String },

    #[error("{0} channel is mid-transition, request rejected")]
    TransitionRejected(Channel),

    #[error("Sound effect '{0}' not found")]
    SfxNotFound(String),

    #[error("Nothing is playing on the {0} channel")]
    NothingPlaying(Channel),

    #[error("Playback backend error: {0}")]
    Backend(String),

    #[error("Failed to load audio assets from {location}: {reason}")]
    AssetLoad { location: String, reason: String },
}

impl AudioError {
    /// Whether the error only means "nothing to do" rather than a bad request
    pub fn is_benign(&self) -> bool {
        matches!(self, AudioError::NothingPlaying(_))
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration from {path}")]
    LoadFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Failed to save configuration to {path}")]
    SaveFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to create config directory: {path}")]
    DirectoryCreationFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Type alias for application Results using anyhow for context chaining
pub type AppResult<T> = anyhow::Result<T>;
