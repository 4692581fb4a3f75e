//! Error types for lesson playback

use std::time::Duration;
use thiserror::Error;

/// Playback errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlaybackError {
    /// Video id was empty or whitespace
    #[error("Video id must not be empty")]
    InvalidVideoId,

    /// The player neither became ready nor reported an error in time
    #[error("Player did not become ready within {timeout:?}")]
    InitTimeout { timeout: Duration },

    /// The embedded player reported an error
    #[error("Player reported an error: {0}")]
    PlayerReported(String),

    /// Embed URL could not be constructed
    #[error("Invalid embed URL: {0}")]
    InvalidEmbedUrl(String),

    /// Embedding artifacts could not be attached to the container
    #[error("Embed surface error: {0}")]
    Surface(String),

    /// Operation not allowed in the current state
    #[error("Invalid operation: {0}")]
    InvalidState(String),
}

impl PlaybackError {
    /// Whether the failure should send the viewer to the fallback panel
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::InitTimeout { .. } | Self::PlayerReported(_) | Self::Surface(_)
        )
    }
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
