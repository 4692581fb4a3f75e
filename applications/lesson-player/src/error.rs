/// CLI error types
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid event on line {line}: {source}")]
    InvalidEvent {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("No backend configured (set LESSON_SERVER__URL)")]
    NoBackend,

    #[error("Playback error: {0}")]
    Playback(#[from] lesson_playback::PlaybackError),

    #[error("Storage error: {0}")]
    Storage(#[from] lesson_storage::StorageError),

    #[error("Core error: {0}")]
    Core(#[from] lesson_core::CoreError),

    #[error("Server error: {0}")]
    Server(#[from] lesson_server_client::ServerClientError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}
