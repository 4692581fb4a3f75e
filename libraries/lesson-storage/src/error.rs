/// Storage-specific errors
use thiserror::Error;

/// Result type alias using `StorageError`
pub type Result<T> = std::result::Result<T, StorageError>;

/// Storage error types
#[derive(Error, Debug)]
pub enum StorageError {
    /// Backing storage cannot be used (missing directory, poisoned lock, quota)
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// A stored entry could not be decoded
    #[error("Corrupt entry for lesson {lesson_id}: {reason}")]
    Corrupt { lesson_id: String, reason: String },

    /// Invalid lesson key
    #[error("Invalid lesson id: {0:?}")]
    InvalidKey(String),

    /// Serialization/deserialization error
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    /// I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl StorageError {
    /// Create an unavailable error
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }
}

impl From<StorageError> for lesson_core::CoreError {
    fn from(err: StorageError) -> Self {
        lesson_core::CoreError::storage(err.to_string())
    }
}
