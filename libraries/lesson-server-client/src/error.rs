//! Heartbeat delivery errors

use lesson_core::LessonId;
use thiserror::Error;

/// Why a heartbeat did not reach the progress backend.
#[derive(Error, Debug)]
pub enum ServerClientError {
    /// The configured base URL or endpoint path cannot form an endpoint
    #[error("Invalid progress endpoint '{url}': {reason}")]
    InvalidEndpoint { url: String, reason: String },

    /// Connection refused or timed out
    #[error("Progress backend unreachable: {0}")]
    ServerUnreachable(String),

    /// Any other transport failure
    #[error("Heartbeat request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// 401: the viewer's session token is missing or expired
    #[error("Heartbeat for lesson {lesson_id} rejected: not signed in")]
    AuthRequired { lesson_id: LessonId },

    /// 429
    #[error("Heartbeat for lesson {lesson_id} throttled, retry after {retry_after_secs}s")]
    RateLimited {
        lesson_id: LessonId,
        retry_after_secs: u64,
    },

    /// Any other non-2xx answer
    #[error("Heartbeat for lesson {lesson_id} rejected ({status}): {message}")]
    ServerError {
        lesson_id: LessonId,
        status: u16,
        message: String,
    },
}

impl ServerClientError {
    /// Whether the next drain cycle could plausibly succeed.
    ///
    /// A missing session or a 4xx answer will not fix itself between cycles.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::ServerUnreachable(_) | Self::Request(_) | Self::RateLimited { .. } => true,
            Self::ServerError { status, .. } => *status >= 500,
            Self::InvalidEndpoint { .. } | Self::AuthRequired { .. } => false,
        }
    }
}

/// Result type for heartbeat delivery.
pub type Result<T> = std::result::Result<T, ServerClientError>;
