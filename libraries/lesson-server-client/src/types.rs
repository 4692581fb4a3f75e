//! Configuration types for the lesson server client.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for connecting to the lesson platform backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Base URL of the backend (e.g., "https://learn.example.com")
    pub url: String,

    /// Bearer token from the host's auth provider (if authenticated)
    #[serde(default)]
    pub access_token: Option<String>,

    /// Path of the progress endpoint, relative to `url`
    #[serde(default = "default_heartbeat_path")]
    pub heartbeat_path: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_heartbeat_path() -> String {
    "/api/progress/heartbeat".to_string()
}

fn default_request_timeout_secs() -> u64 {
    15
}

impl ServerConfig {
    /// Create a new server config with just the URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            access_token: None,
            heartbeat_path: default_heartbeat_path(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }

    /// Create a config with an existing token.
    pub fn with_token(url: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            access_token: Some(access_token.into()),
            ..Self::new(url)
        }
    }
}

/// Heartbeat dispatcher tuning.
///
/// Neither value is a hard invariant of the backend contract; both are kept
/// configurable until the backend's idempotency guarantees are confirmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeartbeatConfig {
    /// Seconds between drain cycles (default: 10)
    pub interval_secs: u64,

    /// Delivery attempts per entry, first try included (default: 2)
    pub max_attempts: u32,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            interval_secs: 10,
            max_attempts: 2,
        }
    }
}

impl HeartbeatConfig {
    /// Drain interval, never shorter than one second
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }
}
