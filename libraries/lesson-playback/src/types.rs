//! Configuration and state types for lesson playback

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Control bar presentation requested from the embedded player
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Controls {
    /// Full control bar
    #[default]
    Full,

    /// Play/pause and seek bar only
    Minimal,

    /// No controls
    Hidden,
}

/// Per-mount player options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Start playing as soon as the player is ready (default: false)
    pub autoplay: bool,

    /// Start muted (default: false)
    pub muted: bool,

    /// Persist normalized progress locally (default: true)
    pub save_progress: bool,

    /// Let the player decide autoplay from viewer behaviour (default: false)
    pub smart_autoplay: bool,

    /// Start offset in seconds (default: 0)
    pub start_time: f64,

    /// Control bar presentation (default: Full)
    pub controls: Controls,

    /// Explicit player URL; replaces the pullzone-derived embed URL
    pub player_url: Option<String>,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            autoplay: false,
            muted: false,
            save_progress: true,
            smart_autoplay: false,
            start_time: 0.0,
            controls: Controls::Full,
            player_url: None,
        }
    }
}

/// Strategy manager configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// Seconds to wait for ready/error before giving up (default: 10)
    pub init_timeout_secs: u64,

    /// Try the next strategy when one fails (default: false)
    pub cascade: bool,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            init_timeout_secs: 10,
            cascade: false,
        }
    }
}

impl ManagerConfig {
    pub fn init_timeout(&self) -> Duration {
        Duration::from_secs(self.init_timeout_secs)
    }
}

/// Resume banner configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResumeConfig {
    /// Auto-resume countdown in seconds (default: 5)
    pub countdown_secs: u32,

    /// Prior percentage must be strictly above this (default: 5)
    pub min_percentage: f64,

    /// Prior percentage must be strictly below this (default: 95)
    pub max_percentage: f64,
}

impl Default for ResumeConfig {
    fn default() -> Self {
        Self {
            countdown_secs: 5,
            min_percentage: 5.0,
            max_percentage: 95.0,
        }
    }
}

impl ResumeConfig {
    /// Whether a prior percentage is worth offering a resume for
    pub fn in_window(&self, percentage: f64) -> bool {
        percentage > self.min_percentage && percentage < self.max_percentage
    }
}

/// Process-wide embed settings, read once at startup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbedConfig {
    /// CDN pullzone; the embed URL is unresolvable without it
    pub pullzone: Option<String>,

    /// Video library identifier
    pub library_id: Option<String>,

    /// Provider domain (default: mediadelivery.net)
    pub provider_domain: String,
}

impl Default for EmbedConfig {
    fn default() -> Self {
        Self {
            pullzone: None,
            library_id: None,
            provider_domain: "mediadelivery.net".to_string(),
        }
    }
}

/// Embedding strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    /// Rich SDK embedding with telemetry and control
    Sdk,

    /// Plain frame embedding, no telemetry
    Frame,

    /// Recorded telemetry played back offline; nothing is embedded
    Replay,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sdk => write!(f, "sdk"),
            Self::Frame => write!(f, "frame"),
            Self::Replay => write!(f, "replay"),
        }
    }
}

/// Why initialization failed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FailureReason {
    /// No ready or error signal before the timeout
    Timeout,

    /// The strategy reported an error
    Error(String),
}

/// Strategy manager lifecycle
///
/// `Idle -> Initializing -> {Ready | Failed}`, `Ready -> Destroyed`,
/// `Failed -> Idle` on retry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ManagerState {
    /// Nothing mounted yet
    Idle,

    /// Waiting for the strategy to report ready or error
    Initializing,

    /// A working player instance is held
    Ready,

    /// Initialization failed; the fallback panel is shown
    Failed(FailureReason),

    /// Torn down on unmount
    Destroyed,
}

impl ManagerState {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}
