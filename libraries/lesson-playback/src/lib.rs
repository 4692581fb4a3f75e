//! Lesson Player - Playback Engine
//!
//! Platform-agnostic engine behind the lesson video player.
//!
//! This crate provides:
//! - Embedding strategies (rich SDK, plain frame) behind one contract
//! - A strategy manager with a bounded initialization wait
//! - Embed URL construction
//! - Event normalization into trustworthy progress values
//! - The fallback panel shown when no player could be created
//! - The resume banner with its auto-resume countdown
//! - `PlayerSession`, which wires all of the above together
//!
//! # Architecture
//!
//! `lesson-playback` does no I/O of its own:
//! - No dependency on lesson-storage (persistence comes in as a `ProgressStore`)
//! - No dependency on lesson-server-client (heartbeats go to a `ProgressReporter`)
//! - The embedding host is reached through `EmbedSurface` and `SdkBridge`
//!
//! # Example: Normalizing telemetry
//!
//! ```rust
//! use lesson_playback::{EventNormalizer, PlayerEvent, PlayerSignal};
//!
//! let mut normalizer = EventNormalizer::new();
//!
//! // A transient one-second duration is not trusted
//! let signals = normalizer.normalize(
//!     PlayerEvent::TimeUpdate { current_time: 40.0, duration: Some(1.0) },
//!     || None,
//! );
//! assert!(signals.is_empty());
//!
//! // Real metadata arrives and the last position is re-emitted
//! let signals = normalizer.normalize(PlayerEvent::Metadata { duration: Some(160.0) }, || None);
//! match &signals[0] {
//!     PlayerSignal::Progress(p) => assert_eq!(p.percentage(), 25.0),
//!     other => panic!("unexpected signal {other:?}"),
//! }
//! ```
//!
//! # Example: Mounting a player
//!
//! ```rust,no_run
//! use lesson_core::{LessonId, PlaybackContext, ProgressReporter, ProgressValue};
//! use lesson_playback::{
//!     EmbedConfig, FrameStrategy, ManagerConfig, MemorySurface, NoopCallbacks, PlayerConfig,
//!     PlayerSession, ResumeConfig, SessionServices, StrategyManager,
//! };
//! use lesson_storage::MemoryProgressStore;
//! use std::sync::Arc;
//!
//! struct LogReporter;
//!
//! impl ProgressReporter for LogReporter {
//!     fn report(&self, progress: ProgressValue, _context: &PlaybackContext) {
//!         println!("{:.1}%", progress.percentage());
//!     }
//! }
//!
//! # async fn run() {
//! let surface = Arc::new(MemorySurface::new());
//! let manager = StrategyManager::new(
//!     vec![Arc::new(FrameStrategy::new(surface))],
//!     ManagerConfig::default(),
//!     EmbedConfig { pullzone: Some("vz-1234".into()), ..Default::default() },
//! );
//!
//! let services = SessionServices {
//!     store: Arc::new(MemoryProgressStore::new()),
//!     reporter: Arc::new(LogReporter),
//!     callbacks: Arc::new(NoopCallbacks),
//! };
//!
//! let mut session = PlayerSession::mount(
//!     PlaybackContext::new(LessonId::new("lesson-1")),
//!     PlayerConfig::default(),
//!     ResumeConfig::default(),
//!     manager,
//!     services,
//!     None,
//! );
//!
//! if session.start("player", "video-guid", None).await.is_err() {
//!     let panel = session.fallback().unwrap();
//!     println!("Open {} instead", panel.open_url());
//! }
//! # }
//! ```

mod diagnostics;
mod embed;
mod error;
mod events;
mod fallback;
mod manager;
mod normalizer;
mod resume;
mod session;
pub mod strategy;
pub mod types;

// Public exports
pub use diagnostics::{RateLimitedSink, DIAGNOSTIC_WINDOW};
pub use embed::{EmbedUrl, UNCONFIGURED_PULLZONE};
pub use error::{PlaybackError, Result};
pub use events::{PlayerEvent, PlayerSignal, RawPlayerEvent};
pub use fallback::FallbackPanel;
pub use manager::StrategyManager;
pub use normalizer::EventNormalizer;
pub use resume::{BannerOutcome, BannerState, ResumeBanner, ResumeDecision};
pub use session::{NoopCallbacks, PlayerCallbacks, PlayerSession, SessionServices};
pub use strategy::{
    EmbedRequest, EmbedSurface, EventStream, FrameStrategy, MemorySurface, PlaybackStrategy,
    PlayerInstance, SdkBridge, SdkConnection, SdkControl, SdkStrategy,
};
pub use types::{
    Controls, EmbedConfig, FailureReason, ManagerConfig, ManagerState, PlayerConfig,
    ResumeConfig, StrategyKind,
};
