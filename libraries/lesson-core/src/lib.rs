//! Lesson Player Core
//!
//! Platform-agnostic types, traits, and error handling shared by the lesson
//! video player crates.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `ProgressValue`, `PlaybackContext`, `PersistedProgressRecord`,
//!   `HeartbeatQueueEntry`
//! - **Core Traits**: `ProgressStore` (local resume position), `ProgressReporter`
//!   (backend telemetry)
//! - **Error Handling**: Unified `CoreError` and `Result` types
//!
//! # Example
//!
//! ```rust
//! use lesson_core::{LessonId, PlaybackContext, ProgressValue};
//!
//! let context = PlaybackContext::new(LessonId::new("lesson-42"))
//!     .with_lesson_title("Intro to ownership");
//!
//! // 30s into a 3 minute video
//! let progress = ProgressValue::from_playback(30.0, 180.0).unwrap();
//! assert!((progress.percentage() - 16.666).abs() < 0.01);
//!
//! // A 1 second "duration" is never trusted
//! assert!(ProgressValue::from_playback(30.0, 1.0).is_none());
//! # let _ = context;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod traits;
pub mod types;

pub use error::{CoreError, Result};
pub use traits::{ProgressReporter, ProgressStore};
pub use types::{
    is_plausible_duration, CourseId, HeartbeatPayload, HeartbeatQueueEntry, LessonId, ModuleId,
    PersistedProgressRecord, PlaybackContext, ProgressValue, PLAUSIBLE_DURATION_SECS,
};
