/// Core traits for the lesson player
///
/// Playback code depends on these instead of concrete storage or network
/// crates, so the engine runs the same against a browser-like local store, a
/// file store, or test doubles.
use crate::error::Result;
use crate::types::{LessonId, PersistedProgressRecord, PlaybackContext, ProgressValue};

/// Local, per-lesson resume position storage.
///
/// Implementations are synchronous (local storage does not suspend) and
/// scoped to one device. They are not authoritative across devices.
pub trait ProgressStore: Send + Sync {
    /// Load the saved record for a lesson, `Ok(None)` when nothing is saved
    fn load(&self, lesson_id: &LessonId) -> Result<Option<PersistedProgressRecord>>;

    /// Overwrite the saved record for a lesson
    ///
    /// Called on every normalized progress update, so it must be cheap and
    /// idempotent.
    fn save(&self, lesson_id: &LessonId, progress: &ProgressValue) -> Result<()>;

    /// Remove the saved record (viewer restarted from zero)
    ///
    /// Clearing a lesson with no record is not an error.
    fn clear(&self, lesson_id: &LessonId) -> Result<()>;
}

/// Sink for backend progress telemetry.
///
/// `report` must never fail or block the caller; delivery problems are the
/// implementation's concern.
pub trait ProgressReporter: Send + Sync {
    /// Record the latest progress for the context's lesson
    fn report(&self, progress: ProgressValue, context: &PlaybackContext);
}
