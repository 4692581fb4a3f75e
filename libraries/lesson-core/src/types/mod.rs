//! Domain types for lesson playback progress

mod context;
mod heartbeat;
mod ids;
mod progress;

pub use context::PlaybackContext;
pub use heartbeat::{HeartbeatPayload, HeartbeatQueueEntry};
pub use ids::{CourseId, LessonId, ModuleId};
pub use progress::{
    is_plausible_duration, PersistedProgressRecord, ProgressValue, PLAUSIBLE_DURATION_SECS,
};
