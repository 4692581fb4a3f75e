//! Heartbeat queue entries and their wire payload

use super::context::PlaybackContext;
use super::ids::LessonId;
use super::progress::ProgressValue;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A pending progress update waiting for the next dispatch cycle.
///
/// At most one entry per lesson is ever pending: a newer enqueue for the same
/// lesson replaces the older one.
#[derive(Debug, Clone, PartialEq)]
pub struct HeartbeatQueueEntry {
    pub lesson_id: LessonId,
    pub progress: ProgressValue,
    pub context: PlaybackContext,
    pub enqueued_at: DateTime<Utc>,
    /// Delivery attempts already made for this entry
    pub attempts: u32,
}

impl HeartbeatQueueEntry {
    pub fn new(lesson_id: LessonId, progress: ProgressValue, context: PlaybackContext) -> Self {
        Self {
            lesson_id,
            progress,
            context,
            enqueued_at: Utc::now(),
            attempts: 0,
        }
    }

    /// Body sent to the backend progress endpoint
    pub fn payload(&self) -> HeartbeatPayload {
        HeartbeatPayload {
            lesson_id: self.lesson_id.clone(),
            progress: self.progress,
            context: self.context.clone(),
        }
    }
}

/// `{lessonId, progress, context}` as delivered to the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeartbeatPayload {
    pub lesson_id: LessonId,
    pub progress: ProgressValue,
    pub context: PlaybackContext,
}
