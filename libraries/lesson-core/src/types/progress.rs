//! Progress value and its persisted form
//!
//! A `ProgressValue` can only be built from a duration that passes the
//! plausibility threshold, so a percentage computed from a transient
//! `duration = 1` reading (40000%) is unrepresentable.

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Durations at or below this many seconds are never trusted.
///
/// Some embeddings report `0` or single-digit durations before the real
/// metadata arrives.
pub const PLAUSIBLE_DURATION_SECS: f64 = 10.0;

/// Check whether a reported duration can be used to compute a percentage
pub fn is_plausible_duration(duration: f64) -> bool {
    duration.is_finite() && duration > PLAUSIBLE_DURATION_SECS
}

/// Canonical playback progress: `{currentTime, duration, percentage}`
///
/// Invariants:
/// - `current_time >= 0`
/// - `duration > PLAUSIBLE_DURATION_SECS`
/// - `0 <= percentage <= 100`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "ProgressFields")]
pub struct ProgressValue {
    current_time: f64,
    duration: f64,
    percentage: f64,
}

/// Unchecked wire form, validated through `TryFrom`.
///
/// A serialized `percentage` is accepted and ignored; it is re-derived from
/// the other two fields.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProgressFields {
    current_time: f64,
    duration: f64,
}

impl TryFrom<ProgressFields> for ProgressValue {
    type Error = String;

    fn try_from(fields: ProgressFields) -> std::result::Result<Self, Self::Error> {
        Self::from_playback(fields.current_time, fields.duration).ok_or_else(|| {
            format!(
                "implausible progress: currentTime={} duration={}",
                fields.current_time, fields.duration
            )
        })
    }
}

impl ProgressValue {
    /// Build a progress value from a playback position and a duration.
    ///
    /// Returns `None` when the duration is not plausible or the position is
    /// not a finite number. Negative positions clamp to zero and the
    /// percentage clamps to 100 to absorb overshoot near the end of a video.
    pub fn from_playback(current_time: f64, duration: f64) -> Option<Self> {
        if !is_plausible_duration(duration) || !current_time.is_finite() {
            return None;
        }

        let current_time = current_time.max(0.0);
        let percentage = (current_time / duration * 100.0).min(100.0);

        Some(Self {
            current_time,
            duration,
            percentage,
        })
    }

    /// The same position against a corrected duration
    pub fn with_duration(&self, duration: f64) -> Option<Self> {
        Self::from_playback(self.current_time, duration)
    }

    /// Progress at the very end of the video
    pub fn completed(duration: f64) -> Option<Self> {
        Self::from_playback(duration, duration)
    }

    /// Current position in seconds
    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    /// Trusted duration in seconds
    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Watched percentage, 0 to 100
    pub fn percentage(&self) -> f64 {
        self.percentage
    }

    /// True once the percentage has reached 100
    pub fn is_complete(&self) -> bool {
        self.percentage >= 100.0
    }
}

/// Locally persisted resume position for one lesson
///
/// Stored as `{currentTime, duration, percentage, timestamp}` where
/// `timestamp` is Unix epoch milliseconds of the last save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedProgressRecord {
    /// Position in seconds
    pub current_time: f64,

    /// Duration in seconds
    pub duration: f64,

    /// Watched percentage, 0 to 100
    pub percentage: f64,

    /// Last save time (Unix epoch milliseconds)
    pub timestamp: i64,
}

impl PersistedProgressRecord {
    /// Snapshot a progress value with the current wall clock
    pub fn new(progress: &ProgressValue) -> Self {
        Self::at(progress, Utc::now().timestamp_millis())
    }

    /// Snapshot a progress value with an explicit timestamp
    pub fn at(progress: &ProgressValue, timestamp: i64) -> Self {
        Self {
            current_time: progress.current_time(),
            duration: progress.duration(),
            percentage: progress.percentage(),
            timestamp,
        }
    }

    /// Re-validate the stored numbers.
    ///
    /// Returns `None` for records written with an implausible duration
    /// (e.g. by an older client), which are then treated as "no saved progress".
    pub fn progress(&self) -> Option<ProgressValue> {
        ProgressValue::from_playback(self.current_time, self.duration)
    }
}
