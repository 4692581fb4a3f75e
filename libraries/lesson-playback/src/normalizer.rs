//! Event normalizer
//!
//! Turns typed player events into trustworthy progress and lifecycle signals.
//!
//! Duration handling:
//! - A cached "best known duration" starts at 0 and is only replaced by a
//!   plausible reading (> 10 s).
//! - Time updates use the cached duration, then the event's own duration, then
//!   the live player duration, in that order. If none is plausible the update
//!   is suppressed entirely.
//! - Once a duration is cached, only a larger one counts as a correction.
//!   Players that report a truncated duration mid-stream (partial buffer,
//!   preview clip) would otherwise inflate percentages.
//! - When a corrected duration arrives after progress was computed (or
//!   suppressed), the last seen position is re-emitted against it.

use crate::diagnostics::{RateLimitedSink, DIAGNOSTIC_WINDOW};
use crate::events::{PlayerEvent, PlayerSignal};
use lesson_core::{is_plausible_duration, ProgressValue};
use tracing::debug;

/// Stateful normalizer for one video
#[derive(Debug)]
pub struct EventNormalizer {
    cached_duration: f64,
    last_time: Option<f64>,
    last_emitted: Option<ProgressValue>,
    diagnostics: RateLimitedSink,
}

impl Default for EventNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl EventNormalizer {
    pub fn new() -> Self {
        Self {
            cached_duration: 0.0,
            last_time: None,
            last_emitted: None,
            diagnostics: RateLimitedSink::new("normalizer", DIAGNOSTIC_WINDOW),
        }
    }

    /// Best known duration, if one has been accepted
    pub fn duration(&self) -> Option<f64> {
        is_plausible_duration(self.cached_duration).then_some(self.cached_duration)
    }

    pub fn last_emitted(&self) -> Option<ProgressValue> {
        self.last_emitted
    }

    /// Forget everything about the current video
    pub fn reset(&mut self) {
        self.cached_duration = 0.0;
        self.last_time = None;
        self.last_emitted = None;
    }

    /// Normalize one event.
    ///
    /// `live_duration` queries the player instance and is only called when no
    /// plausible duration is known yet.
    pub fn normalize<F>(&mut self, event: PlayerEvent, live_duration: F) -> Vec<PlayerSignal>
    where
        F: FnOnce() -> Option<f64>,
    {
        match event {
            PlayerEvent::Ready => {
                if self.duration().is_none() {
                    if let Some(live) = live_duration().filter(|d| is_plausible_duration(*d)) {
                        self.cached_duration = live;
                    }
                }
                vec![PlayerSignal::Ready]
            }
            PlayerEvent::Loaded { duration } | PlayerEvent::Metadata { duration } => {
                self.accept_duration(duration).into_iter().collect()
            }
            PlayerEvent::TimeUpdate {
                current_time,
                duration,
            } => self
                .time_update(current_time, duration, live_duration)
                .into_iter()
                .collect(),
            PlayerEvent::Play => vec![PlayerSignal::Play],
            PlayerEvent::Pause => vec![PlayerSignal::Pause],
            PlayerEvent::Ended => self.ended(),
            PlayerEvent::Error { message } => vec![PlayerSignal::Error(message)],
        }
    }

    /// Take a duration from a lifecycle or metadata event
    fn accept_duration(&mut self, reported: Option<f64>) -> Option<PlayerSignal> {
        let reported = reported?;

        if !is_plausible_duration(reported) {
            self.diagnostics
                .record(&format!("Ignoring implausible duration {reported}"));
            return None;
        }

        if reported <= self.cached_duration {
            if reported < self.cached_duration {
                debug!(
                    cached = self.cached_duration,
                    duration = reported,
                    "Ignoring shorter duration"
                );
            }
            return None;
        }

        debug!(
            previous = self.cached_duration,
            duration = reported,
            "Duration updated"
        );
        self.cached_duration = reported;

        // Self-heal: re-emit the last known position against the new duration
        let current_time = self.last_time?;
        self.emit(current_time, reported)
    }

    fn time_update<F>(
        &mut self,
        current_time: f64,
        reported: Option<f64>,
        live_duration: F,
    ) -> Option<PlayerSignal>
    where
        F: FnOnce() -> Option<f64>,
    {
        self.last_time = Some(current_time);

        if self.duration().is_none() {
            let adopted = reported
                .filter(|d| is_plausible_duration(*d))
                .or_else(|| live_duration().filter(|d| is_plausible_duration(*d)));

            match adopted {
                Some(duration) => self.cached_duration = duration,
                None => {
                    self.diagnostics.record(&format!(
                        "Suppressing progress at {current_time}s: no plausible duration"
                    ));
                    return None;
                }
            }
        }

        self.emit(current_time, self.cached_duration)
    }

    fn ended(&mut self) -> Vec<PlayerSignal> {
        let mut signals = Vec::with_capacity(2);

        if let Some(duration) = self.duration() {
            let already_complete = self.last_emitted.is_some_and(|p| p.is_complete());
            if !already_complete {
                if let Some(done) = ProgressValue::completed(duration) {
                    self.last_time = Some(duration);
                    self.last_emitted = Some(done);
                    signals.push(PlayerSignal::Progress(done));
                }
            }
        }

        signals.push(PlayerSignal::Completed);
        signals
    }

    fn emit(&mut self, current_time: f64, duration: f64) -> Option<PlayerSignal> {
        let progress = ProgressValue::from_playback(current_time, duration)?;
        self.last_emitted = Some(progress);
        Some(PlayerSignal::Progress(progress))
    }
}
