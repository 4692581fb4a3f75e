//! Recorded telemetry replay
//!
//! A recording is a JSON-lines file of raw player events, one per line, as
//! captured from the embedded player. Replaying it mounts a real
//! `PlayerSession` whose player is the recording, so events go through the
//! same normalizer, store and reporter as a live player.

use crate::error::{AppError, Result};
use async_trait::async_trait;
use lesson_core::ProgressValue;
use lesson_playback::{
    EmbedRequest, EventStream, FallbackPanel, PlaybackStrategy, PlayerCallbacks, PlayerInstance,
    PlayerSignal, RawPlayerEvent, StrategyKind,
};
use std::io::BufRead;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

/// Read a JSON-lines recording. Blank lines and `#` comments are skipped.
pub fn read_events(reader: impl BufRead) -> Result<Vec<RawPlayerEvent>> {
    let mut events = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let value: serde_json::Value =
            serde_json::from_str(trimmed).map_err(|source| AppError::InvalidEvent {
                line: index + 1,
                source,
            })?;
        events.push(RawPlayerEvent::new(value));
    }

    Ok(events)
}

/// Strategy whose player plays back a recording
pub struct ReplayStrategy {
    events: Mutex<Option<Vec<RawPlayerEvent>>>,
}

impl ReplayStrategy {
    pub fn new(events: Vec<RawPlayerEvent>) -> Self {
        Self {
            events: Mutex::new(Some(events)),
        }
    }
}

#[async_trait]
impl PlaybackStrategy for ReplayStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Replay
    }

    async fn initialize(
        &self,
        _request: &EmbedRequest,
    ) -> lesson_playback::Result<Arc<dyn PlayerInstance>> {
        let events = self
            .events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
            .unwrap_or_default();

        Ok(Arc::new(ReplayInstance {
            id: Uuid::new_v4(),
            events: Mutex::new(Some(EventStream::finite(events))),
            destroyed: AtomicBool::new(false),
        }))
    }

    fn teardown_container(&self, _container_id: &str) {}
}

struct ReplayInstance {
    id: Uuid,
    events: Mutex<Option<EventStream>>,
    destroyed: AtomicBool,
}

impl PlayerInstance for ReplayInstance {
    fn id(&self) -> Uuid {
        self.id
    }

    fn kind(&self) -> StrategyKind {
        StrategyKind::Replay
    }

    fn duration(&self) -> Option<f64> {
        None
    }

    fn seek(&self, seconds: f64) {
        tracing::debug!(seconds, "Seek ignored during replay");
    }

    fn take_events(&self) -> Option<EventStream> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
    }

    fn destroy(&self) {
        self.destroyed.store(true, Ordering::SeqCst);
    }

    fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::SeqCst)
    }
}

/// Host callbacks that keep every signal in order
#[derive(Default)]
pub struct SignalLog {
    signals: Mutex<Vec<PlayerSignal>>,
}

impl SignalLog {
    fn signals_mut(&self) -> MutexGuard<'_, Vec<PlayerSignal>> {
        self.signals
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn signals(&self) -> Vec<PlayerSignal> {
        self.signals_mut().clone()
    }

    /// Last progress value seen
    pub fn last_progress(&self) -> Option<ProgressValue> {
        self.signals_mut().iter().rev().find_map(|signal| match signal {
            PlayerSignal::Progress(progress) => Some(*progress),
            _ => None,
        })
    }
}

impl PlayerCallbacks for SignalLog {
    fn on_progress(&self, progress: &ProgressValue) {
        self.signals_mut().push(PlayerSignal::Progress(*progress));
    }

    fn on_ready(&self) {
        self.signals_mut().push(PlayerSignal::Ready);
    }

    fn on_error(&self, message: &str) {
        self.signals_mut()
            .push(PlayerSignal::Error(message.to_string()));
    }

    fn on_complete(&self) {
        self.signals_mut().push(PlayerSignal::Completed);
    }

    fn on_play(&self) {
        self.signals_mut().push(PlayerSignal::Play);
    }

    fn on_pause(&self) {
        self.signals_mut().push(PlayerSignal::Pause);
    }

    fn on_fallback(&self, panel: &FallbackPanel) {
        tracing::warn!(url = panel.open_url(), "Replay fell back to the static panel");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_events_skips_blanks_and_comments() {
        let input = "# recorded 2024-03-01\n{\"event\":\"ready\"}\n\n{\"event\":\"play\"}\n";
        let events = read_events(input.as_bytes()).unwrap();

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].name(), Some("ready"));
    }

    #[test]
    fn test_read_events_reports_line() {
        let input = "{\"event\":\"ready\"}\nnot json\n";

        match read_events(input.as_bytes()) {
            Err(AppError::InvalidEvent { line, .. }) => assert_eq!(line, 2),
            other => panic!("Expected InvalidEvent, got {:?}", other.map(|e| e.len())),
        }
    }

    #[test]
    fn test_replay_reports_its_own_kind() {
        let strategy = ReplayStrategy::new(Vec::new());
        assert_eq!(strategy.kind(), StrategyKind::Replay);
        assert_eq!(strategy.kind().to_string(), "replay");

        let instance = ReplayInstance {
            id: Uuid::new_v4(),
            events: Mutex::new(None),
            destroyed: AtomicBool::new(false),
        };
        assert_eq!(instance.kind(), StrategyKind::Replay);
    }

    #[test]
    fn test_signal_log_last_progress() {
        let log = SignalLog::default();
        assert_eq!(log.last_progress(), None);

        let first = ProgressValue::from_playback(10.0, 100.0).unwrap();
        let second = ProgressValue::from_playback(20.0, 100.0).unwrap();
        log.on_progress(&first);
        log.on_pause();
        log.on_progress(&second);

        assert_eq!(log.last_progress(), Some(second));
        assert_eq!(log.signals().len(), 3);
    }
}
