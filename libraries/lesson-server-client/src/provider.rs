//! Session-scoped dispatcher provider
//!
//! Every player mounted during a viewing session must report through the same
//! dispatcher so per-lesson coalescing holds across lesson navigation. The
//! provider owns that dispatcher instead of a global: the host keeps one
//! provider per session and tests build a fresh one per case.

use crate::client::ProgressSink;
use crate::heartbeat::{DispatchReport, HeartbeatDispatcher};
use crate::types::HeartbeatConfig;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::info;

/// Owner of the session's single [`HeartbeatDispatcher`].
pub struct HeartbeatProvider {
    sink: Arc<dyn ProgressSink>,
    config: HeartbeatConfig,
    slot: Mutex<Option<HeartbeatDispatcher>>,
}

impl HeartbeatProvider {
    pub fn new(sink: Arc<dyn ProgressSink>, config: HeartbeatConfig) -> Self {
        Self {
            sink,
            config,
            slot: Mutex::new(None),
        }
    }

    fn slot(&self) -> MutexGuard<'_, Option<HeartbeatDispatcher>> {
        self.slot
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// The session dispatcher, created and started on first use.
    ///
    /// Must be called from within a tokio runtime.
    pub fn get_instance(&self) -> HeartbeatDispatcher {
        let mut slot = self.slot();

        if let Some(dispatcher) = slot.as_ref() {
            return dispatcher.clone();
        }

        let dispatcher = HeartbeatDispatcher::new(Arc::clone(&self.sink), self.config.clone());
        dispatcher.start();
        *slot = Some(dispatcher.clone());

        info!(
            interval_secs = self.config.interval_secs,
            "Heartbeat dispatcher created for session"
        );
        dispatcher
    }

    /// Whether a dispatcher exists for the current session
    pub fn is_active(&self) -> bool {
        self.slot().is_some()
    }

    /// End the viewing session: let an in-flight cycle settle, then flush
    /// whatever is still pending. The next [`get_instance`](Self::get_instance)
    /// starts a fresh dispatcher.
    pub async fn end_session(&self) -> Option<DispatchReport> {
        let dispatcher = self.slot().take()?;

        dispatcher.shutdown().await;
        let report = dispatcher.flush().await;

        info!(
            delivered = report.delivered,
            dropped = report.dropped,
            "Heartbeat session ended"
        );
        Some(report)
    }
}

impl std::fmt::Debug for HeartbeatProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeartbeatProvider")
            .field("config", &self.config)
            .field("active", &self.is_active())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MockProgressSink;
    use lesson_core::{LessonId, PlaybackContext, ProgressValue};

    #[tokio::test]
    async fn same_instance_until_session_ends() {
        let mut sink = MockProgressSink::new();
        sink.expect_deliver().times(1).returning(|_| Ok(()));
        let provider = HeartbeatProvider::new(Arc::new(sink), HeartbeatConfig::default());

        let first = provider.get_instance();
        let second = provider.get_instance();

        let lesson = LessonId::new("l1");
        first.enqueue(
            lesson.clone(),
            ProgressValue::from_playback(12.0, 120.0).unwrap(),
            PlaybackContext::new(lesson.clone()),
        );
        // Both handles see the same queue
        assert_eq!(second.pending_len(), 1);

        let report = provider.end_session().await.expect("session was active");
        assert_eq!(report.delivered, 1);
        assert!(!provider.is_active());
        assert!(!first.is_running());
    }

    #[tokio::test]
    async fn end_session_without_instance_is_noop() {
        let provider =
            HeartbeatProvider::new(Arc::new(MockProgressSink::new()), HeartbeatConfig::default());
        assert!(provider.end_session().await.is_none());
    }
}
