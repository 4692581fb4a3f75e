//! Heartbeat dispatcher behavior: coalescing, cadence, retry bound.
//!
//! Uses a recording sink and paused tokio time so the drain cycle is
//! simulated instead of waited for.

use async_trait::async_trait;
use lesson_core::{HeartbeatPayload, LessonId, PlaybackContext, ProgressValue};
use lesson_server_client::{
    HeartbeatConfig, HeartbeatDispatcher, HeartbeatProvider, ProgressSink, Result,
    ServerClientError,
};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ===== Test Helpers =====

/// Sink that records every delivery and fails for selected lessons
#[derive(Default)]
struct RecordingSink {
    delivered: Mutex<Vec<HeartbeatPayload>>,
    attempts: Mutex<Vec<String>>,
    failing: Mutex<HashSet<String>>,
    fail_once: Mutex<HashSet<String>>,
    latency: Mutex<Option<Duration>>,
}

impl RecordingSink {
    fn fail_for(&self, lesson: &str) {
        self.failing.lock().unwrap().insert(lesson.to_string());
    }

    fn fail_next(&self, lesson: &str) {
        self.fail_once.lock().unwrap().insert(lesson.to_string());
    }

    fn respond_after(&self, latency: Duration) {
        *self.latency.lock().unwrap() = Some(latency);
    }

    fn heal(&self, lesson: &str) {
        self.failing.lock().unwrap().remove(lesson);
    }

    fn delivered(&self) -> Vec<HeartbeatPayload> {
        self.delivered.lock().unwrap().clone()
    }

    fn attempts_for(&self, lesson: &str) -> usize {
        self.attempts
            .lock()
            .unwrap()
            .iter()
            .filter(|l| l.as_str() == lesson)
            .count()
    }
}

#[async_trait]
impl ProgressSink for RecordingSink {
    async fn deliver(&self, payload: &HeartbeatPayload) -> Result<()> {
        let lesson = payload.lesson_id.to_string();
        self.attempts.lock().unwrap().push(lesson.clone());

        let latency = *self.latency.lock().unwrap();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        if self.failing.lock().unwrap().contains(&lesson)
            || self.fail_once.lock().unwrap().remove(&lesson)
        {
            return Err(ServerClientError::ServerUnreachable("offline".into()));
        }

        self.delivered.lock().unwrap().push(payload.clone());
        Ok(())
    }
}

fn progress(current_time: f64) -> ProgressValue {
    ProgressValue::from_playback(current_time, 600.0).unwrap()
}

fn enqueue(dispatcher: &HeartbeatDispatcher, lesson: &str, current_time: f64) {
    let id = LessonId::new(lesson);
    dispatcher.enqueue(id.clone(), progress(current_time), PlaybackContext::new(id));
}

fn dispatcher_with(sink: &Arc<RecordingSink>, config: HeartbeatConfig) -> HeartbeatDispatcher {
    HeartbeatDispatcher::new(Arc::clone(sink) as Arc<dyn ProgressSink>, config)
}

// ===== Coalescing =====

#[tokio::test]
async fn three_rapid_updates_deliver_one_payload_with_last_value() {
    let sink = Arc::new(RecordingSink::default());
    let dispatcher = dispatcher_with(&sink, HeartbeatConfig::default());

    enqueue(&dispatcher, "lesson-1", 100.0);
    enqueue(&dispatcher, "lesson-1", 100.4);
    enqueue(&dispatcher, "lesson-1", 100.9);
    assert_eq!(dispatcher.pending_len(), 1);

    let report = dispatcher.dispatch_pending().await;
    assert_eq!(report.delivered, 1);

    let delivered = sink.delivered();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].progress.current_time(), 100.9);
}

#[tokio::test]
async fn coalescing_is_keyed_by_lesson() {
    let sink = Arc::new(RecordingSink::default());
    let dispatcher = dispatcher_with(&sink, HeartbeatConfig::default());

    enqueue(&dispatcher, "a", 1.0);
    enqueue(&dispatcher, "b", 2.0);
    enqueue(&dispatcher, "a", 3.0);

    let report = dispatcher.dispatch_pending().await;
    assert_eq!(report.delivered, 2);

    let mut delivered: Vec<(String, f64)> = sink
        .delivered()
        .into_iter()
        .map(|p| (p.lesson_id.to_string(), p.progress.current_time()))
        .collect();
    delivered.sort_by(|x, y| x.0.cmp(&y.0));
    assert_eq!(delivered, vec![("a".to_string(), 3.0), ("b".to_string(), 2.0)]);
}

#[tokio::test]
async fn concurrent_players_do_not_corrupt_each_other() {
    let sink = Arc::new(RecordingSink::default());
    let dispatcher = dispatcher_with(&sink, HeartbeatConfig::default());

    let mut handles = Vec::new();
    for player in 0..4 {
        let dispatcher = dispatcher.clone();
        handles.push(tokio::spawn(async move {
            for step in 0..50 {
                enqueue(&dispatcher, &format!("lesson-{player}"), f64::from(step));
                tokio::task::yield_now().await;
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(dispatcher.pending_len(), 4);
    dispatcher.dispatch_pending().await;

    let delivered = sink.delivered();
    assert_eq!(delivered.len(), 4);
    assert!(delivered.iter().all(|p| p.progress.current_time() == 49.0));
}

// ===== Retry bound =====

#[tokio::test]
async fn failed_entry_is_retried_at_most_once() {
    let sink = Arc::new(RecordingSink::default());
    sink.fail_for("flaky");
    let dispatcher = dispatcher_with(&sink, HeartbeatConfig::default());

    enqueue(&dispatcher, "flaky", 10.0);

    let first = dispatcher.dispatch_pending().await;
    assert_eq!(first.requeued, 1);

    let second = dispatcher.dispatch_pending().await;
    assert_eq!(second.dropped, 1);

    let third = dispatcher.dispatch_pending().await;
    assert_eq!(third.attempted(), 0);
    assert_eq!(sink.attempts_for("flaky"), 2);
}

#[tokio::test]
async fn retry_succeeds_when_backend_recovers() {
    let sink = Arc::new(RecordingSink::default());
    sink.fail_for("flaky");
    let dispatcher = dispatcher_with(&sink, HeartbeatConfig::default());

    enqueue(&dispatcher, "flaky", 10.0);
    dispatcher.dispatch_pending().await;

    sink.heal("flaky");
    let report = dispatcher.dispatch_pending().await;
    assert_eq!(report.delivered, 1);
    assert_eq!(sink.delivered()[0].progress.current_time(), 10.0);
}

#[tokio::test]
async fn newer_value_supersedes_failed_retry() {
    let sink = Arc::new(RecordingSink::default());
    let dispatcher = dispatcher_with(&sink, HeartbeatConfig::default());
    sink.fail_for("lesson");

    enqueue(&dispatcher, "lesson", 10.0);
    dispatcher.dispatch_pending().await;

    // A fresh update replaces the requeued one
    enqueue(&dispatcher, "lesson", 20.0);
    sink.heal("lesson");
    dispatcher.dispatch_pending().await;

    let delivered = sink.delivered();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].progress.current_time(), 20.0);
}

#[tokio::test]
async fn single_attempt_config_drops_immediately() {
    let sink = Arc::new(RecordingSink::default());
    sink.fail_for("x");
    let dispatcher = dispatcher_with(
        &sink,
        HeartbeatConfig {
            max_attempts: 1,
            ..Default::default()
        },
    );

    enqueue(&dispatcher, "x", 1.0);
    let report = dispatcher.dispatch_pending().await;
    assert_eq!(report.dropped, 1);
    assert_eq!(dispatcher.pending_len(), 0);
}

// ===== Cadence =====

#[tokio::test(start_paused = true)]
async fn background_cycle_drains_on_interval() {
    let sink = Arc::new(RecordingSink::default());
    let dispatcher = dispatcher_with(
        &sink,
        HeartbeatConfig {
            interval_secs: 5,
            ..Default::default()
        },
    );
    dispatcher.start();
    assert!(dispatcher.is_running());

    enqueue(&dispatcher, "lesson", 42.0);

    // Nothing is sent before the first interval elapses
    tokio::time::sleep(Duration::from_secs(4)).await;
    assert!(sink.delivered().is_empty());

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(sink.delivered().len(), 1);

    // The queue is empty again; enqueue rate does not drive sends
    enqueue(&dispatcher, "lesson", 43.0);
    enqueue(&dispatcher, "lesson", 44.0);
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(sink.delivered().len(), 2);
    assert_eq!(sink.delivered()[1].progress.current_time(), 44.0);

    dispatcher.stop();
    assert!(!dispatcher.is_running());
}

#[tokio::test(start_paused = true)]
async fn provider_final_drain_on_session_end() {
    let sink = Arc::new(RecordingSink::default());
    let provider = HeartbeatProvider::new(
        Arc::clone(&sink) as Arc<dyn ProgressSink>,
        HeartbeatConfig::default(),
    );

    let dispatcher = provider.get_instance();
    enqueue(&dispatcher, "lesson-1", 5.0);
    enqueue(&dispatcher, "lesson-2", 6.0);

    let report = provider.end_session().await.unwrap();
    assert_eq!(report.delivered, 2);
    assert!(!provider.is_active());

    // A new session gets a fresh dispatcher with an empty queue
    let next = provider.get_instance();
    assert_eq!(next.pending_len(), 0);
}

fn provider_for(sink: &Arc<RecordingSink>) -> HeartbeatProvider {
    HeartbeatProvider::new(
        Arc::clone(sink) as Arc<dyn ProgressSink>,
        HeartbeatConfig::default(),
    )
}

#[tokio::test(start_paused = true)]
async fn session_end_waits_for_in_flight_delivery() {
    let sink = Arc::new(RecordingSink::default());
    sink.respond_after(Duration::from_secs(2));
    let provider = provider_for(&sink);

    let dispatcher = provider.get_instance();
    enqueue(&dispatcher, "lesson-1", 42.0);

    // The first cycle fires at 10s and is still waiting on the backend
    tokio::time::sleep(Duration::from_secs(11)).await;
    assert_eq!(dispatcher.pending_len(), 0);
    assert!(sink.delivered().is_empty());

    provider.end_session().await.unwrap();

    let delivered = sink.delivered();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].progress.current_time(), 42.0);
    assert_eq!(sink.attempts_for("lesson-1"), 1);
    assert!(!dispatcher.is_running());
}

#[tokio::test(start_paused = true)]
async fn session_end_retries_failed_entry_in_place() {
    let sink = Arc::new(RecordingSink::default());
    sink.fail_next("lesson-1");
    let provider = provider_for(&sink);

    enqueue(&provider.get_instance(), "lesson-1", 30.0);

    let report = provider.end_session().await.unwrap();
    assert_eq!(report.delivered, 1);
    assert_eq!(report.dropped, 0);
    assert_eq!(report.requeued, 0);
    assert_eq!(sink.attempts_for("lesson-1"), 2);
    assert_eq!(sink.delivered()[0].progress.current_time(), 30.0);
}

#[tokio::test(start_paused = true)]
async fn session_end_drops_after_last_attempt() {
    let sink = Arc::new(RecordingSink::default());
    sink.fail_for("lesson-1");
    let provider = provider_for(&sink);

    let dispatcher = provider.get_instance();
    enqueue(&dispatcher, "lesson-1", 30.0);

    let report = provider.end_session().await.unwrap();
    assert_eq!(report.delivered, 0);
    assert_eq!(report.dropped, 1);
    assert_eq!(sink.attempts_for("lesson-1"), 2);
    assert_eq!(dispatcher.pending_len(), 0);
}

#[tokio::test(start_paused = true)]
async fn stopped_cycle_finishes_its_delivery() {
    let sink = Arc::new(RecordingSink::default());
    sink.respond_after(Duration::from_secs(2));
    let dispatcher = dispatcher_with(
        &sink,
        HeartbeatConfig {
            interval_secs: 5,
            ..Default::default()
        },
    );
    dispatcher.start();
    enqueue(&dispatcher, "lesson", 7.0);

    tokio::time::sleep(Duration::from_secs(6)).await;
    dispatcher.stop();
    assert!(!dispatcher.is_running());

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(sink.delivered().len(), 1);
    assert_eq!(sink.attempts_for("lesson"), 1);
}
