//! Heartbeat dispatcher
//!
//! Progress events can fire several times per second. The dispatcher keeps at
//! most one pending entry per lesson (last value wins) and ships everything
//! pending on a fixed cadence, so the backend sees a bounded request rate no
//! matter how noisy the player is.

use crate::client::ProgressSink;
use crate::types::HeartbeatConfig;
use futures_util::future::join_all;
use lesson_core::{HeartbeatQueueEntry, LessonId, PlaybackContext, ProgressReporter, ProgressValue};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, trace, warn};

/// Outcome of one drain cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Entries the backend accepted
    pub delivered: usize,
    /// Entries that failed and were put back for one more attempt
    pub requeued: usize,
    /// Entries that failed for the last time (or were superseded) and were dropped
    pub dropped: usize,
}

impl DispatchReport {
    pub fn attempted(&self) -> usize {
        self.delivered + self.requeued + self.dropped
    }
}

/// Per-lesson coalescing progress queue with a background drain cycle.
///
/// Cloning is cheap and every clone shares the same queue.
#[derive(Clone)]
pub struct HeartbeatDispatcher {
    inner: Arc<Inner>,
}

struct Inner {
    sink: Arc<dyn ProgressSink>,
    config: HeartbeatConfig,
    pending: Mutex<HashMap<LessonId, HeartbeatQueueEntry>>,
    worker: Mutex<Option<Worker>>,
}

/// Background drain task and its stop signal
struct Worker {
    handle: JoinHandle<()>,
    stop: watch::Sender<bool>,
}

impl Worker {
    /// Ask the task to exit. A cycle already delivering runs to completion.
    fn signal_stop(&self) {
        let _ = self.stop.send(true);
    }
}

impl Inner {
    /// Lock the pending map, recovering from poisoning: a panic elsewhere must
    /// not make progress reporting start failing.
    fn pending(&self) -> MutexGuard<'_, HashMap<LessonId, HeartbeatQueueEntry>> {
        self.pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn worker(&self) -> MutexGuard<'_, Option<Worker>> {
        self.worker
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl HeartbeatDispatcher {
    /// Create an idle dispatcher. Call [`start`](Self::start) to run the
    /// background cycle, or drive it manually with
    /// [`dispatch_pending`](Self::dispatch_pending).
    pub fn new(sink: Arc<dyn ProgressSink>, config: HeartbeatConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                sink,
                config,
                pending: Mutex::new(HashMap::new()),
                worker: Mutex::new(None),
            }),
        }
    }

    pub fn config(&self) -> &HeartbeatConfig {
        &self.inner.config
    }

    /// Record the latest progress for a lesson, replacing any pending entry
    /// for the same lesson. Never blocks on I/O and never fails.
    pub fn enqueue(&self, lesson_id: LessonId, progress: ProgressValue, context: PlaybackContext) {
        let entry = HeartbeatQueueEntry::new(lesson_id.clone(), progress, context);
        let replaced = self.inner.pending().insert(lesson_id, entry);

        trace!(
            percentage = progress.percentage(),
            coalesced = replaced.is_some(),
            "Heartbeat enqueued"
        );
    }

    /// Number of lessons with a pending entry
    pub fn pending_len(&self) -> usize {
        self.inner.pending().len()
    }

    /// Pending entry for a lesson, if any
    pub fn pending_for(&self, lesson_id: &LessonId) -> Option<HeartbeatQueueEntry> {
        self.inner.pending().get(lesson_id).cloned()
    }

    /// Drain every pending entry and deliver them concurrently.
    ///
    /// A failure for one lesson never holds back another. A transiently failed
    /// entry goes back into the queue for the next cycle while it has attempts
    /// left and no newer entry for the same lesson arrived in the meantime.
    /// Rejections that a retry cannot fix (401, other 4xx) are dropped at once.
    pub async fn dispatch_pending(&self) -> DispatchReport {
        let batch: Vec<HeartbeatQueueEntry> = {
            let mut pending = self.inner.pending();
            pending.drain().map(|(_, entry)| entry).collect()
        };

        if batch.is_empty() {
            return DispatchReport::default();
        }

        let deliveries = batch.into_iter().map(|mut entry| {
            let sink = Arc::clone(&self.inner.sink);
            async move {
                entry.attempts += 1;
                let result = sink.deliver(&entry.payload()).await;
                (entry, result)
            }
        });

        let mut report = DispatchReport::default();

        for (entry, result) in join_all(deliveries).await {
            match result {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    warn!(
                        lesson_id = %entry.lesson_id,
                        attempt = entry.attempts,
                        error = %e,
                        "Heartbeat delivery failed"
                    );

                    if !e.is_transient() {
                        report.dropped += 1;
                    } else if entry.attempts < self.inner.config.max_attempts {
                        let mut pending = self.inner.pending();
                        if pending.contains_key(&entry.lesson_id) {
                            // A newer value supersedes the failed one
                            report.dropped += 1;
                        } else {
                            pending.insert(entry.lesson_id.clone(), entry);
                            report.requeued += 1;
                        }
                    } else {
                        report.dropped += 1;
                    }
                }
            }
        }

        debug!(
            delivered = report.delivered,
            requeued = report.requeued,
            dropped = report.dropped,
            "Heartbeat cycle complete"
        );

        report
    }

    /// Deliver everything pending before the dispatcher goes away.
    ///
    /// Failed entries are retried in place while they have attempts left
    /// instead of being requeued for a cycle that will never run. Whatever
    /// is still pending afterwards is dropped and counted as such.
    pub async fn flush(&self) -> DispatchReport {
        let mut report = DispatchReport::default();

        for _ in 0..self.inner.config.max_attempts.max(1) {
            let round = self.dispatch_pending().await;
            report.delivered += round.delivered;
            report.dropped += round.dropped;

            if round.requeued == 0 {
                break;
            }
        }

        let leftover = self.inner.pending().drain().count();
        if leftover > 0 {
            warn!(entries = leftover, "Heartbeats dropped at session end");
            report.dropped += leftover;
        }

        report
    }

    /// Spawn the background drain cycle on the current tokio runtime.
    ///
    /// The first drain happens one interval after start. Calling `start` on a
    /// running dispatcher is a no-op.
    pub fn start(&self) {
        let mut worker = self.inner.worker();
        if worker
            .as_ref()
            .is_some_and(|worker| !worker.handle.is_finished())
        {
            return;
        }

        let period = self.inner.config.interval();
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        let (stop, mut stopped) = watch::channel(false);

        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                // The stop signal is only observed between cycles, so an
                // in-flight delivery is never cut off
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = stopped.changed() => break,
                }

                // Stop once every handle to the dispatcher is gone
                let Some(inner) = weak.upgrade() else { break };
                HeartbeatDispatcher { inner }.dispatch_pending().await;
            }
        });

        *worker = Some(Worker { handle, stop });
        debug!(interval_secs = period.as_secs(), "Heartbeat cycle started");
    }

    /// Stop the background cycle without waiting for it. Pending entries stay
    /// queued; a cycle that is already delivering finishes on its own.
    pub fn stop(&self) {
        if let Some(worker) = self.inner.worker().take() {
            worker.signal_stop();
            debug!("Heartbeat cycle stopping");
        }
    }

    /// Stop the background cycle and wait for an in-flight delivery to settle
    pub async fn shutdown(&self) {
        let Some(worker) = self.inner.worker().take() else {
            return;
        };

        worker.signal_stop();
        if let Err(e) = worker.handle.await {
            if e.is_panic() {
                warn!(error = %e, "Heartbeat cycle panicked");
            }
        }
        debug!("Heartbeat cycle stopped");
    }

    pub fn is_running(&self) -> bool {
        self.inner
            .worker()
            .as_ref()
            .is_some_and(|worker| !worker.handle.is_finished())
    }
}

impl ProgressReporter for HeartbeatDispatcher {
    fn report(&self, progress: ProgressValue, context: &PlaybackContext) {
        self.enqueue(context.lesson_id.clone(), progress, context.clone());
    }
}

impl std::fmt::Debug for HeartbeatDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeartbeatDispatcher")
            .field("config", &self.inner.config)
            .field("pending", &self.pending_len())
            .finish_non_exhaustive()
    }
}
