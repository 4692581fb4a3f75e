//! Player session - one mounted player on a lesson page
//!
//! Wires the pieces together: the manager produces an instance, a pump task
//! feeds its events through the normalizer, and valid progress fans out to
//! the local store, the heartbeat reporter and the host callbacks. The resume
//! banner is decided at mount and its countdown runs as a second task.

use crate::error::{PlaybackError, Result};
use crate::events::{PlayerEvent, PlayerSignal};
use crate::fallback::FallbackPanel;
use crate::manager::StrategyManager;
use crate::normalizer::EventNormalizer;
use crate::resume::{BannerState, ResumeBanner, ResumeDecision};
use crate::strategy::{EventStream, PlayerInstance};
use crate::types::{FailureReason, ManagerState, PlayerConfig, ResumeConfig};
use lesson_core::{PlaybackContext, ProgressReporter, ProgressStore, ProgressValue};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};
use tracing::{debug, info, warn};

const COUNTDOWN_TICK: Duration = Duration::from_secs(1);

/// Host integration points.
///
/// Every method has a no-op default so hosts only implement what they use.
pub trait PlayerCallbacks: Send + Sync {
    fn on_progress(&self, _progress: &ProgressValue) {}
    fn on_ready(&self) {}
    fn on_error(&self, _message: &str) {}
    fn on_complete(&self) {}
    fn on_play(&self) {}
    fn on_pause(&self) {}
    /// The fallback panel replaced the player
    fn on_fallback(&self, _panel: &FallbackPanel) {}
}

/// Callbacks that ignore everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopCallbacks;

impl PlayerCallbacks for NoopCallbacks {}

/// Collaborators a session reports into
#[derive(Clone)]
pub struct SessionServices {
    pub store: Arc<dyn ProgressStore>,
    pub reporter: Arc<dyn ProgressReporter>,
    pub callbacks: Arc<dyn PlayerCallbacks>,
}

/// Mutable playback state shared between the session and its tasks.
///
/// Only held for bookkeeping; store writes, reporting and host callbacks run
/// after the guard is released so a callback may call back into the session.
struct Pipeline {
    normalizer: EventNormalizer,
    banner: ResumeBanner,
    instance: Option<Arc<dyn PlayerInstance>>,
    pending_seek: Option<f64>,
}

impl Pipeline {
    fn handle(&mut self, event: PlayerEvent) -> Vec<PlayerSignal> {
        let instance = self.instance.clone();
        self.normalizer
            .normalize(event, || instance.as_ref().and_then(|i| i.duration()))
    }

    /// Where a banner decision lands: the live instance, or the pending seek
    /// applied once the player is ready.
    fn place(&mut self, decision: ResumeDecision) -> Option<Arc<dyn PlayerInstance>> {
        match &self.instance {
            Some(instance) => Some(Arc::clone(instance)),
            None => {
                self.pending_seek = Some(decision.position());
                None
            }
        }
    }
}

/// Destinations for signals; fixed for the life of the mount
struct Outlet {
    context: PlaybackContext,
    save_progress: bool,
    services: SessionServices,
}

impl Outlet {
    fn dispatch(&self, signal: PlayerSignal) {
        let callbacks = &self.services.callbacks;

        match signal {
            PlayerSignal::Progress(progress) => {
                if self.save_progress {
                    if let Err(e) = self.services.store.save(&self.context.lesson_id, &progress) {
                        warn!(lesson_id = %self.context.lesson_id, error = %e, "Failed to save progress");
                    }
                }
                self.services.reporter.report(progress, &self.context);
                callbacks.on_progress(&progress);
            }
            PlayerSignal::Ready => callbacks.on_ready(),
            PlayerSignal::Play => callbacks.on_play(),
            PlayerSignal::Pause => callbacks.on_pause(),
            PlayerSignal::Completed => callbacks.on_complete(),
            PlayerSignal::Error(message) => {
                warn!(lesson_id = %self.context.lesson_id, %message, "Player reported an error");
                callbacks.on_error(&message);
            }
        }
    }

    fn apply(&self, decision: ResumeDecision, target: Option<Arc<dyn PlayerInstance>>) {
        if decision == ResumeDecision::Restart {
            if let Err(e) = self.services.store.clear(&self.context.lesson_id) {
                warn!(lesson_id = %self.context.lesson_id, error = %e, "Failed to clear saved progress");
            }
        }

        let position = decision.position();
        info!(lesson_id = %self.context.lesson_id, position, "Applying resume decision");

        if let Some(instance) = target {
            instance.seek(position);
        }
    }
}

struct Shared {
    pipeline: Mutex<Pipeline>,
    outlet: Outlet,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Pipeline> {
        self.pipeline
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// One mounted player
pub struct PlayerSession {
    manager: StrategyManager,
    config: PlayerConfig,
    shared: Arc<Shared>,
    pump: Option<JoinHandle<()>>,
    countdown: Option<JoinHandle<()>>,
    fallback: Option<FallbackPanel>,
}

impl PlayerSession {
    /// Mount a player for a lesson.
    ///
    /// `saved` is the prior progress passed in by the host; when absent the
    /// store is consulted. A store failure counts as "no saved progress".
    pub fn mount(
        context: PlaybackContext,
        config: PlayerConfig,
        resume: ResumeConfig,
        manager: StrategyManager,
        services: SessionServices,
        saved: Option<ProgressValue>,
    ) -> Self {
        let saved = saved.or_else(|| match services.store.load(&context.lesson_id) {
            Ok(record) => record.and_then(|r| r.progress()),
            Err(e) => {
                warn!(lesson_id = %context.lesson_id, error = %e, "Saved progress unavailable");
                None
            }
        });

        let mut banner = ResumeBanner::new(resume);
        banner.present(saved);

        debug!(
            lesson_id = %context.lesson_id,
            banner = banner.is_visible(),
            "Player mounted"
        );

        Self {
            manager,
            shared: Arc::new(Shared {
                pipeline: Mutex::new(Pipeline {
                    normalizer: EventNormalizer::new(),
                    banner,
                    instance: None,
                    pending_seek: None,
                }),
                outlet: Outlet {
                    context,
                    save_progress: config.save_progress,
                    services,
                },
            }),
            config,
            pump: None,
            countdown: None,
            fallback: None,
        }
    }

    /// Start the banner countdown (if shown) and initialize the player.
    ///
    /// On failure the fallback panel is built and handed to the host; the
    /// error is returned as well.
    pub async fn start(
        &mut self,
        container_id: &str,
        video_id: &str,
        library_id: Option<&str>,
    ) -> Result<()> {
        let banner_visible = self.shared.lock().banner.is_visible();
        if banner_visible && self.countdown.is_none() {
            self.countdown = Some(spawn_countdown(Arc::clone(&self.shared)));
        }

        let result = self
            .manager
            .initialize(container_id, video_id, library_id, &self.config)
            .await;
        self.finish_init(result)
    }

    /// Retry from the fallback panel
    pub async fn retry(&mut self) -> Result<()> {
        if self.fallback.is_none() {
            return Err(PlaybackError::InvalidState(
                "retry is only available from the fallback panel".to_string(),
            ));
        }

        let result = self.manager.retry().await;
        self.finish_init(result)
    }

    fn finish_init(&mut self, result: Result<Arc<dyn PlayerInstance>>) -> Result<()> {
        if let Some(pump) = self.pump.take() {
            pump.abort();
        }

        match result {
            Ok(instance) => {
                self.fallback = None;
                let events = instance.take_events();

                let pending_seek = {
                    let mut pipeline = self.shared.lock();
                    pipeline.normalizer.reset();
                    pipeline.instance = Some(Arc::clone(&instance));
                    pipeline.pending_seek.take()
                };
                if let Some(position) = pending_seek {
                    instance.seek(position);
                }

                if let Some(events) = events {
                    self.pump = Some(spawn_pump(Arc::clone(&self.shared), events));
                }
                Ok(())
            }
            Err(e) => {
                let reason = match self.manager.state() {
                    ManagerState::Failed(reason) => reason.clone(),
                    _ => FailureReason::Error(e.to_string()),
                };

                self.shared.lock().instance = None;

                let outlet = &self.shared.outlet;
                let callbacks = &outlet.services.callbacks;

                callbacks.on_error(&e.to_string());
                if let Some(request) = self.manager.last_request() {
                    let panel = FallbackPanel::new(request, &outlet.context, reason);
                    info!(
                        lesson_id = %outlet.context.lesson_id,
                        url = panel.open_url(),
                        "Showing fallback panel"
                    );
                    callbacks.on_fallback(&panel);
                    self.fallback = Some(panel);
                }
                Err(e)
            }
        }
    }

    /// Viewer clicked "resume"
    pub fn resume(&self) -> Option<ResumeDecision> {
        let (decision, target) = {
            let mut pipeline = self.shared.lock();
            let decision = pipeline.banner.resume()?;
            (decision, pipeline.place(decision))
        };
        self.shared.outlet.apply(decision, target);
        Some(decision)
    }

    /// Viewer clicked "restart"; also clears the saved position
    pub fn restart(&self) -> Option<ResumeDecision> {
        let (decision, target) = {
            let mut pipeline = self.shared.lock();
            let decision = pipeline.banner.restart()?;
            (decision, pipeline.place(decision))
        };
        self.shared.outlet.apply(decision, target);
        Some(decision)
    }

    /// Viewer closed the banner without choosing
    pub fn dismiss(&self) -> bool {
        self.shared.lock().banner.dismiss()
    }

    pub fn banner_state(&self) -> BannerState {
        self.shared.lock().banner.state()
    }

    pub fn manager_state(&self) -> &ManagerState {
        self.manager.state()
    }

    /// The fallback panel, while initialization is failed
    pub fn fallback(&self) -> Option<&FallbackPanel> {
        self.fallback.as_ref()
    }

    pub fn instance(&self) -> Option<Arc<dyn PlayerInstance>> {
        self.manager.instance()
    }

    pub fn context(&self) -> PlaybackContext {
        self.shared.outlet.context.clone()
    }

    /// Wait until the player stops emitting events.
    ///
    /// Live players only end their stream when destroyed; recorded ones end
    /// after the last event.
    pub async fn closed(&mut self) {
        if let Some(pump) = self.pump.take() {
            if let Err(e) = pump.await {
                if e.is_panic() {
                    warn!(error = %e, "Player event pump panicked");
                }
            }
        }
    }

    /// Unmount: stop the tasks, stop the countdown without applying it and
    /// destroy the instance.
    pub fn unmount(&mut self) {
        if let Some(pump) = self.pump.take() {
            pump.abort();
        }
        if let Some(countdown) = self.countdown.take() {
            countdown.abort();
        }

        {
            let mut pipeline = self.shared.lock();
            pipeline.banner.stop();
            pipeline.instance = None;
            pipeline.pending_seek = None;
            pipeline.normalizer.reset();
        }

        self.manager.teardown();
        self.fallback = None;
    }
}

impl Drop for PlayerSession {
    fn drop(&mut self) {
        self.unmount();
    }
}

fn spawn_pump(shared: Arc<Shared>, mut events: EventStream) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(raw) = events.next().await {
            let Some(event) = PlayerEvent::parse(&raw) else {
                continue;
            };

            let signals = shared.lock().handle(event);
            for signal in signals {
                shared.outlet.dispatch(signal);
            }
        }
        debug!("Player event stream ended");
    })
}

fn spawn_countdown(shared: Arc<Shared>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + COUNTDOWN_TICK, COUNTDOWN_TICK);

        loop {
            ticker.tick().await;

            let fired = {
                let mut pipeline = shared.lock();
                if !pipeline.banner.is_visible() {
                    break;
                }
                pipeline
                    .banner
                    .tick()
                    .map(|decision| (decision, pipeline.place(decision)))
            };

            if let Some((decision, target)) = fired {
                shared.outlet.apply(decision, target);
                break;
            }
        }
    })
}
