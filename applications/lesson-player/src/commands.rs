/// CLI command implementations
///
/// Each command returns data; printing is left to `main`.
use crate::config::AppConfig;
use crate::error::{AppError, Result};
use crate::replay::{ReplayStrategy, SignalLog};
use lesson_core::{
    CourseId, LessonId, PersistedProgressRecord, PlaybackContext, ProgressReporter, ProgressValue,
};
use lesson_playback::{
    EmbedUrl, PlaybackStrategy, PlayerSession, PlayerSignal, RawPlayerEvent, ResumeBanner, SessionServices,
    StrategyManager,
};
use lesson_server_client::{DispatchReport, HeartbeatProvider, ProgressApiClient};
use lesson_storage::FileProgressStore;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

/// Container id used for replay sessions
const REPLAY_CONTAINER: &str = "replay";

/// Build the embed URL for a video with per-invocation overrides
pub fn embed_url(
    config: &AppConfig,
    video_id: &str,
    start: Option<f64>,
    autoplay: bool,
    muted: bool,
) -> Result<EmbedUrl> {
    let mut player = config.player.clone();
    player.autoplay |= autoplay;
    player.muted |= muted;
    if let Some(start) = start {
        player.start_time = start;
    }

    Ok(EmbedUrl::build(&config.embed, video_id, &player)?)
}

/// Replay parameters
#[derive(Debug, Clone)]
pub struct ReplayOptions {
    pub lesson: LessonId,
    pub course: Option<CourseId>,
    pub video_id: String,
    /// Ship heartbeats to the configured backend
    pub send: bool,
}

/// What a replay produced
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayOutcome {
    pub events: usize,
    pub signals: Vec<PlayerSignal>,
    pub final_progress: Option<ProgressValue>,
    #[serde(skip)]
    pub dispatch: Option<DispatchReport>,
}

/// Reporter used when heartbeats are not being sent
struct LoggingReporter;

impl ProgressReporter for LoggingReporter {
    fn report(&self, progress: ProgressValue, context: &PlaybackContext) {
        debug!(
            lesson_id = %context.lesson_id,
            percentage = progress.percentage(),
            "Heartbeat not sent"
        );
    }
}

/// Feed a recording through a player session
pub async fn replay(
    config: &AppConfig,
    events: Vec<RawPlayerEvent>,
    options: ReplayOptions,
) -> Result<ReplayOutcome> {
    let event_count = events.len();
    let store = Arc::new(FileProgressStore::open(&config.storage.progress_dir)?);
    let log = Arc::new(SignalLog::default());

    let (reporter, provider): (Arc<dyn ProgressReporter>, Option<HeartbeatProvider>) =
        if options.send {
            let server = config.server.clone().ok_or(AppError::NoBackend)?;
            let client = ProgressApiClient::new(server)?;
            let provider = HeartbeatProvider::new(Arc::new(client), config.heartbeat.clone());
            (Arc::new(provider.get_instance()), Some(provider))
        } else {
            (Arc::new(LoggingReporter), None)
        };

    let mut context = PlaybackContext::new(options.lesson.clone());
    if let Some(course) = options.course {
        context = context.with_course(course, None, None);
    }

    let strategy: Arc<dyn PlaybackStrategy> = Arc::new(ReplayStrategy::new(events));
    let manager = StrategyManager::new(
        vec![strategy],
        config.manager.clone(),
        config.embed.clone(),
    );

    let mut session = PlayerSession::mount(
        context,
        config.player.clone(),
        config.resume.clone(),
        manager,
        SessionServices {
            store,
            reporter,
            callbacks: log.clone(),
        },
        None,
    );

    session.start(REPLAY_CONTAINER, &options.video_id, None).await?;
    session.closed().await;
    session.unmount();

    let dispatch = match provider {
        Some(provider) => provider.end_session().await,
        None => None,
    };

    info!(
        lesson_id = %options.lesson,
        events = event_count,
        "Replay finished"
    );

    Ok(ReplayOutcome {
        events: event_count,
        final_progress: log.last_progress(),
        signals: log.signals(),
        dispatch,
    })
}

/// Saved progress for a lesson
pub fn show_progress(
    config: &AppConfig,
    lesson: &LessonId,
) -> Result<Option<PersistedProgressRecord>> {
    let store = FileProgressStore::open(&config.storage.progress_dir)?;
    Ok(store.load_record(lesson)?)
}

/// Forget the saved progress for a lesson
pub fn clear_progress(config: &AppConfig, lesson: &LessonId) -> Result<()> {
    let store = FileProgressStore::open(&config.storage.progress_dir)?;
    store.remove_record(lesson)?;
    info!(lesson_id = %lesson, "Saved progress cleared");
    Ok(())
}

/// Whether the resume banner would show for a lesson
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeCheck {
    pub visible: bool,
    pub prior: Option<ProgressValue>,
    pub countdown_secs: u32,
}

pub fn resume_check(config: &AppConfig, lesson: &LessonId) -> Result<ResumeCheck> {
    let prior = show_progress(config, lesson)?.and_then(|record| record.progress());

    let mut banner = ResumeBanner::new(config.resume.clone());
    let visible = banner.present(prior);

    Ok(ResumeCheck {
        visible,
        prior,
        countdown_secs: config.resume.countdown_secs,
    })
}
