//! Common test utilities and fixtures
#![allow(dead_code)]

use async_trait::async_trait;
use lesson_core::{
    CoreError, LessonId, PersistedProgressRecord, PlaybackContext, ProgressReporter,
    ProgressStore, ProgressValue,
};
use lesson_playback::{
    EmbedConfig, EmbedRequest, FallbackPanel, ManagerConfig, MemorySurface, PlaybackError,
    PlayerCallbacks, RawPlayerEvent, Result, SdkBridge, SdkConnection, SdkControl, SdkStrategy,
    StrategyManager,
};
use serde_json::json;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

/// Player control that records what the engine asked of it
#[derive(Default)]
pub struct ScriptedControl {
    pub duration: Mutex<Option<f64>>,
    pub seeks: Mutex<Vec<f64>>,
    pub closes: AtomicUsize,
}

impl ScriptedControl {
    pub fn seeks(&self) -> Vec<f64> {
        self.seeks.lock().unwrap().clone()
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

impl SdkControl for ScriptedControl {
    fn duration(&self) -> Option<f64> {
        *self.duration.lock().unwrap()
    }

    fn seek(&self, seconds: f64) {
        self.seeks.lock().unwrap().push(seconds);
    }

    fn close(&self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

/// SDK bridge whose players are driven by the test through channels
#[derive(Default)]
pub struct ScriptedBridge {
    pending: Mutex<VecDeque<mpsc::UnboundedReceiver<RawPlayerEvent>>>,
    pub control: Arc<ScriptedControl>,
    pub connects: AtomicUsize,
}

impl ScriptedBridge {
    /// Queue a player for the next `connect` and return its event sender
    pub fn next_player(&self) -> mpsc::UnboundedSender<RawPlayerEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.pending.lock().unwrap().push_back(rx);
        tx
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SdkBridge for ScriptedBridge {
    async fn connect(&self, _request: &EmbedRequest) -> Result<SdkConnection> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        let events = self
            .pending
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| PlaybackError::PlayerReported("no player scripted".into()))?;

        Ok(SdkConnection {
            events,
            control: self.control.clone(),
        })
    }
}

pub fn send(tx: &mpsc::UnboundedSender<RawPlayerEvent>, value: serde_json::Value) {
    tx.send(RawPlayerEvent::new(value)).unwrap();
}

pub fn ready() -> serde_json::Value {
    json!({ "event": "ready" })
}

pub fn time_update(current_time: f64, duration: f64) -> serde_json::Value {
    json!({ "event": "timeupdate", "currentTime": current_time, "duration": duration })
}

pub fn embed_config() -> EmbedConfig {
    EmbedConfig {
        pullzone: Some("vz-test".to_string()),
        library_id: Some("1001".to_string()),
        ..Default::default()
    }
}

/// Manager with a single SDK strategy over a scripted bridge
pub fn sdk_manager(bridge: &Arc<ScriptedBridge>, surface: &Arc<MemorySurface>) -> StrategyManager {
    StrategyManager::new(
        vec![Arc::new(SdkStrategy::new(bridge.clone(), surface.clone()))],
        ManagerConfig::default(),
        embed_config(),
    )
}

/// Let spawned tasks drain their queues
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(10)).await;
}

#[derive(Default)]
pub struct RecordingReporter {
    pub reports: Mutex<Vec<(LessonId, ProgressValue)>>,
}

impl RecordingReporter {
    pub fn reports(&self) -> Vec<(LessonId, ProgressValue)> {
        self.reports.lock().unwrap().clone()
    }
}

impl ProgressReporter for RecordingReporter {
    fn report(&self, progress: ProgressValue, context: &PlaybackContext) {
        self.reports
            .lock()
            .unwrap()
            .push((context.lesson_id.clone(), progress));
    }
}

/// Host callbacks flattened into a log of short strings
#[derive(Default)]
pub struct RecordingCallbacks {
    pub log: Mutex<Vec<String>>,
    pub panels: Mutex<Vec<FallbackPanel>>,
}

impl RecordingCallbacks {
    pub fn log(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.log().iter().filter(|e| e.starts_with(prefix)).count()
    }

    fn push(&self, entry: String) {
        self.log.lock().unwrap().push(entry);
    }
}

impl PlayerCallbacks for RecordingCallbacks {
    fn on_progress(&self, progress: &ProgressValue) {
        self.push(format!("progress:{}", progress.percentage()));
    }

    fn on_ready(&self) {
        self.push("ready".into());
    }

    fn on_error(&self, message: &str) {
        self.push(format!("error:{message}"));
    }

    fn on_complete(&self) {
        self.push("complete".into());
    }

    fn on_play(&self) {
        self.push("play".into());
    }

    fn on_pause(&self) {
        self.push("pause".into());
    }

    fn on_fallback(&self, panel: &FallbackPanel) {
        self.push("fallback".into());
        self.panels.lock().unwrap().push(panel.clone());
    }
}

/// Store that is always unavailable (private browsing, quota exceeded)
pub struct UnavailableStore;

impl ProgressStore for UnavailableStore {
    fn load(&self, _lesson_id: &LessonId) -> lesson_core::Result<Option<PersistedProgressRecord>> {
        Err(CoreError::storage("storage unavailable"))
    }

    fn save(&self, _lesson_id: &LessonId, _progress: &ProgressValue) -> lesson_core::Result<()> {
        Err(CoreError::storage("quota exceeded"))
    }

    fn clear(&self, _lesson_id: &LessonId) -> lesson_core::Result<()> {
        Err(CoreError::storage("storage unavailable"))
    }
}
