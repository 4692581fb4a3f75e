//! Basic frame embedding
//!
//! No SDK handshake and no telemetry: the frame is ready as soon as it is
//! attached. Seeking reloads the frame with a new start offset.

use super::{EmbedRequest, EmbedSurface, EventStream, PlaybackStrategy, PlayerInstance};
use crate::embed::EmbedUrl;
use crate::error::Result;
use crate::events::RawPlayerEvent;
use crate::types::StrategyKind;
use async_trait::async_trait;
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, warn};
use uuid::Uuid;

/// Strategy that embeds a plain player frame
pub struct FrameStrategy {
    surface: Arc<dyn EmbedSurface>,
}

impl FrameStrategy {
    pub fn new(surface: Arc<dyn EmbedSurface>) -> Self {
        Self { surface }
    }
}

#[async_trait]
impl PlaybackStrategy for FrameStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Frame
    }

    async fn initialize(&self, request: &EmbedRequest) -> Result<Arc<dyn PlayerInstance>> {
        self.surface
            .attach(&request.container_id, StrategyKind::Frame, &request.embed_url)?;

        let ready = RawPlayerEvent::new(json!({ "event": "ready" }));
        let instance = FrameInstance {
            id: Uuid::new_v4(),
            surface: Arc::clone(&self.surface),
            container_id: request.container_id.clone(),
            url: Mutex::new(request.embed_url.clone()),
            events: Mutex::new(Some(EventStream::finite([ready]))),
            destroyed: AtomicBool::new(false),
        };

        debug!(instance = %instance.id, video_id = %request.video_id, "Frame player attached");
        Ok(Arc::new(instance))
    }

    fn teardown_container(&self, container_id: &str) {
        self.surface.detach(container_id);
    }
}

struct FrameInstance {
    id: Uuid,
    surface: Arc<dyn EmbedSurface>,
    container_id: String,
    url: Mutex<EmbedUrl>,
    events: Mutex<Option<EventStream>>,
    destroyed: AtomicBool,
}

impl FrameInstance {
    fn url(&self) -> MutexGuard<'_, EmbedUrl> {
        self.url
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl PlayerInstance for FrameInstance {
    fn id(&self) -> Uuid {
        self.id
    }

    fn kind(&self) -> StrategyKind {
        StrategyKind::Frame
    }

    fn duration(&self) -> Option<f64> {
        None
    }

    fn seek(&self, seconds: f64) {
        if self.is_destroyed() {
            return;
        }

        let mut url = self.url();
        *url = url.with_start(seconds);

        if let Err(e) = self
            .surface
            .attach(&self.container_id, StrategyKind::Frame, &url)
        {
            warn!(instance = %self.id, error = %e, "Failed to reload frame at new offset");
        }
    }

    fn take_events(&self) -> Option<EventStream> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
    }

    fn destroy(&self) {
        if !self.destroyed.swap(true, Ordering::SeqCst) {
            self.surface.detach(&self.container_id);
        }
    }

    fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::SeqCst)
    }
}
