//! Rich SDK embedding

use super::{EmbedRequest, EmbedSurface, EventStream, PlaybackStrategy, PlayerInstance};
use crate::error::{PlaybackError, Result};
use crate::events::{PlayerEvent, RawPlayerEvent};
use crate::types::StrategyKind;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

/// Control half of an SDK player connection
pub trait SdkControl: Send + Sync {
    fn duration(&self) -> Option<f64>;
    fn seek(&self, seconds: f64);
    /// Close the connection. Called at most once.
    fn close(&self);
}

/// An open connection to the player SDK
pub struct SdkConnection {
    pub events: mpsc::UnboundedReceiver<RawPlayerEvent>,
    pub control: Arc<dyn SdkControl>,
}

/// Transport to the third-party player SDK (postMessage bridge, webview, ...)
#[async_trait]
pub trait SdkBridge: Send + Sync {
    /// Open a connection to the player embedded for `request`
    async fn connect(&self, request: &EmbedRequest) -> Result<SdkConnection>;
}

/// Strategy that drives the player through its SDK
pub struct SdkStrategy {
    bridge: Arc<dyn SdkBridge>,
    surface: Arc<dyn EmbedSurface>,
}

impl SdkStrategy {
    pub fn new(bridge: Arc<dyn SdkBridge>, surface: Arc<dyn EmbedSurface>) -> Self {
        Self { bridge, surface }
    }
}

#[async_trait]
impl PlaybackStrategy for SdkStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Sdk
    }

    async fn initialize(&self, request: &EmbedRequest) -> Result<Arc<dyn PlayerInstance>> {
        self.surface
            .attach(&request.container_id, StrategyKind::Sdk, &request.embed_url)?;

        let SdkConnection {
            events: mut rx,
            control,
        } = match self.bridge.connect(request).await {
            Ok(connection) => connection,
            Err(e) => {
                self.surface.detach(&request.container_id);
                return Err(e);
            }
        };

        // Closes the connection if the handshake fails or this future is
        // dropped (init timeout) before the instance takes over
        let pending = PendingConnection {
            control,
            armed: true,
            surface: Arc::clone(&self.surface),
            container_id: request.container_id.clone(),
        };

        // Wait for the handshake, keeping whatever arrives before it
        let mut backlog = Vec::new();
        loop {
            let Some(raw) = rx.recv().await else {
                return Err(PlaybackError::PlayerReported(
                    "player closed before signalling ready".to_string(),
                ));
            };

            match PlayerEvent::parse(&raw) {
                Some(PlayerEvent::Ready) => {
                    backlog.push(raw);
                    break;
                }
                Some(PlayerEvent::Error { message }) => {
                    return Err(PlaybackError::PlayerReported(message));
                }
                _ => backlog.push(raw),
            }
        }

        let control = pending.hand_off();

        let instance = SdkInstance {
            id: Uuid::new_v4(),
            control,
            events: Mutex::new(Some(EventStream::with_backlog(backlog, rx))),
            surface: Arc::clone(&self.surface),
            container_id: request.container_id.clone(),
            destroyed: AtomicBool::new(false),
        };

        debug!(
            instance = %instance.id,
            video_id = %request.video_id,
            "SDK player ready"
        );
        Ok(Arc::new(instance))
    }

    fn teardown_container(&self, container_id: &str) {
        self.surface.detach(container_id);
    }
}

/// Connection that has not reached ready yet
struct PendingConnection {
    control: Arc<dyn SdkControl>,
    armed: bool,
    surface: Arc<dyn EmbedSurface>,
    container_id: String,
}

impl PendingConnection {
    /// Give the control to the ready instance; the guard no longer closes it
    fn hand_off(mut self) -> Arc<dyn SdkControl> {
        self.armed = false;
        Arc::clone(&self.control)
    }
}

impl Drop for PendingConnection {
    fn drop(&mut self) {
        if self.armed {
            self.control.close();
            self.surface.detach(&self.container_id);
            debug!(container = %self.container_id, "Released SDK connection before ready");
        }
    }
}

struct SdkInstance {
    id: Uuid,
    control: Arc<dyn SdkControl>,
    events: Mutex<Option<EventStream>>,
    surface: Arc<dyn EmbedSurface>,
    container_id: String,
    destroyed: AtomicBool,
}

impl PlayerInstance for SdkInstance {
    fn id(&self) -> Uuid {
        self.id
    }

    fn kind(&self) -> StrategyKind {
        StrategyKind::Sdk
    }

    fn duration(&self) -> Option<f64> {
        if self.is_destroyed() {
            return None;
        }
        self.control.duration()
    }

    fn seek(&self, seconds: f64) {
        if !self.is_destroyed() {
            self.control.seek(seconds.max(0.0));
        }
    }

    fn take_events(&self) -> Option<EventStream> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
    }

    fn destroy(&self) {
        if self.destroyed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.control.close();
        self.surface.detach(&self.container_id);
        self.take_events();
        debug!(instance = %self.id, "SDK player destroyed");
    }

    fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::SeqCst)
    }
}
