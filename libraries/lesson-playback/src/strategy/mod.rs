//! Embedding strategies
//!
//! A strategy is one way of putting the third-party player on screen. The
//! rich SDK strategy gives telemetry and control; the frame strategy is a
//! plain embed with neither. Both share one contract so only the
//! [`StrategyManager`](crate::StrategyManager) knows which one is in use.

mod frame;
mod sdk;
mod surface;

pub use frame::FrameStrategy;
pub use sdk::{SdkBridge, SdkConnection, SdkControl, SdkStrategy};
pub use surface::{EmbedSurface, MemorySurface, SurfaceArtifact};

use crate::embed::EmbedUrl;
use crate::error::Result;
use crate::events::RawPlayerEvent;
use crate::types::{PlayerConfig, StrategyKind};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Everything a strategy needs to embed one video
#[derive(Debug, Clone, PartialEq)]
pub struct EmbedRequest {
    pub container_id: String,
    pub video_id: String,
    pub library_id: Option<String>,
    pub config: PlayerConfig,
    pub embed_url: EmbedUrl,
}

/// Raw events from a player instance, in arrival order.
///
/// Events observed before the instance was handed out (during the ready
/// handshake) are replayed first.
#[derive(Debug)]
pub struct EventStream {
    backlog: VecDeque<RawPlayerEvent>,
    rx: Option<mpsc::UnboundedReceiver<RawPlayerEvent>>,
}

impl EventStream {
    pub fn new(rx: mpsc::UnboundedReceiver<RawPlayerEvent>) -> Self {
        Self {
            backlog: VecDeque::new(),
            rx: Some(rx),
        }
    }

    /// A stream that yields the backlog and then ends
    pub fn finite(backlog: impl IntoIterator<Item = RawPlayerEvent>) -> Self {
        Self {
            backlog: backlog.into_iter().collect(),
            rx: None,
        }
    }

    pub fn with_backlog(
        backlog: impl IntoIterator<Item = RawPlayerEvent>,
        rx: mpsc::UnboundedReceiver<RawPlayerEvent>,
    ) -> Self {
        Self {
            backlog: backlog.into_iter().collect(),
            rx: Some(rx),
        }
    }

    /// Next event, or `None` once the player stops emitting
    pub async fn next(&mut self) -> Option<RawPlayerEvent> {
        if let Some(event) = self.backlog.pop_front() {
            return Some(event);
        }
        match self.rx.as_mut() {
            Some(rx) => rx.recv().await,
            None => None,
        }
    }
}

/// Handle to a live embedding.
///
/// Owned by the strategy manager and never shared across lessons.
pub trait PlayerInstance: Send + Sync {
    fn id(&self) -> Uuid;

    fn kind(&self) -> StrategyKind;

    /// Duration as reported by the player right now, if it exposes one
    fn duration(&self) -> Option<f64>;

    /// Move the playhead
    fn seek(&self, seconds: f64);

    /// Take the event stream. Only the first call returns it.
    fn take_events(&self) -> Option<EventStream>;

    /// Release the embedding. Idempotent and infallible.
    fn destroy(&self);

    fn is_destroyed(&self) -> bool;
}

/// One way of embedding the player
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PlaybackStrategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    /// Embed the player and resolve once it is ready or has failed.
    ///
    /// The manager bounds this with its timeout and drops the future when the
    /// timeout fires.
    async fn initialize(&self, request: &EmbedRequest) -> Result<Arc<dyn PlayerInstance>>;

    /// Remove whatever this strategy put into the container.
    ///
    /// Safe to call when initialization never completed.
    fn teardown_container(&self, container_id: &str);
}
