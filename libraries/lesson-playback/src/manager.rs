//! Strategy manager - owns the player instance and the init timeout race
//!
//! Exactly one instance is alive per manager. A new `initialize` tears the
//! previous instance down first, and a timed-out or failed attempt tears down
//! whatever the strategy had already attached.

use crate::embed::EmbedUrl;
use crate::error::{PlaybackError, Result};
use crate::strategy::{EmbedRequest, PlaybackStrategy, PlayerInstance};
use crate::types::{EmbedConfig, FailureReason, ManagerConfig, ManagerState, PlayerConfig};
use std::sync::Arc;
use tracing::{debug, info, warn};

struct ActivePlayer {
    instance: Arc<dyn PlayerInstance>,
    strategy: Arc<dyn PlaybackStrategy>,
    container_id: String,
}

/// Selects, initializes and tears down embedding strategies
pub struct StrategyManager {
    strategies: Vec<Arc<dyn PlaybackStrategy>>,
    config: ManagerConfig,
    embed: EmbedConfig,
    state: ManagerState,
    active: Option<ActivePlayer>,
    last_request: Option<EmbedRequest>,
}

impl StrategyManager {
    /// Create a manager. Strategies are tried in order, richest first.
    pub fn new(
        strategies: Vec<Arc<dyn PlaybackStrategy>>,
        config: ManagerConfig,
        embed: EmbedConfig,
    ) -> Self {
        Self {
            strategies,
            config,
            embed,
            state: ManagerState::Idle,
            active: None,
            last_request: None,
        }
    }

    pub fn state(&self) -> &ManagerState {
        &self.state
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    /// The live instance, if initialization succeeded
    pub fn instance(&self) -> Option<Arc<dyn PlayerInstance>> {
        self.active
            .as_ref()
            .map(|active| Arc::clone(&active.instance))
    }

    /// The request used by the most recent `initialize`
    pub fn last_request(&self) -> Option<&EmbedRequest> {
        self.last_request.as_ref()
    }

    /// Embed `video_id` into `container_id`.
    ///
    /// Tears down any existing instance first. Resolves with the instance on
    /// ready, or with an error on timeout or strategy error; the manager is
    /// then `Failed` and the caller shows the fallback panel.
    pub async fn initialize(
        &mut self,
        container_id: &str,
        video_id: &str,
        library_id: Option<&str>,
        config: &PlayerConfig,
    ) -> Result<Arc<dyn PlayerInstance>> {
        self.teardown();
        self.last_request = None;

        let mut embed = self.embed.clone();
        if let Some(library_id) = library_id {
            embed.library_id = Some(library_id.to_string());
        }

        let embed_url = match EmbedUrl::build(&embed, video_id, config) {
            Ok(url) => url,
            Err(e) => {
                self.state = ManagerState::Failed(FailureReason::Error(e.to_string()));
                return Err(e);
            }
        };

        let request = EmbedRequest {
            container_id: container_id.to_string(),
            video_id: video_id.trim().to_string(),
            library_id: embed.library_id,
            config: config.clone(),
            embed_url,
        };
        self.last_request = Some(request.clone());

        self.run(request).await
    }

    /// Re-enter `Initializing` with the last request after a failure
    pub async fn retry(&mut self) -> Result<Arc<dyn PlayerInstance>> {
        if !self.state.is_failed() {
            return Err(PlaybackError::InvalidState(format!(
                "retry requires a failed player, state is {:?}",
                self.state
            )));
        }

        let Some(request) = self.last_request.clone() else {
            return Err(PlaybackError::InvalidState(
                "nothing to retry".to_string(),
            ));
        };

        self.state = ManagerState::Idle;
        info!(video_id = %request.video_id, "Retrying player initialization");
        self.run(request).await
    }

    async fn run(&mut self, request: EmbedRequest) -> Result<Arc<dyn PlayerInstance>> {
        if self.strategies.is_empty() {
            let error = PlaybackError::InvalidState("no playback strategies".to_string());
            self.state = ManagerState::Failed(FailureReason::Error(error.to_string()));
            return Err(error);
        }

        self.state = ManagerState::Initializing;
        let timeout = self.config.init_timeout();
        let attempts = if self.config.cascade {
            self.strategies.len()
        } else {
            1
        };

        let mut last_error = None;

        for strategy in self.strategies.iter().take(attempts) {
            let kind = strategy.kind();
            debug!(strategy = %kind, video_id = %request.video_id, "Initializing player");

            // The timer is dropped as soon as the strategy resolves
            let outcome = tokio::time::timeout(timeout, strategy.initialize(&request)).await;

            match outcome {
                Ok(Ok(instance)) => {
                    info!(strategy = %kind, instance = %instance.id(), "Player ready");
                    self.active = Some(ActivePlayer {
                        instance: Arc::clone(&instance),
                        strategy: Arc::clone(strategy),
                        container_id: request.container_id.clone(),
                    });
                    self.state = ManagerState::Ready;
                    return Ok(instance);
                }
                Ok(Err(e)) => {
                    warn!(strategy = %kind, error = %e, "Player initialization failed");
                    strategy.teardown_container(&request.container_id);
                    last_error = Some(e);
                }
                Err(_) => {
                    warn!(strategy = %kind, ?timeout, "Player initialization timed out");
                    strategy.teardown_container(&request.container_id);
                    last_error = Some(PlaybackError::InitTimeout { timeout });
                }
            }
        }

        let error = last_error.unwrap_or(PlaybackError::InitTimeout { timeout });
        self.state = ManagerState::Failed(match &error {
            PlaybackError::InitTimeout { .. } => FailureReason::Timeout,
            other => FailureReason::Error(other.to_string()),
        });
        Err(error)
    }

    /// Release the current instance. Safe in any state; never fails.
    pub fn teardown(&mut self) {
        if let Some(active) = self.active.take() {
            active.instance.destroy();
            active.strategy.teardown_container(&active.container_id);
            debug!(instance = %active.instance.id(), "Player torn down");
        }

        if !matches!(self.state, ManagerState::Idle) {
            self.state = ManagerState::Destroyed;
        }
    }
}

impl Drop for StrategyManager {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl std::fmt::Debug for StrategyManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrategyManager")
            .field("strategies", &self.strategies.len())
            .field("config", &self.config)
            .field("state", &self.state)
            .field("active", &self.active.as_ref().map(|a| a.instance.id()))
            .finish()
    }
}
