//! Embed surface: where embedding artifacts live

use crate::embed::EmbedUrl;
use crate::error::{PlaybackError, Result};
use crate::types::StrategyKind;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// Host-side container for embedding artifacts (the player frame or SDK mount)
pub trait EmbedSurface: Send + Sync {
    /// Put an embedding into a container, replacing anything already there
    fn attach(&self, container_id: &str, kind: StrategyKind, url: &EmbedUrl) -> Result<()>;

    /// Empty a container. Detaching an empty container is a no-op.
    fn detach(&self, container_id: &str);
}

/// What a container currently holds
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceArtifact {
    pub kind: StrategyKind,
    pub url: String,
}

/// In-process surface, used by the CLI host and tests
#[derive(Debug, Default)]
pub struct MemorySurface {
    containers: Mutex<HashMap<String, SurfaceArtifact>>,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    fn containers(&self) -> MutexGuard<'_, HashMap<String, SurfaceArtifact>> {
        self.containers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn artifact(&self, container_id: &str) -> Option<SurfaceArtifact> {
        self.containers().get(container_id).cloned()
    }

    /// Number of containers holding an embedding
    pub fn attached(&self) -> usize {
        self.containers().len()
    }
}

impl EmbedSurface for MemorySurface {
    fn attach(&self, container_id: &str, kind: StrategyKind, url: &EmbedUrl) -> Result<()> {
        if container_id.trim().is_empty() {
            return Err(PlaybackError::Surface("container id is empty".to_string()));
        }

        self.containers().insert(
            container_id.to_string(),
            SurfaceArtifact {
                kind,
                url: url.as_str().to_string(),
            },
        );
        Ok(())
    }

    fn detach(&self, container_id: &str) {
        self.containers().remove(container_id);
    }
}
