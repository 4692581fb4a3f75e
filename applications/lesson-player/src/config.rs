/// Player host configuration
use crate::error::{AppError, Result};
use lesson_playback::{EmbedConfig, ManagerConfig, PlayerConfig, ResumeConfig};
use lesson_server_client::{HeartbeatConfig, ServerConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable prefix, e.g. `LESSON_EMBED__PULLZONE`
pub const ENV_PREFIX: &str = "LESSON";

/// Default config file, read when present
pub const DEFAULT_CONFIG_FILE: &str = "lesson-player.toml";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub embed: EmbedConfig,

    #[serde(default)]
    pub player: PlayerConfig,

    #[serde(default)]
    pub manager: ManagerConfig,

    #[serde(default)]
    pub resume: ResumeConfig,

    #[serde(default)]
    pub heartbeat: HeartbeatConfig,

    #[serde(default)]
    pub storage: StorageSettings,

    /// Progress backend; heartbeats are only sent when this is set
    #[serde(default)]
    pub server: Option<ServerConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageSettings {
    #[serde(default = "default_progress_dir")]
    pub progress_dir: PathBuf,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            progress_dir: default_progress_dir(),
        }
    }
}

fn default_progress_dir() -> PathBuf {
    PathBuf::from("./data/progress")
}

impl AppConfig {
    /// Load configuration from file and environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_prefix(path, ENV_PREFIX)
    }

    /// Load with a custom environment prefix
    pub fn load_with_prefix(path: Option<&Path>, prefix: &str) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            // An explicit path must exist
            Some(path) => {
                settings = settings.add_source(config::File::from(path.to_path_buf()));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    settings = settings.add_source(config::File::from(default_path));
                }
            }
        }

        // Override with environment variables
        settings = settings.add_source(
            config::Environment::with_prefix(prefix)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: Self = settings.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.manager.init_timeout_secs == 0 {
            return Err(AppError::Config(
                "manager.init_timeout_secs must be at least 1".to_string(),
            ));
        }

        if self.resume.min_percentage >= self.resume.max_percentage {
            return Err(AppError::Config(format!(
                "resume window is empty: ({}, {})",
                self.resume.min_percentage, self.resume.max_percentage
            )));
        }

        if self.heartbeat.max_attempts == 0 {
            return Err(AppError::Config(
                "heartbeat.max_attempts must be at least 1".to_string(),
            ));
        }

        if let Some(server) = &self.server {
            if server.url.trim().is_empty() {
                return Err(AppError::Config("server.url is empty".to_string()));
            }
        }

        Ok(())
    }
}
