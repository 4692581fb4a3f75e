//! Lesson Player Host
//!
//! Command-line host for the lesson playback engine: embed URL inspection,
//! telemetry replay, and saved-progress management.
//!
//! This library exposes the command implementations for testing purposes.

pub mod commands;
pub mod config;
pub mod error;
pub mod replay;

// Re-export commonly used types for convenience
pub use config::AppConfig;
pub use error::{AppError, Result};
