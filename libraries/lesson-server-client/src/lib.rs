//! Lesson Player Server Client
//!
//! Delivers playback progress telemetry to the lesson platform backend.
//!
//! # Features
//!
//! - **REST client**: bearer-authenticated `POST /api/progress/heartbeat`
//! - **Heartbeat dispatcher**: per-lesson coalescing queue drained on a fixed
//!   cadence, independent of how often progress events fire
//! - **Session provider**: lazily created dispatcher shared by every player
//!   mounted during a viewing session
//!
//! Delivery problems never reach the caller: `enqueue` is synchronous and
//! infallible, failed deliveries are logged and retried at most once.
//!
//! # Example
//!
//! ```ignore
//! use lesson_server_client::{HeartbeatConfig, HeartbeatProvider, ProgressApiClient, ServerConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ProgressApiClient::new(ServerConfig::new("https://learn.example.com"))?;
//!     let provider = HeartbeatProvider::new(Arc::new(client), HeartbeatConfig::default());
//!
//!     // Any mounted player reports through the same dispatcher
//!     let dispatcher = provider.get_instance();
//!     dispatcher.enqueue(lesson_id, progress, context);
//!
//!     // Final drain when the viewing session ends
//!     provider.end_session().await;
//!     Ok(())
//! }
//! ```

mod client;
mod error;
mod heartbeat;
mod provider;
mod types;

// Re-export main types
pub use client::{ProgressApiClient, ProgressSink};
pub use error::{Result, ServerClientError};
pub use heartbeat::{DispatchReport, HeartbeatDispatcher};
pub use provider::HeartbeatProvider;
pub use types::{HeartbeatConfig, ServerConfig};
