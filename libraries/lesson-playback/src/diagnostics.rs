//! Rate-limited diagnostic logging
//!
//! Telemetry that gets suppressed (implausible durations) can arrive several
//! times per second. The sink lets one trace line through per window and
//! counts the rest.

use std::time::Duration;
use tokio::time::Instant;
use tracing::trace;

/// Default sampling window
pub const DIAGNOSTIC_WINDOW: Duration = Duration::from_secs(5);

/// Emits at most one trace line per window
#[derive(Debug)]
pub struct RateLimitedSink {
    label: &'static str,
    window: Duration,
    last_emit: Option<Instant>,
    suppressed: u64,
}

impl RateLimitedSink {
    pub fn new(label: &'static str, window: Duration) -> Self {
        Self {
            label,
            window,
            last_emit: None,
            suppressed: 0,
        }
    }

    /// Record a diagnostic. Returns true if it was logged.
    pub fn record(&mut self, message: &str) -> bool {
        let now = Instant::now();

        if let Some(last) = self.last_emit {
            if now.duration_since(last) < self.window {
                self.suppressed += 1;
                return false;
            }
        }

        trace!(
            sink = self.label,
            suppressed = self.suppressed,
            "{message}"
        );
        self.last_emit = Some(now);
        self.suppressed = 0;
        true
    }

    /// Diagnostics dropped since the last logged one
    pub fn suppressed(&self) -> u64 {
        self.suppressed
    }
}
