//! Player events
//!
//! The embedded player emits loosely-shaped JSON objects. They are parsed once
//! at the boundary into [`PlayerEvent`]; nothing past this module looks at a
//! raw payload. The normalizer turns `PlayerEvent`s into [`PlayerSignal`]s,
//! which are what the host sees.

use lesson_core::ProgressValue;
use serde::Serialize;
use serde_json::Value;
use tracing::trace;

/// Raw event as delivered by an embedding
#[derive(Debug, Clone, PartialEq)]
pub struct RawPlayerEvent(Value);

impl RawPlayerEvent {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Event name, read from `event` or `type`
    pub fn name(&self) -> Option<&str> {
        self.0
            .get("event")
            .or_else(|| self.0.get("type"))
            .and_then(Value::as_str)
    }

    pub fn value(&self) -> &Value {
        &self.0
    }

    /// Look a field up at the top level, then under `data`
    fn field(&self, key: &str) -> Option<&Value> {
        self.0
            .get(key)
            .or_else(|| self.0.get("data").and_then(|data| data.get(key)))
    }

    fn number(&self, keys: &[&str]) -> Option<f64> {
        keys.iter()
            .find_map(|key| self.field(key))
            .and_then(|value| match value {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.trim().parse::<f64>().ok(),
                _ => None,
            })
            .filter(|n| n.is_finite())
    }
}

impl From<Value> for RawPlayerEvent {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// Typed player event
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    /// Player finished its handshake
    Ready,

    /// Media loaded enough to play; may carry a duration
    Loaded { duration: Option<f64> },

    /// Bulk metadata update; the most reliable duration source
    Metadata { duration: Option<f64> },

    /// Playback position update
    TimeUpdate {
        current_time: f64,
        duration: Option<f64>,
    },

    Play,
    Pause,
    Ended,

    /// Player-reported failure
    Error { message: String },
}

const TIME_KEYS: &[&str] = &["currentTime", "seconds", "position"];
const DURATION_KEYS: &[&str] = &["duration"];

impl PlayerEvent {
    /// Parse a raw event. Unknown or malformed events yield `None`.
    pub fn parse(raw: &RawPlayerEvent) -> Option<Self> {
        let Some(name) = raw.name() else {
            trace!(event = %raw.value(), "Ignoring player event without a name");
            return None;
        };

        let duration = || raw.number(DURATION_KEYS);

        let event = match name.to_ascii_lowercase().as_str() {
            "ready" => Self::Ready,
            "loaded" | "canplay" | "loadedmetadata" | "durationchange" => Self::Loaded {
                duration: duration(),
            },
            "metadata" | "videoinfo" => Self::Metadata {
                duration: duration(),
            },
            "timeupdate" | "time" => {
                let Some(current_time) = raw.number(TIME_KEYS) else {
                    trace!("Ignoring time update without a usable position");
                    return None;
                };
                Self::TimeUpdate {
                    current_time: current_time.max(0.0),
                    duration: duration(),
                }
            }
            "play" | "playing" => Self::Play,
            "pause" => Self::Pause,
            "ended" | "complete" => Self::Ended,
            "error" => Self::Error {
                message: error_message(raw),
            },
            other => {
                trace!(event = other, "Ignoring unknown player event");
                return None;
            }
        };

        Some(event)
    }
}

fn error_message(raw: &RawPlayerEvent) -> String {
    ["message", "error", "code"]
        .iter()
        .find_map(|key| match raw.field(key) {
            Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
            Some(Value::Number(n)) => Some(format!("code {n}")),
            _ => None,
        })
        .unwrap_or_else(|| "unknown player error".to_string())
}

/// Normalized signal delivered to the host
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "signal", content = "data", rename_all = "camelCase")]
pub enum PlayerSignal {
    Ready,
    Progress(ProgressValue),
    Play,
    Pause,
    Completed,
    Error(String),
}
