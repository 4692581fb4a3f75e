//! Fallback presentation
//!
//! Shown when no working player could be created. It carries no telemetry:
//! the only ways out are opening the embed URL elsewhere or retrying.

use crate::embed::EmbedUrl;
use crate::strategy::EmbedRequest;
use crate::types::FailureReason;
use lesson_core::PlaybackContext;
use serde::Serialize;

/// Static panel offered in place of a player
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FallbackPanel {
    embed_url: EmbedUrl,
    thumbnail_url: Option<String>,
    reason: FailureReason,
}

impl FallbackPanel {
    pub fn new(request: &EmbedRequest, context: &PlaybackContext, reason: FailureReason) -> Self {
        Self {
            embed_url: request.embed_url.clone(),
            thumbnail_url: context.lesson_image_url.clone(),
            reason,
        }
    }

    /// URL for "open in a new tab"
    pub fn open_url(&self) -> &str {
        self.embed_url.as_str()
    }

    /// Whether opening the URL can work at all
    pub fn can_open(&self) -> bool {
        self.embed_url.is_resolvable()
    }

    /// Dimmed preview image, if the lesson has one
    pub fn thumbnail(&self) -> Option<&str> {
        self.thumbnail_url.as_deref()
    }

    pub fn reason(&self) -> &FailureReason {
        &self.reason
    }

    /// Short viewer-facing explanation
    pub fn message(&self) -> &'static str {
        match self.reason {
            FailureReason::Timeout => "The video player is taking too long to load.",
            FailureReason::Error(_) => "The video player could not be loaded.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EmbedConfig, PlayerConfig};
    use lesson_core::LessonId;

    fn request(embed: &EmbedConfig) -> EmbedRequest {
        let config = PlayerConfig::default();
        EmbedRequest {
            container_id: "c".into(),
            video_id: "vid".into(),
            library_id: None,
            embed_url: EmbedUrl::build(embed, "vid", &config).unwrap(),
            config,
        }
    }

    #[test]
    fn test_panel_from_timeout() {
        let embed = EmbedConfig {
            pullzone: Some("zone".into()),
            ..Default::default()
        };
        let context = PlaybackContext::new(LessonId::new("l1"))
            .with_lesson_image("https://cdn.example.com/l1.jpg");

        let panel = FallbackPanel::new(&request(&embed), &context, FailureReason::Timeout);

        assert!(panel.can_open());
        assert!(panel.open_url().contains("v=vid"));
        assert_eq!(panel.thumbnail(), Some("https://cdn.example.com/l1.jpg"));
        assert!(panel.message().contains("too long"));
    }

    #[test]
    fn test_panel_without_pullzone_or_thumbnail() {
        let context = PlaybackContext::new(LessonId::new("l1"));
        let panel = FallbackPanel::new(
            &request(&EmbedConfig::default()),
            &context,
            FailureReason::Error("blocked".into()),
        );

        assert!(!panel.can_open());
        assert_eq!(panel.thumbnail(), None);
        assert_eq!(panel.reason(), &FailureReason::Error("blocked".into()));
    }
}
