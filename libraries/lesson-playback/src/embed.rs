//! Embed URL construction
//!
//! `https://player-{pullzone}.{provider}/embed/?v={videoId}` plus the player
//! options as query parameters. A missing pullzone still yields a URL so the
//! fallback panel has something to show, but it is flagged unresolvable.

use crate::error::{PlaybackError, Result};
use crate::types::{EmbedConfig, PlayerConfig};
use serde::Serialize;
use tracing::warn;
use url::Url;

/// Host label used when no pullzone is configured
pub const UNCONFIGURED_PULLZONE: &str = "unconfigured";

/// A constructed embed URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmbedUrl {
    url: String,
    resolvable: bool,
}

impl EmbedUrl {
    /// Build the embed URL for a video.
    ///
    /// `config.player_url` replaces the pullzone-derived base verbatim; the
    /// player options are still appended to it.
    pub fn build(embed: &EmbedConfig, video_id: &str, config: &PlayerConfig) -> Result<Self> {
        let video_id = video_id.trim();
        if video_id.is_empty() {
            return Err(PlaybackError::InvalidVideoId);
        }

        if let Some(player_url) = config.player_url.as_deref() {
            let mut url = Url::parse(player_url)
                .map_err(|e| PlaybackError::InvalidEmbedUrl(format!("{player_url}: {e}")))?;
            append_options(&mut url, config);
            return Ok(Self {
                url: url.into(),
                resolvable: true,
            });
        }

        let pullzone = embed
            .pullzone
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty());

        let resolvable = pullzone.is_some();
        if !resolvable {
            warn!(video_id, "No pullzone configured, embed URL will not resolve");
        }

        let base = format!(
            "https://player-{}.{}/embed/",
            pullzone.unwrap_or(UNCONFIGURED_PULLZONE),
            embed.provider_domain
        );
        let mut url =
            Url::parse(&base).map_err(|e| PlaybackError::InvalidEmbedUrl(format!("{base}: {e}")))?;

        {
            let mut query = url.query_pairs_mut();
            query.append_pair("v", video_id);
            if let Some(library_id) = embed.library_id.as_deref().filter(|l| !l.is_empty()) {
                query.append_pair("library", library_id);
            }
        }
        append_options(&mut url, config);

        Ok(Self {
            url: url.into(),
            resolvable,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.url
    }

    /// Whether the URL points at a configured host
    pub fn is_resolvable(&self) -> bool {
        self.resolvable
    }

    /// Same URL with the `t` start offset replaced.
    pub fn with_start(&self, seconds: f64) -> Self {
        let Ok(mut url) = Url::parse(&self.url) else {
            return self.clone();
        };

        let kept: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(key, _)| key != "t")
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        {
            let mut query = url.query_pairs_mut();
            query.clear();
            for (key, value) in &kept {
                query.append_pair(key, value);
            }
            if let Some(t) = start_param(seconds) {
                query.append_pair("t", &t);
            }
        }

        Self {
            url: url.into(),
            resolvable: self.resolvable,
        }
    }
}

impl std::fmt::Display for EmbedUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.url)
    }
}

fn append_options(url: &mut Url, config: &PlayerConfig) {
    let mut query = url.query_pairs_mut();
    query
        .append_pair("autoplay", bool_param(config.autoplay || config.smart_autoplay))
        .append_pair("muted", bool_param(config.muted))
        .append_pair("preload", "true")
        .append_pair("responsive", "true");

    if let Some(t) = start_param(config.start_time) {
        query.append_pair("t", &t);
    }
}

fn bool_param(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

/// Whole seconds, omitted for zero or invalid offsets
fn start_param(seconds: f64) -> Option<String> {
    if seconds.is_finite() && seconds >= 1.0 {
        Some(format!("{}", seconds.floor() as u64))
    } else {
        None
    }
}
