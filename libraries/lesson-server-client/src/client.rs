//! REST client for the backend progress endpoint.

use crate::error::{Result, ServerClientError};
use crate::types::ServerConfig;
use async_trait::async_trait;
use lesson_core::HeartbeatPayload;
use reqwest::{Client, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use url::Url;

/// Destination for heartbeat payloads.
///
/// The dispatcher only knows this trait, so tests and alternative transports
/// can stand in for the HTTP client.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProgressSink: Send + Sync {
    /// Deliver one payload to the backend
    async fn deliver(&self, payload: &HeartbeatPayload) -> Result<()>;
}

/// Client for the lesson platform's progress endpoint.
///
/// The heartbeat endpoint is resolved once at construction; only the bearer
/// token changes afterwards.
///
/// # Example
///
/// ```ignore
/// use lesson_server_client::{ProgressApiClient, ServerConfig};
///
/// let client = ProgressApiClient::new(ServerConfig::new("https://learn.example.com"))?;
/// client.set_token("token-from-auth-cookie").await;
/// client.send_heartbeat(&payload).await?;
/// ```
pub struct ProgressApiClient {
    http: Client,
    endpoint: Url,
    token: Arc<RwLock<Option<String>>>,
}

/// Resolve the heartbeat endpoint against the backend base URL.
///
/// The base is treated as a directory, so a platform mounted under a path
/// prefix (`https://host/school`) keeps that prefix. The endpoint path is
/// always relative to the base, with or without a leading slash.
fn heartbeat_endpoint(base: &str, path: &str) -> Result<Url> {
    let invalid = |reason: &str| ServerClientError::InvalidEndpoint {
        url: base.to_string(),
        reason: reason.to_string(),
    };

    let base = base.trim();
    if base.is_empty() {
        return Err(invalid("base URL is empty"));
    }

    let mut url = Url::parse(base).map_err(|e| invalid(&e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid("scheme must be http:// or https://"));
    }
    if url.cannot_be_a_base() || url.host_str().is_none() {
        return Err(invalid("base URL has no host"));
    }

    url.set_query(None);
    url.set_fragment(None);
    let dir = format!("{}/", url.path().trim_end_matches('/'));
    url.set_path(&dir);

    let path = path.trim().trim_start_matches('/');
    if path.is_empty() {
        return Err(invalid("heartbeat path is empty"));
    }

    url.join(path).map_err(|e| invalid(&e.to_string()))
}

impl ProgressApiClient {
    pub fn new(config: ServerConfig) -> Result<Self> {
        let endpoint = heartbeat_endpoint(&config.url, &config.heartbeat_path)?;

        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs.max(1)))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(format!("LessonPlayer/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        debug!(endpoint = %endpoint, "Progress client ready");

        Ok(Self {
            http,
            endpoint,
            token: Arc::new(RwLock::new(config.access_token)),
        })
    }

    /// Resolved heartbeat endpoint
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub async fn has_token(&self) -> bool {
        self.token.read().await.is_some()
    }

    /// Set the bearer token handed over by the host's auth provider.
    pub async fn set_token(&self, access_token: impl Into<String>) {
        *self.token.write().await = Some(access_token.into());
    }

    /// Forget the token, e.g. when the viewer signs out mid-session.
    pub async fn clear_token(&self) {
        *self.token.write().await = None;
        info!("Progress client signed out");
    }

    /// Post one heartbeat to the backend.
    pub async fn send_heartbeat(&self, payload: &HeartbeatPayload) -> Result<()> {
        let lesson_id = &payload.lesson_id;
        let token = self.token.read().await.clone();

        debug!(
            endpoint = %self.endpoint,
            lesson_id = %lesson_id,
            percentage = payload.progress.percentage(),
            "Sending progress heartbeat"
        );

        let mut request = self.http.post(self.endpoint.clone()).json(payload);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_connect() || e.is_timeout() {
                ServerClientError::ServerUnreachable(format!("{}: {e}", self.endpoint))
            } else {
                ServerClientError::Request(e)
            }
        })?;

        let status = response.status();
        match status {
            s if s.is_success() => Ok(()),
            StatusCode::UNAUTHORIZED => {
                warn!(lesson_id = %lesson_id, "Heartbeat rejected: no valid session token");
                Err(ServerClientError::AuthRequired {
                    lesson_id: lesson_id.clone(),
                })
            }
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after_secs = response
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.trim().parse().ok())
                    .unwrap_or(60);
                Err(ServerClientError::RateLimited {
                    lesson_id: lesson_id.clone(),
                    retry_after_secs,
                })
            }
            _ => Err(ServerClientError::ServerError {
                lesson_id: lesson_id.clone(),
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            }),
        }
    }
}

#[async_trait]
impl ProgressSink for ProgressApiClient {
    async fn deliver(&self, payload: &HeartbeatPayload) -> Result<()> {
        self.send_heartbeat(payload).await
    }
}
