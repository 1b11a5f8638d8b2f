use anyhow::Context;
use axum::body::Bytes;
use futures::{
    StreamExt,
    stream::{self, BoxStream},
};
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use tokio::time::Duration;
use tracing::{debug, warn};

use crate::{
    config::UpstreamConfig,
    error::{ChatError, StreamReadError},
};

use super::chat::ChatMessage;

const MAX_ERROR_BODY_CHARS: usize = 512;

pub type BodyStream = BoxStream<'static, Result<Bytes, StreamReadError>>;

/// Sampling knobs forwarded verbatim in the upstream `options` object.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SamplingOptions {
    pub temperature: f32,
    pub num_predict: u32,
    pub top_k: u32,
    pub top_p: f32,
    pub repeat_penalty: f32,
    pub num_ctx: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpstreamChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub stream: bool,
    pub options: SamplingOptions,
}

#[derive(Debug, Deserialize)]
struct VersionResponse {
    #[serde(default)]
    version: String,
}

/// HTTP client for the language model service.
pub struct UpstreamClient {
    http: Client,
    base: String,
    model: String,
    api_key: Option<String>,
    request_timeout: Duration,
    status_timeout: Duration,
}

impl UpstreamClient {
    pub fn new(config: &UpstreamConfig) -> anyhow::Result<Self> {
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .context("Failed to build upstream HTTP client")?;
        Ok(Self {
            http,
            base: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            request_timeout: Duration::from_secs(config.request_timeout_secs),
            status_timeout: Duration::from_secs(config.status_timeout_secs),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn base_url(&self) -> &str {
        &self.base
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    /// Opens a chat completion and hands back the raw response body. A
    /// non-2xx status is reported before any body bytes are read.
    ///
    /// `request_timeout` bounds the wait for response headers and every gap
    /// between body chunks, never the whole generation.
    pub async fn open_chat_stream(&self, body: &UpstreamChatRequest) -> Result<BodyStream, ChatError> {
        let request = self.http.post(format!("{}/api/chat", self.base)).json(body);

        let idle = self.request_timeout;
        let resp = tokio::time::timeout(idle, self.authorize(request).send())
            .await
            .map_err(|_| {
                ChatError::UpstreamUnavailable(format!("no response within {}s", idle.as_secs()))
            })??;
        let status = resp.status();
        if !status.is_success() {
            let text = tokio::time::timeout(idle, resp.text())
                .await
                .ok()
                .and_then(Result::ok)
                .unwrap_or_default();
            let text: String = text.chars().take(MAX_ERROR_BODY_CHARS).collect();
            warn!(status = status.as_u16(), body = %text, "upstream rejected chat request");
            return Err(ChatError::UpstreamStatus {
                status: status.as_u16(),
                body: text,
            });
        }

        debug!(status = status.as_u16(), model = %body.model, "upstream chat stream opened");
        Ok(idle_bounded(resp.bytes_stream().boxed(), idle))
    }

    /// Version string reported by the service, within the status timeout.
    pub async fn version(&self) -> Result<String, ChatError> {
        let request = self
            .http
            .get(format!("{}/api/version", self.base))
            .timeout(self.status_timeout);

        let resp = self.authorize(request).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ChatError::UpstreamStatus {
                status: status.as_u16(),
                body: resp.text().await.unwrap_or_default(),
            });
        }
        let parsed: VersionResponse = resp.json().await?;
        Ok(parsed.version)
    }
}

/// Ends `body` with [`StreamReadError::Idle`] when no chunk arrives within `idle`.
fn idle_bounded(body: BoxStream<'static, reqwest::Result<Bytes>>, idle: Duration) -> BodyStream {
    stream::unfold(Some(body), move |body| async move {
        let mut body = body?;
        match tokio::time::timeout(idle, body.next()).await {
            Ok(Some(Ok(chunk))) => Some((Ok(chunk), Some(body))),
            Ok(Some(Err(err))) => Some((Err(StreamReadError::Body(err)), None)),
            Ok(None) => None,
            Err(_) => {
                warn!(idle_secs = idle.as_secs(), "upstream stream went quiet");
                Some((Err(StreamReadError::Idle(idle)), None))
            }
        }
    })
    .boxed()
}
