use futures::{StreamExt, stream::BoxStream};
use serde::{Deserialize, Serialize};
use tracing::{Instrument, info, info_span};
use ts_rs::TS;
use uuid::Uuid;

use crate::{
    config::ChatConfig,
    error::{ChatError, RelayError},
    relay::{RelayUpdate, StreamRelay},
};

use super::{
    client::{SamplingOptions, UpstreamChatRequest, UpstreamClient},
    prompts::language_prompt,
};

const MAX_TEMPERATURE: f32 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

/// Inbound chat request. `message` is the single-turn shorthand and is
/// appended after `messages` as a user turn.
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ChatRequest {
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub system_prompt: Option<String>,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default, rename = "max_tokens")]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub language: Option<String>,
}

pub type UpdateStream = BoxStream<'static, Result<RelayUpdate, RelayError>>;

pub struct ChatService {
    client: UpstreamClient,
    defaults: ChatConfig,
}

impl ChatService {
    pub fn new(client: UpstreamClient, defaults: ChatConfig) -> Self {
        Self { client, defaults }
    }

    pub fn client(&self) -> &UpstreamClient {
        &self.client
    }

    /// Validates `request` and resolves prompt and sampling defaults.
    pub fn build_request(&self, request: ChatRequest) -> Result<UpstreamChatRequest, ChatError> {
        let temperature = request.temperature.unwrap_or(self.defaults.temperature);
        if !temperature.is_finite() || !(0.0..=MAX_TEMPERATURE).contains(&temperature) {
            return Err(ChatError::Input(format!(
                "temperature must be between 0 and {MAX_TEMPERATURE}"
            )));
        }
        let max_tokens = request.max_tokens.unwrap_or(self.defaults.max_tokens);
        if max_tokens == 0 {
            return Err(ChatError::Input("max_tokens must be at least 1".to_string()));
        }

        let mut turns = request.messages;
        if let Some(message) = request.message.filter(|m| !m.trim().is_empty()) {
            turns.push(ChatMessage {
                role: ChatRole::User,
                content: message,
            });
        }
        if turns.iter().any(|m| m.content.trim().is_empty()) {
            return Err(ChatError::Input("message content must not be blank".to_string()));
        }
        if turns.iter().all(|m| m.role == ChatRole::System) {
            return Err(ChatError::Input(
                "at least one user or assistant message is required".to_string(),
            ));
        }

        let explicit = non_blank(request.system_prompt);
        let language = non_blank(request.language);
        let caller_leads_with_system = turns.first().is_some_and(|m| m.role == ChatRole::System);

        let system = match (explicit, language) {
            (Some(prompt), _) => Some(prompt),
            (None, _) if caller_leads_with_system => None,
            (None, Some(language)) => Some(language_prompt(&language)),
            (None, None) => Some(self.defaults.default_system_prompt.clone()),
        };

        let mut messages = Vec::with_capacity(turns.len() + 1);
        if let Some(content) = system {
            messages.push(ChatMessage {
                role: ChatRole::System,
                content,
            });
        }
        messages.extend(turns);

        Ok(UpstreamChatRequest {
            model: self.client.model().to_string(),
            messages,
            stream: true,
            options: SamplingOptions {
                temperature,
                num_predict: max_tokens,
                top_k: self.defaults.top_k,
                top_p: self.defaults.top_p,
                repeat_penalty: self.defaults.repeat_penalty,
                num_ctx: self.defaults.num_ctx,
                seed: self.defaults.seed,
            },
        })
    }

    /// Runs a completion and returns the full aggregated reply.
    pub async fn complete(
        &self,
        request: ChatRequest,
        relay: StreamRelay,
    ) -> Result<String, ChatError> {
        let body = self.build_request(request)?;
        let span = info_span!(
            "chat",
            request_id = %Uuid::new_v4(),
            model = %body.model,
            turns = body.messages.len()
        );

        async {
            let upstream = self.client.open_chat_stream(&body).await?;
            let reply = relay.aggregate(upstream).await?;
            info!(chars = reply.len(), "chat completed");
            Ok::<_, ChatError>(reply)
        }
        .instrument(span)
        .await
    }

    /// Opens a completion and returns its incremental updates.
    pub async fn stream(
        &self,
        request: ChatRequest,
        relay: StreamRelay,
    ) -> Result<UpdateStream, ChatError> {
        let body = self.build_request(request)?;
        let upstream = self.client.open_chat_stream(&body).await?;
        info!(model = %body.model, turns = body.messages.len(), "chat stream started");
        Ok(relay.updates(upstream).boxed())
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
