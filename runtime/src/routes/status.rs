use std::sync::Arc;

use axum::{Json, Router, extract::State, routing::get};
use chrono::Utc;
use tracing::debug;

use crate::{AppState, error::ChatError};

use super::types::{HealthResponse, UpstreamState, UpstreamStatusResponse};

pub fn status_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health))
        .route("/api/ollama-status", get(upstream_status))
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

async fn upstream_status(State(state): State<Arc<AppState>>) -> Json<UpstreamStatusResponse> {
    let client = state.chat.client();
    let response = match client.version().await {
        Ok(version) => UpstreamStatusResponse {
            status: UpstreamState::Online,
            message: "Language model service is running".to_string(),
            model: Some(client.model().to_string()),
            version: Some(version),
        },
        Err(ChatError::UpstreamStatus { status, .. }) => UpstreamStatusResponse {
            status: UpstreamState::Error,
            message: format!("Language model service returned status {status}"),
            model: None,
            version: None,
        },
        Err(ChatError::UpstreamProtocol(detail)) => UpstreamStatusResponse {
            status: UpstreamState::Error,
            message: format!("Language model service sent an unreadable version reply: {detail}"),
            model: None,
            version: None,
        },
        Err(err) => {
            debug!(error = %err, "language model service unreachable");
            UpstreamStatusResponse {
                status: UpstreamState::Offline,
                message: format!("Cannot connect to language model service at {}", client.base_url()),
                model: None,
                version: None,
            }
        }
    };
    Json(response)
}
