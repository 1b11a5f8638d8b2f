pub mod ai;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod relay;
pub mod routes;

use std::sync::Arc;

use anyhow::Result;
use axum::{Router, routing::get};
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;

use ai::{chat::ChatService, client::UpstreamClient};
use config::AppConfig;
use pipeline::{Analyzer, AnalyzerConfig};

pub struct AppState {
    pub config: Arc<AppConfig>,
    pub analyzer: Arc<Analyzer>,
    pub chat: Arc<ChatService>,
    /// Cancelled on shutdown so open relays stop reading.
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn from_config(config: AppConfig) -> Result<Self> {
        let analyzer = Analyzer::new(AnalyzerConfig {
            dedup_mentions: config.analysis.dedup_mentions,
        });
        Self::with_analyzer(config, analyzer)
    }

    /// Same as [`AppState::from_config`] with a caller-supplied analyzer.
    pub fn with_analyzer(config: AppConfig, analyzer: Analyzer) -> Result<Self> {
        let client = UpstreamClient::new(&config.upstream)?;
        let chat = ChatService::new(client, config.chat.clone());
        Ok(Self {
            config: Arc::new(config),
            analyzer: Arc::new(analyzer),
            chat: Arc::new(chat),
            shutdown: CancellationToken::new(),
        })
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    let mut app = Router::new()
        .route("/", get(root))
        .merge(routes::status_routes())
        .merge(routes::analysis_routes(state.config.analysis.max_upload_bytes))
        .merge(routes::chat_routes());

    if state.config.server.cors_permissive {
        app = app.layer(CorsLayer::permissive());
    }
    app.with_state(state)
}

#[inline]
async fn root() -> &'static str {
    "clinalyze"
}
