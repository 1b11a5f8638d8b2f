use std::{
    env,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::Deserialize;
use tokio::fs;
use tracing::info;

use crate::ai::prompts::DEFAULT_SYSTEM_PROMPT;

pub const DEFAULT_CONFIG_PATH: &str = "config/app.yaml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub upstream: UpstreamConfig,
    pub chat: ChatConfig,
    pub analysis: AnalysisConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_permissive: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_permissive: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub status_timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "llama3.2".to_string(),
            api_key: None,
            connect_timeout_secs: 5,
            request_timeout_secs: 60,
            status_timeout_secs: 3,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    pub default_system_prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_k: u32,
    pub top_p: f32,
    pub repeat_penalty: f32,
    pub num_ctx: u32,
    pub seed: Option<i64>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            default_system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            temperature: 0.7,
            max_tokens: 2000,
            top_k: 40,
            top_p: 0.9,
            repeat_penalty: 1.1,
            num_ctx: 4096,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Collapse repeated mentions before insights, summary and chart labels.
    pub dedup_mentions: bool,
    pub max_upload_bytes: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            dedup_mentions: false,
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

impl AppConfig {
    pub fn from_yaml_str(contents: &str) -> Result<Self> {
        let config: AppConfig =
            serde_yaml::from_str(contents).context("Failed to parse YAML configuration")?;
        Ok(config)
    }

    pub async fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file at {}", path.display()))?;
        let config = Self::from_yaml_str(&contents)
            .with_context(|| format!("Failed to parse config file at {}", path.display()))?;
        info!(path = %path.display(), "Configuration loaded from disk");
        Ok(config)
    }

    /// Environment variables win over the file for deployment-specific values.
    pub fn apply_env_overrides(&mut self) {
        if let Some(url) = non_empty_env("UPSTREAM_BASE_URL") {
            self.upstream.base_url = url;
        }
        if let Some(model) = non_empty_env("UPSTREAM_MODEL") {
            self.upstream.model = model;
        }
        if let Some(key) = non_empty_env("UPSTREAM_API_KEY") {
            self.upstream.api_key = Some(key);
        }
    }
}

pub fn config_path() -> PathBuf {
    env::var("APP_CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
