use serde::{Deserialize, Serialize};
use ts_rs::TS;

#[derive(Clone, Debug, Deserialize, Serialize, TS)]
#[ts(export)]
pub struct ChatResponse {
    pub response: String,
}

#[derive(Clone, Debug, Deserialize, Serialize, TS)]
#[ts(export)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum UpstreamState {
    Online,
    Offline,
    Error,
}

/// Reachability of the language model service; always served with 200.
#[derive(Clone, Debug, Deserialize, Serialize, TS)]
#[ts(export)]
pub struct UpstreamStatusResponse {
    pub status: UpstreamState,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}
