use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Failures of a single document analysis request.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("invalid input: {0}")]
    Input(String),

    #[error("failed to extract text from document: {0}")]
    Extraction(String),

    #[error("document contains no extractable text")]
    EmptyDocument,

    #[error("text extraction service unavailable: {0}")]
    UpstreamUnavailable(String),
}

impl AnalysisError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Input(_) => "input",
            Self::Extraction(_) => "extraction",
            Self::EmptyDocument => "empty_document",
            Self::UpstreamUnavailable(_) => "upstream_unavailable",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Input(_) => StatusCode::BAD_REQUEST,
            Self::EmptyDocument => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Extraction(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::UpstreamUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

/// Terminal failure of a stream relay. Per-event decode problems never
/// surface here; they are logged and dropped by the relay loop.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("upstream stream failed: {0}")]
    Upstream(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("relay cancelled before the upstream stream completed")]
    Cancelled,
}

impl RelayError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Upstream(_) => "relay",
            Self::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("invalid input: {0}")]
    Input(String),

    #[error("language model service unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("language model service returned {status}: {body}")]
    UpstreamStatus { status: u16, body: String },

    #[error("language model service sent an unreadable response: {0}")]
    UpstreamProtocol(String),

    #[error(transparent)]
    Relay(#[from] RelayError),
}

impl ChatError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Input(_) => "input",
            Self::UpstreamUnavailable(_) => "upstream_unavailable",
            Self::UpstreamStatus { .. } => "upstream_status",
            Self::UpstreamProtocol(_) => "upstream_protocol",
            Self::Relay(err) => err.kind(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Input(_) => StatusCode::BAD_REQUEST,
            Self::UpstreamUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::UpstreamStatus { .. } | Self::UpstreamProtocol(_) | Self::Relay(_) => {
                StatusCode::BAD_GATEWAY
            }
        }
    }
}

impl From<reqwest::Error> for ChatError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::UpstreamProtocol(err.to_string())
        } else {
            Self::UpstreamUnavailable(err.to_string())
        }
    }
}

/// Failure while reading an already-open upstream body.
#[derive(Debug, Error)]
pub enum StreamReadError {
    #[error(transparent)]
    Body(#[from] reqwest::Error),

    #[error("no data from language model service for {}s", .0.as_secs())]
    Idle(std::time::Duration),
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub kind: &'static str,
}

/// Handler-facing error: a status code plus the JSON body returned to the caller.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    pub fn new(status: StatusCode, kind: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                error: message.into(),
                kind,
            },
        }
    }
}

impl From<AnalysisError> for ApiError {
    fn from(err: AnalysisError) -> Self {
        Self::new(err.status_code(), err.kind(), err.to_string())
    }
}

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        Self::new(err.status_code(), err.kind(), err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
