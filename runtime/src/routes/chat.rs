use std::{convert::Infallible, future::ready, sync::Arc, time::Duration};

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    routing::post,
};
use futures::{Stream, StreamExt, stream};
use serde_json::json;
use tracing::{error, warn};

use crate::{
    AppState,
    ai::{chat::ChatRequest, markdown::render_markdown},
    error::{ApiError, ErrorBody},
    relay::{StreamRelay, event::DONE_SENTINEL},
};

use super::types::ChatResponse;

pub fn chat_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/chat", post(chat))
        .route("/api/chat/stream", post(chat_stream))
}

fn parse_request(payload: Result<Json<ChatRequest>, JsonRejection>) -> Result<ChatRequest, ApiError> {
    payload
        .map(|Json(request)| request)
        .map_err(|rejection| ApiError::new(StatusCode::BAD_REQUEST, "input", rejection.body_text()))
}

fn request_relay(state: &AppState) -> StreamRelay {
    StreamRelay::with_cancellation(state.shutdown.child_token())
}

async fn chat(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let request = parse_request(payload)?;
    let response = state
        .chat
        .complete(request, request_relay(&state))
        .await
        .map_err(|err| {
            error!(error = %err, kind = err.kind(), "chat request failed");
            err
        })?;
    Ok(Json(ChatResponse { response }))
}

/// Re-emits upstream deltas as `data: {"text": ..., "html": ...}` events, the
/// html being the delta rendered as markdown, and finishes with `data: [DONE]`.
/// A mid-stream failure becomes a single `error` event instead.
async fn chat_stream(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let request = parse_request(payload)?;
    let updates = state
        .chat
        .stream(request, request_relay(&state))
        .await
        .map_err(|err| {
            error!(error = %err, kind = err.kind(), "chat stream could not start");
            err
        })?;

    let events = updates
        .map(|item| match item {
            Ok(update) => {
                let data = json!({ "text": update.delta, "html": render_markdown(&update.delta) });
                (false, Event::default().data(data.to_string()))
            }
            Err(err) => {
                warn!(error = %err, kind = err.kind(), "chat stream aborted");
                let body = ErrorBody {
                    error: err.to_string(),
                    kind: err.kind(),
                };
                let data = serde_json::to_string(&body).unwrap_or_default();
                (true, Event::default().event("error").data(data))
            }
        })
        .chain(stream::once(async { (false, Event::default().data(DONE_SENTINEL)) }))
        .scan(false, |failed, (is_error, event)| {
            let next = if *failed {
                None
            } else {
                Some(Ok::<_, Infallible>(event))
            };
            *failed |= is_error;
            ready(next)
        });

    Ok(Sse::new(events).keep_alive(KeepAlive::new().interval(Duration::from_secs(15))))
}
