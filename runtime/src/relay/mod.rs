pub mod event;
pub mod state;

use std::{collections::VecDeque, error::Error, pin::Pin};

use futures::{Stream, StreamExt, stream};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::RelayError;

pub use event::{EventParseError, StreamEvent, decode_payload};
pub use state::RelayState;

type BoxError = Box<dyn Error + Send + Sync>;

/// One text-bearing upstream event together with everything received so far.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayUpdate {
    pub delta: String,
    pub aggregated: String,
}

/// Turns an upstream byte stream into cumulative text.
#[derive(Debug, Clone, Default)]
pub struct StreamRelay {
    cancel: CancellationToken,
}

impl StreamRelay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancelling `token` stops reading at the next chunk boundary.
    pub fn with_cancellation(token: CancellationToken) -> Self {
        Self { cancel: token }
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub async fn aggregate<S, B, E>(&self, upstream: S) -> Result<String, RelayError>
    where
        S: Stream<Item = Result<B, E>>,
        B: AsRef<[u8]>,
        E: Into<BoxError>,
    {
        self.relay(upstream, |_| {}).await
    }

    /// Reads `upstream` to completion, calling `on_partial` with the
    /// cumulative text after each non-empty delta. Returns the final text.
    pub async fn relay<S, B, E, F>(&self, upstream: S, mut on_partial: F) -> Result<String, RelayError>
    where
        S: Stream<Item = Result<B, E>>,
        B: AsRef<[u8]>,
        E: Into<BoxError>,
        F: FnMut(&str),
    {
        let mut upstream = std::pin::pin!(upstream);
        let mut state = RelayState::new();
        let mut on_delta = |_: &str, aggregated: &str| on_partial(aggregated);
        let mut chunks = 0usize;

        loop {
            let next = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    debug!(chunks, received = state.aggregated().len(), "relay cancelled");
                    return Err(RelayError::Cancelled);
                }
                next = upstream.next() => next,
            };

            match next {
                Some(Ok(chunk)) => {
                    chunks += 1;
                    state.feed(chunk.as_ref(), &mut on_delta);
                    if state.is_terminated() {
                        break;
                    }
                }
                Some(Err(err)) => return Err(RelayError::Upstream(err.into())),
                None => {
                    state.finish(&mut on_delta);
                    break;
                }
            }
        }

        debug!(chunks, chars = state.aggregated().len(), "relay finished");
        Ok(state.into_aggregated())
    }

    /// Pull-based variant of [`StreamRelay::relay`]. The stream ends after the
    /// upstream terminates, after the first error, or on cancellation. Once
    /// cancelled, updates already decoded from the current chunk are dropped.
    pub fn updates<S, B, E>(self, upstream: S) -> impl Stream<Item = Result<RelayUpdate, RelayError>>
    where
        S: Stream<Item = Result<B, E>>,
        B: AsRef<[u8]>,
        E: Into<BoxError>,
    {
        let pump = UpdatePump {
            upstream: Box::pin(upstream),
            state: RelayState::new(),
            pending: VecDeque::new(),
            cancel: self.cancel,
            finished: false,
        };

        stream::unfold(pump, |mut pump| async move {
            loop {
                let live = !pump.finished || !pump.pending.is_empty();
                if live && pump.cancel.is_cancelled() {
                    pump.pending.clear();
                    pump.finished = true;
                    return Some((Err(RelayError::Cancelled), pump));
                }
                if let Some(update) = pump.pending.pop_front() {
                    return Some((Ok(update), pump));
                }
                if pump.finished {
                    return None;
                }

                let next = tokio::select! {
                    biased;
                    _ = pump.cancel.cancelled() => {
                        pump.finished = true;
                        return Some((Err(RelayError::Cancelled), pump));
                    }
                    next = pump.upstream.next() => next,
                };

                let mut produced = Vec::new();
                {
                    let mut collect = |delta: &str, aggregated: &str| {
                        produced.push(RelayUpdate {
                            delta: delta.to_string(),
                            aggregated: aggregated.to_string(),
                        })
                    };
                    match next {
                        Some(Ok(chunk)) => pump.state.feed(chunk.as_ref(), &mut collect),
                        Some(Err(err)) => {
                            pump.finished = true;
                            return Some((Err(RelayError::Upstream(err.into())), pump));
                        }
                        None => pump.state.finish(&mut collect),
                    }
                }

                pump.finished = pump.state.is_terminated();
                pump.pending.extend(produced);
            }
        })
    }
}

struct UpdatePump<S> {
    upstream: Pin<Box<S>>,
    state: RelayState,
    pending: VecDeque<RelayUpdate>,
    cancel: CancellationToken,
    finished: bool,
}
