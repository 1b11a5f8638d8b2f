use tracing::{debug, warn};

use super::event::{DATA_PREFIX, decode_payload};

const PREVIEW_CHARS: usize = 80;

/// Longest line kept while waiting for its `\n`.
pub const MAX_LINE_BYTES: usize = 1 << 20;

/// Framing state for one upstream response.
///
/// Bytes are split on `\n` before decoding, so a multi-byte character cut
/// across two chunks is reassembled intact. Every `data:` line and every bare
/// JSON line is one event; blank lines, comments and other SSE fields only
/// delimit. A line that outgrows the line limit is dropped whole.
#[derive(Debug)]
pub struct RelayState {
    buffer: Vec<u8>,
    aggregated: String,
    terminated: bool,
    max_line: usize,
    skipping_line: bool,
}

impl Default for RelayState {
    fn default() -> Self {
        Self::with_line_limit(MAX_LINE_BYTES)
    }
}

impl RelayState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_line_limit(max_line: usize) -> Self {
        Self {
            buffer: Vec::new(),
            aggregated: String::new(),
            terminated: false,
            max_line,
            skipping_line: false,
        }
    }

    pub fn aggregated(&self) -> &str {
        &self.aggregated
    }

    pub fn into_aggregated(self) -> String {
        self.aggregated
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// Consumes one chunk. `on_delta(delta, aggregated)` fires for every event
    /// that carries text, in arrival order.
    pub fn feed<F>(&mut self, chunk: &[u8], on_delta: &mut F)
    where
        F: FnMut(&str, &str),
    {
        if self.terminated {
            return;
        }
        self.buffer.extend_from_slice(chunk);

        let mut start = 0;
        while let Some(offset) = self.buffer[start..].iter().position(|b| *b == b'\n') {
            let end = start + offset;
            let line = String::from_utf8_lossy(&self.buffer[start..end]).into_owned();
            start = end + 1;

            if std::mem::take(&mut self.skipping_line) {
                continue;
            }
            self.handle_line(&line, on_delta);
            if self.terminated {
                self.buffer.clear();
                return;
            }
        }
        self.buffer.drain(..start);

        if self.buffer.len() > self.max_line {
            if !self.skipping_line {
                warn!(
                    limit = self.max_line,
                    line = %preview(&String::from_utf8_lossy(&self.buffer)),
                    "dropping oversized stream line"
                );
            }
            self.buffer.clear();
            self.skipping_line = true;
        }
    }

    /// Flushes whatever trails the last delimiter once the upstream closes.
    pub fn finish<F>(&mut self, on_delta: &mut F)
    where
        F: FnMut(&str, &str),
    {
        if !self.terminated && !self.skipping_line && !self.buffer.is_empty() {
            let rest = std::mem::take(&mut self.buffer);
            let line = String::from_utf8_lossy(&rest).into_owned();
            self.handle_line(&line, on_delta);
        }
        self.buffer.clear();
        self.terminated = true;
    }

    fn handle_line<F>(&mut self, line: &str, on_delta: &mut F)
    where
        F: FnMut(&str, &str),
    {
        let line = line.strip_suffix('\r').unwrap_or(line);
        let trimmed = line.trim();

        if trimmed.is_empty() || trimmed.starts_with(':') {
            return;
        }
        if let Some(payload) = trimmed.strip_prefix(DATA_PREFIX) {
            self.dispatch(payload, on_delta);
        } else if trimmed.starts_with('{') {
            self.dispatch(trimmed, on_delta);
        } else {
            debug!(line = %preview(trimmed), "skipping non-data stream line");
        }
    }

    fn dispatch<F>(&mut self, payload: &str, on_delta: &mut F)
    where
        F: FnMut(&str, &str),
    {
        let event = match decode_payload(payload) {
            Ok(event) => event,
            Err(err) => {
                warn!(error = %err, payload = %preview(payload), "discarding stream event");
                return;
            }
        };

        if let Some(text) = event.text {
            self.aggregated.push_str(&text);
            on_delta(&text, &self.aggregated);
        }
        if event.done {
            self.terminated = true;
        }
    }
}

fn preview(text: &str) -> String {
    text.chars().take(PREVIEW_CHARS).collect()
}
