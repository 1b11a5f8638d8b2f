use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Payload some upstreams send instead of closing the stream.
pub const DONE_SENTINEL: &str = "[DONE]";
pub const DATA_PREFIX: &str = "data:";

/// One decoded upstream event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamEvent {
    pub text: Option<String>,
    pub done: bool,
}

impl StreamEvent {
    pub fn done() -> Self {
        Self {
            text: None,
            done: true,
        }
    }
}

#[derive(Debug, Error)]
pub enum EventParseError {
    #[error("event payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("event payload has no recognised text field")]
    UnknownShape,
}

#[derive(Debug, Deserialize)]
struct MessageDelta {
    #[serde(default)]
    content: String,
}

/// Known upstream dialects, tried top to bottom.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Payload {
    Text {
        text: String,
        #[serde(default)]
        done: bool,
    },
    Response {
        response: String,
        #[serde(default)]
        done: bool,
    },
    Message {
        message: MessageDelta,
        #[serde(default)]
        done: bool,
    },
    Control {
        done: bool,
    },
}

impl From<Payload> for StreamEvent {
    fn from(payload: Payload) -> Self {
        let (text, done) = match payload {
            Payload::Text { text, done } | Payload::Response { response: text, done } => {
                (Some(text), done)
            }
            Payload::Message { message, done } => (Some(message.content), done),
            Payload::Control { done } => (None, done),
        };
        Self {
            text: text.filter(|t| !t.is_empty()),
            done,
        }
    }
}

/// Decodes the payload of a single event, with any `data:` prefix already removed.
pub fn decode_payload(payload: &str) -> Result<StreamEvent, EventParseError> {
    let payload = payload.trim();
    if payload == DONE_SENTINEL {
        return Ok(StreamEvent::done());
    }

    let value: Value = serde_json::from_str(payload)?;
    if !value.is_object() {
        return Err(EventParseError::UnknownShape);
    }
    let parsed = Payload::deserialize(value).map_err(|_| EventParseError::UnknownShape)?;
    Ok(parsed.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_and_response_fields_are_synonyms() {
        let a = decode_payload(r#"{"text":"Hel"}"#).unwrap();
        let b = decode_payload(r#"{"response":"Hel"}"#).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.text.as_deref(), Some("Hel"));
        assert!(!a.done);
    }

    #[test]
    fn chat_dialect_with_done_flag() {
        let event =
            decode_payload(r#"{"model":"m","message":{"role":"assistant","content":"lo"},"done":true}"#)
                .unwrap();
        assert_eq!(event.text.as_deref(), Some("lo"));
        assert!(event.done);
    }

    #[test]
    fn extra_fields_are_ignored() {
        let event = decode_payload(r#"{"text":"Hi","html":"<p>Hi</p>"}"#).unwrap();
        assert_eq!(event.text.as_deref(), Some("Hi"));
    }

    #[test]
    fn sentinel_terminates_without_text() {
        assert_eq!(decode_payload(" [DONE] ").unwrap(), StreamEvent::done());
    }

    #[test]
    fn empty_delta_carries_no_text() {
        let event = decode_payload(r#"{"text":""}"#).unwrap();
        assert_eq!(event.text, None);
    }

    #[test]
    fn malformed_and_foreign_payloads_are_errors() {
        assert!(matches!(
            decode_payload("not-json"),
            Err(EventParseError::Json(_))
        ));
        assert!(matches!(
            decode_payload(r#""just a string""#),
            Err(EventParseError::UnknownShape)
        ));
        assert!(matches!(
            decode_payload(r#"{"html":"<p>"}"#),
            Err(EventParseError::UnknownShape)
        ));
    }
}
