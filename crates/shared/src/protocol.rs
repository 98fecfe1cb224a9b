//! Frame encoding and decoding for the relay protocol.
//!
//! The relay is not trusted to send well-formed JSON. [`parse_frame`] always
//! yields an [`InboundEvent`]: strict decoding first, then a permissive scan
//! for a `"text"` field, then the raw frame as-is.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

use crate::error::ProtocolError;
use crate::models::{InboundEvent, OutboundPayload, ResponseRole};

/// Author name used when a relayed chat line carries none.
pub const UNKNOWN_USERNAME: &str = "unknown";

/// Matches `"text": "...` (or `"message"`) up to the closing quote, or to the
/// end of input when the frame was truncated mid-string.
static TEXT_FIELD_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""(?:text|message)"\s*:\s*"((?:[^"\\]|\\.)*)"#).expect("text field pattern")
});

/// Serialize an outbound payload into a text frame.
pub fn encode_payload(payload: &OutboundPayload) -> Result<String, ProtocolError> {
    serde_json::to_string(payload).map_err(|source| ProtocolError::Encode {
        kind: payload.kind(),
        source,
    })
}

/// Decode one inbound text frame.
pub fn parse_frame(raw: &str) -> InboundEvent {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(fields)) => classify(&fields).unwrap_or_else(|| unstructured(raw)),
        Ok(Value::String(text)) => InboundEvent::Unstructured { text },
        Ok(_) => unstructured(raw),
        Err(_) => match salvage_text(raw) {
            Some(text) => InboundEvent::Response {
                role: ResponseRole::Server,
                text,
                target_persona: None,
            },
            None => unstructured(raw),
        },
    }
}

fn unstructured(raw: &str) -> InboundEvent {
    InboundEvent::Unstructured {
        text: raw.to_string(),
    }
}

fn classify(fields: &Map<String, Value>) -> Option<InboundEvent> {
    let username = string_field(fields, "username");
    let kind = fields.get("type").and_then(Value::as_str);

    // Presence kinds never fall through to the text fallback.
    let missing_username = |kind: &str| InboundEvent::Ignored {
        kind: kind.to_string(),
        reason: "missing username",
    };

    match kind {
        Some("typing") => Some(match username {
            Some(username) => InboundEvent::Typing {
                username,
                is_typing: fields.get("isTyping").is_some_and(is_truthy),
            },
            None => missing_username("typing"),
        }),
        Some("user.joined") => Some(match username {
            Some(username) => InboundEvent::UserJoined { username },
            None => missing_username("user.joined"),
        }),
        Some("user.left") => Some(match username {
            Some(username) => InboundEvent::UserLeft { username },
            None => missing_username("user.left"),
        }),
        Some("message") | Some("user.message") => Some(InboundEvent::UserMessage {
            username: username.unwrap_or_else(|| UNKNOWN_USERNAME.to_string()),
            text: text_field(fields).unwrap_or_default(),
        }),
        Some("ai") => Some(InboundEvent::Response {
            role: ResponseRole::Ai,
            text: text_field(fields).unwrap_or_default(),
            target_persona: persona_field(fields),
        }),
        _ => text_field(fields).map(|text| InboundEvent::Response {
            role: ResponseRole::Server,
            text,
            target_persona: persona_field(fields),
        }),
    }
}

fn string_field(fields: &Map<String, Value>, key: &str) -> Option<String> {
    fields
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn persona_field(fields: &Map<String, Value>) -> Option<String> {
    string_field(fields, "targetPersona").or_else(|| string_field(fields, "persona"))
}

/// `text`, falling back to `message`. Empty strings and nulls count as absent;
/// other scalars are stringified.
fn text_field(fields: &Map<String, Value>) -> Option<String> {
    ["text", "message"]
        .iter()
        .filter_map(|key| fields.get(*key))
        .find_map(|value| match value {
            Value::Null => None,
            Value::String(s) if s.is_empty() => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        })
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Best-effort extraction of a text field from a frame that failed to decode.
fn salvage_text(raw: &str) -> Option<String> {
    let captured = TEXT_FIELD_PATTERN.captures(raw)?.get(1)?.as_str();
    if captured.is_empty() {
        return None;
    }
    // Undo JSON escapes when the captured span is itself a valid string body.
    let text = serde_json::from_str::<String>(&format!("\"{}\"", captured))
        .unwrap_or_else(|_| captured.to_string());
    Some(text)
}
