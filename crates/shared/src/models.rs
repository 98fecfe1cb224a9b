//! Wire payloads exchanged with the chat relay.

use serde::{Deserialize, Serialize};

// --- Outbound ---

/// Presence commands, discriminated by a `type` field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PresenceCommand {
    /// Associates the transport with an identity. Sent on every open.
    Join { username: String },
    Typing {
        username: String,
        #[serde(rename = "isTyping")]
        is_typing: bool,
    },
}

/// A chat line sent to the relay.
///
/// With `target_persona` set the relay is expected to answer exactly once;
/// with `store` set the line is only persisted and no answer follows.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub text: String,
    pub username: String,
    /// The locally selected default persona, `null` when none is selected.
    pub persona: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_persona: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub store: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RelayAction {
    #[serde(rename = "ai_to_ai")]
    AiToAi,
}

/// Asks the relay to have one persona address another.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AiRelayRequest {
    pub action: RelayAction,
    pub from_persona: String,
    pub to_persona: String,
    pub text: String,
    pub username: String,
}

/// Every payload shape the client may put on the wire.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum OutboundPayload {
    Presence(PresenceCommand),
    AiRelay(AiRelayRequest),
    Chat(ChatRequest),
}

impl OutboundPayload {
    pub fn join(username: impl Into<String>) -> Self {
        OutboundPayload::Presence(PresenceCommand::Join {
            username: username.into(),
        })
    }

    pub fn typing(username: impl Into<String>, is_typing: bool) -> Self {
        OutboundPayload::Presence(PresenceCommand::Typing {
            username: username.into(),
            is_typing,
        })
    }

    /// Short label used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            OutboundPayload::Presence(PresenceCommand::Join { .. }) => "join",
            OutboundPayload::Presence(PresenceCommand::Typing { .. }) => "typing",
            OutboundPayload::AiRelay(_) => "ai_to_ai",
            OutboundPayload::Chat(req) if req.target_persona.is_some() => "targeted",
            OutboundPayload::Chat(_) => "store",
        }
    }
}

// --- Inbound ---

/// Who produced a relay response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResponseRole {
    Server,
    Ai,
}

/// A decoded inbound frame.
///
/// Produced by [`crate::parse_frame`], which never fails: anything it cannot
/// classify ends up as [`InboundEvent::Unstructured`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    Typing { username: String, is_typing: bool },
    UserJoined { username: String },
    UserLeft { username: String },
    /// A human chat line relayed from any participant, possibly ourselves.
    UserMessage { username: String, text: String },
    /// A relay or persona answer. Completes the newest pending placeholder.
    Response {
        role: ResponseRole,
        text: String,
        target_persona: Option<String>,
    },
    /// Legacy plain-text frames and anything the decoder had to salvage.
    Unstructured { text: String },
    /// A recognized kind too incomplete to apply. Touches no state.
    Ignored {
        kind: String,
        reason: &'static str,
    },
}

impl InboundEvent {
    /// Whether this event may complete a pending placeholder.
    pub fn is_reply(&self) -> bool {
        matches!(
            self,
            InboundEvent::Response { .. } | InboundEvent::Unstructured { .. }
        )
    }
}
