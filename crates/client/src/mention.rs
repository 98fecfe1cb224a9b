//! Outbound addressing.
//!
//! Grammar, checked in order against the trimmed input:
//!
//! 1. `@From->@To: text` asks the relay to have persona `From` address `To`.
//! 2. `@Name` anywhere (at the start or after whitespace) targets `Name`.
//!    The first such token is removed from the content. A `,` or `:` right
//!    after a leading token goes with it (`@Athena, hi` sends `hi`), and
//!    closing punctuation after an inner token stays attached to the
//!    preceding word (`thanks @Bob!` sends `thanks!`).
//! 3. Anything else is untargeted.
//!
//! Names are ASCII letters, digits, `_` and `-`.

use once_cell::sync::Lazy;
use regex::Regex;
use relaychat_shared::{AiRelayRequest, ChatRequest, OutboundPayload, RelayAction};

use crate::config::UntargetedMode;
use crate::stores::{MessageDraft, Sender};

static RELAY_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^@([A-Za-z0-9_-]+)\s*->\s*@([A-Za-z0-9_-]+)\s*:?\s*(.*)$")
        .expect("relay mention pattern")
});

/// Punctuation that binds to the word before it.
const CLOSING_PUNCTUATION: [char; 6] = [',', '.', '!', '?', ':', ';'];

static MENTION_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|\s)(@([A-Za-z0-9_-]+))").expect("mention pattern")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mention {
    Relay {
        from: String,
        to: String,
        text: String,
    },
    Direct {
        target: String,
        /// Text with the mention token removed; may be empty.
        content: String,
    },
    Untargeted,
}

/// Classify already-trimmed outbound text.
pub fn parse_mention(text: &str) -> Mention {
    if let Some(caps) = RELAY_PATTERN.captures(text) {
        return Mention::Relay {
            from: caps[1].to_string(),
            to: caps[2].to_string(),
            text: caps[3].trim().to_string(),
        };
    }

    if let Some(caps) = MENTION_PATTERN.captures(text) {
        if let Some(token) = caps.get(1) {
            let before = text[..token.start()].trim_end();
            let mut after = text[token.end()..].trim_start();
            if before.is_empty() {
                after = after.trim_start_matches([',', ':']).trim_start();
            }
            let content = match (before.is_empty(), after.is_empty()) {
                (true, _) => after.to_string(),
                (false, true) => before.to_string(),
                (false, false) if after.starts_with(CLOSING_PUNCTUATION) => {
                    format!("{}{}", before, after)
                }
                (false, false) => format!("{} {}", before, after),
            };
            return Mention::Direct {
                target: caps[2].to_string(),
                content,
            };
        }
    }

    Mention::Untargeted
}

/// Who is sending, as seen by the router.
#[derive(Debug, Clone, Copy)]
pub struct Author<'a> {
    pub username: &'a str,
    pub persona: Option<&'a str>,
}

/// Local log entries and the wire payload for one `send_message` call.
#[derive(Debug, Clone, PartialEq)]
pub struct Routed {
    /// Appended to the log, in order, before anything is transmitted.
    pub echoes: Vec<MessageDraft>,
    pub payload: Option<OutboundPayload>,
}

/// Route one line of user input. Returns `None` for blank input.
pub fn route(raw: &str, author: Author<'_>, untargeted: UntargetedMode) -> Option<Routed> {
    let text = raw.trim();
    if text.is_empty() {
        return None;
    }
    let username = author.username.to_string();
    let persona = author.persona.map(str::to_string);

    let routed = match parse_mention(text) {
        Mention::Relay { from, to, text } => {
            let description = if text.is_empty() {
                format!("Relaying from {} to {}", from, to)
            } else {
                format!("Relaying from {} to {}: {}", from, to, text)
            };
            Routed {
                echoes: vec![MessageDraft::new(Sender::System, description)
                    .with_username(username.clone())
                    .with_target(Some(to.clone()))],
                payload: Some(OutboundPayload::AiRelay(AiRelayRequest {
                    action: RelayAction::AiToAi,
                    from_persona: from,
                    to_persona: to,
                    text,
                    username,
                })),
            }
        }
        Mention::Direct { target, content } => {
            let echo_text = if content.is_empty() {
                format!("(calling {})", target)
            } else {
                content.clone()
            };
            Routed {
                echoes: vec![
                    MessageDraft::me(echo_text, Some(username.clone()))
                        .with_target(Some(target.clone())),
                    MessageDraft::placeholder(),
                ],
                payload: Some(OutboundPayload::Chat(ChatRequest {
                    text: content,
                    username,
                    persona,
                    target_persona: Some(target),
                    store: false,
                })),
            }
        }
        Mention::Untargeted => {
            let payload = match untargeted {
                UntargetedMode::LocalOnly => None,
                UntargetedMode::Store => Some(OutboundPayload::Chat(ChatRequest {
                    text: text.to_string(),
                    username: username.clone(),
                    persona,
                    target_persona: None,
                    store: true,
                })),
            };
            Routed {
                echoes: vec![MessageDraft::me(text, Some(username))],
                payload,
            }
        }
    };
    Some(routed)
}
