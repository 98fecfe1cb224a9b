//! Session-owned state read by the presentation layer.

pub mod messages;
pub mod typing;

pub use messages::{ChatMessage, MessageDraft, MessageStore, ReconcileOutcome, Reply, Sender};
pub use typing::TypingSet;
