//! Relaychat Client - chat session over a WebSocket relay
//!
//! This crate owns one relay connection and turns it into the state a chat
//! UI renders: connection status, an ordered message log with optimistic
//! echoes reconciled against relay replies, and the set of users typing.
//! Rendering lives elsewhere and talks to [`ChatSession`] only.

pub mod config;
pub mod error;
pub mod logging;
pub mod mention;
pub mod session;
pub mod stores;
pub mod ws;

pub use config::{SessionConfig, UntargetedMode};
pub use error::{ConfigError, SessionError};
pub use session::{ChatSession, SessionEvent};
pub use stores::{ChatMessage, Sender};
pub use ws::{ConnectionState, WsConnector};
