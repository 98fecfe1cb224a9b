//! Client error types.
//!
//! None of these escape the public session commands; they are logged at the
//! point where the session decides to drop the action.

use relaychat_shared::ProtocolError;
use thiserror::Error;

use crate::ws::{ConnectionEvent, ConnectionState};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("transport is not open (status: {0:?})")]
    NotConnected(ConnectionState),
    #[error("transport channel closed")]
    ChannelClosed,
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error("invalid connection transition: {event:?} while {from:?}")]
    InvalidTransition {
        from: ConnectionState,
        event: ConnectionEvent,
    },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid relay endpoint {endpoint:?}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },
    #[error("unknown untargeted mode {0:?} (expected \"store\" or \"local\")")]
    UnknownUntargetedMode(String),
}
