//! WebSocket connection state and the handles shared with the transport task.
//!
//! This module provides the shared types and includes the native
//! implementation. Anything that can produce a [`WsLink`] can stand in for
//! the network through the [`Connector`] trait.

use std::fmt;

use futures_channel::mpsc::{UnboundedReceiver, UnboundedSender};
use relaychat_shared::{encode_payload, OutboundPayload};

use crate::error::SessionError;

/// Connection state for the relay connection.
///
/// `Connecting` is tracked internally but reported as `Disconnected`; see
/// [`ConnectionState::observable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Error,
}

/// Inputs to the connection state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// `connect()` was called.
    Connect,
    /// The transport reported open.
    Opened,
    /// The transport reported an error.
    Errored,
    /// The transport reported close.
    Closed,
    /// `disconnect()` or disposal.
    Disconnect,
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }

    /// The state as presented to the UI. There is no visible "connecting".
    pub fn observable(self) -> ConnectionState {
        match self {
            ConnectionState::Connecting => ConnectionState::Disconnected,
            other => other,
        }
    }

    /// Apply one event.
    ///
    /// | from                      | event      | to           |
    /// |---------------------------|------------|--------------|
    /// | disconnected, error       | connect    | connecting   |
    /// | connecting, connected     | connect    | unchanged    |
    /// | connecting                | opened     | connected    |
    /// | connecting, connected     | errored    | error        |
    /// | connecting, connected, error | closed  | disconnected |
    /// | any                       | disconnect | disconnected |
    ///
    /// Everything else is rejected.
    pub fn transition(self, event: ConnectionEvent) -> Result<ConnectionState, SessionError> {
        use ConnectionEvent as E;
        use ConnectionState as S;

        let next = match (self, event) {
            (_, E::Disconnect) => S::Disconnected,
            (S::Disconnected | S::Error, E::Connect) => S::Connecting,
            (S::Connecting | S::Connected, E::Connect) => self,
            (S::Connecting, E::Opened) => S::Connected,
            (S::Connecting | S::Connected, E::Errored) => S::Error,
            (S::Connecting | S::Connected | S::Error, E::Closed) => S::Disconnected,
            (from, event) => return Err(SessionError::InvalidTransition { from, event }),
        };
        Ok(next)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Error => "error",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Callbacks from the transport, delivered in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Opened,
    Frame(String),
    Errored(String),
    Closed,
}

/// Instructions for the transport task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WsCommand {
    Text(String),
    Close,
}

/// Handle for sending frames through a WebSocket connection
#[derive(Debug, Clone)]
pub struct WsHandle {
    sender: UnboundedSender<WsCommand>,
    pub endpoint: String,
}

impl WsHandle {
    pub fn new(sender: UnboundedSender<WsCommand>, endpoint: impl Into<String>) -> Self {
        Self {
            sender,
            endpoint: endpoint.into(),
        }
    }

    /// Encode and queue a payload. Fails if encoding fails or the transport
    /// task is gone.
    pub fn send(&self, payload: &OutboundPayload) -> Result<(), SessionError> {
        let json = encode_payload(payload)?;
        crate::log_debug!("Queueing {} frame for {}: {}", payload.kind(), self.endpoint, json);
        self.sender
            .unbounded_send(WsCommand::Text(json))
            .map_err(|_| SessionError::ChannelClosed)
    }

    /// Ask the transport to close. Harmless if it already has.
    pub fn close(&self) {
        let _ = self.sender.unbounded_send(WsCommand::Close);
        self.sender.close_channel();
    }
}

/// One live transport: the outbound handle and its event stream.
#[derive(Debug)]
pub struct WsLink {
    pub handle: WsHandle,
    pub events: UnboundedReceiver<TransportEvent>,
}

impl WsLink {
    pub fn new(handle: WsHandle, events: UnboundedReceiver<TransportEvent>) -> Self {
        Self { handle, events }
    }
}

/// Opens transports for a session.
pub trait Connector {
    fn open(&self, endpoint: &str) -> WsLink;
}

mod connection_native;
pub use connection_native::WsConnector;
