//! Relay transport.
//!
//! ```text
//!   ChatSession ──WsHandle──▶ transport task ──▶ relay
//!        ▲                         │
//!        └────TransportEvent───────┘
//! ```
//!
//! The session is the only holder of a [`WsHandle`]; every outbound frame
//! goes through it. Transport callbacks come back as [`TransportEvent`]s on
//! the link's receiver and are applied by the session one at a time.

mod connection;

pub use connection::{
    ConnectionEvent, ConnectionState, Connector, TransportEvent, WsCommand, WsConnector, WsHandle,
    WsLink,
};
