//! Chat session: one relay connection and the state the UI renders.
//!
//! A [`ChatSession`] owns the transport link, the message log and the typing
//! set. Transport callbacks and user commands are applied one at a time on
//! whichever task drives the session, so nothing here is locked.
//!
//! # Usage
//!
//! ```rust,ignore
//! let config = SessionConfig::from_env()?;
//! let mut session = ChatSession::new(config, WsConnector)
//!     .with_identity("alice", Some("Hermes".into()))
//!     .with_event_sink(|event| println!("{:?}", event));
//!
//! session.connect();
//! session.send_message("@Athena explain recursion");
//! session.run().await;
//! ```

use std::collections::BTreeSet;
use std::sync::Arc;

use futures_util::StreamExt;
use relaychat_shared::{parse_frame, InboundEvent, OutboundPayload, ResponseRole};

use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::mention::{route, Author};
use crate::stores::{
    ChatMessage, MessageDraft, MessageStore, ReconcileOutcome, Reply, Sender, TypingSet,
};
use crate::ws::{ConnectionEvent, ConnectionState, Connector, TransportEvent, WsConnector, WsLink};

/// Changes pushed to the event sink as they happen.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// The observable connection status changed.
    StatusChanged(ConnectionState),
    MessageAppended(ChatMessage),
    /// A placeholder was completed in place.
    MessageReconciled(ChatMessage),
    TypingChanged { username: String, is_typing: bool },
}

pub type EventSink = Arc<dyn Fn(SessionEvent) + Send + Sync>;

pub struct ChatSession<C: Connector = WsConnector> {
    config: SessionConfig,
    connector: C,
    current_user: Option<String>,
    persona: Option<String>,
    state: ConnectionState,
    link: Option<WsLink>,
    messages: MessageStore,
    typing: TypingSet,
    on_event: Option<EventSink>,
}

impl<C: Connector> ChatSession<C> {
    pub fn new(config: SessionConfig, connector: C) -> Self {
        Self {
            config,
            connector,
            current_user: None,
            persona: None,
            state: ConnectionState::Disconnected,
            link: None,
            messages: MessageStore::new(),
            typing: TypingSet::new(),
            on_event: None,
        }
    }

    pub fn with_identity(mut self, username: impl Into<String>, persona: Option<String>) -> Self {
        self.current_user = Some(username.into()).filter(|u: &String| !u.is_empty());
        self.persona = persona;
        self
    }

    pub fn with_event_sink(mut self, sink: impl Fn(SessionEvent) + Send + Sync + 'static) -> Self {
        self.on_event = Some(Arc::new(sink));
        self
    }

    // --- State read by the presentation layer ---

    pub fn connection_status(&self) -> ConnectionState {
        self.state.observable()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        self.messages.messages()
    }

    pub fn typing_users(&self) -> &BTreeSet<String> {
        self.typing.users()
    }

    pub fn current_user(&self) -> Option<&str> {
        self.current_user.as_deref()
    }

    pub fn persona(&self) -> Option<&str> {
        self.persona.as_deref()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Whether a transport link is held (open, opening, or awaiting close).
    pub fn has_transport(&self) -> bool {
        self.link.is_some()
    }

    // --- Lifecycle ---

    /// Open the relay connection. A no-op while a connection is open or
    /// being opened.
    pub fn connect(&mut self) {
        if self.link.is_some()
            && matches!(
                self.state,
                ConnectionState::Connecting | ConnectionState::Connected
            )
        {
            crate::log_debug!("connect() ignored, already {}", self.state);
            return;
        }

        // A link can outlive an error until its close arrives; replace it.
        self.release_link();
        if self.apply(ConnectionEvent::Connect) {
            crate::log_info!("Connecting to {}", self.config.endpoint);
            self.link = Some(self.connector.open(&self.config.endpoint));
        }
    }

    /// Close the transport and release it. Safe to call repeatedly;
    /// unresolved placeholders stay in the log as they are.
    pub fn dispose(&mut self) {
        let had_link = self.release_link();
        if had_link || self.state != ConnectionState::Disconnected {
            crate::log_info!("Disposing session for {:?}", self.current_user);
            self.apply(ConnectionEvent::Disconnect);
        }
    }

    pub fn disconnect(&mut self) {
        self.dispose();
    }

    /// Switch identity. A different user tears the connection down and, if
    /// the new user is non-empty, connects again so the relay sees a fresh join.
    pub fn set_current_user(&mut self, username: Option<String>) {
        let username = username.filter(|u| !u.is_empty());
        if username == self.current_user {
            return;
        }
        self.dispose();
        self.current_user = username;
        if self.current_user.is_some() {
            self.connect();
        }
    }

    pub fn set_persona(&mut self, persona: Option<String>) {
        self.persona = persona;
    }

    fn release_link(&mut self) -> bool {
        match self.link.take() {
            Some(link) => {
                link.handle.close();
                true
            }
            None => false,
        }
    }

    fn apply(&mut self, event: ConnectionEvent) -> bool {
        match self.state.transition(event) {
            Ok(next) => {
                let before = self.state.observable();
                self.state = next;
                if next.observable() != before {
                    self.emit(SessionEvent::StatusChanged(next.observable()));
                }
                true
            }
            Err(e) => {
                crate::log_warn!("{}", e);
                false
            }
        }
    }

    // --- Transport callbacks ---

    /// Wait for the next transport event and apply it. Returns `false` once
    /// there is no live link left to wait on.
    pub async fn process_next(&mut self) -> bool {
        let Some(link) = self.link.as_mut() else {
            return false;
        };
        let event = link.events.next().await;
        match event {
            Some(event) => {
                self.handle_transport_event(event);
                true
            }
            None => {
                // The transport task went away without reporting close.
                self.link = None;
                if self.state != ConnectionState::Disconnected {
                    self.apply(ConnectionEvent::Closed);
                }
                false
            }
        }
    }

    /// Drive the session until the connection ends.
    pub async fn run(&mut self) {
        while self.process_next().await {}
    }

    pub fn handle_transport_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Opened => {
                if self.apply(ConnectionEvent::Opened) {
                    self.announce_join();
                }
            }
            TransportEvent::Frame(raw) => self.handle_frame(&raw),
            TransportEvent::Errored(reason) => {
                crate::log_warn!("Transport error: {}", reason);
                self.apply(ConnectionEvent::Errored);
            }
            TransportEvent::Closed => {
                self.apply(ConnectionEvent::Closed);
                self.link = None;
            }
        }
    }

    fn announce_join(&mut self) {
        let Some(username) = self.current_user.clone() else {
            return;
        };
        if let Err(e) = self.transmit(&OutboundPayload::join(username)) {
            crate::log_error!("Failed to send join event: {}", e);
        }
    }

    fn handle_frame(&mut self, raw: &str) {
        match parse_frame(raw) {
            InboundEvent::Typing {
                username,
                is_typing,
            } => {
                if self.typing.set_typing(&username, is_typing) {
                    self.emit(SessionEvent::TypingChanged {
                        username,
                        is_typing,
                    });
                }
            }
            InboundEvent::UserJoined { username } => {
                self.append(MessageDraft::system(format!("{} joined", username)));
            }
            InboundEvent::UserLeft { username } => {
                if self.typing.remove(&username) {
                    self.emit(SessionEvent::TypingChanged {
                        username: username.clone(),
                        is_typing: false,
                    });
                }
                self.append(MessageDraft::system(format!("{} left", username)));
            }
            InboundEvent::UserMessage { username, text } => {
                let sender = if self.current_user.as_deref() == Some(username.as_str()) {
                    Sender::Me
                } else {
                    Sender::User
                };
                self.append(MessageDraft::new(sender, text).with_username(username));
            }
            InboundEvent::Response {
                role,
                text,
                target_persona,
            } => {
                let sender = match role {
                    ResponseRole::Ai => Sender::Ai,
                    ResponseRole::Server => Sender::Server,
                };
                self.reconcile(Reply {
                    sender,
                    text,
                    target_persona,
                });
            }
            InboundEvent::Unstructured { text } => {
                crate::log_debug!("Unstructured frame treated as server text");
                self.reconcile(Reply {
                    sender: Sender::Server,
                    text,
                    target_persona: None,
                });
            }
            InboundEvent::Ignored { kind, reason } => {
                crate::log_warn!("Ignoring {} frame: {}", kind, reason);
            }
        }
    }

    fn append(&mut self, draft: MessageDraft) {
        let message = self.messages.append(draft).clone();
        self.emit(SessionEvent::MessageAppended(message));
    }

    fn reconcile(&mut self, reply: Reply) {
        let outcome = self.messages.reconcile(reply);
        let Some(message) = self.messages.get(outcome.id()).cloned() else {
            return;
        };
        match outcome {
            ReconcileOutcome::Completed(_) => self.emit(SessionEvent::MessageReconciled(message)),
            ReconcileOutcome::Appended(_) => self.emit(SessionEvent::MessageAppended(message)),
        }
    }

    // --- Commands ---

    /// Route, echo and (when applicable) transmit one line of user input.
    ///
    /// Echoes are appended before transmission is attempted. If the
    /// transport is not open the payload is dropped with a warning and any
    /// placeholder stays loading.
    pub fn send_message(&mut self, text: &str) {
        let author = Author {
            username: self.current_user.as_deref().unwrap_or_default(),
            persona: self.persona.as_deref(),
        };
        let Some(routed) = route(text, author, self.config.untargeted) else {
            return;
        };

        for draft in routed.echoes {
            self.append(draft);
        }

        if let Some(payload) = routed.payload {
            if let Err(e) = self.transmit(&payload) {
                crate::log_warn!("Dropped {} message: {}", payload.kind(), e);
            }
        }
    }

    /// Best-effort typing notification. Skipped while not connected.
    pub fn send_typing_indicator(&mut self, is_typing: bool) {
        if !self.state.is_connected() {
            return;
        }
        let Some(username) = self.current_user.clone() else {
            return;
        };
        if let Err(e) = self.transmit(&OutboundPayload::typing(username, is_typing)) {
            crate::log_error!("Failed to send typing indicator: {}", e);
        }
    }

    fn transmit(&self, payload: &OutboundPayload) -> Result<(), SessionError> {
        if !self.state.is_connected() {
            return Err(SessionError::NotConnected(self.state.observable()));
        }
        let link = self.link.as_ref().ok_or(SessionError::ChannelClosed)?;
        link.handle.send(payload)
    }

    fn emit(&self, event: SessionEvent) {
        if let Some(sink) = &self.on_event {
            sink(event);
        }
    }
}

impl<C: Connector> Drop for ChatSession<C> {
    fn drop(&mut self) {
        self.release_link();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UntargetedMode;
    use crate::ws::{WsCommand, WsHandle};
    use futures_channel::mpsc::{unbounded, UnboundedReceiver, UnboundedSender};
    use serde_json::{json, Value};
    use std::sync::Mutex;

    struct OpenedLink {
        commands: UnboundedReceiver<WsCommand>,
        events: UnboundedSender<TransportEvent>,
    }

    /// Stands in for the network and records every link it hands out.
    #[derive(Clone, Default)]
    struct RecordingConnector {
        opened: Arc<Mutex<Vec<OpenedLink>>>,
    }

    impl RecordingConnector {
        fn open_count(&self) -> usize {
            self.opened.lock().unwrap().len()
        }

        /// Drain everything written to the most recent link.
        fn drain_last(&self) -> Vec<WsCommand> {
            let mut opened = self.opened.lock().unwrap();
            let link = opened.last_mut().expect("no link opened");
            let mut out = Vec::new();
            while let Ok(Some(command)) = link.commands.try_next() {
                out.push(command);
            }
            out
        }

        fn sent_json(&self) -> Vec<Value> {
            self.drain_last()
                .into_iter()
                .filter_map(|c| match c {
                    WsCommand::Text(json) => Some(serde_json::from_str(&json).unwrap()),
                    WsCommand::Close => None,
                })
                .collect()
        }
    }

    impl Connector for RecordingConnector {
        fn open(&self, endpoint: &str) -> WsLink {
            let (command_tx, command_rx) = unbounded();
            let (event_tx, event_rx) = unbounded();
            self.opened.lock().unwrap().push(OpenedLink {
                commands: command_rx,
                events: event_tx,
            });
            WsLink::new(WsHandle::new(command_tx, endpoint), event_rx)
        }
    }

    fn session(connector: &RecordingConnector) -> ChatSession<RecordingConnector> {
        let config = SessionConfig::new("ws://relay.test/ws").unwrap();
        ChatSession::new(config, connector.clone()).with_identity("alice", Some("Hermes".into()))
    }

    fn connected(connector: &RecordingConnector) -> ChatSession<RecordingConnector> {
        let mut s = session(connector);
        s.connect();
        s.handle_transport_event(TransportEvent::Opened);
        s
    }

    fn frame(s: &mut ChatSession<RecordingConnector>, raw: &str) {
        s.handle_transport_event(TransportEvent::Frame(raw.to_string()));
    }

    #[test]
    fn open_announces_join() {
        let connector = RecordingConnector::default();
        let mut s = session(&connector);

        s.connect();
        assert_eq!(s.connection_status(), ConnectionState::Disconnected);
        s.handle_transport_event(TransportEvent::Opened);
        assert_eq!(s.connection_status(), ConnectionState::Connected);

        assert_eq!(
            connector.sent_json(),
            vec![json!({"type": "join", "username": "alice"})]
        );
    }

    #[test]
    fn open_without_user_sends_nothing() {
        let connector = RecordingConnector::default();
        let config = SessionConfig::new("ws://relay.test/ws").unwrap();
        let mut s = ChatSession::new(config, connector.clone());
        s.connect();
        s.handle_transport_event(TransportEvent::Opened);
        assert!(connector.sent_json().is_empty());
    }

    #[test]
    fn connect_is_idempotent() {
        let connector = RecordingConnector::default();
        let mut s = session(&connector);
        s.connect();
        s.connect();
        s.handle_transport_event(TransportEvent::Opened);
        s.connect();
        assert_eq!(connector.open_count(), 1);
    }

    #[test]
    fn error_and_close_transitions() {
        let connector = RecordingConnector::default();
        let mut s = connected(&connector);

        s.handle_transport_event(TransportEvent::Errored("reset".into()));
        assert_eq!(s.connection_status(), ConnectionState::Error);
        s.handle_transport_event(TransportEvent::Closed);
        assert_eq!(s.connection_status(), ConnectionState::Disconnected);

        // No automatic reconnect; an explicit connect opens a new link.
        assert_eq!(connector.open_count(), 1);
        s.connect();
        assert_eq!(connector.open_count(), 2);
    }

    #[test]
    fn connect_after_error_replaces_link() {
        let connector = RecordingConnector::default();
        let mut s = connected(&connector);
        s.handle_transport_event(TransportEvent::Errored("boom".into()));
        s.connect();
        assert_eq!(connector.open_count(), 2);
        assert_eq!(s.connection_status(), ConnectionState::Disconnected);
    }

    #[test]
    fn targeted_send_echoes_and_transmits() {
        let connector = RecordingConnector::default();
        let mut s = connected(&connector);
        connector.drain_last();

        s.send_message("@Athena explain recursion");

        let messages = s.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].sender, Sender::Me);
        assert_eq!(messages[0].text, "explain recursion");
        assert_eq!(messages[0].target_persona.as_deref(), Some("Athena"));
        assert!(messages[1].loading);

        assert_eq!(
            connector.sent_json(),
            vec![json!({
                "text": "explain recursion",
                "username": "alice",
                "persona": "Hermes",
                "targetPersona": "Athena"
            })]
        );

        frame(&mut s, "Recursion is a function calling itself.");
        let messages = s.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].text, "Recursion is a function calling itself.");
        assert!(!messages[1].loading);
        assert_eq!(messages[1].id, 2);
    }

    #[test]
    fn targeted_send_while_closed_leaves_placeholder() {
        let connector = RecordingConnector::default();
        let mut s = session(&connector);

        s.send_message("@Bob");

        assert_eq!(s.messages().len(), 2);
        assert_eq!(s.messages()[0].text, "(calling Bob)");
        assert!(s.messages()[1].loading);
        assert_eq!(connector.open_count(), 0);
    }

    #[test]
    fn untargeted_modes() {
        let connector = RecordingConnector::default();
        let mut s = connected(&connector);
        connector.drain_last();
        s.send_message("hello room");
        assert_eq!(
            connector.sent_json(),
            vec![json!({"text": "hello room", "username": "alice", "persona": "Hermes", "store": true})]
        );
        assert_eq!(s.messages().len(), 1);
        assert!(!s.messages()[0].loading);

        let connector = RecordingConnector::default();
        let config = SessionConfig::new("ws://relay.test/ws")
            .unwrap()
            .with_untargeted(UntargetedMode::LocalOnly);
        let mut s = ChatSession::new(config, connector.clone()).with_identity("alice", None);
        s.connect();
        s.handle_transport_event(TransportEvent::Opened);
        connector.drain_last();
        s.send_message("just for me");
        assert!(connector.sent_json().is_empty());
        assert_eq!(s.messages()[0].text, "just for me");
    }

    #[test]
    fn typing_presence() {
        let connector = RecordingConnector::default();
        let mut s = connected(&connector);

        frame(&mut s, r#"{"type":"typing","username":"Bob","isTyping":true}"#);
        frame(&mut s, r#"{"type":"typing","username":"Carol","isTyping":true}"#);
        assert!(s.typing_users().contains("Bob"));

        frame(&mut s, r#"{"type":"typing","username":"Bob","isTyping":false}"#);
        assert!(!s.typing_users().contains("Bob"));

        frame(&mut s, r#"{"type":"typing","username":"Bob","isTyping":true}"#);
        frame(&mut s, r#"{"type":"user.left","username":"Bob"}"#);
        assert!(!s.typing_users().contains("Bob"));
        assert!(s.typing_users().contains("Carol"));

        assert_eq!(s.messages().len(), 1);
        assert_eq!(s.messages()[0].text, "Bob left");
        assert_eq!(s.messages()[0].sender, Sender::System);
    }

    #[test]
    fn anonymous_typing_frames_leave_the_log_alone() {
        let connector = RecordingConnector::default();
        let mut s = connected(&connector);
        s.send_message("@Athena explain recursion");
        assert_eq!(s.messages().len(), 2);

        frame(&mut s, r#"{"type":"typing","isTyping":false}"#);
        frame(&mut s, r#"{"type":"typing","username":"","isTyping":true}"#);
        frame(&mut s, r#"{"type":"user.joined"}"#);

        let messages = s.messages();
        assert_eq!(messages.len(), 2);
        assert!(messages[1].loading);
        assert_eq!(messages[1].text, "");
        assert!(s.typing_users().is_empty());

        frame(&mut s, r#"{"type":"ai","text":"A function calling itself."}"#);
        assert_eq!(s.messages().len(), 2);
        assert!(!s.messages()[1].loading);
    }

    #[test]
    fn join_notice_leaves_typing_alone() {
        let connector = RecordingConnector::default();
        let mut s = connected(&connector);
        frame(&mut s, r#"{"type":"typing","username":"Bob","isTyping":true}"#);

        frame(&mut s, r#"{"type":"user.joined","username":"Carol"}"#);

        assert_eq!(s.messages().len(), 1);
        assert_eq!(s.messages()[0].sender, Sender::System);
        assert_eq!(s.messages()[0].text, "Carol joined");
        assert_eq!(
            s.typing_users().iter().cloned().collect::<Vec<_>>(),
            vec!["Bob".to_string()]
        );
    }

    #[test]
    fn relayed_messages_do_not_consume_placeholders() {
        let connector = RecordingConnector::default();
        let mut s = connected(&connector);
        s.send_message("@Athena hi");

        frame(&mut s, r#"{"type":"message","username":"Bob","text":"yo"}"#);
        frame(&mut s, r#"{"type":"user.message","username":"alice","text":"echo"}"#);

        let messages = s.messages();
        assert_eq!(messages.len(), 4);
        assert!(messages[1].loading);
        assert_eq!(messages[2].sender, Sender::User);
        assert_eq!(messages[2].username.as_deref(), Some("Bob"));
        assert_eq!(messages[3].sender, Sender::Me);
    }

    #[test]
    fn malformed_frame_is_appended_verbatim() {
        let connector = RecordingConnector::default();
        let mut s = connected(&connector);
        frame(&mut s, "not-json-at-all");

        assert_eq!(s.messages().len(), 1);
        assert_eq!(s.messages()[0].sender, Sender::Server);
        assert_eq!(s.messages()[0].text, "not-json-at-all");
    }

    #[test]
    fn ai_reply_reconciles_newest_placeholder_only() {
        let connector = RecordingConnector::default();
        let mut s = connected(&connector);
        s.send_message("@Athena first");
        s.send_message("@Hermes second");

        frame(&mut s, r#"{"type":"ai","text":"second answer","persona":"Hermes"}"#);

        let messages = s.messages();
        assert!(messages[1].loading);
        assert_eq!(messages[3].text, "second answer");
        assert!(!messages[3].loading);
        assert_eq!(messages[3].target_persona.as_deref(), Some("Hermes"));
    }

    #[test]
    fn typing_indicator_only_when_open() {
        let connector = RecordingConnector::default();
        let mut s = session(&connector);
        s.send_typing_indicator(true);
        assert_eq!(connector.open_count(), 0);

        s.connect();
        s.send_typing_indicator(true);
        assert!(connector.sent_json().is_empty());

        s.handle_transport_event(TransportEvent::Opened);
        connector.drain_last();
        s.send_typing_indicator(true);
        assert_eq!(
            connector.sent_json(),
            vec![json!({"type": "typing", "username": "alice", "isTyping": true})]
        );
    }

    #[test]
    fn dispose_is_idempotent_and_keeps_placeholders() {
        let connector = RecordingConnector::default();
        let mut s = connected(&connector);
        s.send_message("@Athena pending");
        connector.drain_last();

        s.dispose();
        assert_eq!(connector.drain_last(), vec![WsCommand::Close]);
        assert_eq!(s.connection_status(), ConnectionState::Disconnected);
        let snapshot = s.messages().to_vec();
        assert!(snapshot[1].loading);

        s.dispose();
        assert!(connector.drain_last().is_empty());
        assert_eq!(s.messages(), snapshot.as_slice());
    }

    #[test]
    fn changing_user_reconnects_and_rejoins() {
        let connector = RecordingConnector::default();
        let mut s = connected(&connector);

        s.set_current_user(Some("alice".into()));
        assert_eq!(connector.open_count(), 1);

        s.set_current_user(Some("bob".into()));
        assert_eq!(connector.open_count(), 2);
        s.handle_transport_event(TransportEvent::Opened);
        assert_eq!(
            connector.sent_json(),
            vec![json!({"type": "join", "username": "bob"})]
        );

        s.set_current_user(None);
        assert_eq!(connector.open_count(), 2);
        assert_eq!(s.connection_status(), ConnectionState::Disconnected);
    }

    #[test]
    fn invalid_transport_events_are_ignored() {
        let connector = RecordingConnector::default();
        let mut s = session(&connector);
        s.handle_transport_event(TransportEvent::Opened);
        assert_eq!(s.connection_status(), ConnectionState::Disconnected);
        s.handle_transport_event(TransportEvent::Closed);
        assert_eq!(s.connection_status(), ConnectionState::Disconnected);
    }

    #[test]
    fn event_sink_sees_changes_in_order() {
        let connector = RecordingConnector::default();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let mut s = session(&connector).with_event_sink(move |e| sink.lock().unwrap().push(e));

        s.connect();
        s.handle_transport_event(TransportEvent::Opened);
        s.send_message("@Athena q");
        frame(&mut s, "a");
        frame(&mut s, r#"{"type":"typing","username":"Bob","isTyping":true}"#);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 5);
        assert_eq!(seen[0], SessionEvent::StatusChanged(ConnectionState::Connected));
        assert!(matches!(&seen[1], SessionEvent::MessageAppended(m) if m.sender == Sender::Me));
        assert!(matches!(&seen[2], SessionEvent::MessageAppended(m) if m.loading));
        assert!(matches!(&seen[3], SessionEvent::MessageReconciled(m) if m.text == "a"));
        assert_eq!(
            seen[4],
            SessionEvent::TypingChanged {
                username: "Bob".into(),
                is_typing: true
            }
        );
    }

    #[tokio::test]
    async fn process_next_applies_queued_events() {
        let connector = RecordingConnector::default();
        let mut s = session(&connector);
        s.connect();
        {
            let opened = connector.opened.lock().unwrap();
            let events = &opened[0].events;
            events.unbounded_send(TransportEvent::Opened).unwrap();
            events
                .unbounded_send(TransportEvent::Frame("hello".into()))
                .unwrap();
            events.unbounded_send(TransportEvent::Closed).unwrap();
        }

        s.run().await;

        assert_eq!(s.connection_status(), ConnectionState::Disconnected);
        assert_eq!(s.messages().len(), 1);
        assert_eq!(s.messages()[0].text, "hello");
        assert!(!s.process_next().await);
    }
}
