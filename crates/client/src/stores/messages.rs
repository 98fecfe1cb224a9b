//! Ordered message log for one chat session.
//!
//! Entries are append-only. The one exception is reconciliation: a reply
//! from the relay overwrites the newest loading placeholder in place, so the
//! answer stays directly under the question that caused it.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Who a message is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Sender {
    /// The local author.
    Me,
    /// Another human in the room.
    User,
    Server,
    Ai,
    System,
}

/// A message as stored in the log.
///
/// `id`, `sender` and `username` never change after creation; only
/// reconciliation rewrites `text`, `loading` and `target_persona`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: u64,
    pub sender: Sender,
    pub text: String,
    pub username: Option<String>,
    pub target_persona: Option<String>,
    pub loading: bool,
    pub created_at: DateTime<Utc>,
}

/// Fields supplied when appending; the store assigns `id` and `created_at`.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageDraft {
    pub sender: Sender,
    pub text: String,
    pub username: Option<String>,
    pub target_persona: Option<String>,
    pub loading: bool,
}

impl MessageDraft {
    pub fn new(sender: Sender, text: impl Into<String>) -> Self {
        Self {
            sender,
            text: text.into(),
            username: None,
            target_persona: None,
            loading: false,
        }
    }

    /// The optimistic echo of something the local user typed.
    pub fn me(text: impl Into<String>, username: Option<String>) -> Self {
        Self {
            username,
            ..Self::new(Sender::Me, text)
        }
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::new(Sender::System, text)
    }

    /// An empty server entry waiting for exactly one reply.
    pub fn placeholder() -> Self {
        Self {
            loading: true,
            ..Self::new(Sender::Server, String::new())
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn with_target(mut self, target_persona: Option<String>) -> Self {
        self.target_persona = target_persona;
        self
    }
}

/// A relay answer to be matched against the newest placeholder.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    /// Attribution used only when no placeholder is pending.
    pub sender: Sender,
    pub text: String,
    pub target_persona: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// A placeholder was completed in place.
    Completed(u64),
    /// Nothing was pending; the reply was appended.
    Appended(u64),
}

impl ReconcileOutcome {
    pub fn id(self) -> u64 {
        match self {
            ReconcileOutcome::Completed(id) | ReconcileOutcome::Appended(id) => id,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MessageStore {
    messages: Vec<ChatMessage>,
    next_id: u64,
}

impl Default for MessageStore {
    fn default() -> Self {
        Self {
            messages: Vec::new(),
            next_id: 1,
        }
    }
}

impl MessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn get(&self, id: u64) -> Option<&ChatMessage> {
        self.messages.iter().find(|m| m.id == id)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Number of placeholders still waiting for a reply.
    pub fn pending(&self) -> usize {
        self.messages.iter().filter(|m| m.loading).count()
    }

    /// Add a message at the end of the log and return it.
    pub fn append(&mut self, draft: MessageDraft) -> &ChatMessage {
        let id = self.next_id;
        self.next_id += 1;
        self.messages.push(ChatMessage {
            id,
            sender: draft.sender,
            text: draft.text,
            username: draft.username,
            target_persona: draft.target_persona,
            loading: draft.loading,
            created_at: Utc::now(),
        });
        &self.messages[self.messages.len() - 1]
    }

    /// Complete the most recent loading placeholder with `reply`, or append
    /// the reply when none is pending.
    ///
    /// Only the newest placeholder is ever considered. Older ones stay
    /// loading until later replies work back to them.
    pub fn reconcile(&mut self, reply: Reply) -> ReconcileOutcome {
        if let Some(pending) = self.messages.iter_mut().rev().find(|m| m.loading) {
            pending.text = reply.text;
            pending.loading = false;
            if reply.target_persona.is_some() {
                pending.target_persona = reply.target_persona;
            }
            return ReconcileOutcome::Completed(pending.id);
        }

        let draft = MessageDraft::new(reply.sender, reply.text).with_target(reply.target_persona);
        ReconcileOutcome::Appended(self.append(draft).id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply(text: &str) -> Reply {
        Reply {
            sender: Sender::Server,
            text: text.into(),
            target_persona: None,
        }
    }

    #[test]
    fn ids_increase_and_are_never_reused() {
        let mut store = MessageStore::new();
        let mut seen = Vec::new();
        seen.push(store.append(MessageDraft::me("a", None)).id);
        seen.push(store.append(MessageDraft::placeholder()).id);
        seen.push(store.reconcile(reply("answer")).id());
        seen.push(store.reconcile(reply("unsolicited")).id());
        seen.push(store.append(MessageDraft::system("Carol joined")).id);

        assert_eq!(seen, vec![1, 2, 2, 3, 4]);
        let ids: Vec<u64> = store.messages().iter().map(|m| m.id).collect();
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }

    #[derive(Debug, Clone, Copy)]
    enum Step {
        Append,
        Placeholder,
        Reconcile,
    }

    const STEPS: [Step; 3] = [Step::Append, Step::Placeholder, Step::Reconcile];

    #[test]
    fn ids_stay_ordered_across_every_interleaving() {
        for len in 0..=6u32 {
            for mut code in 0..3usize.pow(len) {
                let mut steps = Vec::new();
                for _ in 0..len {
                    steps.push(STEPS[code % 3]);
                    code /= 3;
                }

                let mut store = MessageStore::new();
                let mut highest = 0;
                for step in &steps {
                    let pending_before: Vec<u64> = store
                        .messages()
                        .iter()
                        .filter(|m| m.loading)
                        .map(|m| m.id)
                        .collect();
                    match step {
                        Step::Append => {
                            let id = store.append(MessageDraft::me("hi", None)).id;
                            assert!(id > highest, "{:?}: reused id {}", steps, id);
                            highest = id;
                        }
                        Step::Placeholder => {
                            let id = store.append(MessageDraft::placeholder()).id;
                            assert!(id > highest, "{:?}: reused id {}", steps, id);
                            highest = id;
                        }
                        Step::Reconcile => match store.reconcile(reply("answer")) {
                            ReconcileOutcome::Completed(id) => {
                                assert_eq!(pending_before.last(), Some(&id), "{:?}", steps);
                            }
                            ReconcileOutcome::Appended(id) => {
                                assert!(pending_before.is_empty(), "{:?}", steps);
                                assert!(id > highest, "{:?}: reused id {}", steps, id);
                                highest = id;
                            }
                        },
                    }
                }

                let ids: Vec<u64> = store.messages().iter().map(|m| m.id).collect();
                let expected: Vec<u64> = (1..=highest).collect();
                assert_eq!(ids, expected, "{:?}", steps);
            }
        }
    }

    #[test]
    fn reconcile_completes_placeholder_in_place() {
        let mut store = MessageStore::new();
        store.append(MessageDraft::me("question", Some("alice".into())));
        let placeholder = store.append(MessageDraft::placeholder()).id;

        let outcome = store.reconcile(Reply {
            sender: Sender::Ai,
            text: "answer".into(),
            target_persona: Some("Athena".into()),
        });

        assert_eq!(outcome, ReconcileOutcome::Completed(placeholder));
        assert_eq!(store.len(), 2);
        let done = store.get(placeholder).unwrap();
        assert_eq!(done.text, "answer");
        assert!(!done.loading);
        assert_eq!(done.sender, Sender::Server);
        assert_eq!(done.target_persona.as_deref(), Some("Athena"));
    }

    #[test]
    fn reconcile_appends_when_nothing_pending() {
        let mut store = MessageStore::new();
        store.append(MessageDraft::me("hi", None));

        let outcome = store.reconcile(Reply {
            sender: Sender::Ai,
            text: "hello".into(),
            target_persona: None,
        });

        assert_eq!(outcome, ReconcileOutcome::Appended(2));
        let last = store.messages().last().unwrap();
        assert_eq!(last.sender, Sender::Ai);
        assert_eq!(last.text, "hello");
        assert!(!last.loading);
    }

    #[test]
    fn only_newest_placeholder_is_reconciled() {
        let mut store = MessageStore::new();
        let first = store.append(MessageDraft::placeholder()).id;
        let second = store.append(MessageDraft::placeholder()).id;

        assert_eq!(
            store.reconcile(reply("for second")),
            ReconcileOutcome::Completed(second)
        );
        assert!(store.get(first).unwrap().loading);
        assert_eq!(store.pending(), 1);

        assert_eq!(
            store.reconcile(reply("for first")),
            ReconcileOutcome::Completed(first)
        );
        assert_eq!(store.get(first).unwrap().text, "for first");
        assert_eq!(store.pending(), 0);
    }

    #[test]
    fn reconcile_keeps_existing_target_when_reply_has_none() {
        let mut store = MessageStore::new();
        let id = store
            .append(MessageDraft::placeholder().with_target(Some("Bob".into())))
            .id;
        store.reconcile(reply("ok"));
        assert_eq!(store.get(id).unwrap().target_persona.as_deref(), Some("Bob"));
    }
}
