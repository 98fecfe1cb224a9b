//! Typing presence for the room.
//!
//! Membership only. An entry leaves the set on an explicit "stopped typing"
//! event or when its user leaves; there is no expiry, so a peer that drops
//! without either event stays listed until the session is rebuilt.

use std::collections::BTreeSet;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypingSet {
    users: BTreeSet<String>,
}

impl TypingSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a typing update. Returns `true` if membership changed.
    pub fn set_typing(&mut self, username: &str, is_typing: bool) -> bool {
        if is_typing {
            self.users.insert(username.to_string())
        } else {
            self.users.remove(username)
        }
    }

    /// Forget a user that left the room. Returns `true` if they were typing.
    pub fn remove(&mut self, username: &str) -> bool {
        self.users.remove(username)
    }

    pub fn contains(&self, username: &str) -> bool {
        self.users.contains(username)
    }

    pub fn users(&self) -> &BTreeSet<String> {
        &self.users
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}
