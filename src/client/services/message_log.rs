use std::collections::HashSet;

use crate::common::models::ChatMessage;

/// Ordered, deduplicated sequence of the active group's messages.
///
/// History replaces the sequence wholesale; live arrivals merge by server
/// id, so a message reaching us both from history and as a live echo shows
/// up once. Servers deliver in creation order, but display order is
/// enforced here rather than trusted from the network: the sequence is
/// kept sorted by (createdAt, id) after every mutation.
#[derive(Debug, Default)]
pub struct MessageLog {
    entries: Vec<ChatMessage>,
    seen: HashSet<i64>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole sequence with freshly loaded history.
    pub fn replace(&mut self, messages: Vec<ChatMessage>) {
        self.entries.clear();
        self.seen.clear();
        for message in messages {
            if self.seen.insert(message.id) {
                self.entries.push(message);
            }
        }
        self.entries.sort_by_key(|m| m.sort_key());
    }

    /// Merge one live arrival. Returns false when the id is already
    /// present and the message was ignored.
    pub fn insert(&mut self, message: ChatMessage) -> bool {
        if !self.seen.insert(message.id) {
            return false;
        }
        self.entries.push(message);
        self.entries.sort_by_key(|m| m.sort_key());
        true
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.seen.clear();
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.entries
    }

    pub fn snapshot(&self) -> Vec<ChatMessage> {
        self.entries.clone()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
