//! Append-only transcript, the single source of truth for the dialogue.

use std::collections::HashSet;

use crate::{ChatError, Message};

/// Ordered log of exchanged messages. Insertion order is display order;
/// messages are never mutated after append, corrections arrive as new
/// messages.
#[derive(Debug, Default)]
pub struct MessageStore {
    messages: Vec<Message>,
    ids: HashSet<String>,
}

impl MessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message. An id collision means the id generator broke its
    /// uniqueness guarantee; that is a defect, not a user error, and it is
    /// propagated rather than swallowed.
    pub fn append(&mut self, message: Message) -> Result<(), ChatError> {
        if !self.ids.insert(message.id.clone()) {
            return Err(ChatError::DuplicateId(message.id));
        }
        self.messages.push(message);
        Ok(())
    }

    /// The transcript in insertion order.
    pub fn all(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Empty the log. Used on identity reset.
    pub fn clear(&mut self) {
        self.messages.clear();
        self.ids.clear();
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
