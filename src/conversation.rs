//! Conversation store
//!
//! Append-only transcript for a single session. Only the session runtime
//! mutates it.

mod message;

pub use message::{Message, MessageId, Origin};

use std::sync::Arc;

/// Ordered transcript plus the id allocator for new entries
#[derive(Debug, Default)]
pub struct ConversationStore {
    messages: Vec<Message>,
    next_id: u64,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve the next message id
    pub fn next_id(&mut self) -> MessageId {
        self.next_id += 1;
        MessageId(self.next_id)
    }

    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// All messages in insertion order
    pub fn all(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    #[allow(dead_code)] // State query utility
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Cheap shared copy for publishing to observers
    pub fn snapshot(&self) -> Arc<[Message]> {
        Arc::from(self.all())
    }
}
