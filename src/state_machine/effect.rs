//! Effects produced by state transitions

use crate::backend::ChatReply;
use crate::conversation::MessageId;

/// Effects to be executed after state transition
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Append the user's message, text exactly as typed
    AppendUserMessage { id: MessageId, text: String },

    /// Append the assistant's reply
    AppendAssistantMessage { reply: ChatReply },

    /// Append a locally synthesized assistant notice
    AppendNotice { text: String },

    /// Send a chat turn (spawns as background task)
    SendChatTurn { text: String },

    /// Run a status probe (spawns as background task)
    Probe,

    /// Publish a fresh snapshot to observers
    Publish,
}

impl Effect {
    pub fn append_user(id: MessageId, text: impl Into<String>) -> Self {
        Effect::AppendUserMessage {
            id,
            text: text.into(),
        }
    }

    pub fn send_chat(text: impl Into<String>) -> Self {
        Effect::SendChatTurn { text: text.into() }
    }
}
