//! Events that can occur in a session

use crate::backend::{ChatReply, ConnectivityError, ModelStatus};
use crate::conversation::MessageId;

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    // User events
    UserSubmit {
        text: String,
        /// Id reserved for the user message if the submit is accepted
        message_id: MessageId,
    },
    RetryProbe,

    // Chat events
    ChatReplied {
        reply: ChatReply,
    },
    ChatFailed {
        error: ConnectivityError,
    },

    // Health events
    ProbeStarted,
    ProbeSucceeded {
        status: ModelStatus,
    },
    ProbeFailed {
        error: ConnectivityError,
    },
}

impl Event {
    /// Short name for logging
    pub fn name(&self) -> &'static str {
        match self {
            Event::UserSubmit { .. } => "user_submit",
            Event::RetryProbe => "retry_probe",
            Event::ChatReplied { .. } => "chat_replied",
            Event::ChatFailed { .. } => "chat_failed",
            Event::ProbeStarted => "probe_started",
            Event::ProbeSucceeded { .. } => "probe_succeeded",
            Event::ProbeFailed { .. } => "probe_failed",
        }
    }
}
