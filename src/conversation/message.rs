//! Transcript entries

use crate::backend::ChatReply;
use chrono::{DateTime, Utc};
use std::fmt;

/// Session-local message identifier
///
/// Allocated from a counter, so two messages created within the same clock
/// tick still get distinct, ordered ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MessageId(pub u64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "msg-{}", self.0)
    }
}

/// Who produced a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    User,
    Assistant,
}

/// One transcript entry. Immutable once created.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub id: MessageId,
    pub text: String,
    pub origin: Origin,
    pub created_at: DateTime<Utc>,
    /// Assistant only
    pub stock_code: Option<String>,
    /// Assistant only, non-negative
    pub notional_amount: Option<f64>,
    /// Assistant only, trading date the backend resolved
    pub query_date: Option<String>,
}

impl Message {
    /// A user message. `text` is kept exactly as typed.
    pub fn user(id: MessageId, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
            origin: Origin::User,
            created_at: Utc::now(),
            stock_code: None,
            notional_amount: None,
            query_date: None,
        }
    }

    /// An assistant message built from a backend reply
    pub fn assistant(id: MessageId, reply: ChatReply) -> Self {
        Self {
            id,
            text: reply.response_text,
            origin: Origin::Assistant,
            created_at: Utc::now(),
            stock_code: reply.stock_code,
            notional_amount: reply.notional_amount,
            query_date: reply.query_date,
        }
    }

    /// A locally synthesized assistant notice with no backend origin
    pub fn notice(id: MessageId, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
            origin: Origin::Assistant,
            created_at: Utc::now(),
            stock_code: None,
            notional_amount: None,
            query_date: None,
        }
    }

    pub fn is_user(&self) -> bool {
        self.origin == Origin::User
    }
}
