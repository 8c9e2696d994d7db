//! Wire types for the backend endpoints

use serde::{Deserialize, Serialize};

/// Readiness snapshot returned by `GET /models/status`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ModelStatus {
    pub sentence_model_loaded: bool,
    pub chat_model_loaded: bool,
    pub chat_pipeline_loaded: bool,
}

impl ModelStatus {
    /// Fully loaded as far as the UI is concerned.
    ///
    /// `chat_model_loaded` is deliberately not part of the predicate.
    pub fn is_ready(&self) -> bool {
        self.sentence_model_loaded && self.chat_pipeline_loaded
    }
}

/// Normalized reply to a chat turn
#[derive(Debug, Clone, PartialEq)]
pub struct ChatReply {
    pub response_text: String,
    pub stock_code: Option<String>,
    /// Always finite and non-negative when present
    pub notional_amount: Option<f64>,
    pub query_date: Option<String>,
}

impl ChatReply {
    #[allow(dead_code)] // Used by tests and mocks
    pub fn text(response_text: impl Into<String>) -> Self {
        Self {
            response_text: response_text.into(),
            stock_code: None,
            notional_amount: None,
            query_date: None,
        }
    }

    #[allow(dead_code)] // Builder used by tests and mocks
    pub fn with_stock(mut self, stock_code: impl Into<String>, notional_amount: f64) -> Self {
        self.stock_code = Some(stock_code.into());
        self.notional_amount = Some(notional_amount);
        self
    }
}

/// Body of `POST /chat`
#[derive(Debug, Serialize)]
pub(crate) struct ChatRequestBody<'a> {
    pub message: &'a str,
}

/// Raw body of a `POST /chat` response
#[derive(Debug, Deserialize)]
pub(crate) struct ChatResponseBody {
    pub response: String,
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(default)]
    pub stock_code: Option<String>,
    #[serde(default)]
    pub notional_amount: Option<f64>,
    #[serde(default)]
    pub query_date: Option<String>,
}

fn default_success() -> bool {
    true
}

impl ChatResponseBody {
    pub fn into_reply(self) -> ChatReply {
        if !self.success {
            tracing::debug!("Backend flagged reply as unsuccessful");
        }

        let notional_amount = match self.notional_amount {
            Some(amount) if amount.is_finite() && amount >= 0.0 => Some(amount),
            Some(amount) => {
                tracing::warn!(amount, "Discarding invalid notional amount");
                None
            }
            None => None,
        };

        ChatReply {
            response_text: self.response,
            stock_code: self.stock_code.filter(|code| !code.trim().is_empty()),
            notional_amount,
            query_date: self.query_date,
        }
    }
}
