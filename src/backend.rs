//! Remote client for the stock-support backend
//!
//! Two request types only: a model status probe and a chat turn. No retries,
//! no caching. Every transport failure comes back as a [`ConnectivityError`].

mod error;
mod http;
mod types;

pub use error::{ConnectivityError, ConnectivityErrorKind};
pub use http::HttpBackend;
pub use types::{ChatReply, ModelStatus};

use async_trait::async_trait;
use std::sync::Arc;

/// Common interface for talking to the backend
#[async_trait]
pub trait BackendClient: Send + Sync {
    /// `GET /models/status`
    async fn probe_status(&self) -> Result<ModelStatus, ConnectivityError>;

    /// `POST /chat` with a single user message
    async fn send_chat_turn(&self, text: &str) -> Result<ChatReply, ConnectivityError>;

    /// Base URL the client talks to, used in user-facing failure notices
    fn base_url(&self) -> &str;
}

#[async_trait]
impl<T: BackendClient + ?Sized> BackendClient for Arc<T> {
    async fn probe_status(&self) -> Result<ModelStatus, ConnectivityError> {
        (**self).probe_status().await
    }

    async fn send_chat_turn(&self, text: &str) -> Result<ChatReply, ConnectivityError> {
        (**self).send_chat_turn(text).await
    }

    fn base_url(&self) -> &str {
        (**self).base_url()
    }
}

/// Logging wrapper for backend clients
pub struct LoggingBackend<B> {
    inner: B,
}

impl<B: BackendClient> LoggingBackend<B> {
    pub fn new(inner: B) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<B: BackendClient> BackendClient for LoggingBackend<B> {
    async fn probe_status(&self) -> Result<ModelStatus, ConnectivityError> {
        let start = std::time::Instant::now();
        let result = self.inner.probe_status().await;
        let duration = start.elapsed();

        match &result {
            Ok(status) => {
                tracing::debug!(
                    duration_ms = %duration.as_millis(),
                    sentence_model_loaded = status.sentence_model_loaded,
                    chat_model_loaded = status.chat_model_loaded,
                    chat_pipeline_loaded = status.chat_pipeline_loaded,
                    "Status probe completed"
                );
            }
            Err(e) => {
                tracing::warn!(
                    duration_ms = %duration.as_millis(),
                    kind = ?e.kind,
                    error = %e.message,
                    "Status probe failed"
                );
            }
        }

        result
    }

    async fn send_chat_turn(&self, text: &str) -> Result<ChatReply, ConnectivityError> {
        let start = std::time::Instant::now();
        let result = self.inner.send_chat_turn(text).await;
        let duration = start.elapsed();

        match &result {
            Ok(reply) => {
                tracing::info!(
                    duration_ms = %duration.as_millis(),
                    input_chars = text.chars().count(),
                    stock_code = reply.stock_code.as_deref().unwrap_or("-"),
                    has_notional = reply.notional_amount.is_some(),
                    "Chat turn completed"
                );
            }
            Err(e) => {
                tracing::error!(
                    duration_ms = %duration.as_millis(),
                    kind = ?e.kind,
                    error = %e.message,
                    "Chat turn failed"
                );
            }
        }

        result
    }

    fn base_url(&self) -> &str {
        self.inner.base_url()
    }
}
