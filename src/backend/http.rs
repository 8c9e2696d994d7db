//! HTTP implementation of the backend client

use super::types::{ChatRequestBody, ChatResponseBody};
use super::{BackendClient, ChatReply, ConnectivityError, ModelStatus};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;

/// reqwest-backed client, one instance per session
pub struct HttpBackend {
    client: Client,
    base_url: String,
    status_url: String,
    chat_url: String,
}

impl HttpBackend {
    pub fn new(base_url: &str) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        Self {
            client: Client::new(),
            status_url: format!("{base_url}/models/status"),
            chat_url: format!("{base_url}/chat"),
            base_url,
        }
    }

    /// Read the body and decode it, mapping every failure to a connectivity error
    async fn decode<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ConnectivityError> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ConnectivityError::from_transport(&e))?;

        if !status.is_success() {
            return Err(ConnectivityError::status(
                status.as_u16(),
                format!("HTTP {status}: {body}"),
            ));
        }

        serde_json::from_str(&body).map_err(|e| {
            ConnectivityError::decode(format!("Failed to parse response: {e} - body: {body}"))
        })
    }
}

#[async_trait]
impl BackendClient for HttpBackend {
    async fn probe_status(&self) -> Result<ModelStatus, ConnectivityError> {
        let response = self
            .client
            .get(&self.status_url)
            .send()
            .await
            .map_err(|e| ConnectivityError::from_transport(&e))?;

        Self::decode(response).await
    }

    async fn send_chat_turn(&self, text: &str) -> Result<ChatReply, ConnectivityError> {
        let response = self
            .client
            .post(&self.chat_url)
            .json(&ChatRequestBody { message: text })
            .send()
            .await
            .map_err(|e| ConnectivityError::from_transport(&e))?;

        let body: ChatResponseBody = Self::decode(response).await?;
        Ok(body.into_reply())
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }
}
