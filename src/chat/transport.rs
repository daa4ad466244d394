//! Chat streaming transport

use crate::chat::state::{ChatMessage, Role};
use crate::error::StoreError;
use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use reqwest::Client;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// Byte stream of the chat response body.
pub type ByteStream = BoxStream<'static, Result<Vec<u8>, StoreError>>;

/// Message as sent on the wire.
#[derive(Debug, Clone, Serialize)]
pub struct WireMessage {
    pub role: Role,
    pub content: String,
}

impl From<&ChatMessage> for WireMessage {
    fn from(msg: &ChatMessage) -> Self {
        Self {
            role: msg.role,
            content: msg.content.clone(),
        }
    }
}

/// Request body for the streaming chat endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub messages: Vec<WireMessage>,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub stream: bool,
}

/// Opens the response byte stream; the caller drives and cancels it.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn stream_chat(&self, request: &ChatRequest) -> Result<ByteStream, StoreError>;
}

#[async_trait]
impl<T: ChatTransport + ?Sized> ChatTransport for Arc<T> {
    async fn stream_chat(&self, request: &ChatRequest) -> Result<ByteStream, StoreError> {
        (**self).stream_chat(request).await
    }
}

/// Streaming chat client over HTTP.
pub struct HttpChatClient {
    client: Client,
    base_url: String,
}

impl HttpChatClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        // No whole-request deadline: the body is an open-ended stream
        // and is cancelled through the conversation's token instead.
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");
        let base_url = base_url.into();
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl ChatTransport for HttpChatClient {
    async fn stream_chat(&self, request: &ChatRequest) -> Result<ByteStream, StoreError> {
        let response = self
            .client
            .post(format!("{}/ai/chat", self.base_url))
            .json(request)
            .send()
            .await
            .map_err(StoreError::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::from_status(status, &body));
        }

        Ok(response
            .bytes_stream()
            .map(|chunk| {
                chunk
                    .map(|bytes| bytes.to_vec())
                    .map_err(StoreError::from_transport)
            })
            .boxed())
    }
}
