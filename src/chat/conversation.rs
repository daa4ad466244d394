//! Streaming conversation controller

use crate::chat::state::{ChatMessage, ConversationState, Role};
use crate::chat::stream::{EventStreamParser, StreamItem};
use crate::chat::transport::{ChatRequest, ChatTransport, WireMessage};
use crate::error::StoreError;
use crate::store::{StateCell, Subscription};
use futures::StreamExt;
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// Tunables for the chat endpoint.
#[derive(Debug, Clone)]
pub struct ChatOptions {
    pub model: String,
    pub system_prompt: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for ChatOptions {
    fn default() -> Self {
        Self {
            model: "gpt-4".to_string(),
            system_prompt: Some(
                "You are the RoboVeda assistant. Help users with robotics, \
                 Web3, and platform questions."
                    .to_string(),
            ),
            max_tokens: 1000,
            temperature: 0.7,
        }
    }
}

/// Owns the message log and the single in-flight stream.
pub struct StreamingConversation<T: ChatTransport> {
    transport: T,
    options: ChatOptions,
    cell: StateCell<ConversationState>,
    /// The live turn's token. Replaced (after cancelling the previous
    /// one) on every send, so at most one token is ever live.
    cancel: Mutex<Option<CancellationToken>>,
}

enum Flow {
    Continue,
    Done,
}

impl<T: ChatTransport> StreamingConversation<T> {
    pub fn new(transport: T) -> Self {
        Self::with_options(transport, ChatOptions::default())
    }

    pub fn with_options(transport: T, options: ChatOptions) -> Self {
        Self {
            transport,
            options,
            cell: StateCell::new(ConversationState::default()),
            cancel: Mutex::new(None),
        }
    }

    pub fn state(&self) -> ConversationState {
        self.cell.snapshot()
    }

    pub fn subscribe(
        &self,
        listener: impl Fn(&ConversationState) + Send + Sync + 'static,
    ) -> Subscription<ConversationState> {
        self.cell.subscribe(listener)
    }

    /// Send a user message and stream the assistant's reply.
    ///
    /// A blank message is a no-op. A call while a previous turn is in
    /// flight cancels that turn first; the superseded call settles with
    /// `Ok` and appends nothing. Failures set the conversation's error
    /// field and are also returned.
    pub async fn send_message(&self, content: &str) -> Result<(), StoreError> {
        let content = content.trim();
        if content.is_empty() {
            return Ok(());
        }

        let token = self.replace_token();

        // The user message lands before any network activity starts.
        self.cell.update(|s| {
            s.messages.push(ChatMessage::new(Role::User, content));
            s.current_response.clear();
            s.is_streaming = true;
            s.error = None;
        });

        match self.run_stream(&token).await {
            Ok(full) => {
                if token.is_cancelled() {
                    // Superseded or stopped after the stream finished;
                    // the canceller already settled the state.
                    return Ok(());
                }
                self.cell.update(|s| {
                    s.messages.push(ChatMessage::new(Role::Assistant, full));
                    s.current_response.clear();
                    s.is_streaming = false;
                });
                Ok(())
            }
            Err(err) if err.is_cancelled() => Ok(()),
            Err(err) => {
                if !token.is_cancelled() {
                    self.cell.update(|s| {
                        s.current_response.clear();
                        s.is_streaming = false;
                        s.error = Some(err.message.clone());
                    });
                }
                Err(err)
            }
        }
    }

    /// Cancel the live stream, if any. The cancelled turn appends no
    /// assistant message and its partial output is dropped.
    pub fn stop_streaming(&self) {
        if let Some(token) = self.cancel.lock().unwrap().take() {
            token.cancel();
        }
        self.cell.update(|s| {
            s.current_response.clear();
            s.is_streaming = false;
        });
    }

    /// Clear the log in bulk, cancelling any live stream so a late
    /// completion cannot append to the emptied conversation.
    pub fn clear_messages(&self) {
        if let Some(token) = self.cancel.lock().unwrap().take() {
            token.cancel();
        }
        self.cell.update(|s| {
            s.messages.clear();
            s.current_response.clear();
            s.is_streaming = false;
            s.error = None;
        });
    }

    /// Re-send the most recent user message, discarding everything the
    /// log holds from it onwards. No-op when fewer than two messages
    /// exist or no user message is found.
    pub async fn regenerate_last_response(&self) -> Result<(), StoreError> {
        let content = self.cell.update(|s| {
            if s.messages.len() < 2 {
                return None;
            }
            let index = s.messages.iter().rposition(|m| m.role == Role::User)?;
            let content = s.messages[index].content.clone();
            s.messages.truncate(index);
            Some(content)
        });
        match content {
            Some(content) => self.send_message(&content).await,
            None => Ok(()),
        }
    }

    async fn run_stream(&self, token: &CancellationToken) -> Result<String, StoreError> {
        let request = self.build_request();

        let mut stream = tokio::select! {
            () = token.cancelled() => return Err(StoreError::cancelled("Request cancelled")),
            result = self.transport.stream_chat(&request) => result?,
        };

        let mut parser = EventStreamParser::new();
        let mut accumulated = String::new();
        loop {
            // Dropping the stream on cancellation releases the reader.
            let chunk = tokio::select! {
                () = token.cancelled() => return Err(StoreError::cancelled("Request cancelled")),
                chunk = stream.next() => chunk,
            };
            let Some(chunk) = chunk else { break };
            for item in parser.feed(&chunk?) {
                if let Flow::Done = self.apply_item(token, item, &mut accumulated)? {
                    return Ok(accumulated);
                }
            }
        }
        if let Some(item) = parser.finish() {
            if let Flow::Done = self.apply_item(token, item, &mut accumulated)? {
                return Ok(accumulated);
            }
        }
        // End of stream without a sentinel still completes the turn.
        Ok(accumulated)
    }

    fn apply_item(
        &self,
        token: &CancellationToken,
        item: StreamItem,
        accumulated: &mut String,
    ) -> Result<Flow, StoreError> {
        match item {
            StreamItem::Content(delta) => {
                if token.is_cancelled() {
                    return Err(StoreError::cancelled("Request cancelled"));
                }
                accumulated.push_str(&delta);
                let snapshot = accumulated.clone();
                self.cell.update(|s| {
                    s.current_response = snapshot;
                });
                Ok(Flow::Continue)
            }
            StreamItem::Error(message) => Err(StoreError::server(message)),
            StreamItem::Done => Ok(Flow::Done),
        }
    }

    fn build_request(&self) -> ChatRequest {
        let state = self.cell.snapshot();
        ChatRequest {
            messages: state.messages.iter().map(WireMessage::from).collect(),
            model: self.options.model.clone(),
            system_prompt: self.options.system_prompt.clone(),
            max_tokens: self.options.max_tokens,
            temperature: self.options.temperature,
            stream: true,
        }
    }

    fn replace_token(&self) -> CancellationToken {
        let token = CancellationToken::new();
        let mut guard = self.cancel.lock().unwrap();
        if let Some(previous) = guard.replace(token.clone()) {
            previous.cancel();
        }
        token
    }
}
