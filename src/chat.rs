//! Streaming AI conversation
//!
//! An ordered message log plus one in-flight partial response. At most
//! one stream is live at a time; a new send cancels the previous one
//! before it starts.

mod conversation;
mod state;
mod stream;
mod transport;

#[cfg(test)]
mod proptests;

pub use conversation::{ChatOptions, StreamingConversation};
pub use state::{ChatMessage, ConversationState, Role};
pub use stream::{EventStreamParser, StreamItem};
pub use transport::{ByteStream, ChatRequest, ChatTransport, HttpChatClient, WireMessage};
