//! Incremental parser for the chat event stream
//!
//! The endpoint emits newline-delimited lines; only `data:`-prefixed
//! lines carry payload, and `data: [DONE]` ends the stream. Payloads
//! are JSON chunks with incremental content or an error field; any
//! other payload is taken as raw text so newer chunk shapes degrade to
//! plain output instead of failing the stream.

use serde::Deserialize;

const DATA_PREFIX: &str = "data:";
const DONE_SENTINEL: &str = "[DONE]";

/// One parsed item from the stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamItem {
    /// Incremental assistant content
    Content(String),
    /// The stream reported a server-side failure
    Error(String),
    /// Normal end of stream
    Done,
}

#[derive(Deserialize)]
struct StreamChunk {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Buffers bytes across reads and yields items per complete line.
///
/// Raw bytes are buffered so a multi-byte character split across two
/// reads decodes correctly once its line completes.
#[derive(Debug, Default)]
pub struct EventStreamParser {
    buffer: Vec<u8>,
}

impl EventStreamParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk of bytes; returns the items completed by it.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<StreamItem> {
        self.buffer.extend_from_slice(bytes);
        let mut items = Vec::new();
        while let Some(newline) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=newline).collect();
            let line = String::from_utf8_lossy(&line);
            if let Some(item) = parse_line(line.trim_end_matches(['\r', '\n'])) {
                items.push(item);
            }
        }
        items
    }

    /// Flush a trailing unterminated line at end of stream.
    pub fn finish(&mut self) -> Option<StreamItem> {
        let line = std::mem::take(&mut self.buffer);
        let line = String::from_utf8_lossy(&line);
        parse_line(line.trim_end_matches('\r'))
    }
}

fn parse_line(line: &str) -> Option<StreamItem> {
    let payload = line.strip_prefix(DATA_PREFIX)?;
    let payload = payload.strip_prefix(' ').unwrap_or(payload);
    if payload.is_empty() {
        return None;
    }
    if payload == DONE_SENTINEL {
        return Some(StreamItem::Done);
    }
    match serde_json::from_str::<StreamChunk>(payload) {
        Ok(chunk) => {
            if let Some(error) = chunk.error {
                Some(StreamItem::Error(error))
            } else {
                chunk
                    .content
                    .filter(|content| !content.is_empty())
                    .map(StreamItem::Content)
            }
        }
        // Unknown payload shapes degrade to raw text.
        Err(_) => Some(StreamItem::Content(payload.to_string())),
    }
}
