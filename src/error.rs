//! Store error types

use thiserror::Error;

/// Store error with classification
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct StoreError {
    pub kind: ErrorKind,
    pub message: String,
}

impl StoreError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Auth, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Network, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, message)
    }

    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Cancelled, message)
    }

    pub fn provider(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Provider, message)
    }

    pub fn server(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Server, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unknown, message)
    }

    /// Cancellation is benign and never surfaced as a user-facing error.
    pub fn is_cancelled(&self) -> bool {
        self.kind == ErrorKind::Cancelled
    }

    /// Classify a transport-level failure.
    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::timeout(format!("Request timed out: {err}"))
        } else if err.is_connect() {
            Self::network(format!("Connection failed: {err}"))
        } else {
            Self::network(format!("Request failed: {err}"))
        }
    }

    /// Classify a non-success HTTP status, extracting the body message.
    pub(crate) fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let message = extract_message(body).unwrap_or_else(|| format!("HTTP {status}"));
        match status.as_u16() {
            401 | 403 => Self::auth(message),
            409 => Self::conflict(message),
            400 | 422 => Self::validation(message),
            500..=599 => Self::server(message),
            _ => Self::unknown(message),
        }
    }
}

/// Pull a human-readable message out of an error body.
/// Accepts `{"message": ...}` and `{"error": {"message": ...}}`.
fn extract_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    if let Some(message) = value.get("message").and_then(|v| v.as_str()) {
        return Some(message.to_string());
    }
    value
        .get("error")?
        .get("message")?
        .as_str()
        .map(str::to_string)
}

/// Error classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed input caught before any network call
    Validation,
    /// Invalid credentials or expired session (401/403)
    Auth,
    /// Duplicate resource (409)
    Conflict,
    /// Transport failure
    Network,
    /// Deadline exceeded
    Timeout,
    /// Explicit or superseding cancellation
    Cancelled,
    /// Wallet provider rejected the operation
    Provider,
    /// Backend failure (5xx)
    Server,
    /// Unknown error
    Unknown,
}
