//! Scripted mock collaborators for store tests

use crate::chain::{EnsProfile, Transaction, TxStatus, WalletConnection, WalletProvider};
use crate::chat::{ByteStream, ChatRequest, ChatTransport};
use crate::error::StoreError;
use crate::persist::{StateStorage, StorageError, StorageResult};
use crate::session::{SessionApi, User};
use async_trait::async_trait;
use chrono::Utc;
use futures::StreamExt;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

/// Storage whose every operation fails; stores must shrug it off.
pub struct FailingStorage;

#[async_trait]
impl StateStorage for FailingStorage {
    async fn load(&self, _key: &str) -> StorageResult<Option<Value>> {
        Err(StorageError::Backend("disk unavailable".to_string()))
    }

    async fn save(&self, _key: &str, _value: &Value) -> StorageResult<()> {
        Err(StorageError::Backend("disk unavailable".to_string()))
    }

    async fn remove(&self, _key: &str) -> StorageResult<()> {
        Err(StorageError::Backend("disk unavailable".to_string()))
    }
}

pub fn test_user(username: &str) -> User {
    let now = Utc::now();
    User {
        id: format!("user-{username}"),
        email: format!("{username}@example.com"),
        username: username.to_string(),
        wallet_address: None,
        avatar: None,
        created_at: now,
        updated_at: now,
        preferences: Default::default(),
    }
}

pub fn test_transaction(hash: &str, status: TxStatus) -> Transaction {
    Transaction {
        hash: hash.to_string(),
        from: "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266".to_string(),
        to: "0x70997970c51812dc3a010c7d01b50e0d17dc79c8".to_string(),
        value: 1_000_000_000_000_000,
        chain_id: 1,
        status,
        timestamp: Utc::now(),
        block_number: None,
    }
}

// ============================================================================
// Mock Session API
// ============================================================================

/// Session API that returns queued results.
pub struct MockSessionApi {
    responses: Mutex<VecDeque<Result<User, StoreError>>>,
    sessions: Mutex<VecDeque<Result<Option<User>, StoreError>>>,
    delay: Option<Duration>,
    calls: Mutex<Vec<String>>,
}

impl MockSessionApi {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            sessions: Mutex::new(VecDeque::new()),
            delay: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Delay every call; lets tests overlap in-flight requests.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn queue_user(&self, user: User) {
        self.responses.lock().unwrap().push_back(Ok(user));
    }

    pub fn queue_error(&self, error: StoreError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    pub fn queue_session(&self, result: Result<Option<User>, StoreError>) {
        self.sessions.lock().unwrap().push_back(result);
    }

    pub fn recorded_calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn pop_response(&self) -> Result<User, StoreError> {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(StoreError::network("No mock response queued")))
    }
}

impl Default for MockSessionApi {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionApi for MockSessionApi {
    async fn login(&self, _email: &str, _password: &str) -> Result<User, StoreError> {
        self.calls.lock().unwrap().push("login".to_string());
        self.pause().await;
        self.pop_response()
    }

    async fn signup(
        &self,
        _email: &str,
        _password: &str,
        _username: &str,
    ) -> Result<User, StoreError> {
        self.calls.lock().unwrap().push("signup".to_string());
        self.pause().await;
        self.pop_response()
    }

    async fn current_session(&self) -> Result<Option<User>, StoreError> {
        self.calls.lock().unwrap().push("session".to_string());
        self.pause().await;
        self.sessions
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(None))
    }

    async fn logout(&self) -> Result<(), StoreError> {
        self.calls.lock().unwrap().push("logout".to_string());
        Ok(())
    }
}

// ============================================================================
// Mock Wallet Provider
// ============================================================================

/// Wallet provider with queued outcomes.
pub struct MockWalletProvider {
    connects: Mutex<VecDeque<Result<WalletConnection, StoreError>>>,
    switches: Mutex<VecDeque<Result<(), StoreError>>>,
    ens: Mutex<Option<EnsProfile>>,
    calls: Mutex<Vec<String>>,
}

impl MockWalletProvider {
    pub fn new() -> Self {
        Self {
            connects: Mutex::new(VecDeque::new()),
            switches: Mutex::new(VecDeque::new()),
            ens: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn queue_connect(&self, result: Result<WalletConnection, StoreError>) {
        self.connects.lock().unwrap().push_back(result);
    }

    pub fn queue_switch(&self, result: Result<(), StoreError>) {
        self.switches.lock().unwrap().push_back(result);
    }

    pub fn set_ens(&self, profile: EnsProfile) {
        *self.ens.lock().unwrap() = Some(profile);
    }

    pub fn recorded_calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl Default for MockWalletProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WalletProvider for MockWalletProvider {
    async fn connect(&self, connector_id: &str) -> Result<WalletConnection, StoreError> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("connect:{connector_id}"));
        self.connects
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(StoreError::provider("No mock connection queued")))
    }

    async fn disconnect(&self) {
        self.calls.lock().unwrap().push("disconnect".to_string());
    }

    async fn switch_chain(&self, chain_id: u64) -> Result<(), StoreError> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("switch:{chain_id}"));
        self.switches.lock().unwrap().pop_front().unwrap_or(Ok(()))
    }

    async fn resolve_ens(&self, _address: &str) -> Option<EnsProfile> {
        self.calls.lock().unwrap().push("resolve_ens".to_string());
        self.ens.lock().unwrap().clone()
    }
}

// ============================================================================
// Scripted Chat Transport
// ============================================================================

/// One scripted response stream.
pub struct ScriptedStream {
    frames: Vec<Vec<u8>>,
    frame_delay: Duration,
    hang_at_end: bool,
}

impl ScriptedStream {
    /// Frames of newline-terminated lines, one frame per line.
    pub fn from_lines(lines: &[&str]) -> Self {
        Self {
            frames: lines.iter().map(|l| format!("{l}\n").into_bytes()).collect(),
            frame_delay: Duration::ZERO,
            hang_at_end: false,
        }
    }

    /// Like `from_lines`, but the stream never ends on its own; the
    /// reader only gets out through cancellation.
    pub fn hanging(lines: &[&str]) -> Self {
        Self {
            hang_at_end: true,
            ..Self::from_lines(lines)
        }
    }

    /// Sleep before yielding each frame.
    pub fn with_frame_delay(mut self, delay: Duration) -> Self {
        self.frame_delay = delay;
        self
    }
}

/// Chat transport yielding scripted byte streams.
pub struct ScriptedChatTransport {
    scripts: Mutex<VecDeque<Result<ScriptedStream, StoreError>>>,
    /// Signalled when a stream is opened (a permit is stored, so a
    /// waiter registered later still sees it).
    pub stream_opened: Arc<Notify>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedChatTransport {
    pub fn new() -> Self {
        Self {
            scripts: Mutex::new(VecDeque::new()),
            stream_opened: Arc::new(Notify::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn queue(&self, script: ScriptedStream) {
        self.scripts.lock().unwrap().push_back(Ok(script));
    }

    pub fn queue_error(&self, error: StoreError) {
        self.scripts.lock().unwrap().push_back(Err(error));
    }

    pub fn recorded_requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Default for ScriptedChatTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatTransport for ScriptedChatTransport {
    async fn stream_chat(&self, request: &ChatRequest) -> Result<ByteStream, StoreError> {
        self.requests.lock().unwrap().push(request.clone());
        let script = self
            .scripts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(StoreError::network("No scripted stream queued")))?;
        self.stream_opened.notify_one();

        let delay = script.frame_delay;
        let frames = futures::stream::iter(script.frames).then(move |frame| async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            Ok::<_, StoreError>(frame)
        });
        if script.hang_at_end {
            Ok(frames
                .chain(futures::stream::pending::<Result<Vec<u8>, StoreError>>())
                .boxed())
        } else {
            Ok(frames.boxed())
        }
    }
}
