//! Persisted client state
//!
//! Each store persists an explicit allow-list snapshot as one JSON
//! document under a fixed key; the full in-memory shape never hits
//! storage. Adapters are injected so tests and ephemeral sessions can
//! run against memory.

mod memory;
mod sqlite;

pub use memory::MemoryStorage;
pub use sqlite::SqliteStorage;

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Storage backend error: {0}")]
    Backend(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Key/value storage for persisted store snapshots.
#[async_trait]
pub trait StateStorage: Send + Sync {
    async fn load(&self, key: &str) -> StorageResult<Option<Value>>;
    async fn save(&self, key: &str, value: &Value) -> StorageResult<()>;
    async fn remove(&self, key: &str) -> StorageResult<()>;
}

#[async_trait]
impl<T: StateStorage + ?Sized> StateStorage for Arc<T> {
    async fn load(&self, key: &str) -> StorageResult<Option<Value>> {
        (**self).load(key).await
    }

    async fn save(&self, key: &str, value: &Value) -> StorageResult<()> {
        (**self).save(key, value).await
    }

    async fn remove(&self, key: &str) -> StorageResult<()> {
        (**self).remove(key).await
    }
}
