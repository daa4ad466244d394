//! Wallet state types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Wallet connection lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WalletStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Error,
}

/// A chain the UI knows how to display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainInfo {
    pub id: u64,
    pub name: String,
}

impl ChainInfo {
    /// Display metadata for the chains the platform supports.
    pub fn known(id: u64) -> Option<ChainInfo> {
        let name = match id {
            1 => "Ethereum",
            137 => "Polygon",
            8453 => "Base",
            42161 => "Arbitrum One",
            11_155_111 => "Sepolia",
            _ => return None,
        };
        Some(ChainInfo {
            id,
            name: name.to_string(),
        })
    }
}

/// On-chain transaction status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxStatus {
    Pending,
    Confirmed,
    Failed,
    Cancelled,
}

impl TxStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, TxStatus::Pending)
    }
}

/// A submitted transaction tracked by the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub hash: String,
    pub from: String,
    pub to: String,
    /// Smallest-unit value. Wei-scale numbers overflow JSON numbers, so
    /// they ride the wire as decimal strings.
    #[serde(with = "u128_string")]
    pub value: u128,
    pub chain_id: u64,
    pub status: TxStatus,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
}

/// Partial update applied to a transaction by hash; `None` leaves a
/// field alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransactionUpdate {
    pub status: Option<TxStatus>,
    pub block_number: Option<u64>,
}

/// Observable wallet state.
///
/// The connection fields (`address`, `chain_id`, `balance`, ENS) are
/// only populated while `status == Connected`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WalletState {
    pub status: WalletStatus,
    pub address: Option<String>,
    pub chain_id: Option<u64>,
    /// Smallest-unit balance.
    pub balance: Option<u128>,
    pub ens_name: Option<String>,
    pub ens_avatar: Option<String>,
    pub current_chain: Option<ChainInfo>,
    pub is_chain_switching: bool,
    pub error: Option<String>,
    pub transactions: Vec<Transaction>,
    pub pending_transactions: Vec<Transaction>,
}

impl WalletState {
    /// Reset the connection tuple, leaving transaction history alone.
    pub(crate) fn reset_connection(&mut self) {
        self.status = WalletStatus::Disconnected;
        self.address = None;
        self.chain_id = None;
        self.balance = None;
        self.ens_name = None;
        self.ens_avatar = None;
        self.current_chain = None;
        self.is_chain_switching = false;
        self.error = None;
    }
}

/// Subset of wallet state that survives a reload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainSnapshot {
    pub transactions: Vec<Transaction>,
}

mod u128_string {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &u128, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u128, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
