//! Wallet connection and transaction bookkeeping
//!
//! The connection lifecycle is a small state machine
//! (`disconnected -> connecting -> connected`, with `error` reachable
//! from `connecting`); connection fields are only ever committed as one
//! transition. The transaction log is uncapped in memory; the persisted
//! view keeps the most recent entries and the pending view is always
//! derived from the full list.

mod provider;
mod state;
mod store;

#[cfg(test)]
mod proptests;

pub use provider::{EnsProfile, WalletConnection, WalletProvider};
pub use state::{
    ChainInfo, ChainSnapshot, Transaction, TransactionUpdate, TxStatus, WalletState, WalletStatus,
};
pub use store::{ChainStore, CHAIN_STORAGE_KEY, MAX_PERSISTED_TRANSACTIONS};
