//! Wallet provider seam

use crate::error::StoreError;
use async_trait::async_trait;
use std::sync::Arc;

/// Connection tuple returned by a successful connector handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletConnection {
    pub address: String,
    pub chain_id: u64,
    /// Smallest-unit balance.
    pub balance: u128,
}

/// Reverse-resolved ENS identity.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EnsProfile {
    pub name: Option<String>,
    pub avatar: Option<String>,
}

/// External signing/account agent (browser extension, WalletConnect).
///
/// Provider-pushed account/chain change events are not part of this
/// seam; the stores only react to their own calls.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    async fn connect(&self, connector_id: &str) -> Result<WalletConnection, StoreError>;

    async fn disconnect(&self);

    async fn switch_chain(&self, chain_id: u64) -> Result<(), StoreError>;

    /// Reverse ENS lookup; providers without a resolver return `None`.
    async fn resolve_ens(&self, _address: &str) -> Option<EnsProfile> {
        None
    }
}

#[async_trait]
impl<T: WalletProvider + ?Sized> WalletProvider for Arc<T> {
    async fn connect(&self, connector_id: &str) -> Result<WalletConnection, StoreError> {
        (**self).connect(connector_id).await
    }

    async fn disconnect(&self) {
        (**self).disconnect().await;
    }

    async fn switch_chain(&self, chain_id: u64) -> Result<(), StoreError> {
        (**self).switch_chain(chain_id).await
    }

    async fn resolve_ens(&self, address: &str) -> Option<EnsProfile> {
        (**self).resolve_ens(address).await
    }
}
