//! Chain store controller

use crate::chain::provider::WalletProvider;
use crate::chain::state::{
    ChainInfo, ChainSnapshot, Transaction, TransactionUpdate, TxStatus, WalletState, WalletStatus,
};
use crate::error::StoreError;
use crate::persist::StateStorage;
use crate::store::{StateCell, Subscription};

/// Storage key for the persisted transaction log.
pub const CHAIN_STORAGE_KEY: &str = "chain_store";

/// The persisted log keeps only this many entries; the in-memory list
/// is uncapped.
pub const MAX_PERSISTED_TRANSACTIONS: usize = 50;

/// Owns wallet connectivity and the client-side transaction log.
pub struct ChainStore<W, P>
where
    W: WalletProvider,
    P: StateStorage,
{
    provider: W,
    storage: P,
    cell: StateCell<WalletState>,
}

impl<W, P> ChainStore<W, P>
where
    W: WalletProvider,
    P: StateStorage,
{
    pub fn new(provider: W, storage: P) -> Self {
        Self {
            provider,
            storage,
            cell: StateCell::new(WalletState::default()),
        }
    }

    pub fn state(&self) -> WalletState {
        self.cell.snapshot()
    }

    pub fn subscribe(
        &self,
        listener: impl Fn(&WalletState) + Send + Sync + 'static,
    ) -> Subscription<WalletState> {
        self.cell.subscribe(listener)
    }

    /// Load the persisted transaction log. The pending view is
    /// recomputed from the restored list so it is never stale.
    pub async fn restore(&self) {
        match self.storage.load(CHAIN_STORAGE_KEY).await {
            Ok(Some(value)) => match serde_json::from_value::<ChainSnapshot>(value) {
                Ok(snapshot) => {
                    self.cell.update(|s| {
                        s.transactions = snapshot.transactions;
                        rebuild_pending(s);
                    });
                }
                Err(e) => tracing::warn!(error = %e, "Discarding unreadable transaction log"),
            },
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "Failed to load persisted transactions"),
        }
    }

    /// Run the connector handshake. Only meaningful from `Disconnected`
    /// or `Error`; a no-op while connecting or connected.
    pub async fn connect_wallet(&self, connector_id: &str) -> Result<(), StoreError> {
        let busy = self.cell.update(|s| match s.status {
            WalletStatus::Connecting | WalletStatus::Connected => true,
            WalletStatus::Disconnected | WalletStatus::Error => {
                s.status = WalletStatus::Connecting;
                s.error = None;
                false
            }
        });
        if busy {
            return Ok(());
        }

        tracing::info!(connector = connector_id, "Connecting wallet");
        match self.provider.connect(connector_id).await {
            Ok(connection) => {
                let ens = self
                    .provider
                    .resolve_ens(&connection.address)
                    .await
                    .unwrap_or_default();
                // One commit: subscribers never see a half-populated connection.
                self.cell.update(|s| {
                    s.status = WalletStatus::Connected;
                    s.current_chain = ChainInfo::known(connection.chain_id);
                    s.address = Some(connection.address);
                    s.chain_id = Some(connection.chain_id);
                    s.balance = Some(connection.balance);
                    s.ens_name = ens.name;
                    s.ens_avatar = ens.avatar;
                    s.error = None;
                });
                Ok(())
            }
            Err(err) => {
                tracing::warn!(error = %err, "Wallet connection failed");
                self.cell.update(|s| {
                    s.status = WalletStatus::Error;
                    s.address = None;
                    s.error = Some(err.message.clone());
                });
                Err(err)
            }
        }
    }

    /// Reset to the initial disconnected tuple; idempotent.
    pub async fn disconnect_wallet(&self) {
        self.provider.disconnect().await;
        self.cell.update(WalletState::reset_connection);
    }

    /// Ask the provider to switch chains. On failure the previous chain
    /// remains authoritative; only the switching flag is cleared.
    pub async fn switch_chain(&self, chain_id: u64) -> Result<(), StoreError> {
        let connected = self.cell.update(|s| {
            if s.status == WalletStatus::Connected {
                s.is_chain_switching = true;
                true
            } else {
                false
            }
        });
        if !connected {
            return Err(StoreError::provider("Wallet is not connected"));
        }

        match self.provider.switch_chain(chain_id).await {
            Ok(()) => {
                self.cell.update(|s| {
                    s.chain_id = Some(chain_id);
                    s.current_chain = ChainInfo::known(chain_id);
                    s.is_chain_switching = false;
                });
                Ok(())
            }
            Err(err) => {
                self.cell.update(|s| {
                    s.is_chain_switching = false;
                });
                Err(err)
            }
        }
    }

    /// Prepend a transaction to the log.
    pub async fn add_transaction(&self, tx: Transaction) {
        self.cell.update(|s| {
            s.transactions.insert(0, tx);
            rebuild_pending(s);
        });
        self.persist().await;
    }

    /// Merge fields into the transaction with the given hash; unknown
    /// hashes are ignored.
    pub async fn update_transaction(&self, hash: &str, update: TransactionUpdate) {
        let changed = self.cell.update(|s| {
            let Some(tx) = s.transactions.iter_mut().find(|t| t.hash == hash) else {
                return false;
            };
            if let Some(status) = update.status {
                tx.status = status;
            }
            if let Some(block_number) = update.block_number {
                tx.block_number = Some(block_number);
            }
            rebuild_pending(s);
            true
        });
        if changed {
            self.persist().await;
        }
    }

    pub async fn clear_transactions(&self) {
        self.cell.update(|s| {
            s.transactions.clear();
            s.pending_transactions.clear();
        });
        self.persist().await;
    }

    async fn persist(&self) {
        let snapshot = {
            let state = self.cell.snapshot();
            let mut transactions = state.transactions;
            transactions.truncate(MAX_PERSISTED_TRANSACTIONS);
            ChainSnapshot { transactions }
        };
        match serde_json::to_value(&snapshot) {
            Ok(value) => {
                if let Err(e) = self.storage.save(CHAIN_STORAGE_KEY, &value).await {
                    tracing::warn!(error = %e, "Failed to persist transaction log");
                }
            }
            Err(e) => tracing::warn!(error = %e, "Failed to serialize transaction log"),
        }
    }
}

/// The pending view is derived from the source list after every mutation.
pub(super) fn rebuild_pending(state: &mut WalletState) {
    state.pending_transactions = state
        .transactions
        .iter()
        .filter(|tx| tx.status == TxStatus::Pending)
        .cloned()
        .collect();
}
