//! Property-based tests for transaction bookkeeping
//!
//! These verify that the pending view stays exactly the pending subset
//! of the full list across arbitrary operation sequences, and that the
//! persisted snapshot never exceeds its cap.

use super::state::{ChainSnapshot, TransactionUpdate, TxStatus};
use super::store::{ChainStore, CHAIN_STORAGE_KEY, MAX_PERSISTED_TRANSACTIONS};
use crate::persist::{MemoryStorage, StateStorage};
use crate::testing::{test_transaction, MockWalletProvider};
use proptest::prelude::*;
use std::sync::Arc;

#[derive(Debug, Clone)]
enum TxOp {
    Add { hash: u8, status: TxStatus },
    Update { hash: u8, status: TxStatus },
    Clear,
}

fn arb_status() -> impl Strategy<Value = TxStatus> {
    prop_oneof![
        Just(TxStatus::Pending),
        Just(TxStatus::Confirmed),
        Just(TxStatus::Failed),
        Just(TxStatus::Cancelled),
    ]
}

fn arb_op() -> impl Strategy<Value = TxOp> {
    prop_oneof![
        3 => (0u8..12, arb_status()).prop_map(|(hash, status)| TxOp::Add { hash, status }),
        3 => (0u8..12, arb_status()).prop_map(|(hash, status)| TxOp::Update { hash, status }),
        1 => Just(TxOp::Clear),
    ]
}

proptest! {
    #[test]
    fn pending_view_always_matches_filtered_source(ops in proptest::collection::vec(arb_op(), 0..40)) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async move {
            let storage = Arc::new(MemoryStorage::new());
            let store = ChainStore::new(MockWalletProvider::new(), Arc::clone(&storage));

            for op in ops {
                match op {
                    TxOp::Add { hash, status } => {
                        store
                            .add_transaction(test_transaction(&format!("0x{hash}"), status))
                            .await;
                    }
                    TxOp::Update { hash, status } => {
                        store
                            .update_transaction(
                                &format!("0x{hash}"),
                                TransactionUpdate {
                                    status: Some(status),
                                    block_number: None,
                                },
                            )
                            .await;
                    }
                    TxOp::Clear => store.clear_transactions().await,
                }

                let state = store.state();
                let expected: Vec<_> = state
                    .transactions
                    .iter()
                    .filter(|tx| tx.status == TxStatus::Pending)
                    .cloned()
                    .collect();
                prop_assert_eq!(&state.pending_transactions, &expected);
            }

            if let Some(value) = storage.load(CHAIN_STORAGE_KEY).await.unwrap() {
                let snapshot: ChainSnapshot = serde_json::from_value(value).unwrap();
                prop_assert!(snapshot.transactions.len() <= MAX_PERSISTED_TRANSACTIONS);
            }
            Ok(())
        })?;
    }
}
