//! Swap history and status tracking.
//!
//! Correlates the settlement layer's observed-transaction log into
//! logical swap records. The tracker holds no state of its own: every
//! query is a fresh snapshot of the log, and the status of a record is
//! derived entirely from what the venue reports right now.

use crate::source::{NodeSource, ObservedStatus, ObservedTx};
use crosspool_domain::quote::{SwapHistory, SwapRecord, SwapStatus};
use crosspool_domain::{Chain, QueryError};
use std::sync::Arc;
use tracing::debug;

pub struct SwapTracker {
    source: Arc<dyn NodeSource>,
}

impl SwapTracker {
    pub fn new(source: Arc<dyn NodeSource>) -> Self {
        Self { source }
    }

    /// All swaps initiated from the given addresses, newest first.
    pub async fn get_swap_history(
        &self,
        chain_addresses: &[(Chain, String)],
    ) -> Result<SwapHistory, QueryError> {
        let mut swaps = Vec::new();
        for (chain, address) in chain_addresses {
            let observed = self.source.get_observed_txs(*chain, address).await?;
            debug!(%chain, address, count = observed.len(), "observed txs fetched");
            swaps.extend(
                observed
                    .into_iter()
                    .filter(ObservedTx::is_swap)
                    .map(|tx| classify(&tx)),
            );
        }
        swaps.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(SwapHistory {
            count: swaps.len(),
            swaps,
        })
    }

    /// Status of a single swap by its inbound hash, or `None` when the
    /// settlement layer has not observed the hash at all.
    pub async fn check_tx_status(&self, hash: &str) -> Result<Option<SwapRecord>, QueryError> {
        Ok(self.source.get_tx(hash).await?.map(|tx| classify(&tx)))
    }
}

/// Maps one observed inbound onto the swap state machine:
/// refund or rejection is terminal `Failed`, a recorded outbound leg is
/// terminal `Success`, anything else is still `Pending`.
fn classify(tx: &ObservedTx) -> SwapRecord {
    let (status, outbound) = match (tx.status, &tx.out_tx) {
        (ObservedStatus::Refunded, _) => (SwapStatus::Failed, None),
        (ObservedStatus::Done, Some(out)) => (SwapStatus::Success, Some(out.clone())),
        _ => (SwapStatus::Pending, None),
    };
    SwapRecord {
        protocol: String::new(),
        status,
        date: tx.date,
        inbound: tx.tx.clone(),
        outbound,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{
        DepositRecord, InboundAddress, LastBlock, NetworkValues, SaverRecord,
    };
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use crosspool_domain::quote::TxRef;
    use crosspool_domain::{Asset, BaseAmount, CryptoAmount, PoolData};

    struct LogSource {
        txs: Vec<ObservedTx>,
    }

    #[async_trait]
    impl NodeSource for LogSource {
        async fn get_pool(&self, asset: &Asset) -> Result<PoolData, QueryError> {
            Err(QueryError::UnsupportedAsset(asset.to_string()))
        }
        async fn get_pools(&self) -> Result<Vec<PoolData>, QueryError> {
            Ok(vec![])
        }
        async fn get_deposit_record(
            &self,
            _asset: &Asset,
            _address: &str,
        ) -> Result<Option<DepositRecord>, QueryError> {
            Ok(None)
        }
        async fn get_saver_record(
            &self,
            _asset: &Asset,
            _address: &str,
        ) -> Result<Option<SaverRecord>, QueryError> {
            Ok(None)
        }
        async fn get_observed_txs(
            &self,
            chain: Chain,
            address: &str,
        ) -> Result<Vec<ObservedTx>, QueryError> {
            Ok(self
                .txs
                .iter()
                .filter(|tx| tx.chain == chain && tx.tx.address == address)
                .cloned()
                .collect())
        }
        async fn get_tx(&self, hash: &str) -> Result<Option<ObservedTx>, QueryError> {
            Ok(self.txs.iter().find(|tx| tx.tx.hash == hash).cloned())
        }
        async fn get_last_blocks(&self) -> Result<Vec<LastBlock>, QueryError> {
            Ok(vec![])
        }
        async fn get_inbound_addresses(&self) -> Result<Vec<InboundAddress>, QueryError> {
            Ok(vec![])
        }
        async fn get_network_values(&self) -> Result<NetworkValues, QueryError> {
            Ok(NetworkValues {
                full_protection_blocks: 1_440_000,
                native_tx_fee: BaseAmount::native(2_000_000u64),
            })
        }
    }

    fn observed(
        hash: &str,
        status: ObservedStatus,
        out: Option<&str>,
        day: u32,
    ) -> ObservedTx {
        ObservedTx {
            tx: TxRef {
                hash: hash.to_string(),
                address: "bc1qsender".to_string(),
                amount: CryptoAmount::new(BaseAmount::native(100_000_000u64), Asset::btc()),
            },
            chain: Chain::Btc,
            memo: "=:ETH.ETH:0xdest".to_string(),
            status,
            date: Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap(),
            out_tx: out.map(|hash| TxRef {
                hash: hash.to_string(),
                address: "0xvault".to_string(),
                amount: CryptoAmount::new(BaseAmount::native(1_770_607_901u64), Asset::eth()),
            }),
        }
    }

    #[tokio::test]
    async fn inbound_without_outbound_is_pending() {
        let tracker = SwapTracker::new(Arc::new(LogSource {
            txs: vec![observed("IN1", ObservedStatus::Observed, None, 1)],
        }));
        let record = tracker.check_tx_status("IN1").await.unwrap().unwrap();
        assert_eq!(record.status, SwapStatus::Pending);
        assert!(record.outbound.is_none());
    }

    #[tokio::test]
    async fn matched_outbound_is_success() {
        let tracker = SwapTracker::new(Arc::new(LogSource {
            txs: vec![observed("IN1", ObservedStatus::Done, Some("OUT1"), 1)],
        }));
        let record = tracker.check_tx_status("IN1").await.unwrap().unwrap();
        assert_eq!(record.status, SwapStatus::Success);
        assert_eq!(record.outbound.unwrap().hash, "OUT1");
    }

    #[tokio::test]
    async fn refunded_inbound_is_failed_without_outbound() {
        let tracker = SwapTracker::new(Arc::new(LogSource {
            txs: vec![observed("IN1", ObservedStatus::Refunded, Some("REFUND1"), 1)],
        }));
        let record = tracker.check_tx_status("IN1").await.unwrap().unwrap();
        assert_eq!(record.status, SwapStatus::Failed);
        // The refund leg is not a swap outbound.
        assert!(record.outbound.is_none());
    }

    #[tokio::test]
    async fn history_filters_non_swaps_and_sorts_newest_first() {
        let mut add_tx = observed("ADD1", ObservedStatus::Done, None, 2);
        add_tx.memo = "+:BTC.BTC".to_string();
        let tracker = SwapTracker::new(Arc::new(LogSource {
            txs: vec![
                observed("IN1", ObservedStatus::Done, Some("OUT1"), 1),
                add_tx,
                observed("IN2", ObservedStatus::Observed, None, 3),
            ],
        }));

        let history = tracker
            .get_swap_history(&[(Chain::Btc, "bc1qsender".to_string())])
            .await
            .unwrap();
        assert_eq!(history.count, 2);
        assert_eq!(history.swaps[0].inbound.hash, "IN2");
        assert_eq!(history.swaps[1].inbound.hash, "IN1");
    }

    #[tokio::test]
    async fn unknown_hash_reports_nothing() {
        let tracker = SwapTracker::new(Arc::new(LogSource { txs: vec![] }));
        assert!(tracker.check_tx_status("MISSING").await.unwrap().is_none());
    }
}
