//! Venue adapters.
//!
//! Each supported settlement venue is wrapped in a type implementing
//! [`Protocol`], the capability surface the aggregator fans out over.
//! Adapters are thin: they bind a [`QueryEngine`] and [`SwapTracker`] to a
//! venue name, native asset and affiliate configuration, and stamp the venue
//! name onto every quote and record they produce.

mod mayachain;
mod thorchain;

pub use mayachain::MayachainProtocol;
pub use thorchain::ThorchainProtocol;

use async_trait::async_trait;
use crosspool_domain::quote::{SwapHistory, SwapQuote};
use crosspool_domain::{Asset, Chain, CryptoAmount, QueryError};
use crosspool_query::{EstimateSwapParams, QueryEngine, SwapTracker};
use rust_decimal::Decimal;
use tracing::debug;

/// Swap request as the caller states it, venue-agnostic. The source asset
/// rides inside `amount`.
#[derive(Debug, Clone)]
pub struct QuoteSwapParams {
    pub amount: CryptoAmount,
    pub destination_asset: Asset,
    pub destination_address: String,
    /// Maximum tolerated slip as a fraction, e.g. `0.03` for 3%.
    pub slip_limit: Option<Decimal>,
}

/// Per-venue affiliate settings applied to every quote.
#[derive(Debug, Clone, Default)]
pub struct ProtocolConfig {
    pub affiliate_bps: u32,
    pub affiliate_address: Option<String>,
}

/// One swap venue. Implementations must never panic on bad input: parameter
/// and liquidity problems come back as `can_swap = false` quotes, and only
/// transport-level failures surface as `Err`.
#[async_trait]
pub trait Protocol: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether this venue can be a leg for `asset`. `Ok(false)` means the
    /// venue is silently skipped for the pair, not that the quote failed.
    async fn is_asset_supported(&self, asset: &Asset) -> Result<bool, QueryError>;

    async fn estimate_swap(&self, params: &QuoteSwapParams) -> Result<SwapQuote, QueryError>;

    async fn get_swap_history(
        &self,
        chain_addresses: &[(Chain, String)],
    ) -> Result<SwapHistory, QueryError>;
}

/// Shared adapter body. The venue-specific types only pin the name and
/// native asset.
pub(crate) struct VenueAdapter {
    name: &'static str,
    engine: QueryEngine,
    tracker: SwapTracker,
    config: ProtocolConfig,
}

impl VenueAdapter {
    pub(crate) fn new(
        name: &'static str,
        engine: QueryEngine,
        tracker: SwapTracker,
        config: ProtocolConfig,
    ) -> Self {
        Self {
            name,
            engine,
            tracker,
            config,
        }
    }

    pub(crate) async fn is_asset_supported(&self, asset: &Asset) -> Result<bool, QueryError> {
        if asset == self.engine.native_asset() || asset.synth {
            return Ok(true);
        }
        let layer1 = Asset::new(asset.chain, asset.symbol.clone(), false);
        match self.engine.source().get_pool(&layer1).await {
            Ok(pool) => Ok(pool.is_available()),
            Err(QueryError::UnsupportedAsset(_)) => {
                debug!(venue = self.name, %asset, "no pool for asset");
                Ok(false)
            }
            Err(other) => Err(other),
        }
    }

    pub(crate) async fn estimate_swap(
        &self,
        params: &QuoteSwapParams,
    ) -> Result<SwapQuote, QueryError> {
        let engine_params = EstimateSwapParams {
            amount: params.amount.clone(),
            destination_asset: params.destination_asset.clone(),
            destination_address: params.destination_address.clone(),
            slip_limit: params.slip_limit,
            affiliate_bps: self.config.affiliate_bps,
            affiliate_address: self.config.affiliate_address.clone(),
        };
        let mut quote = self.engine.estimate_swap(&engine_params).await?;
        quote.protocol = self.name.to_string();
        Ok(quote)
    }

    pub(crate) async fn get_swap_history(
        &self,
        chain_addresses: &[(Chain, String)],
    ) -> Result<SwapHistory, QueryError> {
        let mut history = self.tracker.get_swap_history(chain_addresses).await?;
        for record in &mut history.swaps {
            record.protocol = self.name.to_string();
        }
        Ok(history)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use crosspool_domain::{BaseAmount, PoolData, PoolStatus};
    use crosspool_query::{
        DepositRecord, InboundAddress, LastBlock, NetworkValues, NodeSource, ObservedTx,
        SaverRecord,
    };
    use primitive_types::U256;
    use std::sync::Arc;

    struct PoolOnlySource {
        pools: Vec<PoolData>,
    }

    #[async_trait]
    impl NodeSource for PoolOnlySource {
        async fn get_pool(&self, asset: &Asset) -> Result<PoolData, QueryError> {
            self.pools
                .iter()
                .find(|pool| pool.asset == *asset)
                .cloned()
                .ok_or_else(|| QueryError::UnsupportedAsset(asset.to_string()))
        }
        async fn get_pools(&self) -> Result<Vec<PoolData>, QueryError> {
            Ok(self.pools.clone())
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
            _chain: Chain,
            _address: &str,
        ) -> Result<Vec<ObservedTx>, QueryError> {
            Ok(vec![])
        }
        async fn get_tx(&self, _hash: &str) -> Result<Option<ObservedTx>, QueryError> {
            Ok(None)
        }
        async fn get_last_blocks(&self) -> Result<Vec<LastBlock>, QueryError> {
            Ok(vec![LastBlock {
                chain: Chain::Btc,
                last_observed_in: 1,
                thorchain: 1,
            }])
        }
        async fn get_inbound_addresses(&self) -> Result<Vec<InboundAddress>, QueryError> {
            Ok(vec![InboundAddress {
                chain: Chain::Btc,
                address: "bc1qvault".to_string(),
                gas_fee: BaseAmount::native(10_000u64),
                outbound_fee: BaseAmount::native(30_000u64),
                halted: false,
            }])
        }
        async fn get_network_values(&self) -> Result<NetworkValues, QueryError> {
            Ok(NetworkValues {
                full_protection_blocks: 1_440_000,
                native_tx_fee: BaseAmount::native(2_000_000u64),
            })
        }
    }

    fn pool(asset: Asset, status: PoolStatus) -> PoolData {
        PoolData {
            asset,
            asset_balance: BaseAmount::native(100_000_000_000u64),
            rune_balance: BaseAmount::native(2_500_000_000_000_000u64),
            lp_units: U256::from(1_000_000u64),
            savers_depth: BaseAmount::native(0u64),
            savers_units: U256::zero(),
            status,
        }
    }

    fn venue(pools: Vec<PoolData>) -> ThorchainProtocol {
        ThorchainProtocol::new(
            Arc::new(PoolOnlySource { pools }),
            ProtocolConfig::default(),
        )
    }

    #[tokio::test]
    async fn native_and_synth_assets_are_always_supported() {
        let venue = venue(vec![]);
        assert!(venue.is_asset_supported(&Asset::rune()).await.unwrap());
        let synth = Asset::new(Chain::Btc, "BTC", true);
        assert!(venue.is_asset_supported(&synth).await.unwrap());
    }

    #[tokio::test]
    async fn unlisted_and_staged_pools_are_not_supported() {
        let venue = venue(vec![pool(Asset::btc(), PoolStatus::Staged)]);
        assert!(!venue.is_asset_supported(&Asset::btc()).await.unwrap());
        assert!(!venue.is_asset_supported(&Asset::eth()).await.unwrap());
    }

    #[tokio::test]
    async fn quotes_carry_the_venue_name() {
        let venue = venue(vec![pool(Asset::btc(), PoolStatus::Available)]);
        let quote = venue
            .estimate_swap(&QuoteSwapParams {
                amount: CryptoAmount::new(BaseAmount::native(100_000_000u64), Asset::btc()),
                destination_asset: Asset::rune(),
                destination_address: "thor1dest".to_string(),
                slip_limit: None,
            })
            .await
            .unwrap();
        assert_eq!(quote.protocol, "Thorchain");
        assert!(quote.can_swap, "{:?}", quote.errors);
    }
}
