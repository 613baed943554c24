//! THORChain venue adapter. RUNE-settled; routes every non-native pair
//! through the RUNE side of the pools.

use crate::{Protocol, ProtocolConfig, QuoteSwapParams, VenueAdapter};
use async_trait::async_trait;
use crosspool_domain::quote::{SwapHistory, SwapQuote};
use crosspool_domain::{Asset, Chain, QueryError};
use crosspool_query::{NodeSource, QueryEngine, SwapTracker};
use std::sync::Arc;

pub struct ThorchainProtocol {
    adapter: VenueAdapter,
}

impl ThorchainProtocol {
    pub fn new(source: Arc<dyn NodeSource>, config: ProtocolConfig) -> Self {
        let engine = QueryEngine::new(Arc::clone(&source), Asset::rune());
        let tracker = SwapTracker::new(source);
        Self {
            adapter: VenueAdapter::new("Thorchain", engine, tracker, config),
        }
    }
}

#[async_trait]
impl Protocol for ThorchainProtocol {
    fn name(&self) -> &'static str {
        "Thorchain"
    }

    async fn is_asset_supported(&self, asset: &Asset) -> Result<bool, QueryError> {
        self.adapter.is_asset_supported(asset).await
    }

    async fn estimate_swap(&self, params: &QuoteSwapParams) -> Result<SwapQuote, QueryError> {
        self.adapter.estimate_swap(params).await
    }

    async fn get_swap_history(
        &self,
        chain_addresses: &[(Chain, String)],
    ) -> Result<SwapHistory, QueryError> {
        self.adapter.get_swap_history(chain_addresses).await
    }
}
