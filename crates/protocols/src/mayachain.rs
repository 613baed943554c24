//! Maya venue adapter. Same pool model as THORChain with CACAO as the
//! settlement asset; the node API speaks the same wire format.

use crate::{Protocol, ProtocolConfig, QuoteSwapParams, VenueAdapter};
use async_trait::async_trait;
use crosspool_domain::quote::{SwapHistory, SwapQuote};
use crosspool_domain::{Asset, Chain, QueryError};
use crosspool_query::{NodeSource, QueryEngine, SwapTracker};
use std::sync::Arc;

pub struct MayachainProtocol {
    adapter: VenueAdapter,
}

impl MayachainProtocol {
    pub fn new(source: Arc<dyn NodeSource>, config: ProtocolConfig) -> Self {
        let engine = QueryEngine::new(Arc::clone(&source), Asset::cacao());
        let tracker = SwapTracker::new(source);
        Self {
            adapter: VenueAdapter::new("Mayachain", engine, tracker, config),
        }
    }
}

#[async_trait]
impl Protocol for MayachainProtocol {
    fn name(&self) -> &'static str {
        "Mayachain"
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
