//! Multi-venue quote aggregation.
//!
//! Fans one swap request out over every registered [`Protocol`]
//! concurrently and collects the answers into a single ranked list.
//! A venue that does not list the pair is skipped outright; a venue
//! that lists it but fails to answer is kept in the results as a
//! `can_swap = false` quote carrying the error, so one flaky upstream
//! never hides the quotes that did arrive.

use chrono::Utc;
use crosspool_domain::quote::{SwapHistory, SwapQuote, TotalFees};
use crosspool_domain::{Chain, CryptoAmount, QueryError};
use crosspool_protocols::{Protocol, QuoteSwapParams};
use futures::future::join_all;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, warn};

pub struct Aggregator {
    protocols: Vec<Arc<dyn Protocol>>,
}

impl Aggregator {
    /// Builds an aggregator over the given venues. At least one venue is
    /// required; quoting against nothing is a caller bug, not an empty
    /// result.
    pub fn new(protocols: Vec<Arc<dyn Protocol>>) -> Result<Self, QueryError> {
        if protocols.is_empty() {
            return Err(QueryError::InvalidParams(
                "at least one protocol is required".to_string(),
            ));
        }
        Ok(Self { protocols })
    }

    pub fn protocol_names(&self) -> Vec<&'static str> {
        self.protocols.iter().map(|p| p.name()).collect()
    }

    /// Quotes the swap on every venue that supports the pair. The list is
    /// ranked: swappable quotes first, highest `expected_amount` on top,
    /// degraded quotes at the tail. A venue slot that panics is dropped
    /// with a warning instead of taking the whole request down.
    pub async fn estimate_swap(&self, params: &QuoteSwapParams) -> Vec<SwapQuote> {
        let handles: Vec<_> = self
            .protocols
            .iter()
            .map(|protocol| {
                let protocol = Arc::clone(protocol);
                let params = params.clone();
                tokio::spawn(async move { quote_one(protocol, &params).await })
            })
            .collect();

        let mut quotes = Vec::new();
        for handle in join_all(handles).await {
            match handle {
                Ok(Some(quote)) => quotes.push(quote),
                Ok(None) => {}
                Err(err) => warn!(%err, "quote task aborted"),
            }
        }
        quotes.sort_by(|a, b| {
            b.can_swap
                .cmp(&a.can_swap)
                .then(b.expected_amount.amount.cmp(&a.expected_amount.amount))
        });
        quotes
    }

    /// Swap history merged across every venue, newest first.
    pub async fn get_swap_history(
        &self,
        chain_addresses: &[(Chain, String)],
    ) -> SwapHistory {
        let fetches = self
            .protocols
            .iter()
            .map(|protocol| protocol.get_swap_history(chain_addresses));

        let mut swaps = Vec::new();
        for (protocol, result) in self.protocols.iter().zip(join_all(fetches).await) {
            match result {
                Ok(history) => swaps.extend(history.swaps),
                Err(err) => warn!(protocol = protocol.name(), %err, "history fetch failed"),
            }
        }
        swaps.sort_by(|a, b| b.date.cmp(&a.date));
        SwapHistory {
            count: swaps.len(),
            swaps,
        }
    }
}

/// Picks the quote a caller should act on: the best swappable one, or the
/// first degraded quote so its errors stay visible when nothing can swap.
pub fn best_quote(quotes: &[SwapQuote]) -> Option<&SwapQuote> {
    quotes.iter().find(|q| q.can_swap).or_else(|| quotes.first())
}

async fn quote_one(protocol: Arc<dyn Protocol>, params: &QuoteSwapParams) -> Option<SwapQuote> {
    let supported = async {
        Ok::<bool, QueryError>(
            protocol.is_asset_supported(&params.amount.asset).await?
                && protocol.is_asset_supported(&params.destination_asset).await?,
        )
    }
    .await;

    match supported {
        Ok(false) => {
            debug!(protocol = protocol.name(), "pair not listed, skipping");
            None
        }
        Ok(true) => match protocol.estimate_swap(params).await {
            Ok(quote) => Some(quote),
            Err(err) => Some(degraded_quote(protocol.name(), params, err)),
        },
        Err(err) => Some(degraded_quote(protocol.name(), params, err)),
    }
}

fn degraded_quote(name: &str, params: &QuoteSwapParams, err: QueryError) -> SwapQuote {
    warn!(protocol = name, %err, "quote failed");
    SwapQuote {
        protocol: name.to_string(),
        can_swap: false,
        expected_amount: CryptoAmount::zero(params.destination_asset.clone()),
        slip_bps: Decimal::ZERO,
        fees: TotalFees::zero(params.amount.asset.clone(), params.destination_asset.clone()),
        memo: String::new(),
        to_address: String::new(),
        expiry: Utc::now(),
        errors: vec![err.to_string()],
    }
}
