use thiserror::Error;

/// Failure taxonomy shared by the math engine, the query layer and the
/// aggregator.
///
/// `UnsupportedAsset` makes a protocol silently skip a quote request,
/// `UpstreamFetch` degrades it to a `can_swap = false` quote. The two are
/// kept as distinct variants so callers can tell the paths apart.
#[derive(Debug, Clone, Error)]
pub enum QueryError {
    /// Pool depth is zero or missing on either side. Local, never retried.
    #[error("invalid pool state for {0}: zero or missing depth")]
    InvalidPoolState(String),

    /// The venue does not run a pool for the requested asset.
    #[error("asset {0} is not supported")]
    UnsupportedAsset(String),

    /// The caller has no recorded deposit in the pool.
    #[error("no position for {address} in {asset}")]
    PositionNotFound { asset: String, address: String },

    /// Network or indexer error while fetching pool state or history.
    #[error("upstream fetch failed: {0}")]
    UpstreamFetch(String),

    /// The swap amount nets to zero or below after fees. Reported inside
    /// a rejected quote's `errors`, never as a bare `Err`.
    #[error("amount below minimum: {0}")]
    AmountBelowMinimum(String),

    /// Checked arithmetic failed. Depths large enough to trigger this are
    /// outside anything a real pool can hold.
    #[error("arithmetic overflow in {0}")]
    Overflow(&'static str),

    /// Unparseable asset notation such as `BTCBTC`.
    #[error("invalid asset notation: {0}")]
    InvalidAsset(String),

    /// A request parameter failed validation before any pool was touched.
    #[error("invalid parameters: {0}")]
    InvalidParams(String),
}
