//! Collaborator interface to a settlement-layer node and its indexer.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use crosspool_domain::quote::TxRef;
use crosspool_domain::{Asset, BaseAmount, Chain, PoolData, QueryError};
use primitive_types::U256;
use serde::{Deserialize, Serialize};

/// A member's recorded two-sided deposit in one pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepositRecord {
    pub units: U256,
    pub last_add_height: u64,
    pub asset_deposit_value: BaseAmount,
    pub rune_deposit_value: BaseAmount,
}

/// A member's recorded single-sided saver deposit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaverRecord {
    pub units: U256,
    pub last_add_height: u64,
    pub asset_deposit_value: BaseAmount,
}

/// The settlement layer's verdict on an observed inbound transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObservedStatus {
    /// Seen but not finalised.
    Observed,
    /// Fully processed.
    Done,
    /// Rejected and refunded to the sender.
    Refunded,
}

/// One entry of the settlement layer's observed-transaction log, with the
/// outbound leg joined in when the venue has recorded one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservedTx {
    pub tx: TxRef,
    pub chain: Chain,
    pub memo: String,
    pub status: ObservedStatus,
    pub date: DateTime<Utc>,
    pub out_tx: Option<TxRef>,
}

impl ObservedTx {
    /// Swap deposits carry `=:` (or `SWAP:`) memos; everything else in the
    /// log is adds, withdraws or refund outbounds.
    pub fn is_swap(&self) -> bool {
        self.memo.starts_with("=:") || self.memo.to_uppercase().starts_with("SWAP:")
    }
}

/// Per-chain observed block heights.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LastBlock {
    pub chain: Chain,
    pub last_observed_in: u64,
    /// Settlement-chain height at the same instant.
    pub thorchain: u64,
}

/// Deposit routing and fee data for one connected chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundAddress {
    pub chain: Chain,
    pub address: String,
    /// Flat fee charged on the inbound leg, gas-asset base units.
    pub gas_fee: BaseAmount,
    /// Fee withheld from the outbound leg, gas-asset base units.
    pub outbound_fee: BaseAmount,
    pub halted: bool,
}

/// Network constants the math depends on.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct NetworkValues {
    /// Blocks until impermanent-loss protection is fully accrued.
    pub full_protection_blocks: u64,
    /// Flat fee for native-chain transactions, native base units.
    pub native_tx_fee: BaseAmount,
}

/// Read-only view of a settlement venue: pool snapshots, member records
/// and the observed-transaction log. Implementations own retries and
/// caching; the query layer treats every call as a point-in-time read.
#[async_trait]
pub trait NodeSource: Send + Sync {
    async fn get_pool(&self, asset: &Asset) -> Result<PoolData, QueryError>;

    async fn get_pools(&self) -> Result<Vec<PoolData>, QueryError>;

    /// `None` when the address never deposited into the pool.
    async fn get_deposit_record(
        &self,
        asset: &Asset,
        address: &str,
    ) -> Result<Option<DepositRecord>, QueryError>;

    async fn get_saver_record(
        &self,
        asset: &Asset,
        address: &str,
    ) -> Result<Option<SaverRecord>, QueryError>;

    /// Inbound transactions sent from `address` on `chain`, newest first.
    async fn get_observed_txs(
        &self,
        chain: Chain,
        address: &str,
    ) -> Result<Vec<ObservedTx>, QueryError>;

    /// Looks up a single observed transaction by inbound hash.
    async fn get_tx(&self, hash: &str) -> Result<Option<ObservedTx>, QueryError>;

    async fn get_last_blocks(&self) -> Result<Vec<LastBlock>, QueryError>;

    async fn get_inbound_addresses(&self) -> Result<Vec<InboundAddress>, QueryError>;

    async fn get_network_values(&self) -> Result<NetworkValues, QueryError>;
}
