//! Result records handed back to callers: swap quotes, swap history
//! entries, liquidity and saver positions. All of these are built fresh
//! per query and never mutated afterwards.

use crate::amount::CryptoAmount;
use crate::asset::Asset;
use crate::math::liquidity::{DepositValue, IlProtection, PoolShare};
use chrono::{DateTime, Utc};
use primitive_types::U256;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Fee breakdown for a quoted swap, each component in the asset it is
/// actually charged in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TotalFees {
    pub inbound_fee: CryptoAmount,
    pub swap_fee: CryptoAmount,
    pub outbound_fee: CryptoAmount,
    pub affiliate_fee: CryptoAmount,
}

impl TotalFees {
    pub fn zero(source: Asset, destination: Asset) -> Self {
        Self {
            inbound_fee: CryptoAmount::zero(source.clone()),
            swap_fee: CryptoAmount::zero(destination.clone()),
            outbound_fee: CryptoAmount::zero(destination),
            affiliate_fee: CryptoAmount::zero(source),
        }
    }
}

/// One venue's answer to a quote request. Always well-formed: when the
/// swap cannot proceed, `can_swap` is false and `errors` says why.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwapQuote {
    /// Venue that produced this quote.
    pub protocol: String,
    pub can_swap: bool,
    /// Net output after all fees, destination base units.
    pub expected_amount: CryptoAmount,
    /// Price impact in basis points.
    pub slip_bps: Decimal,
    pub fees: TotalFees,
    /// Deposit memo to attach to the inbound transaction.
    pub memo: String,
    /// Inbound vault address on the source chain.
    pub to_address: String,
    /// Quote is not actionable past this instant.
    pub expiry: DateTime<Utc>,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwapStatus {
    Pending,
    Success,
    Failed,
}

/// Reference to one leg of a swap on its own chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxRef {
    pub hash: String,
    pub address: String,
    pub amount: CryptoAmount,
}

/// Inbound and (when settled) outbound legs of one logical cross-chain
/// swap. `outbound` is populated exactly when `status` is `Success`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwapRecord {
    pub protocol: String,
    pub status: SwapStatus,
    pub date: DateTime<Utc>,
    pub inbound: TxRef,
    pub outbound: Option<TxRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwapHistory {
    pub count: usize,
    pub swaps: Vec<SwapRecord>,
}

/// Present-day valuation of a two-sided liquidity position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiquidityPosition {
    pub asset: Asset,
    pub units: U256,
    pub pool_share: PoolShare,
    pub deposit: DepositValue,
    pub impermanent_loss_protection: IlProtection,
    /// Current share value over initial deposit value, both in native
    /// units. 1.0 means break-even.
    pub lp_growth: Decimal,
}

/// Present-day valuation of a single-sided saver position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaversPosition {
    pub asset: Asset,
    pub deposit_value: CryptoAmount,
    pub redeemable_value: CryptoAmount,
    /// Growth of the redeemable value over the deposit, in percent.
    pub growth_percent: Decimal,
    pub age_days: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimateAddSaver {
    pub asset_amount: CryptoAmount,
    /// Deposit value after the entry fee.
    pub estimated_deposit_value: CryptoAmount,
    pub slip_bps: Decimal,
    pub fee: CryptoAmount,
    pub memo: String,
    pub to_address: String,
    pub expiry: DateTime<Utc>,
    pub can_add_saver: bool,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimateWithdrawSaver {
    pub expected_asset_amount: CryptoAmount,
    pub fee: CryptoAmount,
    pub slip_bps: Decimal,
    pub memo: String,
    pub to_address: String,
    pub errors: Vec<String>,
}
