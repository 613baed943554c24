//! Liquidity unit, pool share and impermanent-loss-protection math.

use crate::amount::{BaseAmount, decimal_to_u256, u256_to_decimal};
use crate::error::QueryError;
use crate::pool::PoolData;
use primitive_types::U256;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Symmetric or asymmetric deposit amounts, 8-decimal base units.
#[derive(Debug, Clone, Copy)]
pub struct LiquidityToAdd {
    pub asset: BaseAmount,
    pub rune: BaseAmount,
}

/// A member's units against the pool's total.
#[derive(Debug, Clone, Copy)]
pub struct UnitData {
    pub liquidity_units: U256,
    pub total_units: U256,
}

/// Proportional claim on both sides of the pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolShare {
    pub asset_share: BaseAmount,
    pub rune_share: BaseAmount,
}

/// Recorded value of the original deposit.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DepositValue {
    pub asset: BaseAmount,
    pub rune: BaseAmount,
}

/// Height window over which loss protection accrues.
#[derive(Debug, Clone, Copy)]
pub struct BlockWindow {
    pub current: u64,
    pub last_added: u64,
    pub full_protection: u64,
}

/// Impermanent-loss protection owed to a member right now.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IlProtection {
    /// Protection payout in native units, coverage scaled by progress.
    pub amount: BaseAmount,
    /// Accrual progress in `[0, 1]`; 1 once the window has elapsed.
    pub progress: Decimal,
    /// Days since the last deposit, capped at the window length.
    pub total_days: Decimal,
}

/// Units minted for a deposit: `P * (R*a + r*A) / (2*R*A)`.
pub fn get_liquidity_units(added: &LiquidityToAdd, pool: &PoolData) -> Result<U256, QueryError> {
    if pool.asset_balance.is_zero() || pool.rune_balance.is_zero() {
        return Err(QueryError::InvalidPoolState(pool.asset.to_string()));
    }
    let p = u256_to_decimal(pool.lp_units)?;
    let r = u256_to_decimal(added.rune.raw)?;
    let a = u256_to_decimal(added.asset.raw)?;
    let big_r = u256_to_decimal(pool.rune_balance.raw)?;
    let big_a = u256_to_decimal(pool.asset_balance.raw)?;

    let numerator = p * (big_r * a + r * big_a);
    let denominator = big_r * big_a * Decimal::TWO;
    decimal_to_u256(numerator / denominator)
}

/// Redeemable share of both depths for a unit holding. The share is
/// proportionally identical on both sides: `units / total` of each depth.
pub fn get_pool_share(units: &UnitData, pool: &PoolData) -> Result<PoolShare, QueryError> {
    if units.total_units.is_zero() {
        return Err(QueryError::InvalidPoolState(pool.asset.to_string()));
    }
    let asset = units
        .liquidity_units
        .checked_mul(pool.asset_balance.raw)
        .ok_or(QueryError::Overflow("pool share"))?
        / units.total_units;
    let rune = units
        .liquidity_units
        .checked_mul(pool.rune_balance.raw)
        .ok_or(QueryError::Overflow("pool share"))?
        / units.total_units;
    Ok(PoolShare {
        asset_share: BaseAmount::new(asset, pool.asset_balance.decimals),
        rune_share: BaseAmount::new(rune, pool.rune_balance.decimals),
    })
}

/// Price shift caused by an asymmetric add: `|t*R - T*r| / (T*r + R*T)`.
pub fn get_slip_on_liquidity(added: &LiquidityToAdd, pool: &PoolData) -> Result<Decimal, QueryError> {
    if pool.asset_balance.is_zero() || pool.rune_balance.is_zero() {
        return Err(QueryError::InvalidPoolState(pool.asset.to_string()));
    }
    let r = u256_to_decimal(added.rune.raw)?;
    let t = u256_to_decimal(added.asset.raw)?;
    let big_r = u256_to_decimal(pool.rune_balance.raw)?;
    let big_t = u256_to_decimal(pool.asset_balance.raw)?;

    let numerator = (t * big_r - big_t * r).abs();
    let denominator = big_t * r + big_r * big_t;
    if denominator.is_zero() {
        return Ok(Decimal::ZERO);
    }
    Ok(numerator / denominator)
}

/// Protection owed for the value lost to relative price movement since the
/// deposit. Coverage is `(A0 * P1 + R0) - (A1 * P1 + R1)` valued at the
/// withdrawal price `P1 = R1 / A1`, floored at zero, and scaled by linear
/// accrual over the protection window.
pub fn get_protection_data(
    deposit: &DepositValue,
    share: &PoolShare,
    window: &BlockWindow,
) -> Result<IlProtection, QueryError> {
    let a0 = u256_to_decimal(deposit.asset.raw)?;
    let r0 = u256_to_decimal(deposit.rune.raw)?;
    let a1 = u256_to_decimal(share.asset_share.raw)?;
    let r1 = u256_to_decimal(share.rune_share.raw)?;

    let coverage = if a1.is_zero() {
        Decimal::ZERO
    } else {
        let p1 = r1 / a1;
        ((a0 * p1 + r0) - (a1 * p1 + r1)).max(Decimal::ZERO)
    };

    let progress = if window.full_protection == 0 {
        Decimal::ONE
    } else {
        let elapsed = window.current.saturating_sub(window.last_added);
        (Decimal::from(elapsed) / Decimal::from(window.full_protection)).min(Decimal::ONE)
    };

    let elapsed = window.current.saturating_sub(window.last_added);
    let capped = elapsed.min(window.full_protection);
    // Native settlement chain produces a block every 6 seconds.
    let total_days = Decimal::from(capped) * Decimal::from(6u64) / Decimal::from(86_400u64);

    Ok(IlProtection {
        amount: BaseAmount::native(decimal_to_u256(coverage * progress)?),
        progress,
        total_days,
    })
}
