//! Constant-product swap math.
//!
//! The venue's pools price swaps with the slip-based formula
//! `output = (x * X * Y) / (x + X)^2` where `x` is the input amount, `X`
//! the input-side depth and `Y` the output-side depth. The fee taken by
//! the pool is `x^2 * Y / (x + X)^2` and the price slip is `x / (x + X)`.
//! All integer work is checked `U256`; slips are `Decimal`. No floats.

use crate::amount::{BaseAmount, u256_to_decimal};
use crate::error::QueryError;
use crate::pool::PoolData;
use primitive_types::U256;
use rust_decimal::Decimal;

/// Output, pool fee and slip of a single-sided swap.
#[derive(Debug, Clone)]
pub struct SwapOutput {
    pub output: BaseAmount,
    pub swap_fee: BaseAmount,
    /// Fractional price impact in `[0, 1)`.
    pub slip: Decimal,
}

/// Input-side and output-side depths for a swap direction. Errors if the
/// pool is not swappable.
fn depths(pool: &PoolData, to_rune: bool) -> Result<(U256, U256), QueryError> {
    if pool.asset_balance.is_zero() || pool.rune_balance.is_zero() {
        return Err(QueryError::InvalidPoolState(pool.asset.to_string()));
    }
    let (input_side, output_side) = if to_rune {
        (pool.asset_balance.raw, pool.rune_balance.raw)
    } else {
        (pool.rune_balance.raw, pool.asset_balance.raw)
    };
    Ok((input_side, output_side))
}

fn mul(a: U256, b: U256) -> Result<U256, QueryError> {
    a.checked_mul(b).ok_or(QueryError::Overflow("swap math"))
}

/// `(x * X * Y) / (x + X)^2`. Strictly below the output-side depth for any
/// input; a single swap can never drain the pool.
pub fn get_swap_output(
    input: BaseAmount,
    pool: &PoolData,
    to_rune: bool,
) -> Result<BaseAmount, QueryError> {
    let (x_depth, y_depth) = depths(pool, to_rune)?;
    let x = input.raw;
    if x.is_zero() {
        return Ok(BaseAmount::zero(input.decimals));
    }
    let numerator = mul(mul(x, x_depth)?, y_depth)?;
    let sum = x.checked_add(x_depth).ok_or(QueryError::Overflow("swap math"))?;
    let denominator = mul(sum, sum)?;
    Ok(BaseAmount::new(numerator / denominator, input.decimals))
}

/// Liquidity fee retained by the pool, `(x^2 * Y) / (x + X)^2`, in output
/// side units.
pub fn get_swap_fee(
    input: BaseAmount,
    pool: &PoolData,
    to_rune: bool,
) -> Result<BaseAmount, QueryError> {
    let (x_depth, y_depth) = depths(pool, to_rune)?;
    let x = input.raw;
    if x.is_zero() {
        return Ok(BaseAmount::zero(input.decimals));
    }
    let numerator = mul(mul(x, x)?, y_depth)?;
    let sum = x.checked_add(x_depth).ok_or(QueryError::Overflow("swap math"))?;
    let denominator = mul(sum, sum)?;
    Ok(BaseAmount::new(numerator / denominator, input.decimals))
}

/// Fractional price impact `x / (x + X)`. Monotonic in `x`, approaches 1
/// as the input dwarfs the pool.
pub fn get_swap_slip(input: BaseAmount, pool: &PoolData, to_rune: bool) -> Result<Decimal, QueryError> {
    let (x_depth, _) = depths(pool, to_rune)?;
    let x = input.raw;
    if x.is_zero() {
        return Ok(Decimal::ZERO);
    }
    let sum = x.checked_add(x_depth).ok_or(QueryError::Overflow("swap slip"))?;
    Ok(u256_to_decimal(x)? / u256_to_decimal(sum)?)
}

/// Output, fee and slip of one swap leg.
pub fn get_single_swap(
    input: BaseAmount,
    pool: &PoolData,
    to_rune: bool,
) -> Result<SwapOutput, QueryError> {
    Ok(SwapOutput {
        output: get_swap_output(input, pool, to_rune)?,
        swap_fee: get_swap_fee(input, pool, to_rune)?,
        slip: get_swap_slip(input, pool, to_rune)?,
    })
}

/// Two-leg swap through the native asset: asset in `pool1` to native, then
/// native to `pool2`'s asset. Exactly the composition of two single swaps,
/// no intermediate rounding beyond integer division.
pub fn get_double_swap_output(
    input: BaseAmount,
    pool1: &PoolData,
    pool2: &PoolData,
) -> Result<BaseAmount, QueryError> {
    let native = get_swap_output(input, pool1, true)?;
    get_swap_output(native, pool2, false)
}

/// Combined slip of a two-leg swap. The legs are independent price
/// impacts, so they compound multiplicatively:
/// `1 - (1 - slip1) * (1 - slip2)`.
pub fn get_double_swap_slip(
    input: BaseAmount,
    pool1: &PoolData,
    pool2: &PoolData,
) -> Result<Decimal, QueryError> {
    let slip1 = get_swap_slip(input, pool1, true)?;
    let native = get_swap_output(input, pool1, true)?;
    let slip2 = get_swap_slip(native, pool2, false)?;
    Ok(Decimal::ONE - (Decimal::ONE - slip1) * (Decimal::ONE - slip2))
}

/// Total pool fee of a two-leg swap in native units. The second leg's fee
/// accrues in the destination asset and is valued at `pool2`'s spot rate.
pub fn get_double_swap_fee(
    input: BaseAmount,
    pool1: &PoolData,
    pool2: &PoolData,
) -> Result<BaseAmount, QueryError> {
    let fee1 = get_swap_fee(input, pool1, true)?;
    let native = get_swap_output(input, pool1, true)?;
    let fee2_in_asset = get_swap_fee(native, pool2, false)?;
    let fee2 = fee2_in_asset.to_decimal()?
        * pool2.runes_per_asset()?
        * Decimal::from(10u64.pow(fee1.decimals as u32));
    let fee2 = crate::amount::decimal_to_u256(fee2)?;
    fee1.checked_add(&BaseAmount::new(fee2, fee1.decimals))
        .ok_or(QueryError::Overflow("double swap fee"))
}
