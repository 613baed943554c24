use crate::asset::Asset;
use crate::error::QueryError;
use primitive_types::U256;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Decimals used by the settlement layer for all pool math.
pub const NATIVE_DECIMALS: u8 = 8;

/// An integer amount in base units. All pool arithmetic happens on `raw`;
/// `decimals` only matters when rendering or converting to [`Decimal`].
///
/// Amounts that take part in the same calculation must share `decimals`.
/// The checked operators return `None` on a mismatch rather than guessing
/// a rescale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BaseAmount {
    pub raw: U256,
    pub decimals: u8,
}

impl BaseAmount {
    pub fn new(raw: impl Into<U256>, decimals: u8) -> Self {
        Self {
            raw: raw.into(),
            decimals,
        }
    }

    /// Amount in the settlement layer's 8-decimal base units.
    pub fn native(raw: impl Into<U256>) -> Self {
        Self::new(raw, NATIVE_DECIMALS)
    }

    pub fn zero(decimals: u8) -> Self {
        Self::new(U256::zero(), decimals)
    }

    pub fn is_zero(&self) -> bool {
        self.raw.is_zero()
    }

    pub fn checked_add(&self, other: &Self) -> Option<Self> {
        if self.decimals != other.decimals {
            return None;
        }
        Some(Self::new(self.raw.checked_add(other.raw)?, self.decimals))
    }

    pub fn checked_sub(&self, other: &Self) -> Option<Self> {
        if self.decimals != other.decimals {
            return None;
        }
        Some(Self::new(self.raw.checked_sub(other.raw)?, self.decimals))
    }

    /// Subtraction floored at zero. Operands must share `decimals`, same
    /// as the checked operators; a mismatch is a caller bug.
    pub fn saturating_sub(&self, other: &Self) -> Self {
        debug_assert_eq!(self.decimals, other.decimals, "decimals mismatch");
        Self::new(self.raw.saturating_sub(other.raw), self.decimals)
    }

    /// Human-unit representation, `raw / 10^decimals`.
    pub fn to_decimal(&self) -> Result<Decimal, QueryError> {
        let raw = u256_to_decimal(self.raw)?;
        let divisor = Decimal::from(10u64.pow(self.decimals as u32));
        Ok(raw / divisor)
    }
}

impl fmt::Display for BaseAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

/// An amount tagged with the asset it denominates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CryptoAmount {
    pub amount: BaseAmount,
    pub asset: Asset,
}

impl CryptoAmount {
    pub fn new(amount: BaseAmount, asset: Asset) -> Self {
        Self { amount, asset }
    }

    pub fn zero(asset: Asset) -> Self {
        Self {
            amount: BaseAmount::zero(NATIVE_DECIMALS),
            asset,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }
}

impl fmt::Display for CryptoAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.amount.to_decimal() {
            Ok(d) => write!(f, "{} {}", d, self.asset),
            Err(_) => write!(f, "{} base units of {}", self.amount.raw, self.asset),
        }
    }
}

/// Lossless for anything a pool can realistically hold; amounts beyond
/// `Decimal`'s 96-bit mantissa fail with `Overflow` instead of rounding.
pub fn u256_to_decimal(value: U256) -> Result<Decimal, QueryError> {
    Decimal::from_str(&value.to_string()).map_err(|_| QueryError::Overflow("u256 to decimal"))
}

/// Truncates towards zero. Negative input is a caller bug and errors out.
pub fn decimal_to_u256(value: Decimal) -> Result<U256, QueryError> {
    if value.is_sign_negative() {
        return Err(QueryError::Overflow("negative amount to u256"));
    }
    U256::from_dec_str(&value.trunc().to_string()).map_err(|_| QueryError::Overflow("decimal to u256"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn checked_ops_respect_decimals() {
        let a = BaseAmount::native(100u64);
        let b = BaseAmount::native(40u64);
        assert_eq!(a.checked_add(&b).unwrap().raw, U256::from(140u64));
        assert_eq!(a.checked_sub(&b).unwrap().raw, U256::from(60u64));
        assert!(b.checked_sub(&a).is_none());

        let mismatched = BaseAmount::new(1u64, 18);
        assert!(a.checked_add(&mismatched).is_none());
    }

    #[test]
    fn saturating_sub_floors_at_zero() {
        let a = BaseAmount::native(100u64);
        let b = BaseAmount::native(140u64);
        assert!(a.saturating_sub(&b).is_zero());
    }

    #[test]
    #[should_panic(expected = "decimals mismatch")]
    fn saturating_sub_rejects_mixed_decimals() {
        let a = BaseAmount::native(100u64);
        let b = BaseAmount::new(1u64, 18);
        let _ = a.saturating_sub(&b);
    }

    #[test]
    fn to_decimal_scales_by_decimals() {
        let amount = BaseAmount::native(150_000_000u64);
        assert_eq!(amount.to_decimal().unwrap(), dec!(1.5));
    }

    #[test]
    fn decimal_round_trip_truncates() {
        assert_eq!(decimal_to_u256(dec!(42.9)).unwrap(), U256::from(42u64));
        assert!(decimal_to_u256(dec!(-1)).is_err());
    }
}
