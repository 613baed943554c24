use crate::amount::{BaseAmount, u256_to_decimal};
use crate::asset::Asset;
use crate::error::QueryError;
use primitive_types::U256;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PoolStatus {
    Available,
    Staged,
    Suspended,
}

/// Point-in-time snapshot of a liquidity pool's two depths, constructed
/// fresh per query from an upstream source and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolData {
    pub asset: Asset,
    /// Depth of the non-native side, 8-decimal base units.
    pub asset_balance: BaseAmount,
    /// Depth of the native settlement side, 8-decimal base units.
    pub rune_balance: BaseAmount,
    /// Total liquidity units issued against the pool.
    pub lp_units: U256,
    /// Single-sided saver vault depth for this asset.
    pub savers_depth: BaseAmount,
    /// Total saver units issued.
    pub savers_units: U256,
    pub status: PoolStatus,
}

impl PoolData {
    pub fn is_available(&self) -> bool {
        self.status == PoolStatus::Available
    }

    /// A pool with a zero depth on either side cannot be swapped against.
    pub fn can_swap(&self) -> bool {
        self.is_available() && !self.asset_balance.is_zero() && !self.rune_balance.is_zero()
    }

    /// Spot price of one asset in native units.
    pub fn runes_per_asset(&self) -> Result<Decimal, QueryError> {
        if self.asset_balance.is_zero() {
            return Err(QueryError::InvalidPoolState(self.asset.to_string()));
        }
        let rune = u256_to_decimal(self.rune_balance.raw)?;
        let asset = u256_to_decimal(self.asset_balance.raw)?;
        Ok(rune / asset)
    }

    /// Spot price of one native unit in asset units.
    pub fn assets_per_rune(&self) -> Result<Decimal, QueryError> {
        if self.rune_balance.is_zero() {
            return Err(QueryError::InvalidPoolState(self.asset.to_string()));
        }
        let rune = u256_to_decimal(self.rune_balance.raw)?;
        let asset = u256_to_decimal(self.asset_balance.raw)?;
        Ok(asset / rune)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::asset::Chain;

    pub fn pool(asset_balance: u64, rune_balance: u64) -> PoolData {
        PoolData {
            asset: Asset::new(Chain::Btc, "BTC", false),
            asset_balance: BaseAmount::native(asset_balance),
            rune_balance: BaseAmount::native(rune_balance),
            lp_units: U256::from(1_000_000u64),
            savers_depth: BaseAmount::native(0u64),
            savers_units: U256::zero(),
            status: PoolStatus::Available,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::pool;
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn zero_depth_pool_cannot_swap() {
        assert!(pool(100, 2_500_000).can_swap());
        assert!(!pool(0, 2_500_000).can_swap());
        assert!(!pool(100, 0).can_swap());

        let mut staged = pool(100, 2_500_000);
        staged.status = PoolStatus::Staged;
        assert!(!staged.can_swap());
    }

    #[test]
    fn spot_ratios() {
        let p = pool(100, 2_500_000);
        assert_eq!(p.runes_per_asset().unwrap(), dec!(25000));
        assert_eq!(p.assets_per_rune().unwrap(), dec!(0.00004));
        assert!(pool(0, 1).runes_per_asset().is_err());
    }
}
