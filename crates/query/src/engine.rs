//! Swap estimation and position valuation against a single venue.

use crate::source::NodeSource;
use chrono::{Duration, Utc};
use crosspool_domain::amount::{decimal_to_u256, u256_to_decimal};
use crosspool_domain::math::liquidity::{
    BlockWindow, DepositValue, UnitData, get_pool_share, get_protection_data,
};
use crosspool_domain::math::swap::{
    get_double_swap_fee, get_double_swap_output, get_double_swap_slip, get_single_swap,
};
use crosspool_domain::quote::{
    EstimateAddSaver, EstimateWithdrawSaver, LiquidityPosition, SaversPosition, SwapQuote,
    TotalFees,
};
use crosspool_domain::{Asset, BaseAmount, CryptoAmount, PoolData, QueryError};
use primitive_types::U256;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::debug;

/// Quotes expire this long after estimation.
const QUOTE_TTL_MINUTES: i64 = 15;
const BPS_SCALE: u32 = 10_000;

#[derive(Debug, Clone)]
pub struct EstimateSwapParams {
    pub amount: CryptoAmount,
    pub destination_asset: Asset,
    pub destination_address: String,
    /// Abort when the combined slip exceeds this ratio.
    pub slip_limit: Option<Decimal>,
    pub affiliate_bps: u32,
    pub affiliate_address: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SaversWithdraw {
    pub asset: Asset,
    pub address: String,
    /// Share of the position to withdraw, basis points.
    pub withdraw_bps: u32,
}

/// Stateless query engine over one venue's pool set. The native asset is
/// the venue's settlement asset; double swaps route through it.
pub struct QueryEngine {
    source: Arc<dyn NodeSource>,
    native: Asset,
}

impl QueryEngine {
    pub fn new(source: Arc<dyn NodeSource>, native: Asset) -> Self {
        Self { source, native }
    }

    pub fn native_asset(&self) -> &Asset {
        &self.native
    }

    pub fn source(&self) -> &Arc<dyn NodeSource> {
        &self.source
    }

    fn is_native(&self, asset: &Asset) -> bool {
        *asset == self.native
    }

    /// Pool for `asset`, or `UnsupportedAsset` when the venue lists none.
    async fn swappable_pool(&self, asset: &Asset) -> Result<PoolData, QueryError> {
        let layer1 = Asset::new(asset.chain, asset.symbol.clone(), false);
        let pool = self.source.get_pool(&layer1).await?;
        if !pool.is_available() {
            return Err(QueryError::UnsupportedAsset(asset.to_string()));
        }
        Ok(pool)
    }

    /// Produces a quote for the requested swap. Parameter and liquidity
    /// problems surface as `errors` entries on a `can_swap = false` quote;
    /// only upstream fetch failures propagate as `Err`.
    pub async fn estimate_swap(&self, params: &EstimateSwapParams) -> Result<SwapQuote, QueryError> {
        let source_asset = params.amount.asset.clone();
        let mut errors = Vec::new();

        if source_asset == params.destination_asset {
            errors.push("source and destination asset cannot be the same".to_string());
        }
        if params.amount.is_zero() {
            errors.push("input amount must be greater than 0".to_string());
        }
        if params.affiliate_bps > BPS_SCALE {
            errors.push(format!(
                "affiliate basis points {} out of bound [0 - 10000]",
                params.affiliate_bps
            ));
        }
        if let Some(limit) = params.slip_limit {
            if limit <= Decimal::ZERO || limit >= Decimal::ONE {
                errors.push(format!("slip limit {limit} out of bound (0 - 1)"));
            }
        }
        if !errors.is_empty() {
            return Ok(self.rejected_quote(params, errors));
        }

        let inbound_addresses = self.source.get_inbound_addresses().await?;
        let network = self.source.get_network_values().await?;
        let source_inbound = inbound_addresses
            .iter()
            .find(|entry| entry.chain == source_asset.chain)
            .cloned();
        let destination_inbound = inbound_addresses
            .iter()
            .find(|entry| entry.chain == params.destination_asset.chain)
            .cloned();

        if let Some(inbound) = &source_inbound {
            if inbound.halted {
                errors.push(format!("source chain {} is halted", source_asset.chain));
            }
        }
        if let Some(inbound) = &destination_inbound {
            if inbound.halted {
                errors.push(format!(
                    "destination chain {} is halted",
                    params.destination_asset.chain
                ));
            }
        }
        if !errors.is_empty() {
            return Ok(self.rejected_quote(params, errors));
        }

        // Inbound fee comes off the input before it reaches the pools.
        let inbound_fee = match &source_inbound {
            Some(inbound) if !self.is_native(&source_asset) => inbound.gas_fee,
            _ => network.native_tx_fee,
        };
        let after_inbound = params.amount.amount.saturating_sub(&inbound_fee);

        let affiliate_fee = BaseAmount::new(
            after_inbound
                .raw
                .checked_mul(U256::from(params.affiliate_bps))
                .ok_or(QueryError::Overflow("affiliate fee"))?
                / U256::from(BPS_SCALE),
            after_inbound.decimals,
        );
        let net_input = after_inbound.saturating_sub(&affiliate_fee);

        if net_input.is_zero() {
            errors.push(
                QueryError::AmountBelowMinimum(format!(
                    "input {} does not cover the inbound fee",
                    params.amount
                ))
                .to_string(),
            );
            return Ok(self.rejected_quote(params, errors));
        }

        // Route: single swap when either side is the native asset,
        // double swap through it otherwise.
        let (gross_output, swap_fee, slip) = if self.is_native(&source_asset) {
            let pool = self.swappable_pool(&params.destination_asset).await?;
            let single = get_single_swap(net_input, &pool, false)?;
            (single.output, single.swap_fee, single.slip)
        } else if self.is_native(&params.destination_asset) {
            let pool = self.swappable_pool(&source_asset).await?;
            let single = get_single_swap(net_input, &pool, true)?;
            (single.output, single.swap_fee, single.slip)
        } else {
            let pool1 = self.swappable_pool(&source_asset).await?;
            let pool2 = self.swappable_pool(&params.destination_asset).await?;
            let output = get_double_swap_output(net_input, &pool1, &pool2)?;
            // The combined fee accrues in native units; report it in the
            // destination asset like the rest of the fee breakdown.
            let fee_native = get_double_swap_fee(net_input, &pool1, &pool2)?;
            let fee = BaseAmount::new(
                decimal_to_u256(
                    fee_native.to_decimal()?
                        * pool2.assets_per_rune()?
                        * Decimal::from(10u64.pow(fee_native.decimals as u32)),
                )?,
                fee_native.decimals,
            );
            let slip = get_double_swap_slip(net_input, &pool1, &pool2)?;
            (output, fee, slip)
        };

        let outbound_fee = match &destination_inbound {
            Some(inbound) if !self.is_native(&params.destination_asset) => inbound.outbound_fee,
            _ => network.native_tx_fee,
        };
        let net_output = gross_output.saturating_sub(&outbound_fee);

        if net_output.is_zero() {
            errors.push(
                QueryError::AmountBelowMinimum(format!(
                    "expected output {gross_output} is less than the outbound fee {outbound_fee}"
                ))
                .to_string(),
            );
        }
        if let Some(limit) = params.slip_limit {
            if slip >= limit {
                errors.push(format!("expected slip {slip} exceeds slip limit {limit}"));
            }
        }

        let slip_bps = slip * Decimal::from(BPS_SCALE);
        let fees = TotalFees {
            inbound_fee: CryptoAmount::new(inbound_fee, source_asset.clone()),
            swap_fee: CryptoAmount::new(swap_fee, params.destination_asset.clone()),
            outbound_fee: CryptoAmount::new(outbound_fee, params.destination_asset.clone()),
            affiliate_fee: CryptoAmount::new(affiliate_fee, source_asset.clone()),
        };

        if !errors.is_empty() {
            let mut quote = self.rejected_quote(params, errors);
            quote.fees = fees;
            quote.slip_bps = slip_bps;
            return Ok(quote);
        }

        // LIM guards the executed swap at the quoted slip tolerance.
        let limit_amount = match params.slip_limit {
            Some(limit) => {
                let lim = u256_to_decimal(net_output.raw)? * (Decimal::ONE - limit);
                BaseAmount::new(decimal_to_u256(lim)?, net_output.decimals)
            }
            None => BaseAmount::zero(net_output.decimals),
        };
        let memo = build_swap_memo(
            &params.destination_asset,
            &params.destination_address,
            &limit_amount,
            params.affiliate_address.as_deref(),
            params.affiliate_bps,
        );
        let to_address = source_inbound
            .map(|inbound| inbound.address)
            .unwrap_or_default();

        debug!(
            from = %source_asset,
            to = %params.destination_asset,
            output = %net_output,
            %slip_bps,
            "swap estimated"
        );

        Ok(SwapQuote {
            protocol: String::new(),
            can_swap: true,
            expected_amount: CryptoAmount::new(net_output, params.destination_asset.clone()),
            slip_bps,
            fees,
            memo,
            to_address,
            expiry: Utc::now() + Duration::minutes(QUOTE_TTL_MINUTES),
            errors: Vec::new(),
        })
    }

    fn rejected_quote(&self, params: &EstimateSwapParams, errors: Vec<String>) -> SwapQuote {
        SwapQuote {
            protocol: String::new(),
            can_swap: false,
            expected_amount: CryptoAmount::zero(params.destination_asset.clone()),
            slip_bps: Decimal::ZERO,
            fees: TotalFees::zero(
                params.amount.asset.clone(),
                params.destination_asset.clone(),
            ),
            memo: String::new(),
            to_address: String::new(),
            expiry: Utc::now() + Duration::minutes(QUOTE_TTL_MINUTES),
            errors,
        }
    }

    /// Values a member's two-sided position from the live pool snapshot
    /// and the recorded deposit.
    pub async fn check_liquidity_position(
        &self,
        asset: &Asset,
        address: &str,
    ) -> Result<LiquidityPosition, QueryError> {
        let pool = self.source.get_pool(asset).await?;
        let record = self
            .source
            .get_deposit_record(asset, address)
            .await?
            .filter(|record| !record.units.is_zero())
            .ok_or_else(|| QueryError::PositionNotFound {
                asset: asset.to_string(),
                address: address.to_string(),
            })?;

        let share = get_pool_share(
            &UnitData {
                liquidity_units: record.units,
                total_units: pool.lp_units,
            },
            &pool,
        )?;

        let network = self.source.get_network_values().await?;
        let current_height = self.settlement_height().await?;
        let deposit = DepositValue {
            asset: record.asset_deposit_value,
            rune: record.rune_deposit_value,
        };
        let protection = get_protection_data(
            &deposit,
            &share,
            &BlockWindow {
                current: current_height,
                last_added: record.last_add_height,
                full_protection: network.full_protection_blocks,
            },
        )?;

        // Growth: current redeemable value over deposit value, both priced
        // in native units at today's pool ratio.
        let price = pool.runes_per_asset()?;
        let redeem_value =
            share.rune_share.to_decimal()? + share.asset_share.to_decimal()? * price;
        let deposit_value =
            deposit.rune.to_decimal()? + deposit.asset.to_decimal()? * price;
        let lp_growth = if deposit_value.is_zero() {
            Decimal::ONE
        } else {
            redeem_value / deposit_value
        };

        Ok(LiquidityPosition {
            asset: asset.clone(),
            units: record.units,
            pool_share: share,
            deposit,
            impermanent_loss_protection: protection,
            lp_growth,
        })
    }

    /// Entry estimate for a single-sided saver deposit. The saver vault
    /// prices entry like a swap against the pool's asset depth, so the
    /// single-swap fee and slip formulas apply unchanged.
    pub async fn estimate_add_saver(
        &self,
        amount: CryptoAmount,
    ) -> Result<EstimateAddSaver, QueryError> {
        let asset = amount.asset.clone();
        if self.is_native(&asset) {
            // No saver vault for the settlement asset itself.
            return Err(QueryError::UnsupportedAsset(asset.to_string()));
        }
        let mut errors = Vec::new();
        if amount.is_zero() {
            errors.push("add amount must be greater than 0".to_string());
        }

        let pool = self.swappable_pool(&asset).await?;
        let inbound = self
            .source
            .get_inbound_addresses()
            .await?
            .into_iter()
            .find(|entry| entry.chain == asset.chain);
        let (to_address, halted) = match &inbound {
            Some(entry) => (entry.address.clone(), entry.halted),
            None => (String::new(), false),
        };
        if halted {
            errors.push(format!("chain {} is halted", asset.chain));
        }

        let single = get_single_swap(amount.amount, &pool, true)?;
        // Entry fee accrues in native units; value it back in the asset.
        let fee_in_asset = BaseAmount::new(
            decimal_to_u256(
                single.swap_fee.to_decimal()?
                    * pool.assets_per_rune()?
                    * Decimal::from(10u64.pow(amount.amount.decimals as u32)),
            )?,
            amount.amount.decimals,
        );
        let deposit_value = amount.amount.saturating_sub(&fee_in_asset);
        if deposit_value.is_zero() {
            errors.push(format!("add amount {amount} does not cover the entry fee"));
        }

        let synth = Asset::new(asset.chain, asset.symbol.clone(), true);
        Ok(EstimateAddSaver {
            asset_amount: amount,
            estimated_deposit_value: CryptoAmount::new(deposit_value, asset.clone()),
            slip_bps: single.slip * Decimal::from(BPS_SCALE),
            fee: CryptoAmount::new(fee_in_asset, asset),
            memo: format!("+:{synth}"),
            to_address,
            expiry: Utc::now() + Duration::minutes(QUOTE_TTL_MINUTES),
            can_add_saver: errors.is_empty(),
            errors,
        })
    }

    /// Current valuation of a saver position: the member's share of the
    /// saver vault depth versus the recorded deposit.
    pub async fn get_saver_position(
        &self,
        asset: &Asset,
        address: &str,
    ) -> Result<SaversPosition, QueryError> {
        let pool = self.source.get_pool(asset).await?;
        let record = self
            .source
            .get_saver_record(asset, address)
            .await?
            .filter(|record| !record.units.is_zero())
            .ok_or_else(|| QueryError::PositionNotFound {
                asset: asset.to_string(),
                address: address.to_string(),
            })?;
        if pool.savers_units.is_zero() {
            return Err(QueryError::InvalidPoolState(asset.to_string()));
        }

        let redeemable = record
            .units
            .checked_mul(pool.savers_depth.raw)
            .ok_or(QueryError::Overflow("saver redeem value"))?
            / pool.savers_units;
        let redeemable = BaseAmount::new(redeemable, pool.savers_depth.decimals);

        let deposit = record.asset_deposit_value;
        let growth_percent = if deposit.is_zero() {
            Decimal::ZERO
        } else {
            (redeemable.to_decimal()? - deposit.to_decimal()?) / deposit.to_decimal()?
                * Decimal::ONE_HUNDRED
        };

        let current_height = self.settlement_height().await?;
        let elapsed = current_height.saturating_sub(record.last_add_height);
        let age_days = Decimal::from(elapsed) * Decimal::from(6u64) / Decimal::from(86_400u64);

        Ok(SaversPosition {
            asset: asset.clone(),
            deposit_value: CryptoAmount::new(deposit, asset.clone()),
            redeemable_value: CryptoAmount::new(redeemable, asset.clone()),
            growth_percent,
            age_days,
        })
    }

    /// Withdraw estimate for a saver position: requested share of the
    /// redeemable value, priced with exit slip and the outbound fee.
    pub async fn estimate_withdraw_saver(
        &self,
        params: &SaversWithdraw,
    ) -> Result<EstimateWithdrawSaver, QueryError> {
        let mut errors = Vec::new();
        if params.withdraw_bps > BPS_SCALE {
            errors.push(format!(
                "withdraw basis points {} out of bound [0 - 10000]",
                params.withdraw_bps
            ));
        }
        let position = self.get_saver_position(&params.asset, &params.address).await?;
        let pool = self.source.get_pool(&params.asset).await?;

        let withdraw_raw = position
            .redeemable_value
            .amount
            .raw
            .checked_mul(U256::from(params.withdraw_bps.min(BPS_SCALE)))
            .ok_or(QueryError::Overflow("saver withdraw share"))?
            / U256::from(BPS_SCALE);
        let withdraw_amount = BaseAmount::new(withdraw_raw, position.redeemable_value.amount.decimals);

        let single = get_single_swap(withdraw_amount, &pool, true)?;
        let inbound = self
            .source
            .get_inbound_addresses()
            .await?
            .into_iter()
            .find(|entry| entry.chain == params.asset.chain);
        let outbound_fee = inbound
            .as_ref()
            .map(|entry| entry.outbound_fee)
            .unwrap_or_else(|| BaseAmount::zero(withdraw_amount.decimals));
        let expected = withdraw_amount.saturating_sub(&outbound_fee);
        if expected.is_zero() {
            errors.push("withdraw amount does not cover the outbound fee".to_string());
        }

        let synth = Asset::new(params.asset.chain, params.asset.symbol.clone(), true);
        let to_address = inbound.map(|entry| entry.address).unwrap_or_default();

        Ok(EstimateWithdrawSaver {
            expected_asset_amount: CryptoAmount::new(expected, params.asset.clone()),
            fee: CryptoAmount::new(outbound_fee, params.asset.clone()),
            slip_bps: single.slip * Decimal::from(BPS_SCALE),
            memo: format!("-:{synth}:{}", params.withdraw_bps),
            to_address,
            errors,
        })
    }

    async fn settlement_height(&self) -> Result<u64, QueryError> {
        let blocks = self.source.get_last_blocks().await?;
        blocks
            .first()
            .map(|block| block.thorchain)
            .ok_or_else(|| QueryError::UpstreamFetch("no block heights reported".to_string()))
    }
}

/// `=:ASSET:destaddr:LIM[:affiliate:bps]`, the venue's deposit memo
/// grammar for swaps.
fn build_swap_memo(
    destination: &Asset,
    destination_address: &str,
    limit: &BaseAmount,
    affiliate_address: Option<&str>,
    affiliate_bps: u32,
) -> String {
    let mut memo = format!("=:{destination}:{destination_address}:{}", limit.raw);
    if let Some(affiliate) = affiliate_address {
        memo.push_str(&format!(":{affiliate}:{affiliate_bps}"));
    }
    memo
}
