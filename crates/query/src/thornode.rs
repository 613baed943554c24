//! REST client for a thornode-style settlement node.
//!
//! Wire amounts arrive as decimal strings in 8-decimal base units; they
//! are parsed into `U256` without ever passing through a float. Any
//! transport or decode failure maps to [`QueryError::UpstreamFetch`] so
//! the aggregation layer can degrade the affected venue instead of
//! failing the whole request.

use crate::source::{
    DepositRecord, InboundAddress, LastBlock, NetworkValues, NodeSource, ObservedStatus,
    ObservedTx, SaverRecord,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use crosspool_domain::quote::TxRef;
use crosspool_domain::{
    Asset, BaseAmount, Chain, CryptoAmount, PoolData, PoolStatus, QueryError,
};
use primitive_types::U256;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

pub struct ThornodeClient {
    base_url: String,
    http: reqwest::Client,
}

impl ThornodeClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, QueryError> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self, QueryError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| QueryError::UpstreamFetch(e.to_string()))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    async fn fetch<T: DeserializeOwned>(&self, path: &str) -> Result<T, QueryError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "fetching");
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| QueryError::UpstreamFetch(format!("{url}: {e}")))?;
        if !response.status().is_success() {
            return Err(QueryError::UpstreamFetch(format!(
                "{url}: status {}",
                response.status()
            )));
        }
        response
            .json::<T>()
            .await
            .map_err(|e| QueryError::UpstreamFetch(format!("{url}: {e}")))
    }

    /// Like `fetch`, but a 404 means "no record" rather than a failure.
    async fn fetch_optional<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, QueryError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| QueryError::UpstreamFetch(format!("{url}: {e}")))?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(QueryError::UpstreamFetch(format!(
                "{url}: status {}",
                response.status()
            )));
        }
        response
            .json::<T>()
            .await
            .map(Some)
            .map_err(|e| QueryError::UpstreamFetch(format!("{url}: {e}")))
    }
}

fn parse_u256(value: &str, field: &str) -> Result<U256, QueryError> {
    U256::from_dec_str(value.trim())
        .map_err(|_| QueryError::UpstreamFetch(format!("bad amount in {field}: {value:?}")))
}

fn parse_base_amount(value: &str, field: &str) -> Result<BaseAmount, QueryError> {
    Ok(BaseAmount::native(parse_u256(value, field)?))
}

#[derive(Debug, Deserialize)]
pub(crate) struct PoolDto {
    pub asset: String,
    pub status: String,
    pub balance_asset: String,
    pub balance_rune: String,
    #[serde(rename = "LP_units")]
    pub lp_units: String,
    #[serde(default)]
    pub savers_depth: String,
    #[serde(default)]
    pub savers_units: String,
}

impl PoolDto {
    pub(crate) fn into_pool(self) -> Result<PoolData, QueryError> {
        let status = match self.status.as_str() {
            "Available" => PoolStatus::Available,
            "Staged" => PoolStatus::Staged,
            _ => PoolStatus::Suspended,
        };
        let savers_depth = if self.savers_depth.is_empty() {
            BaseAmount::native(0u64)
        } else {
            parse_base_amount(&self.savers_depth, "savers_depth")?
        };
        let savers_units = if self.savers_units.is_empty() {
            U256::zero()
        } else {
            parse_u256(&self.savers_units, "savers_units")?
        };
        Ok(PoolData {
            asset: Asset::from_str(&self.asset)?,
            asset_balance: parse_base_amount(&self.balance_asset, "balance_asset")?,
            rune_balance: parse_base_amount(&self.balance_rune, "balance_rune")?,
            lp_units: parse_u256(&self.lp_units, "LP_units")?,
            savers_depth,
            savers_units,
            status,
        })
    }
}

#[derive(Debug, Deserialize)]
struct LiquidityProviderDto {
    units: String,
    #[serde(default)]
    last_add_height: u64,
    asset_deposit_value: String,
    rune_deposit_value: String,
}

#[derive(Debug, Deserialize)]
struct SaverDto {
    units: String,
    #[serde(default)]
    last_add_height: u64,
    asset_deposit_value: String,
}

#[derive(Debug, Deserialize)]
struct CoinDto {
    asset: String,
    amount: String,
}

#[derive(Debug, Deserialize)]
struct TxInfoDto {
    id: String,
    chain: String,
    from_address: String,
    #[serde(default)]
    memo: String,
    coins: Vec<CoinDto>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ObservedTxDto {
    tx: TxInfoDto,
    status: String,
    #[serde(default)]
    date: Option<DateTime<Utc>>,
    #[serde(default)]
    out_txs: Vec<TxInfoDto>,
}

impl TxInfoDto {
    fn into_ref(self) -> Result<(TxRef, Chain, String), QueryError> {
        let chain: Chain = self.chain.parse()?;
        let coin = self
            .coins
            .into_iter()
            .next()
            .ok_or_else(|| QueryError::UpstreamFetch(format!("tx {} has no coins", self.id)))?;
        let amount = CryptoAmount::new(
            parse_base_amount(&coin.amount, "coin amount")?,
            Asset::from_str(&coin.asset)?,
        );
        Ok((
            TxRef {
                hash: self.id,
                address: self.from_address,
                amount,
            },
            chain,
            self.memo,
        ))
    }
}

impl ObservedTxDto {
    pub(crate) fn into_observed(self) -> Result<ObservedTx, QueryError> {
        let status = match self.status.as_str() {
            "done" => ObservedStatus::Done,
            "refunded" | "reverted" => ObservedStatus::Refunded,
            _ => ObservedStatus::Observed,
        };
        let out_tx = self
            .out_txs
            .into_iter()
            .next()
            .map(|dto| dto.into_ref().map(|(tx, _, _)| tx))
            .transpose()?;
        let (tx, chain, memo) = self.tx.into_ref()?;
        Ok(ObservedTx {
            tx,
            chain,
            memo,
            status,
            date: self.date.unwrap_or_else(Utc::now),
            out_tx,
        })
    }
}

#[derive(Debug, Deserialize)]
struct TxEnvelopeDto {
    observed_tx: Option<ObservedTxDto>,
}

#[derive(Debug, Deserialize)]
struct LastBlockDto {
    chain: String,
    #[serde(default)]
    last_observed_in: u64,
    thorchain: u64,
}

#[derive(Debug, Deserialize)]
struct InboundAddressDto {
    chain: String,
    address: String,
    #[serde(default)]
    gas_rate: String,
    #[serde(default)]
    outbound_fee: String,
    #[serde(default)]
    halted: bool,
}

#[derive(Debug, Deserialize)]
struct MimirDto {
    #[serde(rename = "FULLIMPLOSSPROTECTIONBLOCKS", default)]
    full_protection_blocks: Option<u64>,
    #[serde(rename = "NATIVETRANSACTIONFEE", default)]
    native_tx_fee: Option<u64>,
}

/// ~100 days of 6-second blocks, the venue default when mimir is silent.
const DEFAULT_FULL_PROTECTION_BLOCKS: u64 = 1_440_000;
/// 0.02 native units.
const DEFAULT_NATIVE_TX_FEE: u64 = 2_000_000;

#[async_trait]
impl NodeSource for ThornodeClient {
    async fn get_pool(&self, asset: &Asset) -> Result<PoolData, QueryError> {
        let dto: Option<PoolDto> = self.fetch_optional(&format!("/pool/{asset}")).await?;
        match dto {
            Some(dto) => dto.into_pool(),
            None => Err(QueryError::UnsupportedAsset(asset.to_string())),
        }
    }

    async fn get_pools(&self) -> Result<Vec<PoolData>, QueryError> {
        let dtos: Vec<PoolDto> = self.fetch("/pools").await?;
        dtos.into_iter().map(PoolDto::into_pool).collect()
    }

    async fn get_deposit_record(
        &self,
        asset: &Asset,
        address: &str,
    ) -> Result<Option<DepositRecord>, QueryError> {
        let dto: Option<LiquidityProviderDto> = self
            .fetch_optional(&format!("/pool/{asset}/liquidity_provider/{address}"))
            .await?;
        dto.map(|dto| {
            Ok(DepositRecord {
                units: parse_u256(&dto.units, "units")?,
                last_add_height: dto.last_add_height,
                asset_deposit_value: parse_base_amount(&dto.asset_deposit_value, "asset_deposit_value")?,
                rune_deposit_value: parse_base_amount(&dto.rune_deposit_value, "rune_deposit_value")?,
            })
        })
        .transpose()
    }

    async fn get_saver_record(
        &self,
        asset: &Asset,
        address: &str,
    ) -> Result<Option<SaverRecord>, QueryError> {
        let dto: Option<SaverDto> = self
            .fetch_optional(&format!("/pool/{asset}/saver/{address}"))
            .await?;
        dto.map(|dto| {
            Ok(SaverRecord {
                units: parse_u256(&dto.units, "units")?,
                last_add_height: dto.last_add_height,
                asset_deposit_value: parse_base_amount(&dto.asset_deposit_value, "asset_deposit_value")?,
            })
        })
        .transpose()
    }

    async fn get_observed_txs(
        &self,
        chain: Chain,
        address: &str,
    ) -> Result<Vec<ObservedTx>, QueryError> {
        let dtos: Vec<ObservedTxDto> = self
            .fetch(&format!("/observed_txs?chain={chain}&from_address={address}"))
            .await?;
        dtos.into_iter().map(ObservedTxDto::into_observed).collect()
    }

    async fn get_tx(&self, hash: &str) -> Result<Option<ObservedTx>, QueryError> {
        let envelope: Option<TxEnvelopeDto> = self.fetch_optional(&format!("/tx/{hash}")).await?;
        envelope
            .and_then(|e| e.observed_tx)
            .map(ObservedTxDto::into_observed)
            .transpose()
    }

    async fn get_last_blocks(&self) -> Result<Vec<LastBlock>, QueryError> {
        let dtos: Vec<LastBlockDto> = self.fetch("/lastblock").await?;
        dtos.into_iter()
            .map(|dto| {
                Ok(LastBlock {
                    chain: dto.chain.parse()?,
                    last_observed_in: dto.last_observed_in,
                    thorchain: dto.thorchain,
                })
            })
            .collect()
    }

    async fn get_inbound_addresses(&self) -> Result<Vec<InboundAddress>, QueryError> {
        let dtos: Vec<InboundAddressDto> = self.fetch("/inbound_addresses").await?;
        dtos.into_iter()
            .map(|dto| {
                let gas_fee = if dto.gas_rate.is_empty() {
                    BaseAmount::native(0u64)
                } else {
                    parse_base_amount(&dto.gas_rate, "gas_rate")?
                };
                let outbound_fee = if dto.outbound_fee.is_empty() {
                    BaseAmount::native(0u64)
                } else {
                    parse_base_amount(&dto.outbound_fee, "outbound_fee")?
                };
                Ok(InboundAddress {
                    chain: dto.chain.parse()?,
                    address: dto.address,
                    gas_fee,
                    outbound_fee,
                    halted: dto.halted,
                })
            })
            .collect()
    }

    async fn get_network_values(&self) -> Result<NetworkValues, QueryError> {
        let dto: MimirDto = self.fetch("/mimir").await?;
        Ok(NetworkValues {
            full_protection_blocks: dto
                .full_protection_blocks
                .unwrap_or(DEFAULT_FULL_PROTECTION_BLOCKS),
            native_tx_fee: BaseAmount::native(
                dto.native_tx_fee.unwrap_or(DEFAULT_NATIVE_TX_FEE),
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_pool_dto() {
        let json = r#"{
            "asset": "BTC.BTC",
            "status": "Available",
            "balance_asset": "10000000000",
            "balance_rune": "250000000000000",
            "LP_units": "180000000000",
            "savers_depth": "5000000000",
            "savers_units": "4800000000"
        }"#;
        let dto: PoolDto = serde_json::from_str(json).unwrap();
        let pool = dto.into_pool().unwrap();
        assert_eq!(pool.asset.to_string(), "BTC.BTC");
        assert_eq!(pool.asset_balance.raw, U256::from(10_000_000_000u64));
        assert_eq!(pool.lp_units, U256::from(180_000_000_000u64));
        assert!(pool.can_swap());
    }

    #[test]
    fn rejects_malformed_amount() {
        let json = r#"{
            "asset": "BTC.BTC",
            "status": "Available",
            "balance_asset": "not-a-number",
            "balance_rune": "1",
            "LP_units": "1"
        }"#;
        let dto: PoolDto = serde_json::from_str(json).unwrap();
        assert!(matches!(dto.into_pool(), Err(QueryError::UpstreamFetch(_))));
    }

    #[test]
    fn decodes_observed_tx_with_outbound() {
        let json = r#"{
            "tx": {
                "id": "AB12",
                "chain": "BTC",
                "from_address": "bc1qsender",
                "memo": "=:ETH.ETH:0xdest",
                "coins": [{ "asset": "BTC.BTC", "amount": "100000000" }]
            },
            "status": "done",
            "date": "2024-03-17T14:29:09Z",
            "out_txs": [{
                "id": "CD34",
                "chain": "ETH",
                "from_address": "0xvault",
                "coins": [{ "asset": "ETH.ETH", "amount": "1770607901" }]
            }]
        }"#;
        let dto: ObservedTxDto = serde_json::from_str(json).unwrap();
        let observed = dto.into_observed().unwrap();
        assert_eq!(observed.status, ObservedStatus::Done);
        assert!(observed.is_swap());
        assert_eq!(observed.tx.hash, "AB12");
        assert_eq!(observed.out_tx.as_ref().unwrap().hash, "CD34");
    }
}
