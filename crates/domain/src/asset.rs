use crate::error::QueryError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Chains the routing core knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Chain {
    Thor,
    Maya,
    Btc,
    Eth,
    Ltc,
    Bch,
    Doge,
    Gaia,
    Avax,
    Bsc,
}

impl Chain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Chain::Thor => "THOR",
            Chain::Maya => "MAYA",
            Chain::Btc => "BTC",
            Chain::Eth => "ETH",
            Chain::Ltc => "LTC",
            Chain::Bch => "BCH",
            Chain::Doge => "DOGE",
            Chain::Gaia => "GAIA",
            Chain::Avax => "AVAX",
            Chain::Bsc => "BSC",
        }
    }

    /// Average block time, used to turn block heights into elapsed time.
    pub fn avg_block_time_secs(&self) -> u64 {
        match self {
            Chain::Thor | Chain::Maya | Chain::Gaia => 6,
            Chain::Btc | Chain::Bch => 600,
            Chain::Eth => 12,
            Chain::Ltc => 150,
            Chain::Doge => 60,
            Chain::Avax | Chain::Bsc => 3,
        }
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Chain {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "THOR" => Ok(Chain::Thor),
            "MAYA" => Ok(Chain::Maya),
            "BTC" => Ok(Chain::Btc),
            "ETH" => Ok(Chain::Eth),
            "LTC" => Ok(Chain::Ltc),
            "BCH" => Ok(Chain::Bch),
            "DOGE" => Ok(Chain::Doge),
            "GAIA" => Ok(Chain::Gaia),
            "AVAX" => Ok(Chain::Avax),
            "BSC" => Ok(Chain::Bsc),
            other => Err(QueryError::InvalidAsset(format!("unknown chain {other}"))),
        }
    }
}

/// An asset in `CHAIN.SYMBOL` notation, e.g. `BTC.BTC` or
/// `ETH.USDC-0XA0B8...`. Synths settle on the native chain and are written
/// with a slash, `BTC/BTC`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Asset {
    pub chain: Chain,
    /// Symbol including any contract suffix.
    pub symbol: String,
    /// Symbol up to the first `-`.
    pub ticker: String,
    pub synth: bool,
}

impl Asset {
    pub fn new(chain: Chain, symbol: impl Into<String>, synth: bool) -> Self {
        let symbol = symbol.into();
        let ticker = symbol.split('-').next().unwrap_or_default().to_string();
        Self {
            chain,
            symbol,
            ticker,
            synth,
        }
    }

    /// Native settlement asset of the THORChain-style venue.
    pub fn rune() -> Self {
        Asset::new(Chain::Thor, "RUNE", false)
    }

    /// Native settlement asset of the Mayachain-style venue.
    pub fn cacao() -> Self {
        Asset::new(Chain::Maya, "CACAO", false)
    }

    pub fn btc() -> Self {
        Asset::new(Chain::Btc, "BTC", false)
    }

    pub fn eth() -> Self {
        Asset::new(Chain::Eth, "ETH", false)
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sep = if self.synth { '/' } else { '.' };
        write!(f, "{}{}{}", self.chain, sep, self.symbol)
    }
}

impl FromStr for Asset {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (synth, sep) = if s.contains('/') {
            (true, '/')
        } else {
            (false, '.')
        };
        let (chain, symbol) = s
            .split_once(sep)
            .ok_or_else(|| QueryError::InvalidAsset(s.to_string()))?;
        if symbol.is_empty() {
            return Err(QueryError::InvalidAsset(s.to_string()));
        }
        Ok(Asset::new(chain.parse()?, symbol.to_uppercase(), synth))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_layer1_notation() {
        let asset: Asset = "BTC.BTC".parse().unwrap();
        assert_eq!(asset.chain, Chain::Btc);
        assert_eq!(asset.ticker, "BTC");
        assert!(!asset.synth);
        assert_eq!(asset.to_string(), "BTC.BTC");
    }

    #[test]
    fn parses_token_with_contract_suffix() {
        let asset: Asset = "ETH.USDC-0XA0B86991".parse().unwrap();
        assert_eq!(asset.ticker, "USDC");
        assert_eq!(asset.symbol, "USDC-0XA0B86991");
    }

    #[test]
    fn parses_synth_notation() {
        let asset: Asset = "BTC/BTC".parse().unwrap();
        assert!(asset.synth);
        assert_eq!(asset.to_string(), "BTC/BTC");
    }

    #[test]
    fn rejects_missing_separator() {
        assert!("BTCBTC".parse::<Asset>().is_err());
        assert!("BTC.".parse::<Asset>().is_err());
    }
}
