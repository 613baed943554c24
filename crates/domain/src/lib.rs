//! Core domain model for cross-chain swap routing.
//!
//! Everything in this crate is pure and synchronous: assets, base-unit
//! amounts, pool snapshots, the constant-product swap math and the
//! liquidity position math. Network access lives in the query crate;
//! this crate only ever consumes pool state passed in by the caller.

pub mod amount;
pub mod asset;
pub mod error;
pub mod math;
pub mod pool;
pub mod quote;

pub use amount::{BaseAmount, CryptoAmount, NATIVE_DECIMALS};
pub use asset::{Asset, Chain};
pub use error::QueryError;
pub use pool::{PoolData, PoolStatus};
