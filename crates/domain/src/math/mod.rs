//! Pure swap and liquidity math over pool depth snapshots.

pub mod liquidity;
pub mod swap;
