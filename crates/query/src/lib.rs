//! Settlement-layer query engine.
//!
//! Turns pool snapshots and member records served by a [`NodeSource`]
//! into swap quotes, liquidity and saver position valuations, and swap
//! history. The engine itself holds no cache and no mutable state; every
//! call is a fresh read of the upstream snapshot.

pub mod engine;
pub mod history;
pub mod source;
pub mod thornode;

pub use engine::{EstimateSwapParams, QueryEngine, SaversWithdraw};
pub use history::SwapTracker;
pub use source::{
    DepositRecord, InboundAddress, LastBlock, NetworkValues, NodeSource, ObservedStatus,
    ObservedTx, SaverRecord,
};
pub use thornode::ThornodeClient;
