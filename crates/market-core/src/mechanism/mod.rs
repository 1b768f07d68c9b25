//! Contracts for pluggable market mechanisms.
//!
//! Concrete math (AMM curves, option models, matching) lives outside this
//! crate. The pipeline only ever sees these traits, so a new mechanism
//! category is added by writing another trait and implementations, never by
//! editing a dispatch site.

pub mod derivative;
pub mod liquidity_pool;
pub mod order_book;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use derivative::{Derivative, DerivativeParams, Greeks};
pub use liquidity_pool::{
    check_round_trip, LiquidityPool, LiquidityReceipt, PoolParams, PoolState, TokenAmounts,
};
pub use order_book::{
    OrderBook, OrderId, OrderLedger, OrderRequest, OrderSide, OrderType, PriceLevel, Quote,
};

/// Mechanism category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MechanismType {
    LiquidityPool,
    Derivative,
    OrderBook,
}

impl fmt::Display for MechanismType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MechanismType::LiquidityPool => "liquidity_pool",
            MechanismType::Derivative => "derivative",
            MechanismType::OrderBook => "order_book",
        };
        f.write_str(name)
    }
}

/// Capability shared by every mechanism.
pub trait MarketMechanism: Send + Sync {
    fn mechanism(&self) -> MechanismType;

    /// Venue identifier, e.g. `"uniswap-v3"` or `"deribit"`.
    fn venue(&self) -> &str;
}
