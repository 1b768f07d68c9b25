//! Position contract and the built-in spot holding.

use market_core::{Amount, MarketSnapshot, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of a held position.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionType {
    Spot,
    LiquidityPool,
    Derivative,
    OrderBook,
    /// Anything the built-in categories do not cover.
    Custom(String),
}

impl fmt::Display for PositionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositionType::Spot => write!(f, "spot"),
            PositionType::LiquidityPool => write!(f, "liquidity_pool"),
            PositionType::Derivative => write!(f, "derivative"),
            PositionType::OrderBook => write!(f, "order_book"),
            PositionType::Custom(name) => write!(f, "custom:{}", name),
        }
    }
}

/// A holding that can value itself against a market snapshot.
///
/// Positions are immutable once created and shared as `Arc<dyn Position>`,
/// so valuing the same position against the same snapshot always yields the
/// same amount.
pub trait Position: Send + Sync + fmt::Debug {
    /// Identifier, unique within a portfolio.
    fn id(&self) -> &str;

    fn kind(&self) -> PositionType;

    /// Current value in the quote currency.
    fn value(&self, snapshot: &MarketSnapshot) -> Result<Amount>;
}

/// A quantity of one symbol valued at the snapshot price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpotPosition {
    pub id: String,
    pub symbol: String,
    pub quantity: Amount,
}

impl SpotPosition {
    pub fn new(id: impl Into<String>, symbol: impl Into<String>, quantity: Amount) -> Self {
        Self {
            id: id.into(),
            symbol: symbol.into(),
            quantity,
        }
    }
}

impl Position for SpotPosition {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> PositionType {
        PositionType::Spot
    }

    fn value(&self, snapshot: &MarketSnapshot) -> Result<Amount> {
        let price = snapshot.price(&self.symbol)?;
        self.quantity.checked_mul_price(price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use market_core::{Error, Price, Time};

    fn snapshot() -> MarketSnapshot {
        MarketSnapshot::new(Time::from_unix(1_700_000_000).unwrap())
            .with_price("ETH", "2500.50".parse::<Price>().unwrap())
    }

    #[test]
    fn test_spot_value() {
        let pos = SpotPosition::new("eth-1", "ETH", "2".parse().unwrap());
        assert_eq!(pos.value(&snapshot()).unwrap(), "5001".parse().unwrap());
        assert_eq!(pos.kind(), PositionType::Spot);
        assert_eq!(pos.id(), "eth-1");
    }

    #[test]
    fn test_spot_value_idempotent() {
        let pos = SpotPosition::new("eth-1", "ETH", "0.3".parse().unwrap());
        let snap = snapshot();
        assert_eq!(pos.value(&snap).unwrap(), pos.value(&snap).unwrap());
    }

    #[test]
    fn test_missing_price() {
        let pos = SpotPosition::new("btc-1", "BTC", Amount::ONE);
        assert!(matches!(
            pos.value(&snapshot()),
            Err(Error::PriceNotAvailable { symbol }) if symbol == "BTC"
        ));
    }

    #[test]
    fn test_position_type_display() {
        assert_eq!(PositionType::LiquidityPool.to_string(), "liquidity_pool");
        assert_eq!(PositionType::Custom("vault".into()).to_string(), "custom:vault");
    }
}
