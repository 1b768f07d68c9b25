//! Order book contract and a matching-free reference ledger.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

use super::{MarketMechanism, MechanismType};
use crate::context::RunContext;
use crate::types::{Amount, Decimal, Price};
use crate::{Error, Result};

/// Side of the order (buy or sell).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

/// Type of order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    Limit,
    Market,
}

/// Identifier unique within one book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OrderId(pub u64);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "order-{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub side: OrderSide,
    pub order_type: OrderType,
    pub price: Price,
    pub amount: Amount,
}

impl OrderRequest {
    pub fn limit(side: OrderSide, price: Price, amount: Amount) -> Self {
        Self {
            side,
            order_type: OrderType::Limit,
            price,
            amount,
        }
    }

    pub fn limit_buy(price: Price, amount: Amount) -> Self {
        Self::limit(OrderSide::Buy, price, amount)
    }

    pub fn limit_sell(price: Price, amount: Amount) -> Self {
        Self::limit(OrderSide::Sell, price, amount)
    }
}

/// Top of one side of the book. Both fields are zero when the side is empty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub price: Price,
    pub amount: Amount,
}

impl Quote {
    pub fn is_empty(&self) -> bool {
        self.amount.is_zero()
    }
}

/// A single aggregated price level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceLevel {
    pub price: Price,
    pub amount: Amount,
    pub orders: usize,
}

/// Order ledger without matching.
pub trait OrderBook: MarketMechanism {
    /// Highest bid; a zero quote when there are no bids.
    fn best_bid(&self, ctx: &RunContext) -> Result<Quote>;

    /// Lowest ask; a zero quote when there are no asks.
    fn best_ask(&self, ctx: &RunContext) -> Result<Quote>;

    fn place_order(&mut self, ctx: &RunContext, order: &OrderRequest) -> Result<OrderId>;

    fn cancel_order(&mut self, ctx: &RunContext, id: OrderId) -> Result<()>;

    /// Aggregated levels for `side`, best first, at most `levels` entries.
    fn depth(&self, ctx: &RunContext, side: OrderSide, levels: usize) -> Result<Vec<PriceLevel>>;

    /// Fails with [`Error::CrossedBook`] when best bid >= best ask.
    fn check_not_crossed(&self, ctx: &RunContext) -> Result<()> {
        let bid = self.best_bid(ctx)?;
        let ask = self.best_ask(ctx)?;
        if !bid.is_empty() && !ask.is_empty() && bid.price >= ask.price {
            return Err(Error::CrossedBook {
                bid: bid.price.to_string(),
                ask: ask.price.to_string(),
            });
        }
        Ok(())
    }

    /// Midpoint of the touch, `None` unless both sides are populated.
    fn mid_price(&self, ctx: &RunContext) -> Result<Option<Price>> {
        let bid = self.best_bid(ctx)?;
        let ask = self.best_ask(ctx)?;
        if bid.is_empty() || ask.is_empty() {
            return Ok(None);
        }
        let sum = bid.price.checked_add(ask.price)?;
        sum.checked_div(Decimal::from(2)).map(Some)
    }
}

#[derive(Debug, Clone, Copy)]
struct RestingOrder {
    side: OrderSide,
    price: Price,
    amount: Amount,
}

/// In-memory reference [`OrderBook`].
///
/// Ids are sequential per ledger. Orders that would cross the opposite side
/// are rejected, and market orders are unsupported since nothing matches.
#[derive(Debug, Clone)]
pub struct OrderLedger {
    venue: String,
    next_id: u64,
    orders: BTreeMap<OrderId, RestingOrder>,
}

impl OrderLedger {
    pub fn new(venue: impl Into<String>) -> Self {
        Self {
            venue: venue.into(),
            next_id: 1,
            orders: BTreeMap::new(),
        }
    }

    pub fn order_count(&self) -> usize {
        self.orders.len()
    }

    fn levels(&self, side: OrderSide) -> Vec<PriceLevel> {
        let mut by_price: BTreeMap<Price, (Amount, usize)> = BTreeMap::new();
        for order in self.orders.values().filter(|o| o.side == side) {
            let entry = by_price.entry(order.price).or_insert((Amount::ZERO, 0));
            entry.0 = entry.0 + order.amount;
            entry.1 += 1;
        }
        let levels = by_price
            .into_iter()
            .map(|(price, (amount, orders))| PriceLevel { price, amount, orders });
        match side {
            OrderSide::Buy => levels.rev().collect(),
            OrderSide::Sell => levels.collect(),
        }
    }

    fn touch(&self, side: OrderSide) -> Quote {
        self.levels(side)
            .first()
            .map(|level| Quote {
                price: level.price,
                amount: level.amount,
            })
            .unwrap_or_default()
    }
}

impl MarketMechanism for OrderLedger {
    fn mechanism(&self) -> MechanismType {
        MechanismType::OrderBook
    }

    fn venue(&self) -> &str {
        &self.venue
    }
}

impl OrderBook for OrderLedger {
    fn best_bid(&self, ctx: &RunContext) -> Result<Quote> {
        ctx.check()?;
        Ok(self.touch(OrderSide::Buy))
    }

    fn best_ask(&self, ctx: &RunContext) -> Result<Quote> {
        ctx.check()?;
        Ok(self.touch(OrderSide::Sell))
    }

    fn place_order(&mut self, ctx: &RunContext, order: &OrderRequest) -> Result<OrderId> {
        ctx.check()?;
        if order.order_type == OrderType::Market {
            return Err(Error::Unsupported {
                venue: self.venue.clone(),
                operation: "market order".to_string(),
            });
        }
        if order.amount.is_zero() {
            return Err(Error::InvalidParameter {
                name: "amount",
                reason: "order amount must be positive".to_string(),
            });
        }

        let crossed = match order.side {
            OrderSide::Buy => {
                let ask = self.touch(OrderSide::Sell);
                (!ask.is_empty() && order.price >= ask.price).then_some((order.price, ask.price))
            }
            OrderSide::Sell => {
                let bid = self.touch(OrderSide::Buy);
                (!bid.is_empty() && bid.price >= order.price).then_some((bid.price, order.price))
            }
        };
        if let Some((bid, ask)) = crossed {
            return Err(Error::CrossedBook {
                bid: bid.to_string(),
                ask: ask.to_string(),
            });
        }

        let id = OrderId(self.next_id);
        self.next_id += 1;
        self.orders.insert(
            id,
            RestingOrder {
                side: order.side,
                price: order.price,
                amount: order.amount,
            },
        );
        debug!(
            venue = %self.venue,
            order_id = %id,
            side = ?order.side,
            price = %order.price,
            amount = %order.amount,
            "Order placed"
        );
        Ok(id)
    }

    fn cancel_order(&mut self, ctx: &RunContext, id: OrderId) -> Result<()> {
        ctx.check()?;
        match self.orders.remove(&id) {
            Some(_) => {
                debug!(venue = %self.venue, order_id = %id, "Order cancelled");
                Ok(())
            }
            None => Err(Error::OrderNotFound { id: id.to_string() }),
        }
    }

    fn depth(&self, ctx: &RunContext, side: OrderSide, levels: usize) -> Result<Vec<PriceLevel>> {
        ctx.check()?;
        let mut all = self.levels(side);
        all.truncate(levels);
        Ok(all)
    }
}
