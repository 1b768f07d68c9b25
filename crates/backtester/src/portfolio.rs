//! Portfolio ledger: uniquely-identified positions plus a signed cash balance.

use market_core::{Amount, Decimal, Error, MarketSnapshot, Result};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::position::{Position, PositionType};

/// Portfolio shared across tasks. Hold the write guard across any
/// read-then-write sequence.
pub type SharedPortfolio = Arc<RwLock<Portfolio>>;

/// Positions keyed by id, plus cash.
///
/// Cash is signed so that debits beyond the balance are representable; the
/// public [`Portfolio::cash`] and [`Portfolio::value`] views clamp at zero.
/// Cloning shares the underlying positions, which are immutable.
#[derive(Debug, Clone, Default)]
pub struct Portfolio {
    positions: BTreeMap<String, Arc<dyn Position>>,
    cash: Decimal,
}

impl Portfolio {
    pub fn new(initial_cash: Amount) -> Self {
        Self {
            positions: BTreeMap::new(),
            cash: initial_cash.value(),
        }
    }

    /// Wrap into a [`SharedPortfolio`].
    pub fn shared(self) -> SharedPortfolio {
        Arc::new(RwLock::new(self))
    }

    /// Add a position. Fails without modifying the portfolio when the id is
    /// empty or already held.
    pub fn add_position(&mut self, position: Arc<dyn Position>) -> Result<()> {
        let id = position.id();
        if id.is_empty() {
            return Err(Error::MissingArgument { what: "position id" });
        }
        if self.positions.contains_key(id) {
            return Err(Error::DuplicatePosition { id: id.to_string() });
        }

        debug!(position_id = %id, kind = %position.kind(), "Adding position");
        self.positions.insert(id.to_string(), position);
        Ok(())
    }

    /// Remove a position, returning it.
    pub fn remove_position(&mut self, id: &str) -> Result<Arc<dyn Position>> {
        let removed = self
            .positions
            .remove(id)
            .ok_or_else(|| Error::PositionNotFound { id: id.to_string() })?;
        debug!(position_id = %id, "Removed position");
        Ok(removed)
    }

    /// Swap the position held under `id` for `new_position`, returning the old one.
    ///
    /// The new position may carry a different id as long as it does not collide
    /// with another held position.
    pub fn replace_position(
        &mut self,
        id: &str,
        new_position: Arc<dyn Position>,
    ) -> Result<Arc<dyn Position>> {
        if !self.positions.contains_key(id) {
            return Err(Error::PositionNotFound { id: id.to_string() });
        }
        let new_id = new_position.id();
        if new_id.is_empty() {
            return Err(Error::MissingArgument { what: "position id" });
        }
        if new_id != id && self.positions.contains_key(new_id) {
            return Err(Error::DuplicatePosition {
                id: new_id.to_string(),
            });
        }

        let old = self
            .positions
            .remove(id)
            .ok_or_else(|| Error::PositionNotFound { id: id.to_string() })?;
        debug!(old_id = %id, new_id = %new_id, "Replaced position");
        self.positions.insert(new_id.to_string(), new_position);
        Ok(old)
    }

    pub fn get_position(&self, id: &str) -> Option<Arc<dyn Position>> {
        self.positions.get(id).cloned()
    }

    pub fn has_position(&self, id: &str) -> bool {
        self.positions.contains_key(id)
    }

    /// All positions in id order. The returned vector is independent of the
    /// portfolio.
    pub fn positions(&self) -> Vec<Arc<dyn Position>> {
        self.positions.values().cloned().collect()
    }

    pub fn positions_by_type(&self, kind: &PositionType) -> Vec<Arc<dyn Position>> {
        self.positions
            .values()
            .filter(|p| &p.kind() == kind)
            .cloned()
            .collect()
    }

    pub fn position_count(&self) -> usize {
        self.positions.len()
    }

    /// Cash balance clamped at zero.
    pub fn cash(&self) -> Amount {
        Amount::from_clamped(self.cash)
    }

    /// Signed cash balance.
    pub fn cash_decimal(&self) -> Decimal {
        self.cash
    }

    /// Credit (positive) or debit (negative) cash. The balance may go negative.
    pub fn adjust_cash(&mut self, delta: Decimal) {
        self.cash = Decimal::from_raw(self.cash.raw().saturating_add(delta.raw()));
    }

    pub fn set_cash(&mut self, cash: Amount) {
        self.cash = cash.value();
    }

    /// Sum of all position values.
    pub fn positions_value(&self, snapshot: &MarketSnapshot) -> Result<Amount> {
        let values = self
            .positions
            .values()
            .map(|p| p.value(snapshot))
            .collect::<Result<Vec<_>>>()?;
        Amount::checked_sum(values)
    }

    /// Cash plus every position's value, clamped at zero. Any position failing
    /// to value fails the whole call.
    pub fn value(&self, snapshot: &MarketSnapshot) -> Result<Amount> {
        let positions = self.positions_value(snapshot)?;
        let total = self.cash.checked_add(positions.value())?;
        Ok(Amount::from_clamped(total))
    }

    /// Drop every position and zero the cash balance.
    pub fn clear(&mut self) {
        self.positions.clear();
        self.cash = Decimal::ZERO;
    }
}
