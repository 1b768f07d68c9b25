//! Portfolio mutations issued by strategies.

use market_core::{Decimal, Result};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::portfolio::Portfolio;
use crate::position::Position;

/// A single mutation of a portfolio.
pub trait Action: Send + Sync + fmt::Debug {
    fn apply(&self, portfolio: &mut Portfolio) -> Result<()>;

    /// Human-readable description used in logs and error context.
    fn describe(&self) -> String;

    fn boxed(self) -> Box<dyn Action>
    where
        Self: Sized + 'static,
    {
        Box::new(self)
    }
}

#[derive(Debug, Clone)]
pub struct AddPosition {
    pub position: Arc<dyn Position>,
}

impl AddPosition {
    pub fn new(position: Arc<dyn Position>) -> Self {
        Self { position }
    }
}

impl Action for AddPosition {
    fn apply(&self, portfolio: &mut Portfolio) -> Result<()> {
        portfolio.add_position(Arc::clone(&self.position))
    }

    fn describe(&self) -> String {
        format!("add position {} ({})", self.position.id(), self.position.kind())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovePosition {
    pub id: String,
}

impl RemovePosition {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl Action for RemovePosition {
    fn apply(&self, portfolio: &mut Portfolio) -> Result<()> {
        portfolio.remove_position(&self.id).map(|_| ())
    }

    fn describe(&self) -> String {
        format!("remove position {}", self.id)
    }
}

/// Swap the position held under `id` for a new one.
#[derive(Debug, Clone)]
pub struct ReplacePosition {
    pub id: String,
    pub position: Arc<dyn Position>,
}

impl ReplacePosition {
    pub fn new(id: impl Into<String>, position: Arc<dyn Position>) -> Self {
        Self {
            id: id.into(),
            position,
        }
    }
}

impl Action for ReplacePosition {
    fn apply(&self, portfolio: &mut Portfolio) -> Result<()> {
        portfolio
            .replace_position(&self.id, Arc::clone(&self.position))
            .map(|_| ())
    }

    fn describe(&self) -> String {
        format!("replace position {} with {}", self.id, self.position.id())
    }
}

/// Credit or debit cash. Never fails; the balance may go negative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdjustCash {
    pub delta: Decimal,
    pub reason: String,
}

impl AdjustCash {
    pub fn new(delta: Decimal, reason: impl Into<String>) -> Self {
        Self {
            delta,
            reason: reason.into(),
        }
    }
}

impl Action for AdjustCash {
    fn apply(&self, portfolio: &mut Portfolio) -> Result<()> {
        portfolio.adjust_cash(self.delta);
        Ok(())
    }

    fn describe(&self) -> String {
        if self.reason.is_empty() {
            format!("adjust cash by {}", self.delta)
        } else {
            format!("adjust cash by {} ({})", self.delta, self.reason)
        }
    }
}

/// Applies its actions in order and stops at the first failure.
///
/// Not atomic: actions applied before the failing one stay applied.
#[derive(Debug, Default)]
pub struct Batch {
    pub actions: Vec<Box<dyn Action>>,
}

impl Batch {
    pub fn new(actions: Vec<Box<dyn Action>>) -> Self {
        Self { actions }
    }

    pub fn push(mut self, action: impl Action + 'static) -> Self {
        self.actions.push(Box::new(action));
        self
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

impl Action for Batch {
    fn apply(&self, portfolio: &mut Portfolio) -> Result<()> {
        for (index, action) in self.actions.iter().enumerate() {
            if let Err(e) = action.apply(portfolio) {
                debug!(index, action = %action.describe(), error = %e, "Batch stopped");
                return Err(e);
            }
        }
        Ok(())
    }

    fn describe(&self) -> String {
        let parts: Vec<String> = self.actions.iter().map(|a| a.describe()).collect();
        format!("batch [{}]", parts.join("; "))
    }
}
