//! Strategy contract.

use async_trait::async_trait;
use market_core::{MarketSnapshot, RunContext};

use crate::action::Action;
use crate::portfolio::Portfolio;

/// Decides how a portfolio should change in response to a snapshot.
///
/// `rebalance` only reads the portfolio; the engine applies the returned
/// actions in order. Long-running implementations should poll
/// [`RunContext::check`] and return its error when the run is cancelled.
#[async_trait]
pub trait Strategy: Send + Sync {
    /// Get strategy name.
    fn name(&self) -> &str;

    async fn rebalance(
        &self,
        ctx: &RunContext,
        portfolio: &Portfolio,
        snapshot: &MarketSnapshot,
    ) -> anyhow::Result<Vec<Box<dyn Action>>>;
}
