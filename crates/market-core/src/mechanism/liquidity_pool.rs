//! Liquidity pool contract.

use serde::{Deserialize, Serialize};

use super::MarketMechanism;
use crate::context::RunContext;
use crate::types::{Amount, Decimal, Price};
use crate::{Error, Result};

/// A pair of token quantities, ordered as the pool orders its tokens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenAmounts {
    pub amount0: Amount,
    pub amount1: Amount,
}

impl TokenAmounts {
    pub fn new(amount0: Amount, amount1: Amount) -> Self {
        Self { amount0, amount1 }
    }

    /// Value of both legs in token1 terms, given the token0 price in token1.
    pub fn value_in_token1(&self, price0: Price) -> Result<Amount> {
        self.amount0.checked_mul_price(price0)?.checked_add(self.amount1)
    }
}

/// Inputs for [`LiquidityPool::calculate`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PoolParams {
    pub pool_id: String,
    pub reserves: TokenAmounts,
    pub total_liquidity: Amount,
    /// Optional `(lower, upper)` price bounds for concentrated pools.
    pub price_range: Option<(Price, Price)>,
}

/// Derived pool state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PoolState {
    pub pool_id: String,
    pub reserves: TokenAmounts,
    pub total_liquidity: Amount,
    /// Price of token0 denominated in token1.
    pub spot_price: Price,
    pub fee_rate: Decimal,
}

/// Result of depositing into a pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidityReceipt {
    pub liquidity: Amount,
    /// Amounts actually taken from the depositor.
    pub deposited: TokenAmounts,
}

/// Pure pool math over explicit parameters.
///
/// Implementations must not mutate pool state: calling `add_liquidity` and then
/// `remove_liquidity` with the minted liquidity against the same `PoolState`
/// returns the deposited amounts, less whatever [`LiquidityPool::fee_rate`]
/// declares.
pub trait LiquidityPool: MarketMechanism {
    fn calculate(&self, ctx: &RunContext, params: &PoolParams) -> Result<PoolState>;

    fn add_liquidity(
        &self,
        ctx: &RunContext,
        state: &PoolState,
        amounts: &TokenAmounts,
    ) -> Result<LiquidityReceipt>;

    fn remove_liquidity(
        &self,
        ctx: &RunContext,
        state: &PoolState,
        liquidity: Amount,
    ) -> Result<TokenAmounts>;

    /// Fraction withheld on a deposit/withdraw round trip.
    fn fee_rate(&self) -> Decimal {
        Decimal::ZERO
    }
}

/// Check the add/remove round-trip contract for `pool` at `state`.
///
/// Returns the amounts handed back so callers can inspect them; fails with
/// [`Error::Mechanism`] when either leg drifts by more than the declared fee.
pub fn check_round_trip<P: LiquidityPool + ?Sized>(
    pool: &P,
    ctx: &RunContext,
    state: &PoolState,
    deposit: &TokenAmounts,
) -> Result<TokenAmounts> {
    let receipt = pool.add_liquidity(ctx, state, deposit)?;
    let returned = pool.remove_liquidity(ctx, state, receipt.liquidity)?;

    let keep = Decimal::ONE.checked_sub(pool.fee_rate())?;
    let legs = [
        (receipt.deposited.amount0, returned.amount0),
        (receipt.deposited.amount1, returned.amount1),
    ];
    for (put_in, got_back) in legs {
        let floor = put_in.value().checked_mul(keep)?;
        if got_back.value() < floor || got_back > put_in {
            return Err(Error::Mechanism {
                venue: pool.venue().to_string(),
                message: format!(
                    "round trip returned {got_back} for a deposit of {put_in} (fee rate {})",
                    pool.fee_rate()
                ),
            });
        }
    }
    Ok(returned)
}
