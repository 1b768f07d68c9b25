//! Sequential backtest engine.

use market_core::{Amount, Decimal, MarketSnapshot, RunContext, Time};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::BacktestConfig;
use crate::error::{BacktestError, Result};
use crate::portfolio::Portfolio;
use crate::strategy::Strategy;

macro_rules! step_event {
    ($detailed:expr, $($arg:tt)+) => {
        if $detailed {
            info!($($arg)+)
        } else {
            debug!($($arg)+)
        }
    };
}

/// Lifecycle of an engine. Each engine runs at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineState {
    Idle,
    Running,
    Completed,
    Aborted,
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineState::Idle => write!(f, "idle"),
            EngineState::Running => write!(f, "running"),
            EngineState::Completed => write!(f, "completed"),
            EngineState::Aborted => write!(f, "aborted"),
        }
    }
}

/// Portfolio value recorded after a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValuePoint {
    pub time: Time,
    pub value: Amount,
}

/// Result of a backtest run.
#[derive(Debug, Clone)]
pub struct BacktestResult {
    /// Identifier of the run, also present in log events.
    pub run_id: Uuid,
    /// Strategy name.
    pub strategy_name: String,
    /// Portfolio as it stood after the last step.
    pub portfolio: Portfolio,
    /// One point per snapshot, in snapshot order.
    pub value_history: Vec<ValuePoint>,
    /// Initial cash.
    pub initial_cash: Amount,
    /// (final value - initial cash) / initial cash.
    pub total_return: Decimal,
}

impl BacktestResult {
    /// Value at the last step, or the initial cash if there were no steps.
    pub fn final_value(&self) -> Amount {
        self.value_history
            .last()
            .map(|p| p.value)
            .unwrap_or(self.initial_cash)
    }

    /// Highest value seen, counting the initial cash.
    pub fn peak_value(&self) -> Amount {
        self.value_history
            .iter()
            .map(|p| p.value)
            .fold(self.initial_cash, Amount::max)
    }

    /// Largest peak-to-trough decline as a fraction of the peak.
    pub fn max_drawdown(&self) -> Decimal {
        let mut peak = self.initial_cash;
        let mut worst = Decimal::ZERO;
        for point in &self.value_history {
            if point.value > peak {
                peak = point.value;
                continue;
            }
            let decline = peak.value() - point.value.value();
            if let Ok(drawdown) = decline.checked_div(peak.value()) {
                worst = worst.max(drawdown);
            }
        }
        worst
    }

    /// Check if the backtest was profitable.
    pub fn is_profitable(&self) -> bool {
        self.final_value() > self.initial_cash
    }

    pub fn summary(&self) -> String {
        format!(
            "{}: {} steps, initial {}, final {}, return {}, max drawdown {}",
            self.strategy_name,
            self.value_history.len(),
            self.initial_cash,
            self.final_value(),
            percent(self.total_return),
            percent(self.max_drawdown()),
        )
    }
}

/// Ratio as a two-decimal percentage, or the raw ratio if scaling overflows.
fn percent(ratio: Decimal) -> String {
    match ratio.checked_mul(Decimal::ONE_HUNDRED) {
        Ok(pct) => format!("{}%", pct.round_dp(2).normalize()),
        Err(_) => format!("{} (ratio)", ratio),
    }
}

/// Drives one portfolio through a sequence of snapshots.
#[derive(Debug)]
pub struct BacktestEngine {
    config: BacktestConfig,
    portfolio: Portfolio,
    state: EngineState,
}

impl BacktestEngine {
    /// Create an engine whose portfolio starts with the configured cash.
    pub fn new(config: BacktestConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            portfolio: Portfolio::new(config.initial_cash),
            config,
            state: EngineState::Idle,
        })
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn config(&self) -> &BacktestConfig {
        &self.config
    }

    pub fn portfolio(&self) -> &Portfolio {
        &self.portfolio
    }

    /// Run a backtest with the given strategy over `snapshots`.
    ///
    /// Snapshot times must be strictly increasing; this is checked before any
    /// step runs and a violation leaves the engine idle. Any other failure
    /// aborts the run with the portfolio left as the failing step found it.
    pub async fn run<S: Strategy + ?Sized>(
        &mut self,
        ctx: &RunContext,
        strategy: &S,
        snapshots: &[MarketSnapshot],
    ) -> Result<BacktestResult> {
        if self.state != EngineState::Idle {
            return Err(BacktestError::InvalidState { state: self.state });
        }
        check_ordering(snapshots)?;

        let run_id = Uuid::new_v4();
        info!(
            run_id = %run_id,
            strategy = strategy.name(),
            snapshots = snapshots.len(),
            initial_cash = %self.config.initial_cash,
            "Starting backtest"
        );

        self.state = EngineState::Running;
        match self.execute(run_id, ctx, strategy, snapshots).await {
            Ok(result) => {
                self.state = EngineState::Completed;
                info!(
                    run_id = %run_id,
                    strategy = strategy.name(),
                    final_value = %result.final_value(),
                    total_return = %result.total_return,
                    "Backtest completed"
                );
                Ok(result)
            }
            Err(e) => {
                self.state = EngineState::Aborted;
                warn!(
                    run_id = %run_id,
                    strategy = strategy.name(),
                    step = ?e.step(),
                    error = %e,
                    "Backtest aborted"
                );
                Err(e)
            }
        }
    }

    async fn execute<S: Strategy + ?Sized>(
        &mut self,
        run_id: Uuid,
        ctx: &RunContext,
        strategy: &S,
        snapshots: &[MarketSnapshot],
    ) -> Result<BacktestResult> {
        let detailed = self.config.enable_detailed_logging;
        let mut value_history = Vec::with_capacity(snapshots.len());

        for (step, snapshot) in snapshots.iter().enumerate() {
            let time = snapshot.time();
            ctx.check()
                .map_err(|source| BacktestError::Cancelled { step, source })?;

            let actions = strategy
                .rebalance(ctx, &self.portfolio, snapshot)
                .await
                .map_err(|source| BacktestError::Strategy {
                    step,
                    time,
                    strategy: strategy.name().to_string(),
                    source,
                })?;

            for (action_index, action) in actions.iter().enumerate() {
                step_event!(
                    detailed,
                    run_id = %run_id,
                    step,
                    action_index,
                    action = %action.describe(),
                    "Applying action"
                );
                action
                    .apply(&mut self.portfolio)
                    .map_err(|source| BacktestError::Action {
                        step,
                        time,
                        action_index,
                        action: action.describe(),
                        source,
                    })?;
            }

            let value = self
                .portfolio
                .value(snapshot)
                .map_err(|source| BacktestError::Valuation { step, time, source })?;
            step_event!(
                detailed,
                run_id = %run_id,
                step,
                time = %time,
                actions = actions.len(),
                value = %value,
                "Step complete"
            );
            value_history.push(ValuePoint { time, value });
        }

        let initial_cash = self.config.initial_cash;
        let final_value = value_history
            .last()
            .map(|p: &ValuePoint| p.value)
            .unwrap_or(initial_cash);
        let total_return = final_value
            .value()
            .checked_sub(initial_cash.value())?
            .checked_div(initial_cash.value())?;

        Ok(BacktestResult {
            run_id,
            strategy_name: strategy.name().to_string(),
            portfolio: self.portfolio.clone(),
            value_history,
            initial_cash,
            total_return,
        })
    }
}

fn check_ordering(snapshots: &[MarketSnapshot]) -> Result<()> {
    for (step, pair) in snapshots.windows(2).enumerate() {
        let (previous, current) = (pair[0].time(), pair[1].time());
        if current <= previous {
            return Err(BacktestError::OutOfOrder {
                step: step + 1,
                time: current,
                previous,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{Action, AddPosition, AdjustCash};
    use crate::position::SpotPosition;
    use async_trait::async_trait;
    use market_core::{Error, Price};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn amount(s: &str) -> Amount {
        s.parse().unwrap()
    }

    fn snapshot(secs: i64, eth: &str) -> MarketSnapshot {
        MarketSnapshot::new(Time::from_unix(secs).unwrap())
            .with_price("ETH", eth.parse::<Price>().unwrap())
    }

    fn engine(cash: &str) -> BacktestEngine {
        BacktestEngine::new(BacktestConfig::new(amount(cash))).unwrap()
    }

    /// Buys one ETH on the first step and holds.
    struct BuyAndHold;

    #[async_trait]
    impl Strategy for BuyAndHold {
        fn name(&self) -> &str {
            "buy_and_hold"
        }

        async fn rebalance(
            &self,
            _ctx: &RunContext,
            portfolio: &Portfolio,
            snapshot: &MarketSnapshot,
        ) -> anyhow::Result<Vec<Box<dyn Action>>> {
            if portfolio.has_position("eth") {
                return Ok(Vec::new());
            }
            let price = snapshot.price("ETH")?;
            Ok(vec![
                AddPosition::new(Arc::new(SpotPosition::new("eth", "ETH", Amount::ONE))).boxed(),
                AdjustCash::new(-price.value(), "buy 1 ETH").boxed(),
            ])
        }
    }

    /// Fails on a given step.
    struct FailAt(usize, AtomicUsize);

    #[async_trait]
    impl Strategy for FailAt {
        fn name(&self) -> &str {
            "fail_at"
        }

        async fn rebalance(
            &self,
            _ctx: &RunContext,
            _portfolio: &Portfolio,
            _snapshot: &MarketSnapshot,
        ) -> anyhow::Result<Vec<Box<dyn Action>>> {
            let step = self.1.fetch_add(1, Ordering::SeqCst);
            if step == self.0 {
                anyhow::bail!("model diverged");
            }
            Ok(vec![AdjustCash::new(Decimal::ONE, "drip").boxed()])
        }
    }

    #[test]
    fn test_new_rejects_non_positive_cash() {
        let err = BacktestEngine::new(BacktestConfig::new(Amount::ZERO)).unwrap_err();
        assert!(matches!(err, BacktestError::Core(Error::Config { .. })));
    }

    #[tokio::test]
    async fn test_buy_and_hold() {
        let mut engine = engine("10000");
        let snapshots = vec![
            snapshot(0, "2000"),
            snapshot(60, "2100"),
            snapshot(120, "1900"),
        ];
        let result = engine
            .run(&RunContext::new(), &BuyAndHold, &snapshots)
            .await
            .unwrap();

        assert_eq!(engine.state(), EngineState::Completed);
        let values: Vec<Amount> = result.value_history.iter().map(|p| p.value).collect();
        assert_eq!(values, vec![amount("10000"), amount("10100"), amount("9900")]);
        assert_eq!(result.value_history[1].time, snapshots[1].time());
        assert_eq!(result.total_return, Decimal::new(-1, 2));
        assert_eq!(result.final_value(), amount("9900"));
        assert_eq!(result.peak_value(), amount("10100"));
        assert!(!result.is_profitable());
        assert_eq!(result.portfolio.position_count(), 1);
        assert_eq!(result.strategy_name, "buy_and_hold");
        assert!(result.summary().starts_with("buy_and_hold: 3 steps"));
    }

    #[test]
    fn test_summary_with_extreme_return() {
        let result = BacktestResult {
            run_id: Uuid::new_v4(),
            strategy_name: "moonshot".to_string(),
            portfolio: Portfolio::default(),
            value_history: Vec::new(),
            initial_cash: amount("1"),
            // 1e27; scaling to a percentage exceeds the decimal range
            total_return: Decimal::parse("1000000000000000000000000000").unwrap(),
        };
        let summary = result.summary();
        assert!(summary.contains("(ratio)"));
        assert!(summary.contains("max drawdown 0%"));

        let ordinary = BacktestResult {
            total_return: Decimal::new(-1234, 5),
            ..result
        };
        assert!(ordinary.summary().contains("return -1.23%"));
    }

    #[tokio::test]
    async fn test_max_drawdown() {
        let mut engine = engine("1000");
        let snapshots = vec![snapshot(0, "1000"), snapshot(1, "2000"), snapshot(2, "1500")];
        let result = engine
            .run(&RunContext::new(), &BuyAndHold, &snapshots)
            .await
            .unwrap();
        // 1000 -> 2000 -> 1500
        assert_eq!(result.max_drawdown(), Decimal::new(25, 2));
        assert!(result.is_profitable());
    }

    #[tokio::test]
    async fn test_empty_run() {
        let mut engine = engine("500");
        let result = engine
            .run(&RunContext::new(), &BuyAndHold, &[])
            .await
            .unwrap();
        assert!(result.value_history.is_empty());
        assert!(result.total_return.is_zero());
        assert_eq!(result.final_value(), amount("500"));
        assert_eq!(result.max_drawdown(), Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_strategy_failure_aborts() {
        let mut engine = engine("100");
        let strategy = FailAt(1, AtomicUsize::new(0));
        let snapshots = vec![snapshot(0, "1"), snapshot(1, "1"), snapshot(2, "1")];
        let err = engine
            .run(&RunContext::new(), &strategy, &snapshots)
            .await
            .unwrap_err();

        match err {
            BacktestError::Strategy { step, time, strategy, .. } => {
                assert_eq!(step, 1);
                assert_eq!(time, snapshots[1].time());
                assert_eq!(strategy, "fail_at");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(engine.state(), EngineState::Aborted);
        // step 0 applied, step 1 did not
        assert_eq!(engine.portfolio().cash_decimal(), Decimal::new(101, 0));
    }

    #[tokio::test]
    async fn test_valuation_failure_aborts() {
        let mut engine = engine("100");
        let snapshots = vec![
            snapshot(0, "10"),
            MarketSnapshot::new(Time::from_unix(1).unwrap()),
        ];
        let err = engine
            .run(&RunContext::new(), &BuyAndHold, &snapshots)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            BacktestError::Valuation { step: 1, source: Error::PriceNotAvailable { .. }, .. }
        ));
    }

    #[tokio::test]
    async fn test_out_of_order_rejected_up_front() {
        let mut engine = engine("100");
        let snapshots = vec![snapshot(10, "1"), snapshot(10, "1")];
        let err = engine
            .run(&RunContext::new(), &BuyAndHold, &snapshots)
            .await
            .unwrap_err();
        assert!(matches!(err, BacktestError::OutOfOrder { step: 1, .. }));
        assert_eq!(engine.state(), EngineState::Idle);
        assert_eq!(engine.portfolio().position_count(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_context() {
        let mut engine = engine("100");
        let ctx = RunContext::new();
        ctx.cancel();
        let err = engine
            .run(&ctx, &BuyAndHold, &[snapshot(0, "1")])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            BacktestError::Cancelled { step: 0, source: Error::Cancelled }
        ));
        assert_eq!(engine.state(), EngineState::Aborted);
    }

    #[tokio::test]
    async fn test_engine_runs_once() {
        let mut engine = engine("100");
        engine
            .run(&RunContext::new(), &BuyAndHold, &[])
            .await
            .unwrap();
        let err = engine
            .run(&RunContext::new(), &BuyAndHold, &[])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            BacktestError::InvalidState { state: EngineState::Completed }
        ));
    }

    #[tokio::test]
    async fn test_run_with_dyn_strategy() {
        let mut engine = engine("100");
        let strategy: Box<dyn Strategy> = Box::new(BuyAndHold);
        let result = engine
            .run(&RunContext::new(), strategy.as_ref(), &[snapshot(0, "50")])
            .await
            .unwrap();
        assert_eq!(result.final_value(), amount("100"));
        assert_eq!(result.run_id.get_version_num(), 4);
    }
}
