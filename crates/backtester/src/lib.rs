//! Backtester
//!
//! Deterministic replay of a strategy over time-ordered market snapshots.
//!
//! # Features
//!
//! - **Position Trait**: Instruments value themselves from a snapshot
//! - **Action Trait**: Portfolio mutations issued by strategies, applied in order
//! - **Strategy Trait**: Async rebalance hook with cancellation support
//! - **Portfolio**: Uniquely-identified positions plus a signed cash balance
//! - **Backtest Engine**: Sequential loop recording the portfolio value history
//!
//! # Example
//!
//! ```ignore
//! use backtester::{BacktestConfig, BacktestEngine};
//! use market_core::RunContext;
//!
//! let mut engine = BacktestEngine::new(BacktestConfig::default())?;
//! let result = engine.run(&RunContext::new(), &strategy, &snapshots).await?;
//! println!("{}", result.summary());
//! ```

pub mod action;
pub mod config;
pub mod engine;
pub mod error;
pub mod portfolio;
pub mod position;
pub mod strategy;
pub mod telemetry;

// Re-exports
pub use action::{Action, AddPosition, AdjustCash, Batch, RemovePosition, ReplacePosition};
pub use config::BacktestConfig;
pub use engine::{BacktestEngine, BacktestResult, EngineState, ValuePoint};
pub use error::BacktestError;
pub use portfolio::{Portfolio, SharedPortfolio};
pub use position::{Position, PositionType, SpotPosition};
pub use strategy::Strategy;
