//! Mechanism Backtest
//!
//! This is the root crate that provides benchmark and integration-test access
//! to the workspace crates. For actual functionality, use the individual crates
//! directly:
//!
//! - `market-core`: Exact decimals, prices, amounts, time, snapshots, mechanism traits
//! - `backtester`: Positions, actions, strategies, portfolio, backtest engine

// Re-export for benchmarks
pub use backtester as engine;
pub use market_core as core;
