//! Market Core Library
//!
//! Exact numeric primitives, market snapshots and the mechanism contracts that
//! positions and strategies build on. Nothing in here knows how a backtest runs.

pub mod context;
pub mod error;
pub mod mechanism;
pub mod snapshot;
pub mod types;

pub use context::RunContext;
pub use error::{Error, Result};
pub use snapshot::MarketSnapshot;
pub use types::{Amount, Decimal, Duration, Price, Time};
