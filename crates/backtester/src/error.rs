//! Error types for backtest runs.

use market_core::Time;
use thiserror::Error;

use crate::engine::EngineState;

#[derive(Error, Debug)]
pub enum BacktestError {
    #[error("engine is {state}, expected idle")]
    InvalidState { state: EngineState },

    #[error("snapshot {step} at {time} is not after the previous snapshot at {previous}")]
    OutOfOrder { step: usize, time: Time, previous: Time },

    #[error("strategy {strategy} failed at step {step} ({time}): {source}")]
    Strategy {
        step: usize,
        time: Time,
        strategy: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("action {action_index} ({action}) failed at step {step} ({time}): {source}")]
    Action {
        step: usize,
        time: Time,
        action_index: usize,
        action: String,
        #[source]
        source: market_core::Error,
    },

    #[error("valuation failed at step {step} ({time}): {source}")]
    Valuation {
        step: usize,
        time: Time,
        #[source]
        source: market_core::Error,
    },

    #[error("run cancelled at step {step}: {source}")]
    Cancelled {
        step: usize,
        #[source]
        source: market_core::Error,
    },

    #[error(transparent)]
    Core(#[from] market_core::Error),
}

impl BacktestError {
    /// Step index the failure happened at, if it is tied to one.
    pub fn step(&self) -> Option<usize> {
        match self {
            BacktestError::OutOfOrder { step, .. }
            | BacktestError::Strategy { step, .. }
            | BacktestError::Action { step, .. }
            | BacktestError::Valuation { step, .. }
            | BacktestError::Cancelled { step, .. } => Some(*step),
            BacktestError::InvalidState { .. } | BacktestError::Core(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, BacktestError>;
