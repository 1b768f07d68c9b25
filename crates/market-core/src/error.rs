//! Error types shared by the numeric, snapshot and mechanism layers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("negative value: price cannot be {value}")]
    NegativePrice { value: String },

    #[error("negative value: amount cannot be {value}")]
    NegativeAmount { value: String },

    #[error("invalid decimal {input:?}: {reason}")]
    InvalidDecimal { input: String, reason: String },

    #[error("invalid time {input:?}: {reason}")]
    InvalidTime { input: String, reason: String },

    #[error("division by zero")]
    DivisionByZero,

    #[error("arithmetic overflow in {operation}")]
    Overflow { operation: &'static str },

    #[error("price not available for {symbol}")]
    PriceNotAvailable { symbol: String },

    #[error("invalid metadata for {key}: {reason}")]
    InvalidMetadata { key: String, reason: String },

    #[error("position not found: {id}")]
    PositionNotFound { id: String },

    #[error("position already exists: {id}")]
    DuplicatePosition { id: String },

    #[error("missing argument: {what}")]
    MissingArgument { what: &'static str },

    #[error("missing parameter: {name}")]
    MissingParameter { name: &'static str },

    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("order not found: {id}")]
    OrderNotFound { id: String },

    #[error("crossed book: bid {bid} >= ask {ask}")]
    CrossedBook { bid: String, ask: String },

    #[error("unsupported by {venue}: {operation}")]
    Unsupported { venue: String, operation: String },

    #[error("mechanism error at {venue}: {message}")]
    Mechanism { venue: String, message: String },

    #[error("operation cancelled")]
    Cancelled,

    #[error("deadline exceeded")]
    DeadlineExceeded,

    #[error("Configuration file error: {0}")]
    ConfigFile(#[from] config::ConfigError),

    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl Error {
    /// True for the two context-driven failures.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Error::Cancelled | Error::DeadlineExceeded)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
