//! Backtest configuration.

use market_core::{Amount, Decimal, Error, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

/// Configuration for a backtest run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfig {
    /// Starting cash balance; must be positive.
    pub initial_cash: Amount,
    /// Log every step and action at info level instead of debug.
    pub enable_detailed_logging: bool,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            initial_cash: Amount::new_or_panic(Decimal::new(100_000, 0)),
            enable_detailed_logging: false,
        }
    }
}

impl BacktestConfig {
    pub fn new(initial_cash: Amount) -> Self {
        Self {
            initial_cash,
            ..Self::default()
        }
    }

    pub fn with_detailed_logging(mut self, enabled: bool) -> Self {
        self.enable_detailed_logging = enabled;
        self
    }

    /// Load configuration from environment variables.
    ///
    /// Reads `.env` if present, then `BACKTEST_INITIAL_CASH` and
    /// `BACKTEST_DETAILED_LOGGING`. Unset variables keep their defaults.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup("BACKTEST_INITIAL_CASH") {
            config.initial_cash = raw.trim().parse().map_err(|e| Error::Config {
                message: format!("BACKTEST_INITIAL_CASH: {}", e),
            })?;
        }
        if let Some(raw) = lookup("BACKTEST_DETAILED_LOGGING") {
            config.enable_detailed_logging = match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" | "" => false,
                other => {
                    return Err(Error::Config {
                        message: format!(
                            "BACKTEST_DETAILED_LOGGING: unrecognised value {:?}",
                            other
                        ),
                    })
                }
            };
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file, with `BACKTEST_*` environment overrides.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let config: Self = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(config::Environment::with_prefix("BACKTEST"))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.initial_cash.is_positive() {
            return Err(Error::Config {
                message: format!("initial_cash must be positive, got {}", self.initial_cash),
            });
        }
        Ok(())
    }
}
