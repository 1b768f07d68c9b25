//! Tracing subscriber setup.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::BacktestConfig;

/// Filter used when `RUST_LOG` is not set.
pub fn default_directive(config: &BacktestConfig) -> &'static str {
    if config.enable_detailed_logging {
        "backtester=info,market_core=info"
    } else {
        "backtester=warn,market_core=warn"
    }
}

/// Install the global subscriber. Returns `false` if one was already set.
pub fn init(config: &BacktestConfig) -> bool {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_directive(config).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive_follows_config() {
        let quiet = BacktestConfig::default();
        let loud = BacktestConfig::default().with_detailed_logging(true);
        assert!(default_directive(&quiet).contains("warn"));
        assert!(default_directive(&loud).contains("backtester=info"));
    }

    #[test]
    fn test_init_is_idempotent() {
        let config = BacktestConfig::default();
        init(&config);
        assert!(!init(&config));
    }
}
