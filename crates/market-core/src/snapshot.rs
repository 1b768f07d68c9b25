//! Immutable per-instant market view: prices plus pass-through metadata.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::types::{Decimal, Price, Time};
use crate::{Error, Result};

/// Metadata key for per-pool state, e.g. `pool:eth-usdc:sqrt_price`.
pub fn pool_key(pool_id: &str, field: &str) -> String {
    format!("pool:{pool_id}:{field}")
}

/// A point-in-time market view.
///
/// Prices are keyed by exact pair symbol (`"ETH/USDC"`). Metadata carries
/// mechanism-specific state (current tick, funding rate, ...) that the
/// portfolio pipeline never interprets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    time: Time,
    #[serde(default)]
    prices: BTreeMap<String, Price>,
    #[serde(default)]
    metadata: BTreeMap<String, Value>,
}

impl MarketSnapshot {
    pub fn new(time: Time) -> Self {
        Self {
            time,
            prices: BTreeMap::new(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_price(mut self, symbol: impl Into<String>, price: Price) -> Self {
        self.prices.insert(symbol.into(), price);
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn time(&self) -> Time {
        self.time
    }

    /// Exact-match lookup; a missing symbol is an error, never a fallback.
    pub fn price(&self, symbol: &str) -> Result<Price> {
        self.prices
            .get(symbol)
            .copied()
            .ok_or_else(|| Error::PriceNotAvailable {
                symbol: symbol.to_string(),
            })
    }

    pub fn prices(&self) -> &BTreeMap<String, Price> {
        &self.prices
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.metadata.get(key)
    }

    /// Collaborator-side convenience while building a snapshot.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.metadata.insert(key.into(), value.into());
    }

    /// Decimal metadata stored either as a string (`"0.0001"`) or a JSON number.
    pub fn get_decimal(&self, key: &str) -> Result<Option<Decimal>> {
        let Some(value) = self.metadata.get(key) else {
            return Ok(None);
        };
        let parsed = match value {
            Value::String(s) => Decimal::parse(s),
            Value::Number(n) => number_to_decimal(n),
            other => {
                return Err(Error::InvalidMetadata {
                    key: key.to_string(),
                    reason: format!("expected decimal, found {other}"),
                })
            }
        };
        parsed.map(Some).map_err(|e| Error::InvalidMetadata {
            key: key.to_string(),
            reason: e.to_string(),
        })
    }

    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        self.metadata
            .get(key)
            .map(|value| {
                serde_json::from_value(value.clone()).map_err(|e| Error::InvalidMetadata {
                    key: key.to_string(),
                    reason: e.to_string(),
                })
            })
            .transpose()
    }
}

/// JSON floats print in exponent form outside roughly 1e-5..1e16.
fn number_to_decimal(n: &serde_json::Number) -> Result<Decimal> {
    if let Some(i) = n.as_i64() {
        return Ok(Decimal::from(i));
    }
    if let Some(u) = n.as_u64() {
        return Ok(Decimal::from_raw(rust_decimal::Decimal::from(u)));
    }
    let text = n.to_string();
    if !text.contains(['e', 'E']) {
        return Decimal::parse(&text);
    }
    rust_decimal::Decimal::from_scientific(&text)
        .map(Decimal::from_raw)
        .map_err(|e| Error::InvalidDecimal {
            input: text,
            reason: e.to_string(),
        })
}
