//! Non-negative exchange rate or mark value.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Add;
use std::str::FromStr;

use super::Decimal;
use crate::{Error, Result};

/// A price, always `>= 0`.
///
/// Only operations that cannot turn negative are infallible. Subtraction and
/// scaling by an arbitrary [`Decimal`] return a [`Result`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    pub const ZERO: Price = Price(Decimal::ZERO);
    pub const ONE: Price = Price(Decimal::ONE);

    pub fn new(value: Decimal) -> Result<Self> {
        if value.is_negative() {
            return Err(Error::NegativePrice {
                value: value.to_string(),
            });
        }
        Ok(Self(value))
    }

    /// Construct-or-abort for tests and literal constants.
    ///
    /// # Panics
    ///
    /// Panics when `value` is negative.
    pub fn new_or_panic(value: Decimal) -> Self {
        match Self::new(value) {
            Ok(price) => price,
            Err(e) => panic!("{e}"),
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_positive(&self) -> bool {
        self.0.is_positive()
    }

    pub fn checked_add(self, other: Price) -> Result<Price> {
        self.0.checked_add(other.0).map(Self)
    }

    /// Fails with [`Error::NegativePrice`] when `other > self`.
    pub fn checked_sub(self, other: Price) -> Result<Price> {
        Self::new(self.0.checked_sub(other.0)?)
    }

    pub fn checked_mul(self, factor: Decimal) -> Result<Price> {
        Self::new(self.0.checked_mul(factor)?)
    }

    pub fn checked_div(self, divisor: Decimal) -> Result<Price> {
        Self::new(self.0.checked_div(divisor)?)
    }

    /// `self / other` as a plain ratio.
    pub fn ratio(self, other: Price) -> Result<Decimal> {
        self.0.checked_div(other.0)
    }
}

impl Add for Price {
    type Output = Price;

    fn add(self, rhs: Price) -> Price {
        Self(self.0 + rhs.0)
    }
}

impl TryFrom<Decimal> for Price {
    type Error = Error;

    fn try_from(value: Decimal) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

impl FromStr for Price {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(Decimal::parse(s)?)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}
