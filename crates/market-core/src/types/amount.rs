//! Non-negative quantity of an asset or of cash-equivalent value.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Mul};
use std::str::FromStr;

use super::{Decimal, Price};
use crate::{Error, Result};

/// A quantity, always `>= 0`.
///
/// `Amount * Price` yields an `Amount` (the value of that quantity). There is
/// deliberately no `Price * Amount` and no addition between the two.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    pub const ZERO: Amount = Amount(Decimal::ZERO);
    pub const ONE: Amount = Amount(Decimal::ONE);

    pub fn new(value: Decimal) -> Result<Self> {
        if value.is_negative() {
            return Err(Error::NegativeAmount {
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
            Ok(amount) => amount,
            Err(e) => panic!("{e}"),
        }
    }

    /// Negative input becomes zero.
    pub fn from_clamped(value: Decimal) -> Self {
        if value.is_negative() {
            Self::ZERO
        } else {
            Self(value)
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

    pub fn checked_add(self, other: Amount) -> Result<Amount> {
        self.0.checked_add(other.0).map(Self)
    }

    /// Fails with [`Error::NegativeAmount`] when `other > self`.
    pub fn checked_sub(self, other: Amount) -> Result<Amount> {
        Self::new(self.0.checked_sub(other.0)?)
    }

    pub fn saturating_sub(self, other: Amount) -> Amount {
        if other.0 >= self.0 {
            Self::ZERO
        } else {
            Self(self.0 - other.0)
        }
    }

    pub fn checked_mul(self, factor: Decimal) -> Result<Amount> {
        Self::new(self.0.checked_mul(factor)?)
    }

    /// Value of this quantity at `price`.
    pub fn checked_mul_price(self, price: Price) -> Result<Amount> {
        self.0.checked_mul(price.value()).map(Self)
    }

    pub fn checked_div(self, divisor: Decimal) -> Result<Amount> {
        Self::new(self.0.checked_div(divisor)?)
    }

    /// Quantity purchasable with this value at `price`.
    pub fn checked_div_price(self, price: Price) -> Result<Amount> {
        self.0.checked_div(price.value()).map(Self)
    }

    pub fn checked_sum<I: IntoIterator<Item = Amount>>(values: I) -> Result<Amount> {
        values
            .into_iter()
            .try_fold(Amount::ZERO, |acc, v| acc.checked_add(v))
    }
}

impl Add for Amount {
    type Output = Amount;

    fn add(self, rhs: Amount) -> Amount {
        Self(self.0 + rhs.0)
    }
}

impl Mul<Price> for Amount {
    type Output = Amount;

    fn mul(self, rhs: Price) -> Amount {
        Self(self.0 * rhs.value())
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Amount::ZERO, |acc, a| acc + a)
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = Error;

    fn try_from(value: Decimal) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl FromStr for Amount {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(Decimal::parse(s)?)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn a(s: &str) -> Amount {
        s.parse().unwrap()
    }

    fn p(s: &str) -> Price {
        s.parse().unwrap()
    }

    #[test]
    fn test_negative_amount_rejected() {
        assert!(matches!(
            Amount::new(Decimal::new(-5, 0)),
            Err(Error::NegativeAmount { .. })
        ));
        assert_eq!(Amount::new(Decimal::ZERO).unwrap(), Amount::ZERO);
    }

    #[test]
    #[should_panic(expected = "negative value")]
    fn test_new_or_panic_aborts_on_negative() {
        Amount::new_or_panic(Decimal::new(-1, 0));
    }

    #[test]
    fn test_amount_times_price_is_value() {
        let value = a("2.5") * p("1800.40");
        assert_eq!(value, a("4501"));
        assert_eq!(a("2.5").checked_mul_price(p("1800.40")).unwrap(), value);
    }

    #[test]
    fn test_division_forms() {
        assert!(matches!(
            a("10").checked_div(Decimal::ZERO),
            Err(Error::DivisionByZero)
        ));
        assert!(matches!(
            a("10").checked_div_price(Price::ZERO),
            Err(Error::DivisionByZero)
        ));
        assert_eq!(a("4501").checked_div_price(p("1800.40")).unwrap(), a("2.5"));
    }

    #[test]
    fn test_multiply_then_divide_restores_amount() {
        let amount = a("0.123456");
        let factor = Decimal::new(-25, 1);
        // negative factor cannot produce an amount
        assert!(amount.checked_mul(factor).is_err());
        let factor = factor.abs();
        let scaled = amount.checked_mul(factor).unwrap();
        assert_eq!(scaled.checked_div(factor).unwrap(), amount);
    }

    #[test]
    fn test_subtraction() {
        assert_eq!(a("5").checked_sub(a("1.5")).unwrap(), a("3.5"));
        assert!(matches!(
            a("1").checked_sub(a("1.5")),
            Err(Error::NegativeAmount { .. })
        ));
        assert_eq!(a("1").saturating_sub(a("1.5")), Amount::ZERO);
    }

    #[test]
    fn test_clamped_and_sum() {
        assert_eq!(Amount::from_clamped(Decimal::new(-10, 0)), Amount::ZERO);
        assert_eq!(Amount::from_clamped(Decimal::new(10, 0)), a("10"));
        let total: Amount = vec![a("0.1"), a("0.2"), a("0.3")].into_iter().sum();
        assert_eq!(total, a("0.6"));
        assert_eq!(Amount::checked_sum(vec![a("1"), a("2")]).unwrap(), a("3"));
    }
}
