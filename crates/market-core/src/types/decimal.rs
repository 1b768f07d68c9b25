//! Exact signed decimal backed by `rust_decimal`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use std::str::FromStr;

use crate::{Error, Result};

/// Signed base-10 number with up to 28 fractional digits.
///
/// Addition, subtraction and multiplication are available both as operators
/// (which panic on overflow, like the primitive integer types in debug builds)
/// and as `checked_*` methods returning [`Error::Overflow`]. Division is only
/// available through [`Decimal::checked_div`], which reports a zero divisor as
/// [`Error::DivisionByZero`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Decimal(rust_decimal::Decimal);

impl Decimal {
    pub const ZERO: Decimal = Decimal(rust_decimal::Decimal::ZERO);
    pub const ONE: Decimal = Decimal(rust_decimal::Decimal::ONE);
    pub const NEGATIVE_ONE: Decimal = Decimal(rust_decimal::Decimal::NEGATIVE_ONE);
    pub const ONE_HUNDRED: Decimal = Decimal(rust_decimal::Decimal::ONE_HUNDRED);

    /// `num * 10^-scale`, e.g. `Decimal::new(15, 1)` is `1.5`.
    ///
    /// # Panics
    ///
    /// Panics when `scale` exceeds 28. Use [`Decimal::try_new`] for untrusted input.
    pub fn new(num: i64, scale: u32) -> Self {
        Self(rust_decimal::Decimal::new(num, scale))
    }

    pub fn try_new(num: i64, scale: u32) -> Result<Self> {
        rust_decimal::Decimal::try_new(num, scale)
            .map(Self)
            .map_err(|e| Error::InvalidDecimal {
                input: format!("{num}e-{scale}"),
                reason: e.to_string(),
            })
    }

    pub const fn from_raw(raw: rust_decimal::Decimal) -> Self {
        Self(raw)
    }

    pub const fn raw(&self) -> rust_decimal::Decimal {
        self.0
    }

    /// Parse without any rounding; input with more precision than can be
    /// represented is rejected instead of silently rounded.
    pub fn parse(input: &str) -> Result<Self> {
        rust_decimal::Decimal::from_str_exact(input)
            .map(Self)
            .map_err(|e| Error::InvalidDecimal {
                input: input.to_string(),
                reason: e.to_string(),
            })
    }

    pub fn checked_add(self, rhs: Decimal) -> Result<Decimal> {
        self.0
            .checked_add(rhs.0)
            .map(Self)
            .ok_or(Error::Overflow { operation: "add" })
    }

    pub fn checked_sub(self, rhs: Decimal) -> Result<Decimal> {
        self.0
            .checked_sub(rhs.0)
            .map(Self)
            .ok_or(Error::Overflow { operation: "sub" })
    }

    pub fn checked_mul(self, rhs: Decimal) -> Result<Decimal> {
        self.0
            .checked_mul(rhs.0)
            .map(Self)
            .ok_or(Error::Overflow { operation: "mul" })
    }

    pub fn checked_div(self, rhs: Decimal) -> Result<Decimal> {
        if rhs.is_zero() {
            return Err(Error::DivisionByZero);
        }
        self.0
            .checked_div(rhs.0)
            .map(Self)
            .ok_or(Error::Overflow { operation: "div" })
    }

    /// Sum that reports overflow instead of panicking.
    pub fn checked_sum<I: IntoIterator<Item = Decimal>>(values: I) -> Result<Decimal> {
        values
            .into_iter()
            .try_fold(Decimal::ZERO, |acc, v| acc.checked_add(v))
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_positive(&self) -> bool {
        self.0 > rust_decimal::Decimal::ZERO
    }

    pub fn is_negative(&self) -> bool {
        self.0 < rust_decimal::Decimal::ZERO
    }

    pub fn abs(&self) -> Decimal {
        Self(self.0.abs())
    }

    pub fn scale(&self) -> u32 {
        self.0.scale()
    }

    /// Banker's rounding to `dp` fractional digits.
    pub fn round_dp(&self, dp: u32) -> Decimal {
        Self(self.0.round_dp(dp))
    }

    /// Strip trailing zeros: `1.500` becomes `1.5`.
    pub fn normalize(&self) -> Decimal {
        Self(self.0.normalize())
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for Decimal {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl From<rust_decimal::Decimal> for Decimal {
    fn from(raw: rust_decimal::Decimal) -> Self {
        Self(raw)
    }
}

impl From<Decimal> for rust_decimal::Decimal {
    fn from(d: Decimal) -> Self {
        d.0
    }
}

impl From<i64> for Decimal {
    fn from(n: i64) -> Self {
        Self(rust_decimal::Decimal::from(n))
    }
}

impl From<i32> for Decimal {
    fn from(n: i32) -> Self {
        Self(rust_decimal::Decimal::from(n))
    }
}

impl From<u32> for Decimal {
    fn from(n: u32) -> Self {
        Self(rust_decimal::Decimal::from(n))
    }
}

impl Add for Decimal {
    type Output = Decimal;

    fn add(self, rhs: Decimal) -> Decimal {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Decimal {
    fn add_assign(&mut self, rhs: Decimal) {
        self.0 += rhs.0;
    }
}

impl Sub for Decimal {
    type Output = Decimal;

    fn sub(self, rhs: Decimal) -> Decimal {
        Self(self.0 - rhs.0)
    }
}

impl SubAssign for Decimal {
    fn sub_assign(&mut self, rhs: Decimal) {
        self.0 -= rhs.0;
    }
}

impl Mul for Decimal {
    type Output = Decimal;

    fn mul(self, rhs: Decimal) -> Decimal {
        Self(self.0 * rhs.0)
    }
}

impl Neg for Decimal {
    type Output = Decimal;

    fn neg(self) -> Decimal {
        Self(-self.0)
    }
}

impl Sum for Decimal {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Decimal::ZERO, |acc, d| acc + d)
    }
}

impl<'a> Sum<&'a Decimal> for Decimal {
    fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.fold(Decimal::ZERO, |acc, d| acc + *d)
    }
}
