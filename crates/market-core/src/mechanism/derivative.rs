//! Derivative contract: pricing, sensitivities and settlement.

use serde::{Deserialize, Serialize};

use super::MarketMechanism;
use crate::context::RunContext;
use crate::types::{Decimal, Duration, Price};
use crate::{Error, Result};

/// Market inputs for a derivative. Each instrument reads the subset it needs;
/// a missing required input surfaces as [`Error::MissingParameter`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DerivativeParams {
    pub underlying_price: Option<Price>,
    pub strike: Option<Price>,
    pub time_to_expiry: Option<Duration>,
    pub volatility: Option<Decimal>,
    pub risk_free_rate: Option<Decimal>,
    pub funding_rate: Option<Decimal>,
    pub mark_price: Option<Price>,
}

impl DerivativeParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn underlying(mut self, price: Price) -> Self {
        self.underlying_price = Some(price);
        self
    }

    pub fn strike(mut self, strike: Price) -> Self {
        self.strike = Some(strike);
        self
    }

    pub fn expiry(mut self, time_to_expiry: Duration) -> Self {
        self.time_to_expiry = Some(time_to_expiry);
        self
    }

    pub fn volatility(mut self, volatility: Decimal) -> Self {
        self.volatility = Some(volatility);
        self
    }

    pub fn risk_free_rate(mut self, rate: Decimal) -> Self {
        self.risk_free_rate = Some(rate);
        self
    }

    pub fn funding_rate(mut self, rate: Decimal) -> Self {
        self.funding_rate = Some(rate);
        self
    }

    pub fn mark(mut self, price: Price) -> Self {
        self.mark_price = Some(price);
        self
    }

    pub fn require_underlying(&self) -> Result<Price> {
        self.underlying_price
            .ok_or(Error::MissingParameter { name: "underlying_price" })
    }

    pub fn require_strike(&self) -> Result<Price> {
        self.strike.ok_or(Error::MissingParameter { name: "strike" })
    }

    pub fn require_expiry(&self) -> Result<Duration> {
        self.time_to_expiry
            .ok_or(Error::MissingParameter { name: "time_to_expiry" })
    }

    pub fn require_volatility(&self) -> Result<Decimal> {
        let vol = self
            .volatility
            .ok_or(Error::MissingParameter { name: "volatility" })?;
        if vol.is_negative() {
            return Err(Error::InvalidParameter {
                name: "volatility",
                reason: format!("{vol} is negative"),
            });
        }
        Ok(vol)
    }

    pub fn require_risk_free_rate(&self) -> Result<Decimal> {
        self.risk_free_rate
            .ok_or(Error::MissingParameter { name: "risk_free_rate" })
    }

    pub fn require_funding_rate(&self) -> Result<Decimal> {
        self.funding_rate
            .ok_or(Error::MissingParameter { name: "funding_rate" })
    }

    pub fn require_mark(&self) -> Result<Price> {
        self.mark_price.ok_or(Error::MissingParameter { name: "mark_price" })
    }
}

/// First and second order sensitivities. Fields an instrument does not have
/// stay zero; they are never left out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Greeks {
    pub delta: Decimal,
    pub gamma: Decimal,
    pub theta: Decimal,
    pub vega: Decimal,
    pub rho: Decimal,
}

impl Greeks {
    /// Linear exposure only, as for a perpetual or forward.
    pub fn delta_only(delta: Decimal) -> Self {
        Self {
            delta,
            ..Self::default()
        }
    }

    /// Scale every sensitivity by a position size.
    pub fn scaled(&self, size: Decimal) -> Result<Greeks> {
        Ok(Greeks {
            delta: self.delta.checked_mul(size)?,
            gamma: self.gamma.checked_mul(size)?,
            theta: self.theta.checked_mul(size)?,
            vega: self.vega.checked_mul(size)?,
            rho: self.rho.checked_mul(size)?,
        })
    }

    /// Component-wise sum, used to net a book of positions.
    pub fn combine(&self, other: &Greeks) -> Result<Greeks> {
        Ok(Greeks {
            delta: self.delta.checked_add(other.delta)?,
            gamma: self.gamma.checked_add(other.gamma)?,
            theta: self.theta.checked_add(other.theta)?,
            vega: self.vega.checked_add(other.vega)?,
            rho: self.rho.checked_add(other.rho)?,
        })
    }

    /// True when net delta is within `tolerance` of zero.
    pub fn is_delta_neutral(&self, tolerance: Decimal) -> bool {
        self.delta.abs() <= tolerance.abs()
    }
}

/// Pure pricing over explicit parameters.
pub trait Derivative: MarketMechanism {
    /// Fair value of one unit.
    fn price(&self, ctx: &RunContext, params: &DerivativeParams) -> Result<Price>;

    fn greeks(&self, ctx: &RunContext, params: &DerivativeParams) -> Result<Greeks>;

    /// Signed settlement cash flow for one long unit.
    fn settle(&self, ctx: &RunContext, params: &DerivativeParams) -> Result<Decimal>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mechanism::MechanismType;

    /// Linear perpetual: value tracks mark, funding paid by longs.
    struct Perp;

    impl MarketMechanism for Perp {
        fn mechanism(&self) -> MechanismType {
            MechanismType::Derivative
        }

        fn venue(&self) -> &str {
            "perp-venue"
        }
    }

    impl Derivative for Perp {
        fn price(&self, ctx: &RunContext, params: &DerivativeParams) -> Result<Price> {
            ctx.check()?;
            params.require_mark()
        }

        fn greeks(&self, _ctx: &RunContext, _params: &DerivativeParams) -> Result<Greeks> {
            Ok(Greeks::delta_only(Decimal::ONE))
        }

        fn settle(&self, _ctx: &RunContext, params: &DerivativeParams) -> Result<Decimal> {
            let mark = params.require_mark()?.value();
            let funding = params.require_funding_rate()?;
            mark.checked_mul(funding).map(|f| -f)
        }
    }

    fn price(s: &str) -> Price {
        s.parse().unwrap()
    }

    #[test]
    fn test_missing_parameter_is_reported() {
        let err = Perp
            .price(&RunContext::new(), &DerivativeParams::new())
            .unwrap_err();
        assert!(matches!(err, Error::MissingParameter { name: "mark_price" }));
    }

    #[test]
    fn test_inapplicable_greeks_are_zero() {
        let greeks = Perp
            .greeks(&RunContext::new(), &DerivativeParams::new())
            .unwrap();
        assert_eq!(greeks.delta, Decimal::ONE);
        assert_eq!(greeks.gamma, Decimal::ZERO);
        assert_eq!(greeks.theta, Decimal::ZERO);
        assert_eq!(greeks.vega, Decimal::ZERO);
        assert_eq!(greeks.rho, Decimal::ZERO);
    }

    #[test]
    fn test_settle_funding() {
        let params = DerivativeParams::new()
            .mark(price("2000"))
            .funding_rate(Decimal::new(1, 4));
        let flow = Perp.settle(&RunContext::new(), &params).unwrap();
        assert_eq!(flow, Decimal::new(-2, 1));
    }

    #[test]
    fn test_delta_neutral_book() {
        let long_perp = Greeks::delta_only(Decimal::ONE).scaled(Decimal::new(3, 0)).unwrap();
        let short_perp = Greeks::delta_only(Decimal::ONE).scaled(Decimal::new(-3, 0)).unwrap();
        let net = long_perp.combine(&short_perp).unwrap();
        assert!(net.is_delta_neutral(Decimal::new(1, 2)));
        assert!(!long_perp.is_delta_neutral(Decimal::new(1, 2)));
    }

    #[test]
    fn test_negative_volatility_rejected() {
        let params = DerivativeParams::new().volatility(Decimal::new(-5, 1));
        assert!(matches!(
            params.require_volatility(),
            Err(Error::InvalidParameter { name: "volatility", .. })
        ));
        let params = DerivativeParams::new()
            .underlying(price("100"))
            .strike(price("110"))
            .expiry(Duration::days(30).unwrap())
            .risk_free_rate(Decimal::new(5, 2));
        assert_eq!(params.require_strike().unwrap(), price("110"));
        assert!(params.require_expiry().unwrap().num_seconds() > 0);
        assert_eq!(params.require_underlying().unwrap(), price("100"));
        assert_eq!(params.require_risk_free_rate().unwrap(), Decimal::new(5, 2));
    }
}
