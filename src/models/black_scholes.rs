use crate::errors::{ensure_positive, PricingResult};
use crate::models::normal::StandardNormal;
use crate::models::{MarketParams, PricingModel};

/// Black-Scholes-Merton European call.
///
/// C = S0 * Phi(d1) - K * exp(-rT) * Phi(d2)
///
/// where d1 = (ln(S0/K) + (r + sigma^2/2) T) / (sigma sqrt(T))
/// and   d2 = d1 - sigma sqrt(T).
///
/// Vega = dC/dsigma = S0 * phi(d1) * sqrt(T), phi being the normal density.
pub struct BlackScholesCall {
    /// Standard normal distribution (created once, reused)
    normal: StandardNormal,
}

impl BlackScholesCall {
    pub fn new() -> Self {
        Self {
            normal: StandardNormal::new(),
        }
    }

    /// Checked (d1, d2). Requires sigma > 0, T > 0, S0 > 0, K > 0.
    pub fn d1_d2(market: &MarketParams, strike: f64) -> PricingResult<(f64, f64)> {
        market.validate()?;
        ensure_positive("strike", strike)?;
        let sigma_sqrt_t = market.volatility * market.maturity.sqrt();
        let d1 = ((market.spot / strike).ln()
            + (market.rate + 0.5 * market.volatility * market.volatility) * market.maturity)
            / sigma_sqrt_t;
        Ok((d1, d1 - sigma_sqrt_t))
    }

    #[inline]
    pub fn value(&self, market: &MarketParams, strike: f64) -> PricingResult<f64> {
        let (d1, d2) = Self::d1_d2(market, strike)?;
        Ok(market.spot * self.normal.cdf(d1) - strike * market.discount() * self.normal.cdf(d2))
    }

    #[inline]
    pub fn vega(&self, market: &MarketParams, strike: f64) -> PricingResult<f64> {
        let (d1, _) = Self::d1_d2(market, strike)?;
        Ok(market.spot * self.normal.pdf(d1) * market.maturity.sqrt())
    }
}

impl Default for BlackScholesCall {
    fn default() -> Self {
        Self::new()
    }
}

impl PricingModel for BlackScholesCall {
    #[inline]
    fn name(&self) -> &'static str {
        "Black-Scholes-Merton"
    }

    fn call_value(&self, market: &MarketParams, strike: f64) -> PricingResult<f64> {
        self.value(market, strike)
    }
}

/// Analytical BSM call value.
pub fn bsm_call_value(market: &MarketParams, strike: f64) -> PricingResult<f64> {
    BlackScholesCall::new().value(market, strike)
}

/// BSM Vega of a European call.
pub fn bsm_vega(market: &MarketParams, strike: f64) -> PricingResult<f64> {
    BlackScholesCall::new().vega(market, strike)
}
