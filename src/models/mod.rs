pub mod normal;
pub mod binomial;
pub mod black_scholes;
pub mod monte_carlo;
pub mod implied_vol;

use crate::errors::{ensure_finite, ensure_positive, PricingResult};

/// Market parameters shared by every pricer.
/// Passed explicitly into each call; nothing is kept between calls.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
#[repr(C)]
pub struct MarketParams {
    /// Initial price of the underlying
    pub spot: f64,
    /// Time to maturity in year fractions
    pub maturity: f64,
    /// Continuously compounded risk-free rate (may be negative)
    pub rate: f64,
    /// Volatility of the diffusion term
    pub volatility: f64,
}

impl Default for MarketParams {
    /// Sample model: S0 = 100, T = 1, r = 5%, sigma = 20%.
    fn default() -> Self {
        Self {
            spot: 100.0,
            maturity: 1.0,
            rate: 0.05,
            volatility: 0.2,
        }
    }
}

impl MarketParams {
    pub fn new(spot: f64, maturity: f64, rate: f64, volatility: f64) -> Self {
        Self {
            spot,
            maturity,
            rate,
            volatility,
        }
    }

    /// Copy with a different volatility (used by the implied vol solver).
    #[inline]
    pub fn with_volatility(&self, volatility: f64) -> Self {
        Self { volatility, ..*self }
    }

    /// Spot, maturity and volatility strictly positive; rate finite.
    pub fn validate(&self) -> PricingResult<()> {
        ensure_positive("spot", self.spot)?;
        ensure_positive("maturity", self.maturity)?;
        ensure_finite("rate", self.rate)?;
        ensure_positive("volatility", self.volatility)?;
        Ok(())
    }

    /// exp(-rT)
    #[inline]
    pub fn discount(&self) -> f64 {
        (-self.rate * self.maturity).exp()
    }

    /// Intrinsic value of a call under the forward discount: max(S0 - K e^{-rT}, 0).
    /// Deep in-the-money limit of every call pricer.
    #[inline]
    pub fn discounted_intrinsic(&self, strike: f64) -> f64 {
        (self.spot - strike * self.discount()).max(0.0)
    }
}

/// All European call pricers implement this trait.
/// Send + Sync required for use across tokio tasks.
pub trait PricingModel: Send + Sync {
    fn name(&self) -> &'static str;

    /// Present value of a European call struck at `strike`.
    fn call_value(&self, market: &MarketParams, strike: f64) -> PricingResult<f64>;
}
