use crate::errors::{ensure_finite, ensure_positive, PricingError, PricingResult};
use crate::models::black_scholes::BlackScholesCall;
use crate::models::MarketParams;

/// Residual above which a solve is reported as suspicious.
const RESIDUAL_WARN: f64 = 1e-6;

/// Newton-Raphson implied volatility for a European call.
///
/// sigma <- sigma - (C(sigma) - C0) / Vega(sigma)
///
/// Runs exactly `iterations` steps. There is no convergence test and no
/// early exit: the caller checks the returned residual.
#[derive(Debug, Clone, Copy)]
pub struct ImpliedVolSolver {
    pub iterations: usize,
    pub initial_estimate: f64,
}

impl Default for ImpliedVolSolver {
    fn default() -> Self {
        Self {
            iterations: 100,
            initial_estimate: 0.2,
        }
    }
}

/// Terminal estimate and the re-priced error C(sigma) - C0.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct ImpliedVol {
    pub sigma: f64,
    pub residual: f64,
}

impl ImpliedVol {
    #[inline]
    pub fn converged(&self, tolerance: f64) -> bool {
        self.residual.abs() <= tolerance
    }
}

impl ImpliedVolSolver {
    pub fn new(iterations: usize, initial_estimate: f64) -> Self {
        Self {
            iterations,
            initial_estimate,
        }
    }

    /// Solve for the volatility that reprices `target_price`. The volatility
    /// carried by `market` is ignored; the iteration starts from
    /// `initial_estimate`.
    pub fn solve(
        &self,
        market: &MarketParams,
        strike: f64,
        target_price: f64,
    ) -> PricingResult<ImpliedVol> {
        ensure_finite("target_price", target_price)?;
        let mut sigma = ensure_positive("initial_estimate", self.initial_estimate)?;
        let market = market.with_volatility(sigma);
        market.validate()?;
        ensure_positive("strike", strike)?;

        let bs = BlackScholesCall::new();
        for it in 0..self.iterations {
            let m = market.with_volatility(sigma);
            let step = bs
                .value(&m, strike)
                .and_then(|c| bs.vega(&m, strike).map(|v| (c - target_price) / v))
                .map_err(|e| {
                    PricingError::Numerical(format!("iterate {sigma} rejected at step {it}: {e}"))
                })?;
            sigma -= step;
        }

        // The last step can land outside the domain the pricer accepts
        if !(sigma.is_finite() && sigma > 0.0) {
            return Err(PricingError::Numerical(format!(
                "implied volatility diverged to {sigma} after {} steps",
                self.iterations
            )));
        }

        let residual = bs.value(&market.with_volatility(sigma), strike)? - target_price;
        if residual.abs() > RESIDUAL_WARN {
            tracing::warn!(
                sigma,
                residual,
                iterations = self.iterations,
                "implied volatility did not converge"
            );
        }

        Ok(ImpliedVol { sigma, residual })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::black_scholes::bsm_call_value;

    #[test]
    fn test_recovers_known_sigma() {
        let market = MarketParams::default();
        for (k, start) in [(100.0, 0.3), (90.0, 0.1), (115.0, 0.5)] {
            let c0 = bsm_call_value(&market, k).unwrap();
            let iv = ImpliedVolSolver::new(100, start).solve(&market, k, c0).unwrap();
            assert!((iv.sigma - 0.2).abs() < 1e-8, "K={k}: recovered {}", iv.sigma);
            assert!(iv.converged(1e-10), "K={k}: residual {}", iv.residual);
        }
    }

    #[test]
    fn test_zero_iterations_returns_estimate() {
        let market = MarketParams::default();
        let c0 = bsm_call_value(&market, 100.0).unwrap();
        let iv = ImpliedVolSolver::new(0, 0.35).solve(&market, 100.0, c0).unwrap();
        assert_eq!(iv.sigma, 0.35);
        assert!(!iv.converged(1e-6));
    }

    #[test]
    fn test_single_step_is_one_newton_update() {
        let market = MarketParams::default().with_volatility(0.3);
        let c0 = 10.4506;
        let bs = BlackScholesCall::new();
        let value = bs.value(&market, 100.0).unwrap();
        let vega = bs.vega(&market, 100.0).unwrap();
        let expected = 0.3 - (value - c0) / vega;
        let iv = ImpliedVolSolver::new(1, 0.3).solve(&market, 100.0, c0).unwrap();
        assert!((iv.sigma - expected).abs() < 1e-15);
    }

    #[test]
    fn test_vanishing_vega_fails_loudly() {
        // Far OTM, short dated, tiny starting vol: vega underflows to zero
        let market = MarketParams::new(100.0, 0.1, 0.05, 0.05);
        let result = ImpliedVolSolver::new(10, 0.05).solve(&market, 300.0, 0.5);
        assert!(matches!(result, Err(PricingError::Numerical(_))), "got {result:?}");
    }

    #[test]
    fn test_negative_final_iterate_is_numerical() {
        // A target far below the price at sigma = 2 overshoots to a negative
        // sigma, on the last step as well as on an earlier one
        let market = MarketParams::default();
        for iterations in [1, 2] {
            let result = ImpliedVolSolver::new(iterations, 2.0).solve(&market, 100.0, 1.0);
            assert!(
                matches!(result, Err(PricingError::Numerical(_))),
                "iterations={iterations}: got {result:?}"
            );
        }
    }

    #[test]
    fn test_market_volatility_ignored() {
        let market = MarketParams::default();
        let c0 = bsm_call_value(&market, 100.0).unwrap();
        let solver = ImpliedVolSolver::new(100, 0.3);
        let a = solver.solve(&market, 100.0, c0).unwrap();
        let b = solver.solve(&market.with_volatility(0.9), 100.0, c0).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_preconditions() {
        let solver = ImpliedVolSolver::default();
        let market = MarketParams::default();
        let expired = MarketParams { maturity: 0.0, ..market };
        assert!(solver.solve(&expired, 100.0, 10.0).is_err());
        assert!(solver.solve(&market, 100.0, f64::NAN).is_err());
        assert!(solver.solve(&market, 0.0, 10.0).is_err());
        assert!(ImpliedVolSolver::new(10, 0.0).solve(&market, 100.0, 10.0).is_err());
    }
}
