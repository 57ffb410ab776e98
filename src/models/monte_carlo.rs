use crate::errors::{ensure_positive, PricingError, PricingResult};
use crate::models::MarketParams;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, StandardNormal};

/// Simulation resolution for the Monte-Carlo estimator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct McConfig {
    /// Time steps per path (M)
    pub steps: usize,
    /// Independent paths (I)
    pub paths: usize,
    /// Fixed seed for reproducible runs; fresh entropy when None
    pub seed: Option<u64>,
}

impl Default for McConfig {
    fn default() -> Self {
        Self {
            steps: 50,
            paths: 20_000,
            seed: None,
        }
    }
}

impl McConfig {
    pub fn validate(&self) -> PricingResult<()> {
        if self.steps == 0 {
            return Err(PricingError::InvalidInput { field: "mc_steps", value: 0.0 });
        }
        if self.paths == 0 {
            return Err(PricingError::InvalidInput {
                field: "mc_paths",
                value: self.paths as f64,
            });
        }
        Ok(())
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

/// Discounted mean payoff plus its standard error.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct McEstimate {
    pub value: f64,
    pub std_error: f64,
}

/// Simulated price paths, (steps + 1) rows by `paths` columns.
/// Row t is contiguous so each time step updates a single slice.
#[derive(Debug, Clone)]
pub struct PathEnsemble {
    steps: usize,
    paths: usize,
    cells: Vec<f64>,
}

impl PathEnsemble {
    #[inline]
    pub fn row(&self, t: usize) -> &[f64] {
        &self.cells[t * self.paths..(t + 1) * self.paths]
    }

    #[inline]
    pub fn terminal(&self) -> &[f64] {
        self.row(self.steps)
    }
}

/// Geometric Brownian motion under the risk-neutral measure:
/// S[t] = S[t-1] * exp((r - sigma^2/2) dt + sigma sqrt(dt) Z)
/// with an independent Z per step and path.
pub fn simulate_paths<R: Rng + ?Sized>(
    market: &MarketParams,
    steps: usize,
    paths: usize,
    rng: &mut R,
) -> PathEnsemble {
    let dt = market.maturity / steps as f64;
    let drift = (market.rate - 0.5 * market.volatility * market.volatility) * dt;
    let diffusion = market.volatility * dt.sqrt();

    let mut cells = vec![0.0; (steps + 1) * paths];
    cells[..paths].fill(market.spot);

    for t in 1..=steps {
        let (prev, rest) = cells.split_at_mut(t * paths);
        let prev = &prev[(t - 1) * paths..];
        for (s, &s_prev) in rest[..paths].iter_mut().zip(prev) {
            let z: f64 = StandardNormal.sample(&mut *rng);
            *s = s_prev * (drift + diffusion * z).exp();
        }
    }

    PathEnsemble { steps, paths, cells }
}

/// Monte-Carlo estimate of a European call:
/// exp(-rT) * mean(max(S_T - K, 0)).
///
/// A single path has no sample variance, so its standard error is NaN.
pub fn estimate(
    market: &MarketParams,
    strike: f64,
    config: &McConfig,
) -> PricingResult<McEstimate> {
    market.validate()?;
    ensure_positive("strike", strike)?;
    config.validate()?;

    let mut rng = config.rng();
    let ensemble = simulate_paths(market, config.steps, config.paths, &mut rng);

    let n = config.paths as f64;
    let (sum, sum_sq) = ensemble
        .terminal()
        .iter()
        .map(|&s| (s - strike).max(0.0))
        .fold((0.0, 0.0), |(a, b), p| (a + p, b + p * p));

    let mean = sum / n;
    let disc = market.discount();
    let std_error = if config.paths > 1 {
        let var = ((sum_sq - n * mean * mean) / (n - 1.0)).max(0.0);
        disc * (var / n).sqrt()
    } else {
        f64::NAN
    };

    let est = McEstimate {
        value: disc * mean,
        std_error,
    };

    tracing::debug!(
        strike,
        steps = config.steps,
        paths = config.paths,
        value = est.value,
        std_error = est.std_error,
        "monte carlo estimate"
    );

    Ok(est)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::black_scholes::bsm_call_value;

    fn seeded(steps: usize, paths: usize, seed: u64) -> McConfig {
        McConfig { steps, paths, seed: Some(seed) }
    }

    #[test]
    fn test_paths_start_at_spot() {
        let market = MarketParams::default();
        let mut rng = StdRng::seed_from_u64(7);
        let ens = simulate_paths(&market, 5, 100, &mut rng);
        assert!(ens.row(0).iter().all(|&s| s == 100.0));
        assert!(ens.terminal().iter().all(|&s| s > 0.0 && s.is_finite()));
    }

    #[test]
    fn test_single_run_near_bsm() {
        let market = MarketParams::default();
        let est = estimate(&market, 100.0, &seeded(50, 20_000, 42)).unwrap();
        let bsm = bsm_call_value(&market, 100.0).unwrap();
        assert!(
            (est.value - bsm).abs() < 4.0 * est.std_error,
            "mc={} +/- {} bsm={bsm}",
            est.value,
            est.std_error
        );
    }

    #[test]
    fn test_average_of_runs_converges() {
        let market = MarketParams::default();
        let bsm = bsm_call_value(&market, 105.0).unwrap();
        let runs = 20;
        let mean = (0..runs)
            .map(|seed| estimate(&market, 105.0, &seeded(10, 20_000, seed)).unwrap().value)
            .sum::<f64>()
            / runs as f64;
        assert!((mean - bsm).abs() < 0.1, "mean of runs={mean} bsm={bsm}");
    }

    #[test]
    fn test_std_error_shrinks_with_paths() {
        let market = MarketParams::default();
        let small = estimate(&market, 100.0, &seeded(10, 2_000, 1)).unwrap();
        let large = estimate(&market, 100.0, &seeded(10, 32_000, 2)).unwrap();
        // 16x paths -> 4x smaller standard error
        let ratio = small.std_error / large.std_error;
        assert!(ratio > 3.0 && ratio < 5.0, "std error ratio={ratio}");
    }

    #[test]
    fn test_seed_reproducible() {
        let market = MarketParams::default();
        let a = estimate(&market, 100.0, &seeded(10, 1_000, 99)).unwrap();
        let b = estimate(&market, 100.0, &seeded(10, 1_000, 99)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_deep_otm_is_zero() {
        let market = MarketParams::default();
        let est = estimate(&market, 10_000.0, &seeded(10, 5_000, 3)).unwrap();
        assert_eq!(est.value, 0.0);
    }

    #[test]
    fn test_single_path() {
        let market = MarketParams::default();
        let est = estimate(&market, 100.0, &seeded(10, 1, 5)).unwrap();
        assert!(est.value.is_finite() && est.value >= 0.0, "value={}", est.value);
        assert!(est.std_error.is_nan());

        // The lone payoff is the discounted terminal price of the same path
        let mut rng = StdRng::seed_from_u64(5);
        let s_t = simulate_paths(&market, 10, 1, &mut rng).terminal()[0];
        assert_eq!(est.value, market.discount() * (s_t - 100.0).max(0.0));
    }

    #[test]
    fn test_invalid_config() {
        let market = MarketParams::default();
        assert!(estimate(&market, 100.0, &seeded(0, 100, 1)).is_err());
        assert!(estimate(&market, 100.0, &seeded(10, 0, 1)).is_err());
        assert!(estimate(&market.with_volatility(0.0), 100.0, &seeded(10, 100, 1)).is_err());
    }
}
