use crate::errors::{PricingError, PricingResult};
use crate::models::monte_carlo::{self, McConfig};
use crate::models::MarketParams;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// One entry of the strike -> value mapping.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct StrikeValuation {
    pub strike: f64,
    pub value: f64,
    pub std_error: f64,
}

/// `n` evenly spaced points from `low` to `high` inclusive.
pub fn linspace(low: f64, high: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![low],
        _ => {
            let step = (high - low) / (n - 1) as f64;
            (0..n).map(|i| low + step * i as f64).collect()
        }
    }
}

/// Value every strike with an independent Monte-Carlo estimate on the
/// blocking pool, at most `workers` at a time, and join them all.
///
/// Tasks share nothing: each owns its RNG and path array. With a seeded
/// config, strike `i` uses `seed + i`, so a batch is reproducible.
/// Completion order is irrelevant; the result is sorted by strike.
pub async fn value_strikes(
    market: MarketParams,
    strikes: &[f64],
    config: McConfig,
    workers: usize,
) -> PricingResult<Vec<StrikeValuation>> {
    if workers == 0 {
        return Err(PricingError::InvalidInput { field: "workers", value: 0.0 });
    }
    market.validate()?;
    config.validate()?;

    let permits = Arc::new(Semaphore::new(workers));
    let mut tasks = JoinSet::new();

    for (idx, &strike) in strikes.iter().enumerate() {
        let permit = permits.clone().acquire_owned().await?;
        let task_config = McConfig {
            seed: config.seed.map(|s| s.wrapping_add(idx as u64)),
            ..config
        };
        tasks.spawn_blocking(move || {
            let _permit = permit;
            monte_carlo::estimate(&market, strike, &task_config).map(|est| StrikeValuation {
                strike,
                value: est.value,
                std_error: est.std_error,
            })
        });
    }

    let mut results = Vec::with_capacity(strikes.len());
    while let Some(joined) = tasks.join_next().await {
        let valuation = joined??;
        tracing::debug!(strike = valuation.strike, value = valuation.value, "strike valued");
        results.push(valuation);
    }

    results.sort_by(|a, b| a.strike.total_cmp(&b.strike));

    tracing::info!(strikes = results.len(), workers, "strike batch complete");

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::black_scholes::bsm_call_value;

    fn seeded(seed: u64) -> McConfig {
        McConfig { steps: 10, paths: 10_000, seed: Some(seed) }
    }

    #[test]
    fn test_linspace() {
        let xs = linspace(80.0, 120.0, 5);
        assert_eq!(xs, vec![80.0, 90.0, 100.0, 110.0, 120.0]);
        assert!(linspace(1.0, 2.0, 0).is_empty());
        assert_eq!(linspace(3.0, 9.0, 1), vec![3.0]);
    }

    #[tokio::test]
    async fn test_batch_sorted_and_complete() {
        let strikes = [120.0, 80.0, 100.0, 90.0, 110.0];
        let out = value_strikes(MarketParams::default(), &strikes, seeded(5), 3).await.unwrap();
        assert_eq!(out.len(), strikes.len());
        let ks: Vec<f64> = out.iter().map(|v| v.strike).collect();
        assert_eq!(ks, vec![80.0, 90.0, 100.0, 110.0, 120.0]);
    }

    #[tokio::test]
    async fn test_batch_matches_sequential() {
        let market = MarketParams::default();
        let strikes = linspace(80.0, 120.0, 6);
        let out = value_strikes(market, &strikes, seeded(11), 4).await.unwrap();
        for (idx, &k) in strikes.iter().enumerate() {
            let seq = monte_carlo::estimate(&market, k, &seeded(11 + idx as u64)).unwrap();
            let par = out.iter().find(|v| v.strike == k).unwrap();
            assert_eq!(par.value, seq.value, "K={k}");
        }
    }

    #[tokio::test]
    async fn test_batch_near_bsm() {
        let market = MarketParams::default();
        let strikes = linspace(80.0, 120.0, 9);
        let out = value_strikes(market, &strikes, seeded(100), 2).await.unwrap();
        for v in &out {
            let bsm = bsm_call_value(&market, v.strike).unwrap();
            assert!(
                (v.value - bsm).abs() < 5.0 * v.std_error,
                "K={}: mc={} bsm={bsm}",
                v.strike,
                v.value
            );
        }
    }

    #[tokio::test]
    async fn test_zero_workers_rejected() {
        let out = value_strikes(MarketParams::default(), &[100.0], seeded(1), 0).await;
        assert!(out.is_err());
    }

    #[tokio::test]
    async fn test_bad_strike_propagates() {
        let out = value_strikes(MarketParams::default(), &[100.0, -1.0], seeded(1), 2).await;
        assert!(matches!(out, Err(PricingError::InvalidInput { field: "strike", .. })));
    }
}
