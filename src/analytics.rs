use crate::errors::{PricingError, PricingResult};
use chrono::NaiveDate;

/// Trading days per year for annualising daily volatility.
pub const TRADING_DAYS: usize = 252;

/// Short and long moving-average windows for the regime signal.
pub const SHORT_WINDOW: usize = 42;
pub const LONG_WINDOW: usize = 252;

/// Spread between the averages needed to call a trend.
pub const REGIME_THRESHOLD: f64 = 50.0;

/// One daily close. Where the series comes from is up to the caller.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub close: f64,
}

/// Market position implied by the moving-average spread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Regime {
    Long,
    Neutral,
    Short,
}

impl Regime {
    #[inline]
    pub fn position(&self) -> f64 {
        match self {
            Self::Long => 1.0,
            Self::Neutral => 0.0,
            Self::Short => -1.0,
        }
    }
}

impl std::fmt::Display for Regime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Long => write!(f, "long"),
            Self::Neutral => write!(f, "neutral"),
            Self::Short => write!(f, "short"),
        }
    }
}

/// ln(P_t / P_{t-1}). The first bar has no return, so the output is
/// aligned with `bars[1..]`.
pub fn log_returns(bars: &[PriceBar]) -> PricingResult<Vec<f64>> {
    if let Some(bad) = bars.iter().find(|b| !(b.close.is_finite() && b.close > 0.0)) {
        return Err(PricingError::InvalidInput { field: "close", value: bad.close });
    }
    Ok(bars
        .windows(2)
        .map(|w| (w[1].close / w[0].close).ln())
        .collect())
}

/// Trailing mean over `window` values; None until the window is full.
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<Option<f64>> {
    rolling(values, window, |w| w.iter().sum::<f64>() / w.len() as f64)
}

/// Trailing sample standard deviation scaled by sqrt(252).
pub fn rolling_volatility(returns: &[f64], window: usize) -> Vec<Option<f64>> {
    let scale = (TRADING_DAYS as f64).sqrt();
    rolling(returns, window, |w| sample_std(w) * scale)
}

fn rolling(values: &[f64], window: usize, f: impl Fn(&[f64]) -> f64) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; values.len()];
    }
    (0..values.len())
        .map(|i| (i + 1 >= window).then(|| f(&values[i + 1 - window..=i])))
        .collect()
}

fn sample_std(w: &[f64]) -> f64 {
    let n = w.len();
    if n < 2 {
        return 0.0;
    }
    let nf = n as f64;
    let mean = w.iter().sum::<f64>() / nf;
    let var = w.iter().map(|x| (x - mean) * (x - mean)).sum::<f64>() / (nf - 1.0);
    var.sqrt()
}

/// Trend regime from the spread between a short and a long moving average
/// of closes: long above +threshold, short below -threshold, neutral
/// otherwise (including before the long average exists). Both averages are
/// rounded to cents before the spread is taken, so a spread that only
/// clears the threshold by sub-cent noise stays neutral.
pub fn regimes(closes: &[f64], short: usize, long: usize, threshold: f64) -> Vec<Regime> {
    let fast = rolling_mean(closes, short);
    let slow = rolling_mean(closes, long);
    fast.iter()
        .zip(&slow)
        .map(|pair| match pair {
            (Some(f), Some(s)) => {
                let spread = round_cents(*f) - round_cents(*s);
                if spread > threshold {
                    Regime::Long
                } else if spread < -threshold {
                    Regime::Short
                } else {
                    Regime::Neutral
                }
            }
            _ => Regime::Neutral,
        })
        .collect()
}

#[inline]
fn round_cents(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Strategy returns: yesterday's regime applied to today's market return.
/// `market_returns[i]` is the return from bar i to bar i + 1, so it is
/// paired with `regimes[i]`.
pub fn strategy_returns(regimes: &[Regime], market_returns: &[f64]) -> Vec<f64> {
    regimes
        .iter()
        .zip(market_returns)
        .map(|(r, m)| r.position() * m)
        .collect()
}

/// exp(sum of log returns): gross growth of one unit invested.
pub fn cumulative_growth(log_returns: &[f64]) -> f64 {
    log_returns.iter().sum::<f64>().exp()
}
