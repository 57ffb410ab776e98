use crate::errors::{PricingError, PricingResult};
use crate::models::monte_carlo::McConfig;
use crate::models::MarketParams;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("expected text or json, got {other}")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub market: MarketParams,
    pub strike: f64,
    pub binomial_steps: usize,
    pub mc: McConfig,
    pub strike_low: f64,
    pub strike_high: f64,
    pub strike_count: usize,
    pub batch_workers: usize,
    pub implied_vol_iterations: usize,
    pub implied_vol_guess: f64,
    pub output: OutputFormat,
}

impl AppConfig {
    pub fn from_env() -> PricingResult<Self> {
        dotenvy::dotenv().ok();

        let market = MarketParams {
            spot: parse_env("SPOT", "100.0")?,
            maturity: parse_env("MATURITY", "1.0")?,
            rate: parse_env("RATE", "0.05")?,
            volatility: parse_env("VOLATILITY", "0.2")?,
        };

        let mc_seed = match std::env::var("MC_SEED") {
            Ok(v) => Some(
                v.parse::<u64>()
                    .map_err(|e| PricingError::Config(format!("MC_SEED: {e}")))?,
            ),
            Err(_) => None,
        };

        let default_workers = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4)
            .to_string();

        let cfg = Self {
            market,
            strike: parse_env("STRIKE", "100.0")?,
            binomial_steps: parse_env("BINOMIAL_STEPS", "1000")?,
            mc: McConfig {
                steps: parse_env("MC_STEPS", "50")?,
                paths: parse_env("MC_PATHS", "20000")?,
                seed: mc_seed,
            },
            strike_low: parse_env("STRIKE_LOW", "80.0")?,
            strike_high: parse_env("STRIKE_HIGH", "120.0")?,
            strike_count: parse_env("STRIKE_COUNT", "20")?,
            batch_workers: parse_env("BATCH_WORKERS", &default_workers)?,
            implied_vol_iterations: parse_env("IMPLIED_VOL_ITERATIONS", "100")?,
            implied_vol_guess: parse_env("IMPLIED_VOL_GUESS", "0.3")?,
            output: parse_env("OUTPUT_FORMAT", "text")?,
        };

        cfg.market
            .validate()
            .map_err(|e| PricingError::Config(format!("market parameters: {e}")))?;
        if cfg.strike_low > cfg.strike_high {
            return Err(PricingError::Config(format!(
                "STRIKE_LOW {} above STRIKE_HIGH {}",
                cfg.strike_low, cfg.strike_high
            )));
        }

        Ok(cfg)
    }
}

fn parse_env<T>(key: &str, default: &str) -> PricingResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    env_var_or(key, default)
        .parse::<T>()
        .map_err(|e| PricingError::Config(format!("{key}: {e}")))
}

fn env_var_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_parse() {
        assert_eq!("JSON".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert_eq!("text".parse::<OutputFormat>(), Ok(OutputFormat::Text));
        assert!("yaml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_parse_env_default_and_error() {
        let v: f64 = parse_env("OPTION_LAB_TEST_UNSET_KEY", "1.5").unwrap();
        assert_eq!(v, 1.5);
        let bad = parse_env::<usize>("OPTION_LAB_TEST_UNSET_KEY", "abc");
        match bad {
            Err(PricingError::Config(msg)) => assert!(msg.starts_with("OPTION_LAB_TEST_UNSET_KEY")),
            other => panic!("expected config error, got {other:?}"),
        }
    }
}
