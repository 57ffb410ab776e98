mod analytics;
mod batch;
mod config;
mod errors;
mod fundamentals;
mod models;
mod report;

use crate::analytics::PriceBar;
use crate::config::{AppConfig, OutputFormat};
use crate::errors::PricingResult;
use crate::models::binomial::{BinomialPricer, LatticeMethod};
use crate::models::black_scholes::{self, BlackScholesCall};
use crate::models::implied_vol::ImpliedVolSolver;
use crate::models::monte_carlo::{self, McConfig};
use crate::models::{MarketParams, PricingModel};
use crate::report::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Length of the simulated daily close series fed to the analytics.
const SERIES_BARS: usize = 600;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("option_lab starting");

    let cfg = match AppConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("config error: {e}");
            std::process::exit(1);
        }
    };

    let report = match run(&cfg).await {
        Ok(r) => r,
        Err(e) => {
            tracing::error!(error = %e, "pricing failed");
            std::process::exit(1);
        }
    };

    match cfg.output {
        OutputFormat::Text => print!("{}", report.to_text()),
        OutputFormat::Json => match report.to_json() {
            Ok(json) => println!("{json}"),
            Err(e) => {
                tracing::error!("report encoding error: {e}");
                std::process::exit(1);
            }
        },
    }
}

/// Price the configured strike with every method, then run the strike batch,
/// the series analytics and the formula samples.
async fn run(cfg: &AppConfig) -> PricingResult<PricingReport> {
    let market = cfg.market;
    let strike = cfg.strike;

    // Pricing model instances (created once, reused)
    let bsm = BlackScholesCall::new();
    let tree_loop = BinomialPricer::new(cfg.binomial_steps, LatticeMethod::Loop);
    let tree_vec = BinomialPricer::new(cfg.binomial_steps, LatticeMethod::Vectorised);
    let pricing_models: Vec<&dyn PricingModel> = vec![&bsm, &tree_loop, &tree_vec];

    let mut valuations = Vec::with_capacity(pricing_models.len() + 1);
    for model in &pricing_models {
        let value = model.call_value(&market, strike)?;
        tracing::info!(model = model.name(), value, "valued");
        valuations.push(MethodValue { method: model.name(), value });
    }

    let mc = monte_carlo::estimate(&market, strike, &cfg.mc)?;
    tracing::info!(value = mc.value, std_error = mc.std_error, "monte carlo valued");
    valuations.push(MethodValue { method: "Monte-Carlo", value: mc.value });

    let (loop_value, vectorised_value) = (valuations[1].value, valuations[2].value);
    let lattice = LatticeCheck {
        steps: cfg.binomial_steps,
        loop_value,
        vectorised_value,
        relative_diff: (loop_value - vectorised_value).abs()
            / loop_value.abs().max(f64::MIN_POSITIVE),
    };

    // Round trip: the analytical price back through the Newton solver
    let target = black_scholes::bsm_call_value(&market, strike)?;
    let vega = black_scholes::bsm_vega(&market, strike)?;
    let implied_vol = ImpliedVolSolver::new(cfg.implied_vol_iterations, cfg.implied_vol_guess)
        .solve(&market, strike, target)?;
    tracing::info!(
        sigma = implied_vol.sigma,
        residual = implied_vol.residual,
        "implied volatility"
    );

    let strikes = batch::linspace(cfg.strike_low, cfg.strike_high, cfg.strike_count);
    let batch = batch::value_strikes(market, &strikes, cfg.mc, cfg.batch_workers).await?;

    Ok(PricingReport {
        market,
        strike,
        valuations,
        mc_std_error: mc.std_error,
        lattice,
        vega,
        implied_vol,
        batch,
        series: series_summary(&market, &cfg.mc)?,
        formulas: formula_samples()?,
    })
}

/// One simulated GBM path of daily closes run through the analytics.
fn series_summary(market: &MarketParams, mc: &McConfig) -> PricingResult<SeriesSummary> {
    let mut rng = match mc.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let steps = SERIES_BARS - 1;
    let daily = MarketParams {
        maturity: steps as f64 / analytics::TRADING_DAYS as f64,
        ..*market
    };
    let path = monte_carlo::simulate_paths(&daily, steps, 1, &mut rng);

    let start = chrono::NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or_default();
    let bars: Vec<PriceBar> = (0..=steps)
        .map(|t| PriceBar {
            date: start + chrono::Duration::days(t as i64),
            close: path.row(t)[0],
        })
        .collect();

    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let returns = analytics::log_returns(&bars)?;
    let vol = analytics::rolling_volatility(&returns, analytics::TRADING_DAYS);
    let regimes = analytics::regimes(
        &closes,
        analytics::SHORT_WINDOW,
        analytics::LONG_WINDOW,
        analytics::REGIME_THRESHOLD,
    );
    let strategy = analytics::strategy_returns(&regimes, &returns);

    Ok(SeriesSummary {
        bars: bars.len(),
        annualised_vol: vol.last().copied().flatten(),
        last_regime: regimes.last().copied().unwrap_or(analytics::Regime::Neutral),
        market_growth: analytics::cumulative_growth(&returns),
        strategy_growth: analytics::cumulative_growth(&strategy),
    })
}

fn formula_samples() -> PricingResult<Vec<FormulaValue>> {
    use crate::fundamentals::*;

    let rights = rights_per_new_share(200_000.0, new_shares(1_000_000.0, 20.0)?)?;
    Ok(vec![
        FormulaValue { name: "Coupon payment", value: coupon_payment(1_000_000.0, 0.0431, 0.0002) },
        FormulaValue { name: "Current yield", value: current_yield(1000.0, 0.08, 930.0)? },
        FormulaValue { name: "Dividend yield (%)", value: dividend_yield(0.44, 28.25)? },
        FormulaValue { name: "PE ratio", value: pe_ratio(28.25, 1.72)? },
        FormulaValue { name: "Bond yield", value: bond_yield(8.0, 930.0)? },
        FormulaValue { name: "Futures fair value", value: futures_fair_value(0.05, 50.0, 0.0) },
        FormulaValue {
            name: "Asset futures value",
            value: asset_futures_fair_value(0.03, 50.0, 0.02),
        },
        FormulaValue { name: "Ex-rights price", value: ex_rights_price(rights, 25.0, 20.0)? },
        FormulaValue { name: "PV of 100 in 3y @4%", value: present_value(100.0, 3.0, 0.04)? },
        FormulaValue { name: "Discount factor", value: discount_factor(4.0, 0.06, 2.0)? },
        FormulaValue { name: "Annuity 1000 x 15y", value: annuity_value(1000.0, 0.03, 15.0)? },
        FormulaValue { name: "Perpetuity 1000", value: perpetual_annuity_value(1000.0, 0.03)? },
    ])
}
