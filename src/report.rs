use crate::analytics::Regime;
use crate::batch::StrikeValuation;
use crate::models::implied_vol::ImpliedVol;
use crate::models::MarketParams;
use std::fmt;

#[derive(Debug, Clone, serde::Serialize)]
pub struct MethodValue {
    pub method: &'static str,
    pub value: f64,
}

/// Agreement between the two lattice strategies.
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct LatticeCheck {
    pub steps: usize,
    pub loop_value: f64,
    pub vectorised_value: f64,
    pub relative_diff: f64,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct SeriesSummary {
    pub bars: usize,
    pub annualised_vol: Option<f64>,
    pub last_regime: Regime,
    pub market_growth: f64,
    pub strategy_growth: f64,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct FormulaValue {
    pub name: &'static str,
    pub value: f64,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct PricingReport {
    pub market: MarketParams,
    pub strike: f64,
    pub valuations: Vec<MethodValue>,
    pub mc_std_error: f64,
    pub lattice: LatticeCheck,
    pub vega: f64,
    pub implied_vol: ImpliedVol,
    pub batch: Vec<StrikeValuation>,
    pub series: SeriesSummary,
    pub formulas: Vec<FormulaValue>,
}

impl PricingReport {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn to_text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for PricingReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = &self.market;
        writeln!(
            f,
            "European call  S0={} K={} T={} r={} sigma={}",
            m.spot, self.strike, m.maturity, m.rate, m.volatility
        )?;
        for v in &self.valuations {
            writeln!(f, "  {:<24} {:>12.6}", v.method, v.value)?;
        }
        writeln!(f, "  {:<24} {:>12.6}", "MC std error", self.mc_std_error)?;
        writeln!(
            f,
            "  lattice loop vs vectorised (M={}): rel diff {:.3e}",
            self.lattice.steps, self.lattice.relative_diff
        )?;
        writeln!(f, "  {:<24} {:>12.6}", "Vega", self.vega)?;
        writeln!(
            f,
            "  {:<24} {:>12.6}  (residual {:.3e})",
            "Implied vol", self.implied_vol.sigma, self.implied_vol.residual
        )?;

        writeln!(f, "\nMonte-Carlo strike batch")?;
        for v in &self.batch {
            writeln!(
                f,
                "  K={:>8.3}  {:>10.6} +/- {:.6}",
                v.strike, v.value, v.std_error
            )?;
        }

        let s = &self.series;
        writeln!(f, "\nSimulated series ({} bars)", s.bars)?;
        match s.annualised_vol {
            Some(vol) => writeln!(f, "  annualised vol  {vol:.4}")?,
            None => writeln!(f, "  annualised vol  n/a")?,
        }
        writeln!(f, "  last regime     {}", s.last_regime)?;
        writeln!(f, "  market growth   {:.4}", s.market_growth)?;
        writeln!(f, "  strategy growth {:.4}", s.strategy_growth)?;

        writeln!(f, "\nFormulas")?;
        for v in &self.formulas {
            writeln!(f, "  {:<24} {:>14.6}", v.name, v.value)?;
        }
        Ok(())
    }
}
