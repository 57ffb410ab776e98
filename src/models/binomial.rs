use crate::errors::{ensure_positive, PricingError, PricingResult};
use crate::models::{MarketParams, PricingModel};

/// Cox-Ross-Rubinstein binomial lattice for European calls.
///
/// dt = T / M, df = exp(-r dt)
/// u = exp(sigma * sqrt(dt)), d = 1 / u
/// q = (exp(r dt) - d) / (u - d)
///
/// Node (i, j) is the price after j steps with i down-moves:
/// S(i, j) = S0 * u^(j - i) * d^i, for 0 <= i <= j.
///
/// The constants are derived once and shared by every strike priced
/// under the same market.
#[derive(Debug, Clone, Copy)]
pub struct BinomialParams {
    pub spot: f64,
    pub steps: usize,
    pub dt: f64,
    /// Per-step discount factor
    pub df: f64,
    pub up: f64,
    pub down: f64,
    /// Risk-neutral up probability
    pub q: f64,
}

impl BinomialParams {
    /// Derive the lattice constants. Rejects zero steps, step counts whose
    /// (M+1)^2 grid cannot be addressed, non-positive inputs and any
    /// parameter set where d < exp(r dt) < u does not hold.
    pub fn new(market: &MarketParams, steps: usize) -> PricingResult<Self> {
        market.validate()?;
        if steps == 0 || lattice_bytes(steps).is_none() || i32::try_from(steps).is_err() {
            return Err(PricingError::InvalidInput {
                field: "steps",
                value: steps as f64,
            });
        }

        let dt = market.maturity / steps as f64;
        let df = (-market.rate * dt).exp();
        let up = (market.volatility * dt.sqrt()).exp();
        let down = 1.0 / up;
        let growth = (market.rate * dt).exp();

        // u == d happens when sigma * sqrt(dt) underflows
        if !(down < growth && growth < up) {
            return Err(PricingError::Arbitrage { down, growth, up });
        }

        let q = (growth - down) / (up - down);

        tracing::debug!(steps, dt, df, up, down, q, "binomial lattice constants");

        Ok(Self {
            spot: market.spot,
            steps,
            dt,
            df,
            up,
            down,
            q,
        })
    }

    // steps fits in i32 (checked in new)
    #[inline]
    fn node_price(&self, i: usize, j: usize) -> f64 {
        self.spot * self.up.powi(j as i32 - i as i32) * self.down.powi(i as i32)
    }

    /// Explicit double iteration over every valid (i, j) node.
    pub fn value_loop(&self, strike: f64) -> PricingResult<f64> {
        ensure_positive("strike", strike)?;
        let m = self.steps;

        // Index levels
        let mut prices = Lattice::new(m + 1);
        for j in 0..=m {
            for i in 0..=j {
                prices.set(i, j, self.node_price(i, j));
            }
        }

        // Inner values at maturity
        let mut pv = Lattice::new(m + 1);
        for (i, &s) in prices.column(m).iter().enumerate() {
            pv.set(i, m, (s - strike).max(0.0));
        }

        // Backward induction
        for j in (0..m).rev() {
            for i in 0..=j {
                let v = self.df
                    * (self.q * pv.get(i, j + 1) + (1.0 - self.q) * pv.get(i + 1, j + 1));
                pv.set(i, j, v);
            }
        }

        Ok(pv.get(0, 0))
    }

    /// Whole-grid formulation: every cell (padding included) is priced by
    /// broadcasting u^(j - i) * d^i, the payoff is mapped over the grid, and
    /// each backward step updates the valid prefix of a column from the
    /// adjacent pairs of the next one.
    pub fn value_vectorised(&self, strike: f64) -> PricingResult<f64> {
        ensure_positive("strike", strike)?;
        let m = self.steps;
        let n = m + 1;

        let prices = Lattice::from_fn(n, |i, j| self.node_price(i, j));
        let mut pv = prices.map(|s| (s - strike).max(0.0));

        let (q, df) = (self.q, self.df);
        for t in (0..m).rev() {
            let (current, next) = pv.column_pair_mut(t);
            // Column t holds t + 1 live nodes, column t + 1 holds t + 2
            for (v, pair) in current[..=t].iter_mut().zip(next[..t + 2].windows(2)) {
                *v = (q * pair[0] + (1.0 - q) * pair[1]) * df;
            }
        }

        Ok(pv.get(0, 0))
    }
}

/// Bytes of the (steps + 1)^2 grid, or None when it overflows an allocation.
fn lattice_bytes(steps: usize) -> Option<usize> {
    let n = steps.checked_add(1)?;
    let bytes = n.checked_mul(n)?.checked_mul(std::mem::size_of::<f64>())?;
    (bytes <= isize::MAX as usize).then_some(bytes)
}

/// Square (n x n) grid stored column-major so that each time step is a
/// contiguous slice. Cells with i > j are padding.
#[derive(Debug, Clone)]
pub struct Lattice {
    size: usize,
    cells: Vec<f64>,
}

impl Lattice {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            cells: vec![0.0; size * size],
        }
    }

    pub fn from_fn(size: usize, f: impl Fn(usize, usize) -> f64) -> Self {
        let cells = (0..size * size)
            .map(|k| f(k % size, k / size))
            .collect();
        Self { size, cells }
    }

    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            size: self.size,
            cells: self.cells.iter().map(|&c| f(c)).collect(),
        }
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.cells[j * self.size + i]
    }

    #[inline]
    pub fn set(&mut self, i: usize, j: usize, value: f64) {
        self.cells[j * self.size + i] = value;
    }

    #[inline]
    pub fn column(&self, j: usize) -> &[f64] {
        &self.cells[j * self.size..(j + 1) * self.size]
    }

    /// Column j mutably alongside column j + 1.
    #[inline]
    pub fn column_pair_mut(&mut self, j: usize) -> (&mut [f64], &[f64]) {
        let n = self.size;
        let (head, tail) = self.cells.split_at_mut((j + 1) * n);
        (&mut head[j * n..], &tail[..n])
    }
}

/// Which of the two equivalent lattice strategies to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LatticeMethod {
    Loop,
    Vectorised,
}

pub struct BinomialPricer {
    pub steps: usize,
    pub method: LatticeMethod,
}

impl BinomialPricer {
    pub fn new(steps: usize, method: LatticeMethod) -> Self {
        Self { steps, method }
    }
}

impl PricingModel for BinomialPricer {
    fn name(&self) -> &'static str {
        match self.method {
            LatticeMethod::Loop => "Binomial (loop)",
            LatticeMethod::Vectorised => "Binomial (vectorised)",
        }
    }

    fn call_value(&self, market: &MarketParams, strike: f64) -> PricingResult<f64> {
        let params = BinomialParams::new(market, self.steps)?;
        match self.method {
            LatticeMethod::Loop => params.value_loop(strike),
            LatticeMethod::Vectorised => params.value_vectorised(strike),
        }
    }
}
