use statrs::distribution::{Continuous, ContinuousCDF, Normal};

/// Standard normal N(0, 1), shared by the analytical pricer and Vega.
/// `Normal::standard()` cannot fail, so no fallback path is needed.
#[derive(Debug, Clone, Copy)]
pub struct StandardNormal {
    dist: Normal,
}

impl StandardNormal {
    pub fn new() -> Self {
        Self {
            dist: Normal::standard(),
        }
    }

    /// Cumulative distribution function Phi(x).
    #[inline]
    pub fn cdf(&self, x: f64) -> f64 {
        self.dist.cdf(x)
    }

    /// Probability density function phi(x).
    #[inline]
    pub fn pdf(&self, x: f64) -> f64 {
        self.dist.pdf(x)
    }
}

impl Default for StandardNormal {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cdf_reference_values() {
        let n = StandardNormal::new();
        // Abramowitz & Stegun table values. statrs' erfc is good to about
        // 1e-11 here; every analytical price and Vega inherits this bound.
        let cases = [
            (0.0, 0.5),
            (1.0, 0.841_344_746_068_543),
            (-1.0, 0.158_655_253_931_457),
            (1.96, 0.975_002_104_851_780),
            (-2.5, 0.006_209_665_325_776),
            (0.35, 0.636_830_651_175_619),
        ];
        for (x, expected) in cases {
            let got = n.cdf(x);
            assert!((got - expected).abs() < 1e-10, "Phi({x})={got}, expected {expected}");
        }
    }

    #[test]
    fn test_pdf_reference_values() {
        let n = StandardNormal::new();
        let inv_sqrt_2pi = 0.398_942_280_401_432_7;
        assert!((n.pdf(0.0) - inv_sqrt_2pi).abs() < 1e-14);
        assert!((n.pdf(1.0) - 0.241_970_724_519_143).abs() < 1e-10);
        assert!((n.pdf(-1.0) - n.pdf(1.0)).abs() < 1e-15, "pdf must be symmetric");
    }

    #[test]
    fn test_cdf_tails() {
        let n = StandardNormal::new();
        assert!(n.cdf(-40.0) >= 0.0 && n.cdf(-40.0) < 1e-300);
        assert!((n.cdf(40.0) - 1.0).abs() < 1e-15);
    }
}
