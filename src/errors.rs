/// Error types for the pricing library.
/// Every pricer checks its preconditions on entry and returns one of these
/// instead of handing back a NaN or infinite value.
#[derive(Debug, thiserror::Error)]
pub enum PricingError {
    #[error("invalid input: {field} = {value}")]
    InvalidInput { field: &'static str, value: f64 },

    #[error("no-arbitrage violated: down {down} < growth {growth} < up {up} does not hold")]
    Arbitrage { down: f64, growth: f64, up: f64 },

    #[error("numerical error: {0}")]
    Numerical(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("worker error: {0}")]
    Worker(String),
}

impl From<tokio::task::JoinError> for PricingError {
    fn from(e: tokio::task::JoinError) -> Self {
        PricingError::Worker(e.to_string())
    }
}

impl From<tokio::sync::AcquireError> for PricingError {
    fn from(e: tokio::sync::AcquireError) -> Self {
        PricingError::Worker(e.to_string())
    }
}

pub type PricingResult<T> = Result<T, PricingError>;

/// Reject anything that is not a finite, strictly positive number.
#[inline]
pub fn ensure_positive(field: &'static str, value: f64) -> PricingResult<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(PricingError::InvalidInput { field, value })
    }
}

#[inline]
pub fn ensure_finite(field: &'static str, value: f64) -> PricingResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(PricingError::InvalidInput { field, value })
    }
}
