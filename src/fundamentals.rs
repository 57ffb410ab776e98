// Equity, bond and time-value-of-money formulas.
// A zero or non-finite denominator is an input error.

use crate::errors::{PricingError, PricingResult};

#[inline]
fn nonzero(field: &'static str, value: f64) -> PricingResult<f64> {
    if value.is_finite() && value != 0.0 {
        Ok(value)
    } else {
        Err(PricingError::InvalidInput { field, value })
    }
}

/// Share price / earnings per share.
pub fn pe_ratio(share_price: f64, eps: f64) -> PricingResult<f64> {
    Ok(share_price / nonzero("eps", eps)?)
}

/// Annual dividend over share price, in percent.
pub fn dividend_yield(annual_dividend: f64, share_price: f64) -> PricingResult<f64> {
    Ok(annual_dividend / nonzero("share_price", share_price)? * 100.0)
}

/// Coupon / purchase price.
pub fn bond_yield(coupon: f64, purchase_price: f64) -> PricingResult<f64> {
    Ok(coupon / nonzero("purchase_price", purchase_price)?)
}

/// Annual interest payment (face * coupon rate) over the selling price.
pub fn current_yield(face_value: f64, coupon_rate: f64, selling_price: f64) -> PricingResult<f64> {
    Ok(face_value * coupon_rate / nonzero("selling_price", selling_price)?)
}

/// Semi-annual floating coupon on a 30/360 half year: principal * (libor - spread) * 180/360.
pub fn coupon_payment(principal: f64, libor: f64, spread: f64) -> f64 {
    principal * (libor - spread) * (180.0 / 360.0)
}

/// Rights offering: shares to issue for the funds required.
pub fn new_shares(funds_required: f64, subscription_price: f64) -> PricingResult<f64> {
    Ok(funds_required / nonzero("subscription_price", subscription_price)?)
}

/// Rights offering: old shares (rights) needed for one new share.
pub fn rights_per_new_share(rights_outstanding: f64, new_shares: f64) -> PricingResult<f64> {
    Ok(rights_outstanding / nonzero("new_shares", new_shares)?)
}

/// Theoretical ex-rights price, N being the rights needed per new share.
pub fn ex_rights_price(
    n: f64,
    rights_on_price: f64,
    subscription_price: f64,
) -> PricingResult<f64> {
    Ok((n * rights_on_price + subscription_price) / nonzero("n + 1", n + 1.0)?)
}

/// Commodity futures fair value with carrying cost.
pub fn futures_fair_value(rate_to_maturity: f64, spot: f64, storage_cost: f64) -> f64 {
    (1.0 + rate_to_maturity + storage_cost) * spot
}

/// Equity futures fair value net of dividends.
pub fn asset_futures_fair_value(rate_to_maturity: f64, spot: f64, dividends: f64) -> f64 {
    (1.0 + rate_to_maturity - dividends) * spot
}

/// amount / (1 + r)^periods. A rate above 1 is read as a percentage.
pub fn present_value(amount: f64, periods: f64, rate: f64) -> PricingResult<f64> {
    let r = if rate > 1.0 { rate / 100.0 } else { rate };
    Ok(amount / nonzero("1 + rate", 1.0 + r)?.powf(periods))
}

/// Discount factor for a payment after k periods at annual rate r
/// compounded m times per year: 1 / (1 + r/m)^k.
pub fn discount_factor(k: f64, rate: f64, m: f64) -> PricingResult<f64> {
    let per_period = rate / nonzero("compounding", m)?;
    Ok(1.0 / nonzero("1 + rate/m", 1.0 + per_period)?.powf(k))
}

/// Value of an annuity paying `payment` annually for `n` years.
pub fn annuity_value(payment: f64, rate: f64, n: f64) -> PricingResult<f64> {
    let r = nonzero("rate", rate)?;
    Ok(payment / r * (1.0 - 1.0 / (1.0 + r).powf(n)))
}

/// Value of a perpetual annuity paying `payment` annually.
pub fn perpetual_annuity_value(payment: f64, rate: f64) -> PricingResult<f64> {
    Ok(payment / nonzero("rate", rate)?)
}
