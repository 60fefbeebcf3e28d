//! Portfolio valuation: total value of holdings plus cash.

use crate::error::{Result, ValidationError};
use crate::holding::Holding;
use crate::types::Price;

/// Total portfolio value: sum of `quantity * price` over all holdings, plus cash.
///
/// Fails if any price is not positive, if cash is negative, or if the sum
/// does not fit in `i64` cents. Has no side effects.
pub fn total_value(holdings: &[Holding], cash: Price) -> Result<Price> {
    if cash.0 < 0 {
        return Err(ValidationError::NegativeCash);
    }
    let mut total = cash.0;
    for h in holdings {
        total = total
            .checked_add(checked_market_value(h)?.0)
            .ok_or(ValidationError::ValueOverflow)?;
    }
    Ok(Price(total))
}

/// Value of the holdings alone (no cash).
pub fn holdings_value(holdings: &[Holding]) -> Result<Price> {
    total_value(holdings, Price::ZERO)
}

/// Market value of one holding, validating its price.
pub fn checked_market_value(holding: &Holding) -> Result<Price> {
    if !holding.price.is_positive() {
        return Err(ValidationError::NonPositivePrice {
            ticker: holding.ticker.clone(),
        });
    }
    i64::try_from(holding.quantity)
        .ok()
        .and_then(|q| q.checked_mul(holding.price.0))
        .map(Price)
        .ok_or(ValidationError::ValueOverflow)
}
