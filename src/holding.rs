//! A single security position and its per-pass derived state.

use crate::ranking::Deviation;
use crate::types::{Price, Quantity, Ticker};

/// Target percents are resolved to a millionth of a percent.
pub(crate) const PCT_SCALE: i128 = 1_000_000;

/// Absorbs representation error in percents like `12.34`, which scale to
/// `12339999.999999998` before flooring.
const PCT_SNAP: f64 = 1e-6;

/// One security in a portfolio.
///
/// `quantity`, `price` and `target_pct` are caller-supplied. The deviation and
/// the prior quantity are derived: both are overwritten by every rebalance
/// pass and carry no meaning across passes.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Holding {
    /// Security identifier
    pub ticker: Ticker,
    /// Units currently held
    pub quantity: Quantity,
    /// Current price per unit (cents)
    pub price: Price,
    /// Target weight of this holding's value within total value, in (0, 100]
    pub target_pct: f64,
    /// Target-to-current value ratio, set by ranking
    deviation: Option<Deviation>,
    /// Quantity snapshot taken just before the last recompute
    prior_quantity: Quantity,
}

impl Holding {
    /// Create a holding. The prior quantity starts equal to `quantity`, so a
    /// holding that has never been rebalanced reports a zero delta.
    pub fn new(ticker: impl Into<Ticker>, quantity: Quantity, price: Price, target_pct: f64) -> Self {
        Self {
            ticker: ticker.into(),
            quantity,
            price,
            target_pct,
            deviation: None,
            prior_quantity: quantity,
        }
    }

    /// Market value: `quantity * price` (cents).
    ///
    /// Saturates instead of wrapping; inputs that could overflow are rejected
    /// by [`crate::valuation::total_value`] before any pass runs.
    #[inline]
    pub fn market_value(&self) -> Price {
        let qty = i64::try_from(self.quantity).unwrap_or(i64::MAX);
        Price(qty.saturating_mul(self.price.0))
    }

    /// Target percent in millionths of a percent, floored.
    ///
    /// Non-finite or negative percents map to 0 or saturate; validation
    /// rejects them before any pass uses this value.
    pub fn target_units(&self) -> i128 {
        (self.target_pct * PCT_SCALE as f64 + PCT_SNAP).floor() as i128
    }

    /// Value this holding should have out of `total` (cents, floored).
    ///
    /// Computed in integers: `floor(units * total / (100 * PCT_SCALE))`.
    pub fn target_value(&self, total: Price) -> Price {
        let scaled = self
            .target_units()
            .saturating_mul(total.0 as i128)
            .div_euclid(100 * PCT_SCALE);
        Price(scaled.clamp(i64::MIN as i128, i64::MAX as i128) as i64)
    }

    /// Deviation computed by the most recent ranking, if any.
    #[inline]
    pub fn deviation(&self) -> Option<Deviation> {
        self.deviation
    }

    /// Quantity held before the most recent rebalance pass.
    #[inline]
    pub fn prior_quantity(&self) -> Quantity {
        self.prior_quantity
    }

    /// Signed change in units from the prior quantity: positive = buy.
    pub fn delta(&self) -> i64 {
        self.quantity as i64 - self.prior_quantity as i64
    }

    pub(crate) fn set_deviation(&mut self, deviation: Deviation) {
        self.deviation = Some(deviation);
    }

    /// Snapshot the current quantity, then overwrite it.
    pub(crate) fn requantize(&mut self, quantity: Quantity) {
        self.prior_quantity = self.quantity;
        self.quantity = quantity;
    }
}
