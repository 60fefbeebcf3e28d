//! Allocation deviation and severity ranking.
//!
//! Each holding gets a deviation ratio: what its value should be (its target
//! share of total value) over what it is now. Holdings are then ordered so
//! that the worst violators come first, whether over- or underweight.

use std::cmp::Ordering;

use log::debug;

use crate::error::{Result, ValidationError};
use crate::holding::{Holding, PCT_SCALE};
use crate::types::Price;

/// Sum of all targets, in millionths of a percent, may not exceed this.
const FULL_ALLOCATION: i128 = 100 * PCT_SCALE;

/// How far a holding is from its target allocation.
///
/// The ratio is kept as an exact fraction so that holdings sitting at the
/// same distance from target compare equal.
#[derive(Clone, Copy, Debug)]
pub enum Deviation {
    /// Nothing held, so no ratio exists. Ranks above every `Ratio`.
    Unheld,
    /// `target / current`: > 1 underweight, < 1 overweight.
    ///
    /// Both sides are cents scaled by 10^8, the resolution of the targets.
    Ratio { target: u128, current: u128 },
}

impl Deviation {
    /// Deviation of `holding` within a portfolio worth `total`.
    pub fn of(holding: &Holding, total: Price) -> Deviation {
        let value = holding.market_value();
        if value.0 <= 0 {
            return Deviation::Unheld;
        }
        let units = holding.target_units().max(0) as u128;
        Deviation::Ratio {
            target: units.saturating_mul(total.0.max(0) as u128),
            current: (value.0 as u128).saturating_mul(FULL_ALLOCATION as u128),
        }
    }

    /// The ratio as a float, if the holding has a current value.
    pub fn ratio(self) -> Option<f64> {
        match self {
            Deviation::Unheld => None,
            Deviation::Ratio { target, current } => Some(target as f64 / current as f64),
        }
    }

    /// Symmetric distance from 1.0: `max(r, 1/r)`.
    ///
    /// 2x target and 0.5x target are equally severe. `Unheld` is infinite.
    pub fn severity(self) -> f64 {
        match self {
            Deviation::Unheld => f64::INFINITY,
            Deviation::Ratio { .. } => {
                let (hi, lo) = self.severity_parts();
                hi as f64 / lo as f64
            }
        }
    }

    /// Severity as `(numerator, denominator)`, numerator >= denominator.
    fn severity_parts(self) -> (u128, u128) {
        match self {
            Deviation::Unheld => (1, 0),
            Deviation::Ratio { target, current } => (target.max(current), target.min(current)),
        }
    }

    /// Order by severity, exactly. Two `Unheld` deviations are equal.
    pub fn cmp_severity(&self, other: &Deviation) -> Ordering {
        match (self, other) {
            (Deviation::Unheld, Deviation::Unheld) => Ordering::Equal,
            (Deviation::Unheld, Deviation::Ratio { .. }) => Ordering::Greater,
            (Deviation::Ratio { .. }, Deviation::Unheld) => Ordering::Less,
            (a, b) => {
                let (a_hi, a_lo) = a.severity_parts();
                let (b_hi, b_lo) = b.severity_parts();
                widening_mul(a_hi, b_lo).cmp(&widening_mul(b_hi, a_lo))
            }
        }
    }

    pub fn is_underweight(self) -> bool {
        match self {
            Deviation::Unheld => true,
            Deviation::Ratio { target, current } => target > current,
        }
    }

    pub fn is_overweight(self) -> bool {
        matches!(self, Deviation::Ratio { target, current } if target < current)
    }

    /// Exactly at target.
    pub fn is_on_target(self) -> bool {
        matches!(self, Deviation::Ratio { target, current } if target == current)
    }
}

/// Equal when the ratios are equal, not the raw parts.
impl PartialEq for Deviation {
    fn eq(&self, other: &Deviation) -> bool {
        match (*self, *other) {
            (Deviation::Unheld, Deviation::Unheld) => true,
            (
                Deviation::Ratio { target: t1, current: c1 },
                Deviation::Ratio { target: t2, current: c2 },
            ) => widening_mul(t1, c2) == widening_mul(t2, c1),
            _ => false,
        }
    }
}

/// Serialized as the float ratio, `null` when unheld.
#[cfg(feature = "serde")]
impl serde::Serialize for Deviation {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serde::Serialize::serialize(&self.ratio(), serializer)
    }
}

/// Full 256-bit product as `(high, low)`; tuples compare in numeric order.
fn widening_mul(a: u128, b: u128) -> (u128, u128) {
    const MASK: u128 = u64::MAX as u128;
    let (a_hi, a_lo) = (a >> 64, a & MASK);
    let (b_hi, b_lo) = (b >> 64, b & MASK);

    let ll = a_lo * b_lo;
    let lh = a_lo * b_hi;
    let hl = a_hi * b_lo;
    let hh = a_hi * b_hi;

    let mid = (ll >> 64) + (lh & MASK) + (hl & MASK);
    let low = (ll & MASK) | ((mid & MASK) << 64);
    let high = hh + (lh >> 64) + (hl >> 64) + (mid >> 64);
    (high, low)
}

/// Check every target lies in (0, 100] and that they sum to at most 100.
///
/// The sum is checked on the integer targets the pass actually uses, so the
/// floored target values never add up to more than the total. Targets are
/// otherwise independent of one another; no normalization.
pub fn validate_targets(holdings: &[Holding]) -> Result<()> {
    let mut units = 0_i128;
    for h in holdings {
        // Written as a negation so NaN fails too
        if !(h.target_pct > 0.0 && h.target_pct <= 100.0) {
            return Err(ValidationError::TargetOutOfRange {
                ticker: h.ticker.clone(),
                pct: h.target_pct,
            });
        }
        units += h.target_units();
    }
    if units > FULL_ALLOCATION {
        let sum = holdings.iter().map(|h| h.target_pct).sum::<f64>();
        return Err(ValidationError::TargetSumExceeded { sum });
    }
    Ok(())
}

/// Set each holding's deviation and sort by descending severity.
///
/// The sort is stable: equal severities keep their input order. Fails
/// without touching `holdings` if `total` is not positive or a target is
/// out of range.
pub fn rank(holdings: &mut [Holding], total: Price) -> Result<()> {
    if total.0 <= 0 {
        return Err(ValidationError::NonPositiveTotal);
    }
    validate_targets(holdings)?;

    for h in holdings.iter_mut() {
        let deviation = Deviation::of(h, total);
        h.set_deviation(deviation);
    }

    holdings.sort_by(|a, b| severity_of(b).cmp_severity(&severity_of(a)));

    debug!(
        "ranked {} holdings: [{}]",
        holdings.len(),
        holdings
            .iter()
            .map(|h| h.ticker.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );
    Ok(())
}

#[inline]
fn severity_of(h: &Holding) -> Deviation {
    h.deviation().unwrap_or(Deviation::Ratio {
        target: 1,
        current: 1,
    })
}
