//! Allocation drift: how far a portfolio sits from its targets.

use std::fmt;

use crate::error::{Result, ValidationError};
use crate::holding::Holding;
use crate::ranking::{self, Deviation};
use crate::rebalance;
use crate::types::{Price, Quantity};

/// Drift report comparing actual allocation against targets.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DriftReport {
    pub entries: Vec<DriftEntry>,
    pub total_value: Price,
    /// Cash as a percentage of total value
    pub cash_pct: f64,
    /// Root mean square of the per-holding differences (percentage points)
    pub tracking_error_pct: f64,
}

/// One holding's drift entry.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DriftEntry {
    pub ticker: String,
    pub target_pct: f64,
    pub actual_pct: f64,
    /// `actual_pct - target_pct`
    pub diff_pct: f64,
    pub deviation: Deviation,
    pub target_quantity: Quantity,
    pub quantity: Quantity,
}

/// Measure drift without changing anything. Entries keep input order.
pub fn report(holdings: &[Holding], cash: Price) -> Result<DriftReport> {
    let total = rebalance::validate(holdings, cash)?;
    if total.0 <= 0 {
        return Err(ValidationError::NonPositiveTotal);
    }
    ranking::validate_targets(holdings)?;

    let mut sum_sq_diff = 0.0_f64;
    let entries: Vec<DriftEntry> = holdings
        .iter()
        .map(|h| {
            let actual_pct = h.market_value().0 as f64 / total.0 as f64 * 100.0;
            let diff_pct = actual_pct - h.target_pct;
            sum_sq_diff += diff_pct * diff_pct;
            DriftEntry {
                ticker: h.ticker.to_string(),
                target_pct: h.target_pct,
                actual_pct,
                diff_pct,
                deviation: Deviation::of(h, total),
                target_quantity: rebalance::target_quantity(h, total),
                quantity: h.quantity,
            }
        })
        .collect();

    let tracking_error_pct = (sum_sq_diff / entries.len().max(1) as f64).sqrt();

    Ok(DriftReport {
        entries,
        total_value: total,
        cash_pct: cash.0 as f64 / total.0 as f64 * 100.0,
        tracking_error_pct,
    })
}

impl DriftReport {
    /// Entry with the greatest severity, first one on ties.
    pub fn worst(&self) -> Option<&DriftEntry> {
        self.entries.iter().reduce(|worst, e| {
            if e.deviation.cmp_severity(&worst.deviation).is_gt() {
                e
            } else {
                worst
            }
        })
    }
}

fn side(deviation: Deviation) -> &'static str {
    if deviation.is_underweight() {
        "under"
    } else if deviation.is_overweight() {
        "over"
    } else {
        "on"
    }
}

impl fmt::Display for DriftReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "DRIFT ({} total):", self.total_value)?;
        writeln!(
            f,
            "  {:8} {:>10} {:>10} {:>10} {:>10} {:>6} {:>10} {:>10}",
            "Ticker", "Target%", "Actual%", "Diff%", "Severity", "Side", "TargetQty", "Qty"
        )?;
        for e in &self.entries {
            let severity = match e.deviation {
                Deviation::Unheld => "unheld".to_string(),
                d => format!("{:.3}", d.severity()),
            };
            writeln!(
                f,
                "  {:8} {:>9.2}% {:>9.2}% {:>+9.2}% {:>10} {:>6} {:>10} {:>10}",
                e.ticker,
                e.target_pct,
                e.actual_pct,
                e.diff_pct,
                severity,
                side(e.deviation),
                e.target_quantity,
                e.quantity,
            )?;
        }
        writeln!(f, "  {:8} {:>9.2}%", "cash", self.cash_pct)?;
        writeln!(f, "\n  Tracking error: {:.3}%", self.tracking_error_pct)?;
        Ok(())
    }
}
