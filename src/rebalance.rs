//! Single-pass rebalance: valuation → ranking → integer requantization.
//!
//! Every holding's quantity is replaced by the largest whole number of units
//! whose value does not exceed its target share of total value. Whatever the
//! flooring leaves over is returned as residual cash. The pass runs once; it
//! does not try to spend the residual on extra units.

use log::{debug, info};
use rustc_hash::FxHashSet;

use crate::error::{Result, ValidationError};
use crate::holding::Holding;
use crate::ranking;
use crate::types::{Price, Quantity, Ticker};
use crate::valuation;

/// Quantity change for one holding, in ranked order.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Trade {
    pub ticker: Ticker,
    pub prior_quantity: Quantity,
    pub quantity: Quantity,
}

impl Trade {
    /// Signed change in units: positive = buy, negative = sell.
    pub fn delta(&self) -> i64 {
        self.quantity as i64 - self.prior_quantity as i64
    }
}

/// Result of a rebalance pass.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RebalanceOutcome {
    /// Updated holdings in ranked order (most severe first)
    pub holdings: Vec<Holding>,
    /// Portfolio value before the pass (holdings + cash)
    pub total_value: Price,
    /// Cash left after buying the new quantities
    pub residual_cash: Price,
}

impl RebalanceOutcome {
    /// `(ticker, prior, new)` for every holding, in ranked order.
    pub fn trades(&self) -> impl Iterator<Item = Trade> + '_ {
        self.holdings.iter().map(|h| Trade {
            ticker: h.ticker.clone(),
            prior_quantity: h.prior_quantity(),
            quantity: h.quantity,
        })
    }

    /// True if the portfolio had no holdings.
    pub fn is_empty(&self) -> bool {
        self.holdings.is_empty()
    }

    /// True if at least one quantity changed.
    pub fn changed(&self) -> bool {
        self.holdings.iter().any(|h| h.delta() != 0)
    }
}

/// Validate a portfolio and return its total value.
///
/// Checks tickers (non-empty, unique), prices, cash, and overflow. Target and
/// total checks are made by [`ranking::rank`], which also runs before any
/// mutation.
pub fn validate(holdings: &[Holding], cash: Price) -> Result<Price> {
    let mut seen = FxHashSet::default();
    for h in holdings {
        if h.ticker.is_empty() {
            return Err(ValidationError::EmptyTicker);
        }
        if !seen.insert(&h.ticker) {
            return Err(ValidationError::DuplicateTicker {
                ticker: h.ticker.clone(),
            });
        }
    }
    valuation::total_value(holdings, cash)
}

/// Rebalance `holdings` toward their target allocations.
///
/// Takes ownership of the holdings; the returned outcome is the authoritative
/// copy. An empty portfolio is not an error: it yields an empty outcome with
/// the cash unchanged.
///
/// On error nothing has been modified.
pub fn rebalance(mut holdings: Vec<Holding>, cash: Price) -> Result<RebalanceOutcome> {
    let (total_value, residual_cash) = run_pass(&mut holdings, cash)?;
    Ok(RebalanceOutcome {
        holdings,
        total_value,
        residual_cash,
    })
}

/// Rebalance `holdings` in place and return the residual cash.
///
/// Reorders the slice by severity and overwrites each holding's quantity,
/// prior quantity and deviation. Fails atomically: on error the slice is
/// untouched.
pub fn rebalance_in_place(holdings: &mut [Holding], cash: Price) -> Result<Price> {
    run_pass(holdings, cash).map(|(_, residual)| residual)
}

/// Returns `(total value, residual cash)`.
fn run_pass(holdings: &mut [Holding], cash: Price) -> Result<(Price, Price)> {
    let total = validate(holdings, cash)?;
    if holdings.is_empty() {
        debug!("empty portfolio, nothing to rebalance");
        return Ok((total, cash));
    }

    ranking::rank(holdings, total)?;

    for h in holdings.iter_mut() {
        let quantity = target_quantity(h, total);
        debug!(
            "{}: {} -> {} @ {}",
            h.ticker, h.quantity, quantity, h.price
        );
        h.requantize(quantity);
    }

    let residual = Price(total.0 - valuation::holdings_value(holdings)?.0);
    info!(
        "rebalanced {} holdings: total {}, residual cash {}",
        holdings.len(),
        total,
        residual
    );
    Ok((total, residual))
}

/// Whole units worth at most the holding's target value.
///
/// Equals `floor(quantity * ratio)`, since `quantity * ratio * price` is the
/// target value, but stays defined for unheld holdings and is computed in
/// integer cents.
pub fn target_quantity(holding: &Holding, total: Price) -> Quantity {
    let target = holding.target_value(total);
    (target.0 / holding.price.0).max(0) as Quantity
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ranking::Deviation;

    fn goog_tsla() -> Vec<Holding> {
        vec![
            Holding::new("GOOG", 10, Price(100_00), 50.0),
            Holding::new("TSLA", 200, Price(10_00), 50.0),
        ]
    }

    #[test]
    fn reference_scenario() {
        let outcome = rebalance(goog_tsla(), Price::ZERO).unwrap();

        assert_eq!(outcome.total_value, Price(3_000_00));
        assert_eq!(outcome.residual_cash, Price::ZERO);

        let trades: Vec<Trade> = outcome.trades().collect();
        assert_eq!(trades[0].ticker.as_str(), "GOOG");
        assert_eq!(trades[0].prior_quantity, 10);
        assert_eq!(trades[0].quantity, 15);
        assert_eq!(trades[0].delta(), 5);
        assert_eq!(trades[1].ticker.as_str(), "TSLA");
        assert_eq!(trades[1].quantity, 150);
        assert_eq!(trades[1].delta(), -50);
        assert!(outcome.changed());
    }

    #[test]
    fn residual_cash_from_flooring() {
        // total = 10 * 100 + 30 = 1030; target 50% = 515 → 5 shares of 100
        let holdings = vec![Holding::new("GOOG", 10, Price(100_00), 50.0)];
        let outcome = rebalance(holdings, Price(30_00)).unwrap();
        assert_eq!(outcome.holdings[0].quantity, 5);
        assert_eq!(outcome.residual_cash, Price(530_00));
    }

    #[test]
    fn unheld_holding_gets_bought() {
        let holdings = vec![
            Holding::new("GOOG", 10, Price(100_00), 40.0),
            Holding::new("TSLA", 200, Price(10_00), 40.0),
            Holding::new("AAPL", 0, Price(22_00), 20.0),
        ];
        let outcome = rebalance(holdings, Price::ZERO).unwrap();

        let aapl = &outcome.holdings[0];
        assert_eq!(aapl.ticker.as_str(), "AAPL");
        assert_eq!(aapl.deviation(), Some(Deviation::Unheld));
        // 20% of 3000 = 600 → 27 shares of 22 (594)
        assert_eq!(aapl.quantity, 27);
        assert_eq!(aapl.prior_quantity(), 0);
        // GOOG 1200 → 12, TSLA 1200 → 120; residual 3000 - 594 - 1200 - 1200
        assert_eq!(outcome.residual_cash, Price(6_00));
    }

    #[test]
    fn at_target_is_unchanged() {
        let holdings = vec![
            Holding::new("GOOG", 15, Price(100_00), 50.0),
            Holding::new("TSLA", 150, Price(10_00), 50.0),
        ];
        let outcome = rebalance(holdings, Price::ZERO).unwrap();
        assert!(!outcome.changed());
        assert_eq!(outcome.residual_cash, Price::ZERO);
    }

    #[test]
    fn empty_portfolio_keeps_cash() {
        let outcome = rebalance(Vec::new(), Price(42_00)).unwrap();
        assert!(outcome.is_empty());
        assert!(!outcome.changed());
        assert_eq!(outcome.residual_cash, Price(42_00));
        assert_eq!(outcome.total_value, Price(42_00));
    }

    #[test]
    fn empty_portfolio_still_checks_cash() {
        assert_eq!(
            rebalance(Vec::new(), Price(-1)).unwrap_err(),
            ValidationError::NegativeCash
        );
    }

    #[test]
    fn zero_price_fails_before_mutation() {
        let mut holdings = vec![
            Holding::new("TSLA", 200, Price(10_00), 50.0),
            Holding::new("GOOG", 10, Price::ZERO, 50.0),
        ];
        let before = holdings.clone();
        let err = rebalance_in_place(&mut holdings, Price::ZERO).unwrap_err();
        assert!(matches!(err, ValidationError::NonPositivePrice { .. }));
        assert_eq!(holdings, before);
    }

    #[test]
    fn all_zero_quantities_with_no_cash() {
        let holdings = vec![Holding::new("AAPL", 0, Price(22_00), 50.0)];
        assert_eq!(
            rebalance(holdings, Price::ZERO).unwrap_err(),
            ValidationError::NonPositiveTotal
        );
    }

    #[test]
    fn cash_only_portfolio_buys_targets() {
        let holdings = vec![
            Holding::new("AAPL", 0, Price(22_00), 60.0),
            Holding::new("MSFT", 0, Price(300_00), 40.0),
        ];
        let outcome = rebalance(holdings, Price(1_000_00)).unwrap();
        // 600 / 22 = 27 (594), 400 / 300 = 1 (300)
        assert_eq!(outcome.holdings[0].quantity, 27);
        assert_eq!(outcome.holdings[1].quantity, 1);
        assert_eq!(outcome.residual_cash, Price(106_00));
    }

    #[test]
    fn rejects_duplicate_and_empty_tickers() {
        let dup = vec![
            Holding::new("GOOG", 1, Price(1_00), 10.0),
            Holding::new("GOOG", 1, Price(1_00), 10.0),
        ];
        assert_eq!(
            rebalance(dup, Price::ZERO).unwrap_err(),
            ValidationError::DuplicateTicker {
                ticker: "GOOG".into()
            }
        );

        let empty = vec![Holding::new("", 1, Price(1_00), 10.0)];
        assert_eq!(
            rebalance(empty, Price::ZERO).unwrap_err(),
            ValidationError::EmptyTicker
        );
    }

    #[test]
    fn second_pass_overwrites_prior_quantity() {
        let mut holdings = goog_tsla();
        rebalance_in_place(&mut holdings, Price::ZERO).unwrap();
        let residual = rebalance_in_place(&mut holdings, Price::ZERO).unwrap();
        assert_eq!(residual, Price::ZERO);
        assert!(holdings.iter().all(|h| h.delta() == 0));
        assert!(holdings
            .iter()
            .all(|h| h.deviation().is_some_and(Deviation::is_on_target)));
    }
}
