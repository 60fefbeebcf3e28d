//! Parallel rebalancing of independent portfolios.

use crate::error::Result;
use crate::holding::Holding;
use crate::rebalance::{self, RebalanceOutcome};
use crate::types::Price;

/// Rebalance many portfolios in parallel.
///
/// Portfolios share nothing, so each is rebalanced on its own as one atomic
/// pass. Results come back in input order; a failure in one portfolio does
/// not affect the others.
///
/// # Example
///
/// ```
/// use allocbook::{batch, Holding, Price};
///
/// let portfolios = vec![
///     (vec![Holding::new("GOOG", 10, Price(100_00), 50.0)], Price(0)),
///     (vec![], Price(5_00)),
/// ];
/// let results = batch::rebalance_all(portfolios);
/// assert_eq!(results.len(), 2);
/// ```
#[cfg(feature = "parallel")]
pub fn rebalance_all(portfolios: Vec<(Vec<Holding>, Price)>) -> Vec<Result<RebalanceOutcome>> {
    use rayon::prelude::*;

    portfolios
        .into_par_iter()
        .map(|(holdings, cash)| rebalance::rebalance(holdings, cash))
        .collect()
}
