//! Human-readable buy/sell instructions for a rebalance outcome.
//!
//! ```
//! use allocbook::{Holding, Price, get_instructions};
//!
//! let holdings = vec![
//!     Holding::new("GOOG", 10, Price(100_00), 50.0),
//!     Holding::new("TSLA", 200, Price(10_00), 50.0),
//! ];
//! let text = get_instructions(holdings, Price::ZERO).unwrap();
//! assert_eq!(
//!     text,
//!     "buy 5 shares of GOOG, sell 50 shares of TSLA\navailable balance: $0.00"
//! );
//! ```

use std::fmt;

use crate::error::Result;
use crate::holding::Holding;
use crate::rebalance::{self, RebalanceOutcome, Trade};
use crate::types::{Price, Ticker};

/// Returned in place of instructions when there is nothing to trade.
pub const NOTHING_TO_REBALANCE: &str = "This portfolio is empty. Nothing to rebalance.";

/// One buy or sell clause.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Instruction {
    Buy { ticker: Ticker, shares: u64 },
    Sell { ticker: Ticker, shares: u64 },
}

impl Instruction {
    /// Instruction for a trade, or `None` if its quantity did not change.
    pub fn from_trade(trade: &Trade) -> Option<Instruction> {
        let delta = trade.delta();
        let ticker = trade.ticker.clone();
        match delta {
            0 => None,
            d if d > 0 => Some(Instruction::Buy {
                ticker,
                shares: d.unsigned_abs(),
            }),
            d => Some(Instruction::Sell {
                ticker,
                shares: d.unsigned_abs(),
            }),
        }
    }

    pub fn ticker(&self) -> &Ticker {
        match self {
            Instruction::Buy { ticker, .. } | Instruction::Sell { ticker, .. } => ticker,
        }
    }

    pub fn shares(&self) -> u64 {
        match self {
            Instruction::Buy { shares, .. } | Instruction::Sell { shares, .. } => *shares,
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self {
            Instruction::Buy { .. } => "buy",
            Instruction::Sell { .. } => "sell",
        };
        let shares = self.shares();
        let noun = if shares == 1 { "share" } else { "shares" };
        write!(f, "{verb} {shares} {noun} of {}", self.ticker())
    }
}

/// Instructions for every changed trade, keeping the given order.
pub fn instructions<'a>(trades: impl IntoIterator<Item = &'a Trade>) -> Vec<Instruction> {
    trades
        .into_iter()
        .filter_map(Instruction::from_trade)
        .collect()
}

/// Render trades and residual cash as text.
///
/// Clauses are comma-separated in the given order. With no changes the
/// fixed [`NOTHING_TO_REBALANCE`] message is used instead. The residual cash
/// line is always appended.
pub fn format_trades(trades: &[Trade], residual_cash: Price) -> String {
    let clauses = instructions(trades);
    let body = if clauses.is_empty() {
        NOTHING_TO_REBALANCE.to_string()
    } else {
        clauses
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    };
    format!("{body}\navailable balance: {residual_cash}")
}

/// Render a rebalance outcome as text.
pub fn format_instructions(outcome: &RebalanceOutcome) -> String {
    let trades: Vec<Trade> = outcome.trades().collect();
    format_trades(&trades, outcome.residual_cash)
}

/// Validate, rebalance and format in one call.
pub fn get_instructions(holdings: Vec<Holding>, cash: Price) -> Result<String> {
    let outcome = rebalance::rebalance(holdings, cash)?;
    Ok(format_instructions(&outcome))
}
