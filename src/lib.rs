// Allow our dollar.cents digit grouping convention (e.g., 100_00 = $100.00)
#![allow(clippy::inconsistent_digit_grouping)]

//! # allocbook
//!
//! A deterministic allocation rebalancer. Given holdings, prices, target
//! allocation weights and cash, it computes whole-unit quantities that move
//! the portfolio back toward its targets without ever overdrawing cash.
//!
//! ## Quick Start
//!
//! ```
//! use allocbook::{Holding, Price, rebalance};
//!
//! let holdings = vec![
//!     Holding::new("GOOG", 10, Price(100_00), 50.0),
//!     Holding::new("TSLA", 200, Price(10_00), 50.0),
//! ];
//!
//! let outcome = rebalance(holdings, Price::ZERO).unwrap();
//!
//! // GOOG is furthest from target (1.5x vs 0.75x), so it comes first
//! assert_eq!(outcome.holdings[0].ticker.as_str(), "GOOG");
//! assert_eq!(outcome.holdings[0].quantity, 15);
//! assert_eq!(outcome.holdings[1].quantity, 150);
//! assert_eq!(outcome.residual_cash, Price::ZERO);
//! ```
//!
//! ## The Pass
//!
//! 1. **Valuation**: total = sum of `quantity * price` + cash
//! 2. **Ranking**: each holding's deviation ratio is `target value / current value`;
//!    holdings are sorted by severity `max(r, 1/r)`, stable on ties. Ratios are
//!    exact fractions, so equal severities really tie. A holding with nothing
//!    held has no ratio and always ranks first.
//! 3. **Requantize**: new quantity = `floor(quantity * ratio)`, i.e. the whole
//!    units its target value buys. Targets resolve to a millionth of a percent
//!    and the target value is computed in integer cents.
//! 4. **Residual**: total minus the new holdings value. Never negative.
//!
//! The pass runs exactly once. Leftover cash from flooring is reported, not spent.
//!
//! ## Price Representation
//!
//! Money is stored as [`i64`] cents, so value is conserved exactly:
//!
//! ```
//! use allocbook::Price;
//!
//! let price = Price(100_50);  // $100.50
//! assert_eq!(format!("{}", price), "$100.50");
//! ```
//!
//! ## Instructions
//!
//! ```
//! use allocbook::{Holding, Price, get_instructions};
//!
//! let holdings = vec![
//!     Holding::new("GOOG", 10, Price(100_00), 50.0),
//!     Holding::new("TSLA", 200, Price(10_00), 50.0),
//! ];
//! let text = get_instructions(holdings, Price::ZERO).unwrap();
//! assert!(text.starts_with("buy 5 shares of GOOG, sell 50 shares of TSLA"));
//! ```

#[cfg(feature = "parallel")]
pub mod batch;
pub mod drift;
mod error;
mod holding;
pub mod instructions;
pub mod ranking;
pub mod rebalance;
mod types;
pub mod valuation;

// Re-export public API
pub use drift::{DriftEntry, DriftReport};
pub use error::{Result, ValidationError};
pub use holding::Holding;
pub use instructions::{Instruction, NOTHING_TO_REBALANCE, format_instructions, get_instructions};
pub use ranking::Deviation;
pub use rebalance::{RebalanceOutcome, Trade, rebalance, rebalance_in_place};
pub use types::{Price, Quantity, Ticker};
