//! Validation errors for rebalance input.

use crate::types::Ticker;

/// Invalid rebalance input. Raised before any holding is touched.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ValidationError {
    /// Price must be greater than zero.
    #[error("price of {ticker} must be greater than zero")]
    NonPositivePrice { ticker: Ticker },

    /// Target allocation must lie in (0, 100].
    #[error("target allocation of {ticker} ({pct}%) must be in (0, 100]")]
    TargetOutOfRange { ticker: Ticker, pct: f64 },

    /// Targets summing past 100% would overdraw cash.
    #[error("target allocations sum to {sum:.4}% (> 100%)")]
    TargetSumExceeded { sum: f64 },

    #[error("cash balance must not be negative")]
    NegativeCash,

    /// Nothing to allocate.
    #[error("total portfolio value must be greater than zero")]
    NonPositiveTotal,

    #[error("ticker must not be empty")]
    EmptyTicker,

    #[error("duplicate ticker: {ticker}")]
    DuplicateTicker { ticker: Ticker },

    /// `quantity * price` or the portfolio total does not fit in cents.
    #[error("portfolio value overflows")]
    ValueOverflow,
}

pub type Result<T> = std::result::Result<T, ValidationError>;
