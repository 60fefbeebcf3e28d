//! Core types: Price, Quantity, Ticker

use std::fmt;

/// Money in smallest units (cents).
///
/// `Price(10050)` represents $100.50. Used both for per-unit prices and for
/// aggregate values (market value, cash, totals), so every sum is exact.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Price(pub i64);

impl Price {
    pub const ZERO: Price = Price(0);

    /// Convert a dollar amount to cents, rounding to the nearest cent.
    ///
    /// Returns `None` for non-finite input or values outside the `i64` range.
    pub fn from_dollars(dollars: f64) -> Option<Price> {
        let cents = (dollars * 100.0).round();
        if !cents.is_finite() || cents < i64::MIN as f64 || cents >= i64::MAX as f64 {
            return None;
        }
        Some(Price(cents as i64))
    }

    /// Value as dollars (lossy).
    #[inline]
    pub fn as_dollars(self) -> f64 {
        self.0 as f64 / 100.0
    }

    #[inline]
    pub fn is_positive(self) -> bool {
        self.0 > 0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dollars = self.0 / 100;
        let cents = (self.0 % 100).abs();
        if self.0 < 0 {
            write!(f, "-${}.{:02}", dollars.abs(), cents)
        } else {
            write!(f, "${}.{:02}", dollars, cents)
        }
    }
}

/// Number of units held. Never negative.
pub type Quantity = u64;

/// Opaque security identifier, unique within a portfolio.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Ticker(String);

impl Ticker {
    pub fn new(s: impl Into<String>) -> Self {
        Ticker(s.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Ticker {
    fn from(s: &str) -> Self {
        Ticker::new(s)
    }
}

impl From<String> for Ticker {
    fn from(s: String) -> Self {
        Ticker(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_ordering() {
        assert!(Price(100) < Price(200));
        assert!(Price(-50) < Price(50));
        assert_eq!(Price(100), Price(100));
    }

    #[test]
    fn price_display() {
        assert_eq!(format!("{}", Price(10050)), "$100.50");
        assert_eq!(format!("{}", Price(100)), "$1.00");
        assert_eq!(format!("{}", Price(5)), "$0.05");
        assert_eq!(format!("{}", Price(-250)), "-$2.50");
        assert_eq!(format!("{}", Price::ZERO), "$0.00");
    }

    #[test]
    fn price_from_dollars_rounds_to_cent() {
        assert_eq!(Price::from_dollars(100.0), Some(Price(100_00)));
        assert_eq!(Price::from_dollars(22.35), Some(Price(22_35)));
        assert_eq!(Price::from_dollars(0.1 + 0.2), Some(Price(30)));
        assert_eq!(Price::from_dollars(-1.5), Some(Price(-1_50)));
    }

    #[test]
    fn price_from_dollars_rejects_non_finite() {
        assert_eq!(Price::from_dollars(f64::NAN), None);
        assert_eq!(Price::from_dollars(f64::INFINITY), None);
        assert_eq!(Price::from_dollars(1e300), None);
    }

    #[test]
    fn ticker_display() {
        let t = Ticker::new("GOOG");
        assert_eq!(format!("{t}"), "GOOG");
        assert_eq!(t.as_str(), "GOOG");
        assert!(!t.is_empty());
        assert!(Ticker::from("").is_empty());
    }
}
