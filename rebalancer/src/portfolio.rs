//! Portfolio file (portfolio.json) loading and validation.

use std::path::Path;

use allocbook::{Holding, Price};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::{Error, Result};

/// A portfolio snapshot: holdings with prices and targets, plus cash.
///
/// Money is written in dollars and converted to cents on load.
#[derive(Debug, Clone, Deserialize)]
pub struct PortfolioFile {
    /// When the prices were taken
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub cash: f64,
    pub holdings: Vec<HoldingEntry>,
}

/// One holding as written in the file.
#[derive(Debug, Clone, Deserialize)]
pub struct HoldingEntry {
    pub ticker: String,
    pub quantity: u64,
    /// Price per unit in dollars
    pub price: f64,
    /// Target allocation, percent of total value
    pub target_pct: f64,
}

impl PortfolioFile {
    /// Load and validate a portfolio.json file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::PortfolioRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_json(&contents)
    }

    /// Parse from a JSON string (useful for testing).
    pub fn from_json(json: &str) -> Result<Self> {
        let file: PortfolioFile = serde_json::from_str(json)?;
        file.validate()?;
        Ok(file)
    }

    /// Structural checks only: money must convert to cents.
    ///
    /// Domain rules (positive prices, target ranges, unique tickers) belong
    /// to the rebalance pass itself.
    fn validate(&self) -> Result<()> {
        if Price::from_dollars(self.cash).is_none() {
            return Err(Error::Portfolio(format!(
                "cash ({}) is not a finite dollar amount",
                self.cash
            )));
        }
        for h in &self.holdings {
            if Price::from_dollars(h.price).is_none() {
                return Err(Error::Portfolio(format!(
                    "price for {} ({}) is not a finite dollar amount",
                    h.ticker, h.price
                )));
            }
        }
        Ok(())
    }

    /// Cash in cents.
    pub fn cash(&self) -> Price {
        Price::from_dollars(self.cash).unwrap_or(Price::ZERO)
    }

    /// Build core holdings, in file order.
    pub fn holdings(&self) -> Vec<Holding> {
        self.holdings
            .iter()
            .map(|h| {
                Holding::new(
                    h.ticker.as_str(),
                    h.quantity,
                    Price::from_dollars(h.price).unwrap_or(Price::ZERO),
                    h.target_pct,
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_json() -> &'static str {
        r#"{
            "timestamp": "2026-02-08T15:30:00Z",
            "cash": 30.0,
            "holdings": [
                { "ticker": "GOOG", "quantity": 10,  "price": 100.0, "target_pct": 50.0 },
                { "ticker": "TSLA", "quantity": 200, "price": 10.0,  "target_pct": 40.0 },
                { "ticker": "AAPL", "quantity": 0,   "price": 22.15, "target_pct": 10.0 }
            ]
        }"#
    }

    #[test]
    fn parse_valid_portfolio() {
        let file = PortfolioFile::from_json(valid_json()).unwrap();
        assert_eq!(file.holdings.len(), 3);
        assert_eq!(file.holdings[0].ticker, "GOOG");
        assert_eq!(file.cash(), Price(30_00));
        assert!(file.timestamp.is_some());
    }

    #[test]
    fn holdings_conversion() {
        let file = PortfolioFile::from_json(valid_json()).unwrap();
        let holdings = file.holdings();
        assert_eq!(holdings[0].ticker.as_str(), "GOOG");
        assert_eq!(holdings[0].price, Price(100_00));
        assert_eq!(holdings[2].price, Price(22_15));
        assert_eq!(holdings[2].quantity, 0);
        assert_eq!(holdings[1].target_pct, 40.0);
    }

    #[test]
    fn timestamp_and_cash_optional() {
        let json = r#"{"holdings":[{"ticker":"SPY","quantity":1,"price":400.0,"target_pct":100.0}]}"#;
        let file = PortfolioFile::from_json(json).unwrap();
        assert!(file.timestamp.is_none());
        assert_eq!(file.cash(), Price::ZERO);
    }

    #[test]
    fn empty_holdings_accepted() {
        let json = r#"{"cash": 12.5, "holdings": []}"#;
        let file = PortfolioFile::from_json(json).unwrap();
        assert!(file.holdings().is_empty());
        assert_eq!(file.cash(), Price(12_50));
    }

    #[test]
    fn reject_holdings_not_an_array() {
        let json = r#"{"cash": 0, "holdings": {"ticker": "GOOG"}}"#;
        assert!(matches!(
            PortfolioFile::from_json(json),
            Err(Error::PortfolioParse(_))
        ));
    }

    #[test]
    fn reject_negative_quantity() {
        let json = r#"{"holdings":[{"ticker":"SPY","quantity":-1,"price":400.0,"target_pct":100.0}]}"#;
        assert!(matches!(
            PortfolioFile::from_json(json),
            Err(Error::PortfolioParse(_))
        ));
    }

    #[test]
    fn reject_huge_price() {
        let json = r#"{"holdings":[{"ticker":"SPY","quantity":1,"price":1e300,"target_pct":100.0}]}"#;
        assert!(matches!(
            PortfolioFile::from_json(json),
            Err(Error::Portfolio(_))
        ));
    }

    #[test]
    fn load_missing_file() {
        let err = PortfolioFile::load(Path::new("/nonexistent/portfolio.json")).unwrap_err();
        assert!(matches!(err, Error::PortfolioRead { .. }));
    }
}
