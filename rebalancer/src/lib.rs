//! allocbook-rebalancer: command-line front end for allocbook.
//!
//! Reads a portfolio (holdings, prices, targets, cash) from a JSON file,
//! runs one rebalance pass, prints buy/sell instructions, and appends an
//! audit trail.

pub mod audit;
pub mod config;
pub mod error;
pub mod execution;
pub mod portfolio;
