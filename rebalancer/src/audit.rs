//! JSONL audit trail logging.
//!
//! Each rebalancer run appends events to an audit.jsonl file,
//! one JSON object per line.

use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use allocbook::{DriftReport, Holding, Price, RebalanceOutcome};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::Result;

/// An audit event written to the JSONL trail.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    pub event: &'static str,
    pub ts: DateTime<Utc>,
    #[serde(flatten)]
    pub data: serde_json::Value,
}

/// Append-only audit logger.
pub struct AuditLog {
    writer: BufWriter<std::fs::File>,
}

impl AuditLog {
    /// Open (or create) the audit log file for appending.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            writer: BufWriter::new(file),
        })
    }

    /// Log an event with arbitrary JSON data.
    pub fn log(&mut self, event: &'static str, data: serde_json::Value) -> Result<()> {
        let entry = AuditEvent {
            event,
            ts: Utc::now(),
            data,
        };
        let json = serde_json::to_string(&entry)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        writeln!(self.writer, "{json}")?;
        self.writer.flush()?;
        Ok(())
    }

    /// Log a simple event with no additional data.
    pub fn log_simple(&mut self, event: &'static str) -> Result<()> {
        self.log(event, serde_json::json!({}))
    }
}

/// Convenience: log a run start event.
pub fn log_run_started(audit: &mut AuditLog, command: &str, portfolio_file: &str) -> Result<()> {
    audit.log(
        "run_started",
        serde_json::json!({
            "command": command,
            "portfolio_file": portfolio_file,
        }),
    )
}

/// Convenience: log the holdings as loaded.
pub fn log_portfolio(audit: &mut AuditLog, holdings: &[Holding], cash: Price) -> Result<()> {
    let holding_data: Vec<_> = holdings
        .iter()
        .map(|h| {
            serde_json::json!({
                "ticker": h.ticker.as_str(),
                "qty": h.quantity,
                "price": h.price.as_dollars(),
                "target_pct": h.target_pct,
            })
        })
        .collect();

    audit.log(
        "portfolio_loaded",
        serde_json::json!({
            "holdings": holding_data,
            "cash": cash.as_dollars(),
        }),
    )
}

/// Convenience: log the computed quantities.
pub fn log_rebalance(audit: &mut AuditLog, outcome: &RebalanceOutcome) -> Result<()> {
    let trade_data: Vec<_> = outcome
        .trades()
        .map(|t| {
            serde_json::json!({
                "ticker": t.ticker.as_str(),
                "prior": t.prior_quantity,
                "new": t.quantity,
                "delta": t.delta(),
            })
        })
        .collect();

    audit.log(
        "rebalance_computed",
        serde_json::json!({
            "trades": trade_data,
            "total_value": outcome.total_value.as_dollars(),
            "residual_cash": outcome.residual_cash.as_dollars(),
        }),
    )
}

/// Convenience: log a drift measurement.
pub fn log_drift(audit: &mut AuditLog, report: &DriftReport) -> Result<()> {
    let entries: Vec<_> = report
        .entries
        .iter()
        .map(|e| {
            serde_json::json!({
                "ticker": e.ticker,
                "target_pct": e.target_pct,
                "actual_pct": e.actual_pct,
                "ratio": e.deviation.ratio(),
            })
        })
        .collect();

    audit.log(
        "drift_computed",
        serde_json::json!({
            "entries": entries,
            "total_value": report.total_value.as_dollars(),
            "tracking_error_pct": report.tracking_error_pct,
        }),
    )
}

/// Convenience: log a rejected run.
pub fn log_run_failed(audit: &mut AuditLog, reason: &str) -> Result<()> {
    audit.log("run_failed", serde_json::json!({ "reason": reason }))
}

/// Convenience: log run completion.
pub fn log_run_completed(audit: &mut AuditLog, command: &str, instructions: usize) -> Result<()> {
    audit.log(
        "run_completed",
        serde_json::json!({
            "command": command,
            "instructions": instructions,
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use allocbook::rebalance;

    #[test]
    fn audit_log_writes_jsonl() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test_audit.jsonl");

        {
            let mut log = AuditLog::open(&path).unwrap();
            log.log_simple("test_event").unwrap();
            log.log("test_data", serde_json::json!({"key": "value"}))
                .unwrap();
        }

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);

        for line in &lines {
            let _: serde_json::Value = serde_json::from_str(line).unwrap();
        }

        assert!(lines[0].contains("\"event\":\"test_event\""));
    }

    #[test]
    fn audit_log_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("subdir").join("deep").join("audit.jsonl");

        let mut log = AuditLog::open(&path).unwrap();
        log.log_simple("test").unwrap();

        assert!(path.exists());
    }

    #[test]
    fn rebalance_event_records_deltas() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");

        let holdings = vec![
            Holding::new("GOOG", 10, Price(100_00), 50.0),
            Holding::new("TSLA", 200, Price(10_00), 50.0),
        ];
        let outcome = rebalance(holdings, Price::ZERO).unwrap();
        {
            let mut log = AuditLog::open(&path).unwrap();
            log_rebalance(&mut log, &outcome).unwrap();
        }

        let line = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(line.trim()).unwrap();
        assert_eq!(value["event"], "rebalance_computed");
        assert_eq!(value["trades"][0]["ticker"], "GOOG");
        assert_eq!(value["trades"][0]["delta"], 5);
        assert_eq!(value["trades"][1]["delta"], -50);
        assert_eq!(value["residual_cash"], 0.0);
    }

    #[test]
    fn appends_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");

        for _ in 0..2 {
            let mut log = AuditLog::open(&path).unwrap();
            log_run_failed(&mut log, "price of X must be greater than zero").unwrap();
        }

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 2);
    }
}
