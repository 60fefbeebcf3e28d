//! Run orchestrator: load → rebalance → render → audit.
//!
//! This is the main workflow that ties together all components.

use allocbook::{
    DriftReport, Instruction, RebalanceOutcome, Trade, drift, format_instructions, instructions,
    rebalance,
};
use log::{info, warn};
use serde::Serialize;

use crate::audit::{self, AuditLog};
use crate::config::{Config, OutputFormat};
use crate::error::{Error, Result};
use crate::portfolio::PortfolioFile;

/// Options for a rebalance run.
pub struct RunOptions {
    /// Force JSON output regardless of config
    pub json: bool,
    pub portfolio_file: String,
}

/// Machine-readable result of a run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub instructions: Vec<String>,
    pub trades: Vec<Trade>,
    pub total_value: f64,
    pub residual_cash: f64,
    pub text: String,
}

impl RunReport {
    pub fn from_outcome(outcome: &RebalanceOutcome) -> Self {
        let trades: Vec<Trade> = outcome.trades().collect();
        let clauses: Vec<Instruction> = instructions::instructions(&trades);
        Self {
            instructions: clauses.iter().map(ToString::to_string).collect(),
            trades,
            total_value: outcome.total_value.as_dollars(),
            residual_cash: outcome.residual_cash.as_dollars(),
            text: format_instructions(outcome),
        }
    }
}

/// Open the audit log if the config enables it.
fn open_audit(config: &Config) -> Result<Option<AuditLog>> {
    config.audit_path().map(|p| AuditLog::open(&p)).transpose()
}

/// Run `f` against the audit log, if there is one.
fn with_audit(
    audit: &mut Option<AuditLog>,
    f: impl FnOnce(&mut AuditLog) -> Result<()>,
) -> Result<()> {
    match audit {
        Some(log) => f(log),
        None => Ok(()),
    }
}

/// Render a rebalance outcome in the requested format.
pub fn render(outcome: &RebalanceOutcome, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(format_instructions(outcome)),
        OutputFormat::Json => to_json(&RunReport::from_outcome(outcome)),
    }
}

/// Render a drift report in the requested format.
pub fn render_drift(report: &DriftReport, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(report.to_string()),
        OutputFormat::Json => to_json(report),
    }
}

fn output_format(config: &Config, opts: &RunOptions) -> OutputFormat {
    if opts.json {
        OutputFormat::Json
    } else {
        config.output.format
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(|e| Error::Render(e.to_string()))
}

/// Run `steps` between a `run_started` and a `run_completed` or `run_failed`
/// audit event, so every entry in the trail is terminated.
fn audited<T>(
    config: &Config,
    command: &str,
    opts: &RunOptions,
    steps: impl FnOnce(&mut Option<AuditLog>) -> Result<(T, usize)>,
) -> Result<T> {
    let mut audit = open_audit(config)?;
    with_audit(&mut audit, |a| {
        audit::log_run_started(a, command, &opts.portfolio_file)
    })?;

    match steps(&mut audit) {
        Ok((value, n_instructions)) => {
            with_audit(&mut audit, |a| {
                audit::log_run_completed(a, command, n_instructions)
            })?;
            Ok(value)
        }
        Err(e) => {
            warn!("{command} rejected: {e}");
            with_audit(&mut audit, |a| audit::log_run_failed(a, &e.to_string()))?;
            Err(e)
        }
    }
}

/// Rebalance a loaded portfolio. Returns the outcome and the rendered output.
pub fn plan(
    config: &Config,
    portfolio: &PortfolioFile,
    opts: &RunOptions,
) -> Result<(RebalanceOutcome, String)> {
    audited(config, "run", opts, |audit| {
        let holdings = portfolio.holdings();
        let cash = portfolio.cash();
        with_audit(audit, |a| audit::log_portfolio(a, &holdings, cash))?;
        info!(
            "Loaded {} holdings, {} cash from {}",
            holdings.len(),
            cash,
            opts.portfolio_file
        );

        let format = output_format(config, opts);

        let drift_before = if config.output.show_drift && !holdings.is_empty() {
            drift::report(&holdings, cash).ok()
        } else {
            None
        };

        let outcome = rebalance(holdings, cash)?;
        with_audit(audit, |a| audit::log_rebalance(a, &outcome))?;
        if !outcome.changed() {
            info!("Nothing to rebalance");
            with_audit(audit, |a| a.log_simple("nothing_to_rebalance"))?;
        }

        let mut output = String::new();
        if let Some(before) = &drift_before {
            output.push_str(&render_drift(before, format)?);
            output.push('\n');
        }
        output.push_str(&render(&outcome, format)?);
        if drift_before.is_some() {
            let after = drift::report(&outcome.holdings, outcome.residual_cash)?;
            output.push('\n');
            output.push_str(&render_drift(&after, format)?);
        }

        let n_instructions = outcome.holdings.iter().filter(|h| h.delta() != 0).count();
        Ok(((outcome, output), n_instructions))
    })
}

/// Measure drift of a loaded portfolio. Returns the report and its rendering.
pub fn drift_plan(
    config: &Config,
    portfolio: &PortfolioFile,
    opts: &RunOptions,
) -> Result<(DriftReport, String)> {
    audited(config, "drift", opts, |audit| {
        let holdings = portfolio.holdings();
        let cash = portfolio.cash();
        with_audit(audit, |a| audit::log_portfolio(a, &holdings, cash))?;

        let report = drift::report(&holdings, cash)?;
        with_audit(audit, |a| audit::log_drift(a, &report))?;
        if let Some(worst) = report.worst() {
            info!("Largest deviation: {}", worst.ticker);
        }

        let output = render_drift(&report, output_format(config, opts))?;
        Ok(((report, output), 0))
    })
}

/// Execute a full rebalance run and print the result.
pub fn run(config: &Config, portfolio: &PortfolioFile, opts: &RunOptions) -> Result<()> {
    let (_, output) = plan(config, portfolio, opts)?;
    println!("{output}");
    if let Some(path) = config.audit_path() {
        info!("Audit logged to {}", path.display());
    }
    Ok(())
}

/// Print the drift report of a portfolio without rebalancing it.
pub fn run_drift(config: &Config, portfolio: &PortfolioFile, opts: &RunOptions) -> Result<()> {
    let (_, output) = drift_plan(config, portfolio, opts)?;
    println!("{output}");
    Ok(())
}
