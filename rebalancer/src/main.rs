//! CLI entry point for the allocbook rebalancer.

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};

use allocbook_rebalancer::config::Config;
use allocbook_rebalancer::error::Error;
use allocbook_rebalancer::execution::{self, RunOptions};
use allocbook_rebalancer::portfolio::PortfolioFile;

#[derive(Parser)]
#[command(name = "rebalancer")]
#[command(about = "Allocation rebalancer: portfolio file → buy/sell instructions")]
#[command(version)]
struct Cli {
    /// Path to config.toml (defaults apply when omitted)
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Rebalance a portfolio and print the instructions
    Run {
        /// Path to portfolio.json
        portfolio: PathBuf,

        /// Print a JSON report instead of text
        #[arg(long)]
        json: bool,
    },

    /// Show how far a portfolio is from its targets
    Drift {
        /// Path to portfolio.json
        portfolio: PathBuf,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

fn load_portfolio(path: &Path) -> PortfolioFile {
    match PortfolioFile::load(path) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error loading portfolio: {e}");
            process::exit(1);
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => match Config::load(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config: {e}");
                process::exit(1);
            }
        },
        None => Config::default(),
    };

    let result = match cli.command {
        Command::Run { portfolio, json } => {
            let file = load_portfolio(&portfolio);
            let opts = RunOptions {
                json,
                portfolio_file: portfolio.display().to_string(),
            };
            execution::run(&config, &file, &opts)
        }
        Command::Drift { portfolio, json } => {
            let file = load_portfolio(&portfolio);
            let opts = RunOptions {
                json,
                portfolio_file: portfolio.display().to_string(),
            };
            execution::run_drift(&config, &file, &opts)
        }
    };

    if let Err(e) = result {
        match &e {
            Error::Rebalance(err) => {
                eprintln!("\nRejected: {err}");
                process::exit(2);
            }
            _ => {
                eprintln!("Error: {e}");
                process::exit(1);
            }
        }
    }
}
