//! Spendwatch CLI - transaction anomaly detector
//!
//! Usage:
//!   spendwatch train --history txns.csv --user alice   Fit and store a model
//!   spendwatch analyze -a 21000 -c food                Score one transaction
//!   spendwatch seed-prices -o prices.json              Emit reference prices

mod cli;
mod commands;

#[cfg(test)]
mod tests;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    match cli.command {
        Commands::Train {
            history,
            user,
            seed,
            per_category,
        } => commands::cmd_train(
            &cli.models,
            history.as_deref(),
            user.as_deref(),
            seed,
            per_category,
        ),
        Commands::Analyze {
            amount,
            date,
            category,
            description,
            user,
            history,
            json,
        } => commands::cmd_analyze(
            &cli.models,
            amount,
            date.as_deref(),
            &category,
            &description,
            &user,
            history.as_deref(),
            json,
        ),
        Commands::SeedPrices { output, seed } => {
            commands::cmd_seed_prices(output.as_deref(), seed)
        }
    }
}
