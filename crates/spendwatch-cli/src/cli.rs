//! CLI argument definitions using clap
//!
//! This module contains the clap structs and enums for parsing CLI
//! arguments. The command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Spendwatch - Flag anomalous spending
#[derive(Parser)]
#[command(name = "spendwatch")]
#[command(about = "Transaction anomaly detector for personal spending", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Directory where fitted models are stored
    #[arg(long, default_value = "spendwatch-models", global = true)]
    pub models: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Train a model from the synthetic seed plus optional CSV history
    Train {
        /// Transaction history CSV (date,amount,category,description,user_id)
        #[arg(short = 'f', long)]
        history: Option<PathBuf>,

        /// Train for one user's scope (default: global)
        #[arg(short, long)]
        user: Option<String>,

        /// RNG seed for the forest and seed-corpus generation
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Synthetic transactions generated per category
        #[arg(long, default_value = "60")]
        per_category: usize,
    },

    /// Analyze one transaction against a trained model
    Analyze {
        /// Transaction amount (must be positive)
        #[arg(short, long)]
        amount: f64,

        /// Transaction date, ISO format (default: today)
        #[arg(short, long)]
        date: Option<String>,

        /// Category: food, transport, entertainment, bills, other
        #[arg(short, long)]
        category: String,

        /// Free-text description
        #[arg(long, default_value = "")]
        description: String,

        /// User scope id
        #[arg(short, long, default_value = "default")]
        user: String,

        /// Transaction history CSV, used to retrain if no stored model exists
        #[arg(short = 'f', long)]
        history: Option<PathBuf>,

        /// Emit the result as JSON instead of human-readable text
        #[arg(long)]
        json: bool,
    },

    /// Generate a reference price book from the built-in menu
    SeedPrices {
        /// Write the price book JSON here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// RNG seed for drawing each item's price within its range
        #[arg(long, default_value = "42")]
        seed: u64,
    },
}
