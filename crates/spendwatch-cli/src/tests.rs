//! CLI command tests

use clap::Parser;
use tempfile::TempDir;

use crate::cli::{Cli, Commands};
use crate::commands;

#[test]
fn test_cli_parses_train() {
    let cli = Cli::parse_from(["spendwatch", "train", "--user", "alice", "--seed", "7"]);
    match cli.command {
        Commands::Train { user, seed, .. } => {
            assert_eq!(user.as_deref(), Some("alice"));
            assert_eq!(seed, 7);
        }
        _ => panic!("expected train command"),
    }
}

#[test]
fn test_cli_parses_analyze_with_defaults() {
    let cli = Cli::parse_from([
        "spendwatch",
        "analyze",
        "--amount",
        "21000",
        "--category",
        "food",
    ]);
    match cli.command {
        Commands::Analyze {
            amount,
            category,
            user,
            date,
            json,
            ..
        } => {
            assert_eq!(amount, 21000.0);
            assert_eq!(category, "food");
            assert_eq!(user, "default");
            assert!(date.is_none());
            assert!(!json);
        }
        _ => panic!("expected analyze command"),
    }
}

#[test]
fn test_cli_parses_seed_prices() {
    let cli = Cli::parse_from(["spendwatch", "seed-prices", "-o", "prices.json"]);
    match cli.command {
        Commands::SeedPrices { output, seed } => {
            assert_eq!(output.as_deref(), Some(std::path::Path::new("prices.json")));
            assert_eq!(seed, 42);
        }
        _ => panic!("expected seed-prices command"),
    }
}

#[test]
fn test_cmd_seed_prices_writes_the_price_book() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("prices.json");
    commands::cmd_seed_prices(Some(&path), 42).unwrap();

    let body = std::fs::read_to_string(&path).unwrap();
    let entries: Vec<serde_json::Value> = serde_json::from_str(&body).unwrap();
    assert_eq!(entries.len(), spendwatch_core::DEFAULT_MENU.len());
    assert!(entries
        .iter()
        .any(|e| e["name"] == "Nasi Goreng Spesial" && e["price"].is_number()));

    // reproducible for the same seed
    let again = dir.path().join("prices2.json");
    commands::cmd_seed_prices(Some(&again), 42).unwrap();
    assert_eq!(body, std::fs::read_to_string(&again).unwrap());
}

#[test]
fn test_cmd_train_writes_a_model() {
    let dir = TempDir::new().unwrap();
    let models = dir.path().join("models");
    commands::cmd_train(&models, None, Some("alice"), 42, 20).unwrap();
    assert!(models.join("user-alice.json").exists());
}

#[test]
fn test_cmd_analyze_lazy_trains_and_reports() {
    let dir = TempDir::new().unwrap();
    let models = dir.path().join("models");
    // No stored model yet: analyze must train lazily, then succeed
    commands::cmd_analyze(
        &models,
        21000.0,
        Some("2024-06-01"),
        "food",
        "Soto Ayam",
        "alice",
        None,
        true,
    )
    .unwrap();
    assert!(models.join("user-alice.json").exists());
}

#[test]
fn test_cmd_analyze_rejects_bad_input() {
    let dir = TempDir::new().unwrap();
    let models = dir.path().join("models");
    assert!(commands::cmd_analyze(
        &models,
        -5.0,
        Some("2024-06-01"),
        "food",
        "",
        "alice",
        None,
        true
    )
    .is_err());
    assert!(commands::cmd_analyze(
        &models,
        10.0,
        Some("2024-06-01"),
        "groceries",
        "",
        "alice",
        None,
        true
    )
    .is_err());
}
