//! Command implementations for the Spendwatch CLI

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::info;

use spendwatch_core::{
    default_menu, generate_seed, parse_history_csv, sample_menu_prices, AnomalyDetector,
    DetectorConfig, FileModelStore, ForestConfig, ReferencePriceBook, Scope, SeedConfig,
    StaticCorpusProvider, Transaction,
};

/// Scope and model id for an optional user argument
fn scope_for(user: Option<&str>) -> (Scope, String) {
    match user {
        Some(id) => (Scope::User(id.to_string()), format!("user-{}", id)),
        None => (Scope::Global, "global".to_string()),
    }
}

fn read_history(path: Option<&Path>) -> Result<Vec<Transaction>> {
    match path {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("opening history file {}", path.display()))?;
            let txs = parse_history_csv(file).context("parsing history CSV")?;
            info!("Loaded {} historical transactions", txs.len());
            Ok(txs)
        }
        None => Ok(Vec::new()),
    }
}

fn build_detector(
    models_dir: &Path,
    model_id: &str,
    history: Option<&Path>,
    rng_seed: u64,
    per_category: usize,
) -> Result<AnomalyDetector> {
    let seed_config = SeedConfig {
        per_category,
        rng_seed,
        ..SeedConfig::default()
    };
    let seed = generate_seed(&seed_config, default_menu(), Utc::now().date_naive());
    let provider = StaticCorpusProvider::new(seed, read_history(history)?);

    let config = DetectorConfig {
        forest: ForestConfig {
            rng_seed,
            ..ForestConfig::default()
        },
        ..DetectorConfig::default()
    };
    let store = FileModelStore::new(models_dir).context("opening model store")?;

    Ok(AnomalyDetector::with_config(Box::new(provider), config)
        .with_prices(ReferencePriceBook::from_default_menu())
        .with_store(Box::new(store), model_id))
}

pub fn cmd_train(
    models_dir: &Path,
    history: Option<&Path>,
    user: Option<&str>,
    rng_seed: u64,
    per_category: usize,
) -> Result<()> {
    let (scope, model_id) = scope_for(user);
    let detector = build_detector(models_dir, &model_id, history, rng_seed, per_category)?;

    if detector.train(&scope)? {
        println!("Trained and stored model '{}'", model_id);
    } else {
        println!("No training data available for model '{}'", model_id);
    }
    Ok(())
}

/// Draw concrete reference prices from the built-in menu and emit them as
/// JSON, so a caller can inspect the price book or persist it elsewhere.
pub fn cmd_seed_prices(output: Option<&Path>, rng_seed: u64) -> Result<()> {
    let prices = sample_menu_prices(default_menu(), rng_seed);
    let entries: Vec<serde_json::Value> = prices
        .iter()
        .map(|(name, price)| serde_json::json!({ "name": name, "price": price }))
        .collect();
    let body = serde_json::to_string_pretty(&entries)?;

    match output {
        Some(path) => {
            std::fs::write(path, body)
                .with_context(|| format!("writing price book {}", path.display()))?;
            println!("Wrote {} food prices to {}", prices.len(), path.display());
        }
        None => println!("{}", body),
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn cmd_analyze(
    models_dir: &Path,
    amount: f64,
    date: Option<&str>,
    category: &str,
    description: &str,
    user: &str,
    history: Option<&Path>,
    json: bool,
) -> Result<()> {
    let today = Utc::now().date_naive().to_string();
    let date = date.unwrap_or(&today);
    let tx = Transaction::parse(amount, date, category, description, user)?;

    let (scope, model_id) = scope_for(Some(user));
    let detector = build_detector(
        models_dir,
        &model_id,
        history,
        42,
        SeedConfig::default().per_category,
    )?;

    // Lazy training: reuse a persisted model if one exists, otherwise fit
    // now with the submitted transaction folded into the corpus
    if !detector.load_persisted() && !detector.train_with_new(&scope, vec![tx.clone()])? {
        anyhow::bail!("no training data available for '{}'", model_id);
    }

    let result = detector.analyze(&tx)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        let verdict = if result.is_anomaly { "ANOMALY" } else { "normal" };
        println!("{} (confidence {:.1})", verdict, result.confidence_score);
        println!("  amount:   {}", result.insights.amount_analysis);
        println!("  timing:   {}", result.insights.timing_analysis);
        println!("  category: {}", result.insights.category_analysis);
    }
    Ok(())
}
