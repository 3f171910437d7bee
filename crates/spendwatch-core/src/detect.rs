//! The anomaly-detection session
//!
//! A caller-constructed session object owning the trained state. Training
//! is mutually exclusive per session; analysis reads whichever snapshot is
//! installed when the call starts and completes against it, even if a
//! retrain lands mid-flight. No global state anywhere.

use std::sync::{Arc, Mutex, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::corpus::CorpusBuilder;
use crate::error::{Error, Result};
use crate::features::{encode, weekday_index};
use crate::insights::{generate, InsightInput};
use crate::models::{AnalysisResult, Category, Scope, Transaction};
use crate::outlier::{ForestConfig, OutlierModel};
use crate::prices::ReferencePriceBook;
use crate::score::{decide, normalize};
use crate::stats::{z_score, CategoryStatsTable};
use crate::store::ModelStore;

/// Yields the transactions a training pass works from
pub trait CorpusProvider: Send + Sync {
    /// The synthetic default seed corpus.
    fn default_seed(&self) -> Result<Vec<Transaction>>;

    /// Historical transactions for a scope.
    fn historical(&self, scope: &Scope) -> Result<Vec<Transaction>>;
}

/// A provider over in-memory transaction lists
#[derive(Debug, Default)]
pub struct StaticCorpusProvider {
    seed: Vec<Transaction>,
    historical: Vec<Transaction>,
}

impl StaticCorpusProvider {
    pub fn new(seed: Vec<Transaction>, historical: Vec<Transaction>) -> Self {
        Self { seed, historical }
    }
}

impl CorpusProvider for StaticCorpusProvider {
    fn default_seed(&self) -> Result<Vec<Transaction>> {
        Ok(self.seed.clone())
    }

    fn historical(&self, scope: &Scope) -> Result<Vec<Transaction>> {
        let txs = match scope {
            Scope::Global => self.historical.clone(),
            Scope::User(id) => self
                .historical
                .iter()
                .filter(|tx| &tx.user_id == id)
                .cloned()
                .collect(),
        };
        Ok(txs)
    }
}

/// Detector configuration
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    pub forest: ForestConfig,
    /// Std fallback for categories unseen at training time, as a fraction
    /// of the observed amount
    pub fallback_std_fraction: f64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            forest: ForestConfig::default(),
            fallback_std_fraction: 0.25,
        }
    }
}

/// The immutable product of one successful training pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSnapshot {
    pub model: OutlierModel,
    pub stats: CategoryStatsTable,
    pub corpus_size: usize,
    pub trained_at: DateTime<Utc>,
}

/// Session object combining the model, its statistics, and the injected
/// collaborators
pub struct AnomalyDetector {
    config: DetectorConfig,
    provider: Box<dyn CorpusProvider>,
    store: Option<(Box<dyn ModelStore>, String)>,
    prices: Option<ReferencePriceBook>,
    snapshot: RwLock<Option<Arc<ModelSnapshot>>>,
    /// At most one training pass at a time per session
    train_lock: Mutex<()>,
}

impl AnomalyDetector {
    pub fn new(provider: Box<dyn CorpusProvider>) -> Self {
        Self::with_config(provider, DetectorConfig::default())
    }

    pub fn with_config(provider: Box<dyn CorpusProvider>, config: DetectorConfig) -> Self {
        Self {
            config,
            provider,
            store: None,
            prices: None,
            snapshot: RwLock::new(None),
            train_lock: Mutex::new(()),
        }
    }

    /// Attach a model store; snapshots are persisted under `model_id` after
    /// each successful training pass.
    pub fn with_store(mut self, store: Box<dyn ModelStore>, model_id: impl Into<String>) -> Self {
        self.store = Some((store, model_id.into()));
        self
    }

    /// Attach reference price data for the food short-circuit.
    pub fn with_prices(mut self, prices: ReferencePriceBook) -> Self {
        self.prices = Some(prices);
        self
    }

    pub fn is_trained(&self) -> bool {
        self.read_snapshot().is_some()
    }

    /// Try to restore a persisted snapshot. Returns false (and leaves the
    /// session untrained) on any load or decode failure; the fallback is
    /// simply retraining from scratch, so failures are logged, not raised.
    ///
    /// A restore holds the same lock as `train` and is a no-op once any
    /// snapshot is installed: a stale persisted blob never replaces the
    /// product of a newer training pass.
    pub fn load_persisted(&self) -> bool {
        let Some((store, model_id)) = &self.store else {
            return false;
        };
        let _guard = self
            .train_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if self.is_trained() {
            return true;
        }
        let blob = match store.load(model_id) {
            Ok(Some(blob)) => blob,
            Ok(None) => return false,
            Err(e) => {
                warn!("Failed to load model '{}': {}; will retrain", model_id, e);
                return false;
            }
        };
        match serde_json::from_slice::<ModelSnapshot>(&blob) {
            Ok(snapshot) => {
                info!(
                    "Restored model '{}' (trained {} on {} transactions)",
                    model_id, snapshot.trained_at, snapshot.corpus_size
                );
                self.install(snapshot);
                true
            }
            Err(e) => {
                warn!("Corrupt model blob '{}': {}; will retrain", model_id, e);
                false
            }
        }
    }

    /// Train (or retrain) on the provider's seed plus the scope's history.
    ///
    /// Returns `Ok(false)` when the merged corpus is empty; any previously
    /// installed snapshot stays in place and remains usable.
    pub fn train(&self, scope: &Scope) -> Result<bool> {
        self.train_with_new(scope, Vec::new())
    }

    /// Train, folding newly submitted transactions into the corpus after the
    /// seed and the scope's history. Used for lazy train-on-first-analyze, so
    /// the model has seen the transaction it is about to score.
    pub fn train_with_new(&self, scope: &Scope, new: Vec<Transaction>) -> Result<bool> {
        let _guard = self
            .train_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let corpus = CorpusBuilder::new()
            .with_seed(self.provider.default_seed()?)
            .with_historical(self.provider.historical(scope)?)
            .with_new(new)
            .build();

        if corpus.is_empty() {
            warn!("No training data available for {:?}", scope);
            return Ok(false);
        }

        let stats = CategoryStatsTable::fit(&corpus);
        let features = corpus
            .iter()
            .map(encode)
            .collect::<Result<Vec<_>>>()?;
        let model = OutlierModel::fit(self.config.forest.clone(), &features)?;

        let snapshot = ModelSnapshot {
            model,
            stats,
            corpus_size: corpus.len(),
            trained_at: Utc::now(),
        };
        self.persist(&snapshot);
        self.install(snapshot);

        info!("Trained on {} transactions for {:?}", corpus.len(), scope);
        Ok(true)
    }

    /// Analyze one transaction against the installed snapshot.
    ///
    /// Fails with `ModelNotTrained` when no training pass has succeeded and
    /// nothing was restored from the store.
    pub fn analyze(&self, tx: &Transaction) -> Result<AnalysisResult> {
        let snapshot = self.read_snapshot().ok_or(Error::ModelNotTrained)?;

        let feature = encode(tx)?;
        let raw = snapshot.model.score(&feature);
        let confidence_score = normalize(raw.raw_score, raw.is_outlier);

        let lookup =
            snapshot
                .stats
                .lookup_or_default(tx.category, tx.amount, self.config.fallback_std_fraction);
        let z = z_score(tx.amount, lookup.mean, lookup.std);

        let mut is_anomaly = decide(z, confidence_score);

        // Known menu prices trump the model for food: an amount near the
        // listed price is not anomalous no matter what the forest thinks
        if is_anomaly && tx.category == Category::Food {
            if let Some(prices) = &self.prices {
                if prices.within_reference(&tx.description, tx.amount) {
                    debug!(
                        "'{}' at {} is within reference price range; clearing flag",
                        tx.description, tx.amount
                    );
                    is_anomaly = false;
                }
            }
        }

        let insights = generate(&InsightInput {
            transaction: tx,
            category_mean: lookup.mean,
            category_std: lookup.std,
            z_score: z,
            weekday: weekday_index(tx),
            day_of_month: chrono::Datelike::day(&tx.date),
            weekday_mean: snapshot.stats.weekday_mean(weekday_index(tx)),
            frequency_share: snapshot.stats.frequency_share(tx.category),
        });

        Ok(AnalysisResult {
            is_anomaly,
            confidence_score,
            insights,
        })
    }

    fn read_snapshot(&self) -> Option<Arc<ModelSnapshot>> {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn install(&self, snapshot: ModelSnapshot) {
        *self
            .snapshot
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(snapshot));
    }

    /// Best-effort persistence; the session stays correct without it.
    fn persist(&self, snapshot: &ModelSnapshot) {
        let Some((store, model_id)) = &self.store else {
            return;
        };
        let result = serde_json::to_vec(snapshot)
            .map_err(Error::from)
            .and_then(|blob| store.save(model_id, &blob));
        if let Err(e) = result {
            warn!("Failed to persist model '{}': {}", model_id, e);
        }
    }
}
