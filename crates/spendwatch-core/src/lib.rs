//! Spendwatch Core Library
//!
//! Flags financially anomalous transactions for an individual user by
//! combining category-relative statistics with an unsupervised outlier
//! model:
//! - Feature encoding from raw transactions
//! - Per-category historical statistics with fallback defaults
//! - Synthetic seed corpus generation and corpus merging
//! - An isolation-forest ensemble with standard-scaler preprocessing
//! - Confidence normalization gated by a z-score policy
//! - Human-readable insight generation
//! - A session object tying it together, with injected corpus and
//!   persistence collaborators
//!
//! Storage, authentication, and presentation are the caller's problem; this
//! crate consumes abstract corpus/persistence operations and hands back a
//! structured analysis result.

pub mod corpus;
pub mod detect;
pub mod error;
pub mod features;
pub mod import;
pub mod insights;
pub mod models;
pub mod outlier;
pub mod prices;
pub mod score;
pub mod stats;
pub mod store;

pub use corpus::{default_menu, generate_seed, CorpusBuilder, SeedConfig};
pub use detect::{
    AnomalyDetector, CorpusProvider, DetectorConfig, ModelSnapshot, StaticCorpusProvider,
};
pub use error::{Error, Result};
pub use features::{encode, FeatureVector, FEATURE_LEN};
pub use import::parse_history_csv;
pub use insights::{generate, InsightInput, DEGRADED_PLACEHOLDER};
pub use models::{AnalysisResult, Category, Scope, Transaction, TransactionInsights};
pub use outlier::{ForestConfig, IsolationForest, OutlierModel, RawScore, StandardScaler};
pub use prices::{sample_menu_prices, ReferencePriceBook, DEFAULT_MENU};
pub use score::{decide, normalize, CONFIDENCE_GATE, Z_SCORE_GATE};
pub use stats::{z_score, AmountStats, CategoryLookup, CategoryStatsTable};
pub use store::{FileModelStore, MemoryStore, ModelStore};
