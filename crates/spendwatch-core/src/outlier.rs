//! Isolation-forest outlier model
//!
//! Anomalies are easier to isolate with random axis-aligned splits, so they
//! end up with shorter average path lengths across an ensemble of randomized
//! partitioning trees. The model owns its preprocessing: a standard scaler
//! fitted once on the training corpus and reused unchanged at scoring time.
//!
//! Scores follow the usual convention for this family: the internal anomaly
//! score `s = 2^(-E[h(x)] / c(n))` lives in (0, 1] with higher meaning more
//! anomalous, and the exported `raw_score` is `-s`, so more negative means
//! more anomalous.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::features::FeatureVector;
use crate::stats::percentile;

/// Euler-Mascheroni constant, used in the average path length formula
const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

/// Ensemble configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForestConfig {
    /// Number of randomized partitioning trees
    pub trees: usize,
    /// Subsample size per tree (capped at the corpus size)
    pub sample_size: usize,
    /// Assumed prior fraction of anomalous training examples; calibrates
    /// the binary decision threshold
    pub contamination: f64,
    /// RNG seed, for reproducible fits
    pub rng_seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            trees: 100,
            sample_size: 256,
            contamination: 0.10,
            rng_seed: 42,
        }
    }
}

/// Raw scoring output for one feature vector
#[derive(Debug, Clone, Copy)]
pub struct RawScore {
    /// Native-scale score; more negative = more anomalous
    pub raw_score: f64,
    /// The ensemble's binary decision at its contamination-calibrated
    /// threshold
    pub is_outlier: bool,
}

/// Zero-mean / unit-variance scaling, fitted per feature column
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScaler {
    means: Vec<f64>,
    stds: Vec<f64>,
}

impl StandardScaler {
    /// Fit column means and population standard deviations.
    pub fn fit(data: &[FeatureVector]) -> Result<Self> {
        let first = data
            .first()
            .ok_or_else(|| Error::Training("cannot fit scaler on empty data".into()))?;
        let cols = first.values.len();
        let n = data.len() as f64;

        let mut means = vec![0.0; cols];
        for fv in data {
            for (m, v) in means.iter_mut().zip(&fv.values) {
                *m += v;
            }
        }
        for m in &mut means {
            *m /= n;
        }

        let mut stds = vec![0.0; cols];
        for fv in data {
            for ((s, v), m) in stds.iter_mut().zip(&fv.values).zip(&means) {
                *s += (v - m) * (v - m);
            }
        }
        for s in &mut stds {
            *s = (*s / n).sqrt();
        }

        Ok(Self { means, stds })
    }

    /// Scale one vector. Constant columns pass through centered only.
    pub fn transform(&self, fv: &FeatureVector) -> Vec<f64> {
        fv.values
            .iter()
            .zip(&self.means)
            .zip(&self.stds)
            .map(|((v, m), s)| {
                let scale = if *s > 0.0 { *s } else { 1.0 };
                (v - m) / scale
            })
            .collect()
    }
}

/// A node in an isolation tree
#[derive(Debug, Clone, Serialize, Deserialize)]
enum Node {
    Split {
        feature: usize,
        value: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
    Leaf {
        size: usize,
    },
}

/// A single isolation tree
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Tree {
    root: Node,
}

impl Tree {
    fn grow(rows: &[&[f64]], depth: usize, max_depth: usize, rng: &mut StdRng) -> Node {
        if depth >= max_depth || rows.len() <= 1 {
            return Node::Leaf { size: rows.len() };
        }

        let n_features = rows[0].len();
        let feature = rng.random_range(0..n_features);

        let mut min_val = f64::INFINITY;
        let mut max_val = f64::NEG_INFINITY;
        for row in rows {
            let v = row[feature];
            min_val = min_val.min(v);
            max_val = max_val.max(v);
        }

        // All values identical along this axis: nothing left to isolate
        if !(max_val > min_val) {
            return Node::Leaf { size: rows.len() };
        }

        let value = rng.random_range(min_val..max_val);
        let (left_rows, right_rows): (Vec<&[f64]>, Vec<&[f64]>) =
            rows.iter().copied().partition(|row| row[feature] < value);

        Node::Split {
            feature,
            value,
            left: Box::new(Self::grow(&left_rows, depth + 1, max_depth, rng)),
            right: Box::new(Self::grow(&right_rows, depth + 1, max_depth, rng)),
        }
    }

    fn path_length(&self, row: &[f64]) -> f64 {
        let mut node = &self.root;
        let mut depth = 0.0;
        loop {
            match node {
                Node::Leaf { size } => {
                    // Unresolved leaves stand in for the subtree that would
                    // have been grown below them
                    return depth + expected_path_length(*size);
                }
                Node::Split {
                    feature,
                    value,
                    left,
                    right,
                } => {
                    node = if row[*feature] < *value { left } else { right };
                    depth += 1.0;
                }
            }
        }
    }
}

/// Expected path length c(n) of an unsuccessful BST search over n points
fn expected_path_length(n: usize) -> f64 {
    if n <= 1 {
        return 0.0;
    }
    let n = n as f64;
    2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
}

/// The fitted ensemble
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IsolationForest {
    config: ForestConfig,
    trees: Vec<Tree>,
    /// c(sample_size), the normalization constant shared by all trees
    normalizer: f64,
    /// Anomaly-score decision threshold, the (1 - contamination) quantile
    /// of the training scores
    threshold: f64,
}

impl IsolationForest {
    /// Fit the ensemble on scaled feature rows.
    pub fn fit(config: ForestConfig, rows: &[Vec<f64>]) -> Result<Self> {
        if rows.is_empty() {
            return Err(Error::Training("cannot fit forest on empty data".into()));
        }

        let mut rng = StdRng::seed_from_u64(config.rng_seed);
        let sample_size = config.sample_size.min(rows.len());
        let max_depth = (sample_size as f64).log2().ceil().max(1.0) as usize;

        let mut trees = Vec::with_capacity(config.trees);
        for _ in 0..config.trees {
            let sample: Vec<&[f64]> = (0..sample_size)
                .map(|_| rows[rng.random_range(0..rows.len())].as_slice())
                .collect();
            trees.push(Tree {
                root: Tree::grow(&sample, 0, max_depth, &mut rng),
            });
        }

        let mut forest = Self {
            normalizer: expected_path_length(sample_size),
            threshold: 0.5,
            config,
            trees,
        };

        // Calibrate the decision threshold so roughly `contamination` of the
        // training corpus lands on the outlier side
        let mut train_scores: Vec<f64> =
            rows.iter().map(|r| forest.anomaly_score(r)).collect();
        train_scores.sort_by(|a, b| a.total_cmp(b));
        forest.threshold = percentile(&train_scores, 1.0 - forest.config.contamination);

        debug!(
            "Fitted isolation forest: {} trees, sample {}, threshold {:.4}",
            forest.trees.len(),
            sample_size,
            forest.threshold
        );
        Ok(forest)
    }

    /// Anomaly score in (0, 1]; higher = more anomalous.
    fn anomaly_score(&self, row: &[f64]) -> f64 {
        if self.trees.is_empty() || self.normalizer <= 0.0 {
            return 0.5;
        }
        let total: f64 = self.trees.iter().map(|t| t.path_length(row)).sum();
        let avg_path = total / self.trees.len() as f64;
        2.0_f64.powf(-avg_path / self.normalizer)
    }

    /// Score a scaled row into the native raw score plus the binary vote.
    pub fn score(&self, row: &[f64]) -> RawScore {
        let s = self.anomaly_score(row);
        RawScore {
            raw_score: -s,
            is_outlier: s >= self.threshold,
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }
}

/// Fitted preprocessing plus fitted ensemble, the unit that scoring
/// snapshots are made of
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutlierModel {
    scaler: StandardScaler,
    forest: IsolationForest,
}

impl OutlierModel {
    /// Fit scaler and forest in one pass over the training features.
    pub fn fit(config: ForestConfig, features: &[FeatureVector]) -> Result<Self> {
        let scaler = StandardScaler::fit(features)?;
        let rows: Vec<Vec<f64>> = features.iter().map(|fv| scaler.transform(fv)).collect();
        let forest = IsolationForest::fit(config, &rows)?;
        Ok(Self { scaler, forest })
    }

    /// Score one feature vector against the fitted state.
    pub fn score(&self, feature: &FeatureVector) -> RawScore {
        self.forest.score(&self.scaler.transform(feature))
    }
}
