//! Per-category historical statistics
//!
//! Computed in full on every training pass and frozen into the model
//! snapshot; nothing here is updated incrementally.

use std::collections::HashMap;

use chrono::Datelike;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::features::weekday_index;
use crate::models::{Category, Transaction};

/// Amount statistics for one category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmountStats {
    pub mean: f64,
    /// Sample standard deviation; 0.0 when there is a single observation
    pub std: f64,
    pub median: f64,
    pub q1: f64,
    pub q3: f64,
    pub count: usize,
}

/// Category lookup result, possibly synthesized from fallback defaults
#[derive(Debug, Clone, Copy)]
pub struct CategoryLookup {
    pub mean: f64,
    pub std: f64,
    /// False when the category was absent from the training corpus and the
    /// values above are fallback defaults
    pub seen: bool,
}

/// The full statistics snapshot for a training corpus
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryStatsTable {
    per_category: HashMap<Category, AmountStats>,
    /// Mean amount by weekday (0 = Monday), across the whole corpus
    weekday_avg: Vec<Option<f64>>,
    /// Mean amount by day of month (index 0 = day 1), across the whole corpus
    day_of_month_avg: Vec<Option<f64>>,
    total_count: usize,
}

impl CategoryStatsTable {
    /// Compute statistics over a training corpus.
    pub fn fit(corpus: &[Transaction]) -> Self {
        let mut by_category: HashMap<Category, Vec<f64>> = HashMap::new();
        let mut by_weekday: Vec<Vec<f64>> = vec![Vec::new(); 7];
        let mut by_day: Vec<Vec<f64>> = vec![Vec::new(); 31];

        for tx in corpus {
            by_category.entry(tx.category).or_default().push(tx.amount);
            by_weekday[weekday_index(tx)].push(tx.amount);
            by_day[tx.date.day() as usize - 1].push(tx.amount);
        }

        let per_category = by_category
            .into_iter()
            .map(|(cat, mut amounts)| {
                amounts.sort_by(|a, b| a.total_cmp(b));
                let stats = AmountStats {
                    mean: mean(&amounts),
                    std: std_dev(&amounts),
                    median: percentile(&amounts, 0.5),
                    q1: percentile(&amounts, 0.25),
                    q3: percentile(&amounts, 0.75),
                    count: amounts.len(),
                };
                (cat, stats)
            })
            .collect();

        let averaged = |buckets: Vec<Vec<f64>>| -> Vec<Option<f64>> {
            buckets
                .into_iter()
                .map(|b| if b.is_empty() { None } else { Some(mean(&b)) })
                .collect()
        };

        debug!("Computed category statistics over {} transactions", corpus.len());

        Self {
            per_category,
            weekday_avg: averaged(by_weekday),
            day_of_month_avg: averaged(by_day),
            total_count: corpus.len(),
        }
    }

    pub fn lookup(&self, category: Category) -> Option<&AmountStats> {
        self.per_category.get(&category)
    }

    /// Look up a category's mean/std, falling back to defaults when the
    /// category never appeared in the training corpus: the observed amount
    /// becomes its own mean, with std a fixed fraction of the amount.
    pub fn lookup_or_default(
        &self,
        category: Category,
        amount: f64,
        fallback_std_fraction: f64,
    ) -> CategoryLookup {
        match self.per_category.get(&category) {
            Some(stats) => CategoryLookup {
                mean: stats.mean,
                std: stats.std,
                seen: true,
            },
            None => CategoryLookup {
                mean: amount,
                std: amount * fallback_std_fraction,
                seen: false,
            },
        }
    }

    /// The category's share of total corpus count, or `None` if unseen.
    pub fn frequency_share(&self, category: Category) -> Option<f64> {
        if self.total_count == 0 {
            return None;
        }
        self.per_category
            .get(&category)
            .map(|s| s.count as f64 / self.total_count as f64)
    }

    /// Mean amount across the corpus for a weekday (0 = Monday).
    pub fn weekday_mean(&self, weekday: usize) -> Option<f64> {
        self.weekday_avg.get(weekday).copied().flatten()
    }

    /// Mean amount across the corpus for a day of month (1-31).
    pub fn day_of_month_mean(&self, day: u32) -> Option<f64> {
        if !(1..=31).contains(&day) {
            return None;
        }
        self.day_of_month_avg.get(day as usize - 1).copied().flatten()
    }

    pub fn total_count(&self) -> usize {
        self.total_count
    }
}

/// How many standard deviations an amount sits from its category mean.
///
/// Defined as 0 when the std is not positive, so a single-observation
/// category never divides by zero.
pub fn z_score(amount: f64, mean: f64, std: f64) -> f64 {
    if std > 0.0 {
        (amount - mean) / std
    } else {
        0.0
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (ddof = 1); 0.0 for fewer than two values
fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / (values.len() - 1) as f64;
    var.sqrt()
}

/// Linear-interpolation percentile over a sorted slice, p in [0, 1]
pub(crate) fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    if sorted.len() == 1 {
        return sorted[0];
    }
    let rank = p.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        let frac = rank - lo as f64;
        sorted[lo] + (sorted[hi] - sorted[lo]) * frac
    }
}
