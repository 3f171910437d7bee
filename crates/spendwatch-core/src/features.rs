//! Feature encoding for the outlier model
//!
//! Turns a transaction into a fixed-length numeric vector:
//!   [log1p(amount), category ordinal, weekday, day of month, month]
//!
//! The log transform keeps large bill amounts from dominating the metric
//! space that the isolation forest partitions. Category uses the ordinal
//! code from [`Category::ordinal`]; the encoding is fixed for the lifetime
//! of a fitted model.

use chrono::Datelike;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::Transaction;

/// Number of features produced per transaction
pub const FEATURE_LEN: usize = 5;

/// A fixed-order numeric feature vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub values: Vec<f64>,
}

impl FeatureVector {
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }
}

/// Encode a transaction into a feature vector.
///
/// Pure: the same transaction always yields the same vector. Fails with
/// `InvalidTransaction` if the amount is not positive (dates and categories
/// are already typed, so they cannot be invalid here).
pub fn encode(tx: &Transaction) -> Result<FeatureVector> {
    if !(tx.amount > 0.0) {
        return Err(Error::InvalidTransaction(format!(
            "amount must be positive, got {}",
            tx.amount
        )));
    }

    let values = vec![
        (1.0 + tx.amount).ln(),
        tx.category.ordinal() as f64,
        weekday_index(tx) as f64,
        tx.date.day() as f64,
        tx.date.month() as f64,
    ];
    Ok(FeatureVector { values })
}

/// Weekday index with 0 = Monday .. 6 = Sunday
pub fn weekday_index(tx: &Transaction) -> usize {
    tx.date.weekday().num_days_from_monday() as usize
}
