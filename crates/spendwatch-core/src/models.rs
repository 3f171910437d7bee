//! Shared data types for Spendwatch

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// The fixed set of spending categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Food,
    Transport,
    Entertainment,
    Bills,
    Other,
}

impl Category {
    /// All categories, in ordinal order
    pub const ALL: [Category; 5] = [
        Category::Food,
        Category::Transport,
        Category::Entertainment,
        Category::Bills,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Food => "food",
            Category::Transport => "transport",
            Category::Entertainment => "entertainment",
            Category::Bills => "bills",
            Category::Other => "other",
        }
    }

    /// Stable ordinal code used by the feature encoder.
    ///
    /// The same code must be used at fit time and at scoring time, so the
    /// ordering here is part of the model format.
    pub fn ordinal(&self) -> usize {
        match self {
            Category::Food => 0,
            Category::Transport => 1,
            Category::Entertainment => 2,
            Category::Bills => 3,
            Category::Other => 4,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "food" => Ok(Category::Food),
            "transport" => Ok(Category::Transport),
            "entertainment" => Ok(Category::Entertainment),
            "bills" => Ok(Category::Bills),
            "other" => Ok(Category::Other),
            _ => Err(format!("Unknown category: {}", s)),
        }
    }
}

/// A single spending transaction
///
/// Immutable once recorded; the analysis pipeline never mutates one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub date: NaiveDate,
    pub description: String,
    /// Always positive; a spend amount, not a signed ledger entry
    pub amount: f64,
    pub category: Category,
    /// Scope key for history fetches
    pub user_id: String,
}

impl Transaction {
    pub fn new(
        date: NaiveDate,
        description: impl Into<String>,
        amount: f64,
        category: Category,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            date,
            description: description.into(),
            amount,
            category,
            user_id: user_id.into(),
        }
    }

    /// Build a transaction from raw (untyped) fields, validating as we go.
    ///
    /// This is the entry point for external input: CSV rows, CLI arguments,
    /// anything that hasn't been through the type system yet.
    pub fn parse(
        amount: f64,
        date: &str,
        category: &str,
        description: &str,
        user_id: &str,
    ) -> Result<Self> {
        if !(amount > 0.0) {
            return Err(Error::InvalidTransaction(format!(
                "amount must be positive, got {}",
                amount
            )));
        }
        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map_err(|e| Error::InvalidTransaction(format!("bad date '{}': {}", date, e)))?;
        let category = category
            .parse::<Category>()
            .map_err(Error::InvalidTransaction)?;
        Ok(Self::new(date, description, amount, category, user_id))
    }
}

/// Narrative fields describing why a transaction looks the way it does
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionInsights {
    /// How the amount compares to the category's historical spread
    pub amount_analysis: String,
    /// Calendar position (weekday, day of month) and weekday spending average
    pub timing_analysis: String,
    /// The category's share of the historical corpus
    pub category_analysis: String,
}

/// The result of analyzing a single transaction
///
/// Created fresh per analysis; ownership passes to the caller for
/// persistence and rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub is_anomaly: bool,
    /// Always within [0, 100]
    pub confidence_score: f64,
    pub insights: TransactionInsights,
}

/// Which slice of transaction history to train against
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// One user's history
    User(String),
    /// Everything the provider knows about
    Global,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_round_trip() {
        for cat in Category::ALL {
            assert_eq!(cat.as_str().parse::<Category>().unwrap(), cat);
        }
        assert!("groceries".parse::<Category>().is_err());
    }

    #[test]
    fn test_category_ordinals_are_distinct() {
        let mut seen = std::collections::HashSet::new();
        for cat in Category::ALL {
            assert!(seen.insert(cat.ordinal()));
        }
    }

    #[test]
    fn test_parse_valid_transaction() {
        let tx = Transaction::parse(25000.0, "2024-03-15", "food", "Nasi Goreng", "user-1")
            .unwrap();
        assert_eq!(tx.category, Category::Food);
        assert_eq!(tx.date, NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
        assert_eq!(tx.amount, 25000.0);
    }

    #[test]
    fn test_parse_rejects_non_positive_amount() {
        let err = Transaction::parse(0.0, "2024-03-15", "food", "x", "u").unwrap_err();
        assert!(matches!(err, Error::InvalidTransaction(_)));
        let err = Transaction::parse(-5.0, "2024-03-15", "food", "x", "u").unwrap_err();
        assert!(matches!(err, Error::InvalidTransaction(_)));
    }

    #[test]
    fn test_parse_rejects_bad_date_and_category() {
        assert!(matches!(
            Transaction::parse(10.0, "15/03/2024", "food", "x", "u").unwrap_err(),
            Error::InvalidTransaction(_)
        ));
        assert!(matches!(
            Transaction::parse(10.0, "2024-03-15", "groceries", "x", "u").unwrap_err(),
            Error::InvalidTransaction(_)
        ));
    }
}
