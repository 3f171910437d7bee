//! CSV import for transaction history
//!
//! Expected columns (header required): date,amount,category,description,user_id
//! Dates are ISO (YYYY-MM-DD); categories must be one of the fixed set.

use std::io::Read;

use csv::ReaderBuilder;
use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::Transaction;

#[derive(Debug, Deserialize)]
struct HistoryRow {
    date: String,
    amount: f64,
    category: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    user_id: String,
}

/// Parse a transaction history CSV.
///
/// Fails on the first malformed row, with the row number in the error so
/// the caller can point at the offending line.
pub fn parse_history_csv<R: Read>(reader: R) -> Result<Vec<Transaction>> {
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut transactions = Vec::new();
    for (i, record) in csv_reader.deserialize::<HistoryRow>().enumerate() {
        // +2: one for the header line, one for 1-based numbering
        let row_number = i + 2;
        let row = record.map_err(|e| Error::Import(format!("row {}: {}", row_number, e)))?;
        let tx = Transaction::parse(
            row.amount,
            &row.date,
            &row.category,
            &row.description,
            &row.user_id,
        )
        .map_err(|e| Error::Import(format!("row {}: {}", row_number, e)))?;
        transactions.push(tx);
    }

    debug!("Parsed {} transactions from history CSV", transactions.len());
    Ok(transactions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;

    const VALID_CSV: &str = "\
date,amount,category,description,user_id
2024-03-15,25000,food,Nasi Goreng,user-1
2024-03-16,15000,transport,Bus fare,user-1
2024-04-01,350000,bills,Electricity,user-2
";

    #[test]
    fn test_parse_valid_history() {
        let txs = parse_history_csv(VALID_CSV.as_bytes()).unwrap();
        assert_eq!(txs.len(), 3);
        assert_eq!(txs[0].category, Category::Food);
        assert_eq!(txs[0].amount, 25000.0);
        assert_eq!(txs[2].user_id, "user-2");
    }

    #[test]
    fn test_bad_category_reports_row_number() {
        let csv = "\
date,amount,category,description,user_id
2024-03-15,25000,food,ok,u
2024-03-16,100,groceries,bad,u
";
        let err = parse_history_csv(csv.as_bytes()).unwrap_err();
        match err {
            Error::Import(msg) => assert!(msg.contains("row 3"), "got: {}", msg),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_negative_amount_rejected() {
        let csv = "\
date,amount,category,description,user_id
2024-03-15,-5,food,refund,u
";
        assert!(matches!(
            parse_history_csv(csv.as_bytes()).unwrap_err(),
            Error::Import(_)
        ));
    }

    #[test]
    fn test_empty_file_yields_empty_history() {
        let csv = "date,amount,category,description,user_id\n";
        assert!(parse_history_csv(csv.as_bytes()).unwrap().is_empty());
    }
}
