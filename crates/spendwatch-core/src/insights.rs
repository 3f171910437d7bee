//! Narrative insight generation
//!
//! Three independent rules, one per field. A failure in any rule degrades
//! that field to a fixed placeholder instead of failing the analysis.

use crate::models::{Category, Transaction, TransactionInsights};

/// Fallback text for a field whose rule could not run
pub const DEGRADED_PLACEHOLDER: &str = "Analysis unavailable for this transaction";

const WEEKDAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Everything the rules need, precomputed by the caller
#[derive(Debug, Clone)]
pub struct InsightInput<'a> {
    pub transaction: &'a Transaction,
    pub category_mean: f64,
    pub category_std: f64,
    pub z_score: f64,
    /// 0 = Monday .. 6 = Sunday
    pub weekday: usize,
    pub day_of_month: u32,
    /// Historical mean amount for this weekday, if the corpus had any
    pub weekday_mean: Option<f64>,
    /// The category's share of the historical corpus, if seen
    pub frequency_share: Option<f64>,
}

/// Generate all three narrative fields. Pure function of its input; each
/// field degrades independently.
pub fn generate(input: &InsightInput<'_>) -> TransactionInsights {
    TransactionInsights {
        amount_analysis: amount_analysis(input)
            .unwrap_or_else(|| DEGRADED_PLACEHOLDER.to_string()),
        timing_analysis: timing_analysis(input)
            .unwrap_or_else(|| DEGRADED_PLACEHOLDER.to_string()),
        category_analysis: category_analysis(input.transaction.category, input.frequency_share),
    }
}

fn amount_analysis(input: &InsightInput<'_>) -> Option<String> {
    let z = input.z_score;
    if !z.is_finite() {
        return None;
    }
    let avg = format_amount(input.category_mean);

    let text = if z.abs() <= 1.0 {
        format!("Spending is very normal for this category (average: {})", avg)
    } else if z.abs() <= 2.0 {
        if z > 0.0 {
            format!(
                "Spending is slightly higher than usual, but still normal (average: {})",
                avg
            )
        } else {
            format!(
                "Spending is slightly lower than usual, but still normal (average: {})",
                avg
            )
        }
    } else {
        let std = format_amount(input.category_std);
        if z > 0.0 {
            format!(
                "Spending is very high compared to the category average (normal: {} ± {})",
                avg, std
            )
        } else {
            format!(
                "Spending is very low compared to the category average (normal: {} ± {})",
                avg, std
            )
        }
    };
    Some(text)
}

fn timing_analysis(input: &InsightInput<'_>) -> Option<String> {
    let weekday = WEEKDAYS.get(input.weekday)?;
    if !(1..=31).contains(&input.day_of_month) {
        return None;
    }
    let mut text = format!(
        "Transaction made on a {}, day {} of the month",
        weekday, input.day_of_month
    );
    if let Some(avg) = input.weekday_mean {
        text.push_str(&format!(
            "; spending on {}s historically averages {}",
            weekday,
            format_amount(avg)
        ));
    }
    Some(text)
}

fn category_analysis(category: Category, frequency_share: Option<f64>) -> String {
    match frequency_share {
        Some(share) => format!(
            "The {} category makes up {:.1}% of your transaction history",
            category,
            share * 100.0
        ),
        None => format!("No historical data for the {} category yet", category),
    }
}

/// Format an amount with thousands separators and no decimals
fn format_amount(value: f64) -> String {
    let rounded = value.round().abs() as u64;
    let digits = rounded.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    if value < 0.0 {
        format!("-{}", out)
    } else {
        out
    }
}
