//! Reference price data for food items
//!
//! Food spending has a natural external anchor that other categories lack:
//! menu prices. The price book maps item descriptions to a known reference
//! price and serves two purposes: seeding realistic food amounts in the
//! synthetic corpus, and short-circuiting the anomaly flag when a food
//! transaction sits within ±50% of its known price.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// (item name, low price, high price) in rupiah
pub type MenuRange = (&'static str, f64, f64);

/// Built-in menu with plausible price ranges per item
pub const DEFAULT_MENU: &[MenuRange] = &[
    // Rice dishes
    ("Nasi Goreng Spesial", 25000.0, 35000.0),
    ("Nasi Uduk", 12000.0, 18000.0),
    ("Nasi Kuning", 15000.0, 22000.0),
    ("Nasi Campur", 20000.0, 30000.0),
    ("Nasi Ayam", 18000.0, 28000.0),
    // Soups and stews
    ("Soto Ayam", 15000.0, 25000.0),
    ("Soto Betawi", 20000.0, 30000.0),
    ("Sop Buntut", 35000.0, 50000.0),
    ("Bakso", 12000.0, 20000.0),
    ("Rawon", 20000.0, 30000.0),
    // Street food
    ("Gado-gado", 12000.0, 20000.0),
    ("Ketoprak", 12000.0, 20000.0),
    ("Siomay", 10000.0, 18000.0),
    ("Martabak Telur", 20000.0, 30000.0),
    ("Pisang Goreng", 8000.0, 15000.0),
    // Meat dishes
    ("Rendang", 25000.0, 40000.0),
    ("Ayam Goreng", 18000.0, 28000.0),
    ("Ayam Bakar", 20000.0, 30000.0),
    ("Sate Ayam", 15000.0, 25000.0),
    ("Ikan Bakar", 25000.0, 35000.0),
    // Seafood
    ("Cumi Goreng", 25000.0, 35000.0),
    ("Udang Goreng", 25000.0, 35000.0),
    ("Gurame Asam Manis", 35000.0, 50000.0),
    ("Nasi Goreng Seafood", 30000.0, 40000.0),
    // Vegetables
    ("Pecel", 12000.0, 18000.0),
    ("Cap Cay", 18000.0, 25000.0),
    ("Tumis Kangkung", 12000.0, 18000.0),
    ("Karedok", 12000.0, 18000.0),
    // Drinks
    ("Es Teh Manis", 5000.0, 8000.0),
    ("Es Jeruk", 6000.0, 10000.0),
    ("Es Campur", 12000.0, 18000.0),
    ("Jus Alpukat", 12000.0, 18000.0),
];

/// Allowed deviation from a known reference price before the short-circuit
/// stops applying
const REFERENCE_TOLERANCE: f64 = 0.5;

/// Lookup table of known item prices, keyed by normalized description
#[derive(Debug, Clone, Default)]
pub struct ReferencePriceBook {
    prices: HashMap<String, f64>,
}

impl ReferencePriceBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a book from the built-in menu, taking the midpoint of each range.
    pub fn from_default_menu() -> Self {
        let mut book = Self::new();
        for (name, low, high) in DEFAULT_MENU {
            book.insert(name, (low + high) / 2.0);
        }
        book
    }

    pub fn insert(&mut self, name: &str, price: f64) {
        self.prices.insert(normalize(name), price);
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.prices.get(&normalize(name)).copied()
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    /// True when the description matches a known item and the amount sits
    /// within ±50% of its reference price.
    pub fn within_reference(&self, description: &str, amount: f64) -> bool {
        match self.get(description) {
            Some(price) => {
                amount >= price * (1.0 - REFERENCE_TOLERANCE)
                    && amount <= price * (1.0 + REFERENCE_TOLERANCE)
            }
            None => false,
        }
    }
}

/// Draw one concrete price per menu item, uniform within its range and
/// rounded to whole rupiah. Reproducible for a fixed seed.
pub fn sample_menu_prices(menu: &[MenuRange], rng_seed: u64) -> Vec<(String, f64)> {
    let mut rng = StdRng::seed_from_u64(rng_seed);
    menu.iter()
        .map(|(name, low, high)| ((*name).to_string(), rng.random_range(*low..=*high).round()))
        .collect()
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_case_insensitive() {
        let book = ReferencePriceBook::from_default_menu();
        assert_eq!(book.get("nasi goreng spesial"), book.get("Nasi Goreng Spesial"));
        assert!(book.get("Nasi Goreng Spesial").is_some());
        assert!(book.get("Pizza Margherita").is_none());
    }

    #[test]
    fn test_within_reference_band() {
        let mut book = ReferencePriceBook::new();
        book.insert("Bakso", 16000.0);
        assert!(book.within_reference("Bakso", 16000.0));
        assert!(book.within_reference("Bakso", 8000.0)); // -50%
        assert!(book.within_reference("Bakso", 24000.0)); // +50%
        assert!(!book.within_reference("Bakso", 7999.0));
        assert!(!book.within_reference("Bakso", 24001.0));
        assert!(!book.within_reference("Unknown Item", 16000.0));
    }

    #[test]
    fn test_sampled_prices_stay_in_range_and_reproduce() {
        let first = sample_menu_prices(DEFAULT_MENU, 42);
        let second = sample_menu_prices(DEFAULT_MENU, 42);
        assert_eq!(first, second);
        assert_eq!(first.len(), DEFAULT_MENU.len());

        for ((name, price), (menu_name, low, high)) in first.iter().zip(DEFAULT_MENU) {
            assert_eq!(name, menu_name);
            assert!(*price >= *low && *price <= *high, "{} out of range", name);
            assert_eq!(price.fract(), 0.0);
        }

        // a different seed moves at least some prices
        let other = sample_menu_prices(DEFAULT_MENU, 7);
        assert_ne!(first, other);
    }
}
