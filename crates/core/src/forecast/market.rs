use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: f64,
}

pub trait PriceHistorySource: Send + Sync {
    /// Historical prices for `fruit`, oldest first.
    fn history(&self, fruit: &str) -> Vec<PricePoint>;
}

pub const REFERENCE_FRUIT: &str = "apple";

/// Static weekly price table standing in for a market-data feed. Lookups are
/// case-insensitive and unknown fruits resolve to the apple series.
#[derive(Clone, Debug)]
pub struct MockMarketData {
    series: BTreeMap<String, Vec<PricePoint>>,
    reference: String,
}

impl MockMarketData {
    pub fn new(series: BTreeMap<String, Vec<PricePoint>>, reference: impl Into<String>) -> Self {
        let series = series.into_iter().map(|(fruit, points)| (fruit.to_lowercase(), points)).collect();
        Self { series, reference: reference.into().to_lowercase() }
    }

    pub fn known_fruits(&self) -> Vec<&str> {
        self.series.keys().map(String::as_str).collect()
    }
}

impl Default for MockMarketData {
    fn default() -> Self {
        let mut series = BTreeMap::new();
        series.insert("apple".to_string(), weekly_series(&[1.20, 1.25, 1.22, 1.30, 1.28]));
        series.insert("mango".to_string(), weekly_series(&[2.10, 2.15, 2.12, 2.18, 2.20]));
        series.insert("durian".to_string(), weekly_series(&[5.00, 5.10, 5.05, 5.20, 5.15]));
        Self::new(series, REFERENCE_FRUIT)
    }
}

impl PriceHistorySource for MockMarketData {
    fn history(&self, fruit: &str) -> Vec<PricePoint> {
        let key = fruit.trim().to_lowercase();
        self.series
            .get(&key)
            .or_else(|| self.series.get(&self.reference))
            .cloned()
            .unwrap_or_default()
    }
}

// Weekly samples starting 2024-06-01.
fn weekly_series(prices: &[f64]) -> Vec<PricePoint> {
    prices
        .iter()
        .enumerate()
        .filter_map(|(week, price)| {
            NaiveDate::from_ymd_opt(2024, 6, 1 + 7 * week as u32)
                .map(|date| PricePoint { date, price: *price })
        })
        .collect()
}
