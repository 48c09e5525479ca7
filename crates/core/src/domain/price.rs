use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub const DEFAULT_UNIT: &str = "kg";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: Decimal,
    pub max: Decimal,
    pub currency: String,
    #[serde(default = "default_unit")]
    pub unit: String,
}

impl PriceRange {
    pub fn new(min: Decimal, max: Decimal, currency: impl Into<String>) -> Self {
        Self { min, max, currency: currency.into(), unit: DEFAULT_UNIT.to_string() }
    }
}

fn default_unit() -> String {
    DEFAULT_UNIT.to_string()
}

/// Per-fruit price table keyed by the fruit label.
pub type PriceTable = BTreeMap<String, PriceRange>;

/// Every stored range is quoted per kilogram, whatever the caller sent.
pub fn normalize_units(table: PriceTable) -> PriceTable {
    table
        .into_iter()
        .map(|(fruit, range)| (fruit, PriceRange { unit: DEFAULT_UNIT.to_string(), ..range }))
        .collect()
}
