//! Search and facet filters over the supplier and buyer directories.

use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::buyer::{Buyer, Volume};
use crate::domain::supplier::Supplier;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SupplierFilter {
    pub search: Option<String>,
    pub country: Option<String>,
    pub fruit: Option<String>,
    pub certification: Option<String>,
}

impl SupplierFilter {
    pub fn matches(&self, supplier: &Supplier) -> bool {
        matches_search(self.search.as_deref(), &supplier.name, &supplier.location)
            && facet_eq(self.country.as_deref(), &supplier.country)
            && facet_contains(self.fruit.as_deref(), &supplier.fruits_offered)
            && facet_contains(self.certification.as_deref(), &supplier.certifications)
    }

    pub fn apply<'a>(&self, suppliers: &'a [Supplier]) -> Vec<&'a Supplier> {
        suppliers.iter().filter(|supplier| self.matches(supplier)).collect()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuyerFilter {
    pub search: Option<String>,
    pub country: Option<String>,
    pub fruit: Option<String>,
    #[serde(deserialize_with = "blank_volume_as_none")]
    pub volume: Option<Volume>,
}

/// The directory form submits `volume=` for "any volume".
fn blank_volume_as_none<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Volume>, D::Error> {
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(volume) => volume.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

impl BuyerFilter {
    pub fn matches(&self, buyer: &Buyer) -> bool {
        matches_search(self.search.as_deref(), &buyer.name, &buyer.location)
            && facet_eq(self.country.as_deref(), &buyer.country)
            && facet_contains(self.fruit.as_deref(), &buyer.fruits_interested)
            && self.volume.map_or(true, |volume| volume == buyer.volume)
    }

    pub fn apply<'a>(&self, buyers: &'a [Buyer]) -> Vec<&'a Buyer> {
        buyers.iter().filter(|buyer| self.matches(buyer)).collect()
    }
}

fn active(facet: Option<&str>) -> Option<&str> {
    facet.filter(|value| !value.is_empty())
}

fn matches_search(search: Option<&str>, name: &str, location: &str) -> bool {
    let Some(term) = active(search) else {
        return true;
    };
    let term = term.to_lowercase();
    name.to_lowercase().contains(&term) || location.to_lowercase().contains(&term)
}

fn facet_eq(facet: Option<&str>, value: &str) -> bool {
    active(facet).map_or(true, |expected| expected == value)
}

fn facet_contains(facet: Option<&str>, values: &[String]) -> bool {
    active(facet).map_or(true, |expected| values.iter().any(|value| value == expected))
}

/// Distinct values in first-seen order, used to populate facet pickers.
pub fn facet_values<'a, I>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = Vec::<String>::new();
    for value in values {
        if !value.is_empty() && !seen.iter().any(|existing| existing == value) {
            seen.push(value.to_string());
        }
    }
    seen
}
