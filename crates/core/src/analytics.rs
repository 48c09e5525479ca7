//! Directory-wide distributions feeding the analytics endpoint and the
//! business-intelligence prompt.

use serde::{Deserialize, Serialize};

use crate::domain::buyer::Buyer;
use crate::domain::supplier::Supplier;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionEntry {
    pub name: String,
    pub value: usize,
}

/// Counts per label in first-seen order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Distribution(pub Vec<DistributionEntry>);

impl Distribution {
    pub fn tally<'a, I>(labels: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut entries: Vec<DistributionEntry> = Vec::new();
        for label in labels {
            match entries.iter_mut().find(|entry| entry.name == label) {
                Some(entry) => entry.value += 1,
                None => entries.push(DistributionEntry { name: label.to_string(), value: 1 }),
            }
        }
        Self(entries)
    }

    /// Highest count; ties go to the label seen first.
    pub fn top(&self) -> Option<&str> {
        let mut best: Option<&DistributionEntry> = None;
        for entry in &self.0 {
            if best.map_or(true, |current| entry.value > current.value) {
                best = Some(entry);
            }
        }
        best.map(|entry| entry.name.as_str())
    }

    /// Entries ordered by descending count, ties keeping first-seen order.
    pub fn ranked(&self) -> Vec<DistributionEntry> {
        let mut ranked = self.0.clone();
        ranked.sort_by(|left, right| right.value.cmp(&left.value));
        ranked
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketSummary {
    pub supplier_countries: Distribution,
    pub buyer_fruits: Distribution,
    pub supplier_certifications: Distribution,
    pub top_country: Option<String>,
    pub top_fruit: Option<String>,
    pub top_certification: Option<String>,
}

impl MarketSummary {
    pub fn from_directory(suppliers: &[Supplier], buyers: &[Buyer]) -> Self {
        let supplier_countries =
            Distribution::tally(suppliers.iter().map(|supplier| supplier.country.as_str()));
        let buyer_fruits = Distribution::tally(
            buyers.iter().flat_map(|buyer| buyer.fruits_interested.iter().map(String::as_str)),
        );
        let supplier_certifications = Distribution::tally(
            suppliers.iter().flat_map(|supplier| supplier.certifications.iter().map(String::as_str)),
        );

        Self {
            top_country: supplier_countries.top().map(str::to_string),
            top_fruit: buyer_fruits.top().map(str::to_string),
            top_certification: supplier_certifications.top().map(str::to_string),
            supplier_countries,
            buyer_fruits,
            supplier_certifications,
        }
    }

    /// Prompt asking the collaborator for a short executive insight. The text is
    /// a pure function of the summary so it doubles as the insight cache key.
    pub fn insight_prompt(&self) -> String {
        let render = |distribution: &Distribution| {
            serde_json::to_string(&distribution.ranked()).unwrap_or_else(|_| "[]".to_string())
        };
        let label = |value: &Option<String>| value.clone().unwrap_or_else(|| "n/a".to_string());

        format!(
            "You are a business intelligence analyst for a global fruit trading platform. \
             Here is a summary of our current supplier and buyer data:\n\n\
             Top supplier country: {}\nTop buyer fruit: {}\nTop supplier certification: {}\n\n\
             Supplier country distribution: {}\nBuyer fruit interest distribution: {}\n\
             Supplier certification distribution: {}\n\n\
             Please provide a concise, actionable insight (2-4 sentences) for the CEO, \
             highlighting any trends, risks, or opportunities you see in this data.",
            label(&self.top_country),
            label(&self.top_fruit),
            label(&self.top_certification),
            render(&self.supplier_countries),
            render(&self.buyer_fruits),
            render(&self.supplier_certifications),
        )
    }
}
