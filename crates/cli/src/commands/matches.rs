use fruitlink_core::config::{AppConfig, LoadOptions};
use fruitlink_core::matching::{trade_risk, MatchPolicy, Matcher};
use fruitlink_db::SeedDataset;
use serde_json::json;

use crate::commands::CommandResult;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MatchTarget {
    Buyer(String),
    Supplier(String),
}

pub fn run(target: &MatchTarget) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "matches",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };
    let policy = if config.matching.normalize_fruit_names {
        MatchPolicy::Normalized
    } else {
        MatchPolicy::Exact
    };

    run_with(target, Matcher::new(policy), &SeedDataset::demo())
}

pub fn run_with(target: &MatchTarget, matcher: Matcher, dataset: &SeedDataset) -> CommandResult {
    match target {
        MatchTarget::Buyer(id) => {
            let Some(buyer) = dataset.buyers.iter().find(|buyer| &buyer.id.0 == id) else {
                return CommandResult::failure("matches", "not_found", format!("unknown buyer `{id}`"), 4);
            };
            let matched = matcher.match_suppliers(buyer, &dataset.suppliers);
            let risk = trade_risk(&matched);
            let suppliers = matched
                .iter()
                .map(|supplier| {
                    json!({
                        "id": supplier.id.0,
                        "name": supplier.name,
                        "sharedFruits": matcher.shared_fruits(&buyer.fruits_interested, &supplier.fruits_offered),
                    })
                })
                .collect::<Vec<_>>();
            CommandResult::with_data(
                "matches",
                format!("{} suppliers match buyer {}", suppliers.len(), buyer.name),
                json!({ "buyer": buyer.id.0, "suppliers": suppliers, "risk": risk }),
            )
        }
        MatchTarget::Supplier(id) => {
            let Some(supplier) = dataset.suppliers.iter().find(|supplier| &supplier.id.0 == id) else {
                return CommandResult::failure(
                    "matches",
                    "not_found",
                    format!("unknown supplier `{id}`"),
                    4,
                );
            };
            let buyers = matcher
                .match_buyers(supplier, &dataset.buyers)
                .iter()
                .map(|buyer| {
                    json!({
                        "id": buyer.id.0,
                        "name": buyer.name,
                        "sharedFruits": matcher.shared_fruits(&supplier.fruits_offered, &buyer.fruits_interested),
                    })
                })
                .collect::<Vec<_>>();
            CommandResult::with_data(
                "matches",
                format!("{} buyers match supplier {}", buyers.len(), supplier.name),
                json!({ "supplier": supplier.id.0, "buyers": buyers }),
            )
        }
    }
}
