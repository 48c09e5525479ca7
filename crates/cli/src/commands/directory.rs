use fruitlink_core::directory::{BuyerFilter, SupplierFilter};
use fruitlink_db::SeedDataset;

use crate::commands::CommandResult;

pub fn suppliers(filter: &SupplierFilter) -> CommandResult {
    let dataset = SeedDataset::demo();
    let matched = filter.apply(&dataset.suppliers);
    let message = format!("{} of {} suppliers match", matched.len(), dataset.suppliers.len());
    CommandResult::with_data("suppliers", message, matched)
}

pub fn buyers(filter: &BuyerFilter) -> CommandResult {
    let dataset = SeedDataset::demo();
    let matched = filter.apply(&dataset.buyers);
    let message = format!("{} of {} buyers match", matched.len(), dataset.buyers.len());
    CommandResult::with_data("buyers", message, matched)
}
