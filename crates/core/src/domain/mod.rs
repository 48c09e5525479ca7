pub mod buyer;
pub mod chat;
pub mod price;
pub mod supplier;

use crate::errors::DomainError;

/// Trims fruit labels and drops blanks. Casing is preserved: matching is an
/// exact comparison unless a normalizing policy is selected.
pub fn clean_fruits(fruits: Vec<String>) -> Vec<String> {
    fruits
        .into_iter()
        .map(|fruit| fruit.trim().to_string())
        .filter(|fruit| !fruit.is_empty())
        .collect()
}

pub(crate) fn require_name(name: &str, entity: &str) -> Result<String, DomainError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(DomainError::InvariantViolation(format!("{entity} name is required")));
    }
    Ok(name.to_string())
}

/// Splits comma separated form input (`"banana, mango"`) into fruit labels.
pub fn split_fruit_list(raw: &str) -> Vec<String> {
    clean_fruits(raw.split(',').map(str::to_string).collect())
}

#[cfg(test)]
mod tests {
    use super::{clean_fruits, split_fruit_list};

    #[test]
    fn clean_fruits_keeps_casing() {
        let cleaned = clean_fruits(vec![" Mango ".to_string(), String::new()]);
        assert_eq!(cleaned, vec!["Mango".to_string()]);
    }

    #[test]
    fn split_fruit_list_drops_empty_entries() {
        assert_eq!(split_fruit_list("banana, ,mango,"), vec!["banana", "mango"]);
    }
}
