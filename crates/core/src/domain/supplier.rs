use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::price::{normalize_units, PriceTable};
use crate::domain::{clean_fruits, require_name};
use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SupplierId(pub String);

impl SupplierId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Supplier {
    pub id: SupplierId,
    pub name: String,
    pub location: String,
    pub country: String,
    pub fruits_offered: Vec<String>,
    pub certifications: Vec<String>,
    pub contact_email: String,
    pub contact_phone: String,
    pub description: String,
    pub price_range: PriceTable,
    /// Trust score in `0..=100`; absent scores count as zero in aggregates.
    pub reliability: Option<u8>,
    pub established: Option<i32>,
}

/// Creation payload for a supplier, from the directory form or chat extraction.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SupplierDraft {
    pub name: String,
    pub country: String,
    pub location: Option<String>,
    pub fruits_offered: Vec<String>,
    pub certifications: Vec<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub description: Option<String>,
    pub price_range: PriceTable,
    pub reliability: Option<u8>,
    pub established: Option<i32>,
}

impl SupplierDraft {
    pub fn new(
        name: impl Into<String>,
        country: impl Into<String>,
        fruits_offered: Vec<String>,
    ) -> Self {
        Self {
            name: name.into(),
            country: country.into(),
            fruits_offered,
            ..Self::default()
        }
    }

    pub fn into_supplier(self, id: SupplierId) -> Result<Supplier, DomainError> {
        let name = require_name(&self.name, "supplier")?;
        let fruits_offered = clean_fruits(self.fruits_offered);
        if fruits_offered.is_empty() {
            return Err(DomainError::InvariantViolation(
                "supplier must offer at least one fruit".to_string(),
            ));
        }

        let country = self.country.trim().to_string();
        if country.is_empty() {
            return Err(DomainError::InvariantViolation("supplier country is required".to_string()));
        }
        let location = self
            .location
            .map(|location| location.trim().to_string())
            .filter(|location| !location.is_empty())
            .unwrap_or_else(|| country.clone());

        Ok(Supplier {
            id,
            name,
            location,
            country,
            fruits_offered,
            certifications: self.certifications,
            contact_email: self.contact_email.unwrap_or_default(),
            contact_phone: self.contact_phone.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            price_range: normalize_units(self.price_range),
            reliability: self.reliability.map(|score| score.min(100)),
            established: self.established,
        })
    }
}
