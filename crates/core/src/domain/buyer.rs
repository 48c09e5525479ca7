use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::price::{normalize_units, PriceTable};
use crate::domain::{clean_fruits, require_name};
use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BuyerId(pub String);

impl BuyerId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Volume {
    Small,
    #[default]
    Medium,
    Large,
}

impl Volume {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Small => "Small",
            Self::Medium => "Medium",
            Self::Large => "Large",
        }
    }
}

impl std::str::FromStr for Volume {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "Small" => Ok(Self::Small),
            "Medium" => Ok(Self::Medium),
            "Large" => Ok(Self::Large),
            other => Err(DomainError::InvariantViolation(format!(
                "unsupported volume `{other}` (expected Small|Medium|Large)"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Buyer {
    pub id: BuyerId,
    pub name: String,
    pub location: String,
    pub country: String,
    pub fruits_interested: Vec<String>,
    pub certifications: Vec<String>,
    pub contact_email: String,
    pub contact_phone: String,
    pub description: String,
    pub budget_range: PriceTable,
    pub volume: Volume,
    pub established: Option<i32>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BuyerDraft {
    pub name: String,
    pub country: String,
    pub location: Option<String>,
    pub fruits_interested: Vec<String>,
    pub certifications: Vec<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub description: Option<String>,
    pub budget_range: PriceTable,
    pub volume: Option<Volume>,
    pub established: Option<i32>,
}

impl BuyerDraft {
    pub fn new(
        name: impl Into<String>,
        country: impl Into<String>,
        fruits_interested: Vec<String>,
    ) -> Self {
        Self {
            name: name.into(),
            country: country.into(),
            fruits_interested,
            ..Self::default()
        }
    }

    pub fn into_buyer(self, id: BuyerId) -> Result<Buyer, DomainError> {
        let name = require_name(&self.name, "buyer")?;
        let fruits_interested = clean_fruits(self.fruits_interested);
        if fruits_interested.is_empty() {
            return Err(DomainError::InvariantViolation(
                "buyer must be interested in at least one fruit".to_string(),
            ));
        }

        let country = self.country.trim().to_string();
        let location = self
            .location
            .map(|location| location.trim().to_string())
            .filter(|location| !location.is_empty())
            .unwrap_or_else(|| country.clone());

        Ok(Buyer {
            id,
            name,
            location,
            country,
            fruits_interested,
            certifications: self.certifications,
            contact_email: self.contact_email.unwrap_or_default(),
            contact_phone: self.contact_phone.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            budget_range: normalize_units(self.budget_range),
            volume: self.volume.unwrap_or_default(),
            established: self.established,
        })
    }
}
