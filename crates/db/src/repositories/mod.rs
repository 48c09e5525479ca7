use async_trait::async_trait;
use thiserror::Error;

use fruitlink_core::domain::buyer::{Buyer, BuyerId};
use fruitlink_core::domain::chat::ChatMessage;
use fruitlink_core::domain::supplier::{Supplier, SupplierId};
use fruitlink_core::errors::ApplicationError;

pub mod memory;

pub use memory::{InMemoryBuyerRepository, InMemoryMessageRepository, InMemorySupplierRepository};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("{entity} `{id}` already exists")]
    Duplicate { entity: &'static str, id: String },
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

impl From<RepositoryError> for ApplicationError {
    fn from(error: RepositoryError) -> Self {
        Self::Persistence(error.to_string())
    }
}

/// Suppliers in creation order. Records are replaced whole, never deleted.
#[async_trait]
pub trait SupplierRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<Supplier>, RepositoryError>;
    async fn find_by_id(&self, id: &SupplierId) -> Result<Option<Supplier>, RepositoryError>;
    async fn insert(&self, supplier: Supplier) -> Result<(), RepositoryError>;
    async fn replace(&self, supplier: Supplier) -> Result<bool, RepositoryError>;
}

#[async_trait]
pub trait BuyerRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<Buyer>, RepositoryError>;
    async fn find_by_id(&self, id: &BuyerId) -> Result<Option<Buyer>, RepositoryError>;
    async fn insert(&self, buyer: Buyer) -> Result<(), RepositoryError>;
    async fn replace(&self, buyer: Buyer) -> Result<bool, RepositoryError>;
}

/// Append-only chat log; insertion order is display order.
#[async_trait]
pub trait MessageRepository: Send + Sync {
    async fn append(&self, message: ChatMessage) -> Result<(), RepositoryError>;
    async fn list(&self) -> Result<Vec<ChatMessage>, RepositoryError>;
}
