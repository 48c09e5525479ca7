use tokio::sync::RwLock;

use fruitlink_core::domain::buyer::{Buyer, BuyerId};
use fruitlink_core::domain::chat::ChatMessage;
use fruitlink_core::domain::supplier::{Supplier, SupplierId};

use super::{BuyerRepository, MessageRepository, RepositoryError, SupplierRepository};

#[derive(Default)]
pub struct InMemorySupplierRepository {
    suppliers: RwLock<Vec<Supplier>>,
}

impl InMemorySupplierRepository {
    pub fn with_records(suppliers: Vec<Supplier>) -> Self {
        Self { suppliers: RwLock::new(suppliers) }
    }
}

#[async_trait::async_trait]
impl SupplierRepository for InMemorySupplierRepository {
    async fn list(&self) -> Result<Vec<Supplier>, RepositoryError> {
        Ok(self.suppliers.read().await.clone())
    }

    async fn find_by_id(&self, id: &SupplierId) -> Result<Option<Supplier>, RepositoryError> {
        let suppliers = self.suppliers.read().await;
        Ok(suppliers.iter().find(|supplier| &supplier.id == id).cloned())
    }

    async fn insert(&self, supplier: Supplier) -> Result<(), RepositoryError> {
        let mut suppliers = self.suppliers.write().await;
        if suppliers.iter().any(|existing| existing.id == supplier.id) {
            return Err(RepositoryError::Duplicate { entity: "supplier", id: supplier.id.0 });
        }
        suppliers.push(supplier);
        Ok(())
    }

    async fn replace(&self, supplier: Supplier) -> Result<bool, RepositoryError> {
        let mut suppliers = self.suppliers.write().await;
        match suppliers.iter_mut().find(|existing| existing.id == supplier.id) {
            Some(slot) => {
                *slot = supplier;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[derive(Default)]
pub struct InMemoryBuyerRepository {
    buyers: RwLock<Vec<Buyer>>,
}

impl InMemoryBuyerRepository {
    pub fn with_records(buyers: Vec<Buyer>) -> Self {
        Self { buyers: RwLock::new(buyers) }
    }
}

#[async_trait::async_trait]
impl BuyerRepository for InMemoryBuyerRepository {
    async fn list(&self) -> Result<Vec<Buyer>, RepositoryError> {
        Ok(self.buyers.read().await.clone())
    }

    async fn find_by_id(&self, id: &BuyerId) -> Result<Option<Buyer>, RepositoryError> {
        let buyers = self.buyers.read().await;
        Ok(buyers.iter().find(|buyer| &buyer.id == id).cloned())
    }

    async fn insert(&self, buyer: Buyer) -> Result<(), RepositoryError> {
        let mut buyers = self.buyers.write().await;
        if buyers.iter().any(|existing| existing.id == buyer.id) {
            return Err(RepositoryError::Duplicate { entity: "buyer", id: buyer.id.0 });
        }
        buyers.push(buyer);
        Ok(())
    }

    async fn replace(&self, buyer: Buyer) -> Result<bool, RepositoryError> {
        let mut buyers = self.buyers.write().await;
        match buyers.iter_mut().find(|existing| existing.id == buyer.id) {
            Some(slot) => {
                *slot = buyer;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[derive(Default)]
pub struct InMemoryMessageRepository {
    messages: RwLock<Vec<ChatMessage>>,
}

#[async_trait::async_trait]
impl MessageRepository for InMemoryMessageRepository {
    async fn append(&self, message: ChatMessage) -> Result<(), RepositoryError> {
        self.messages.write().await.push(message);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<ChatMessage>, RepositoryError> {
        Ok(self.messages.read().await.clone())
    }
}
