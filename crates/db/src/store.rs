use std::sync::Arc;

use tracing::info;

use fruitlink_core::domain::buyer::{Buyer, BuyerDraft, BuyerId};
use fruitlink_core::domain::chat::{ChatMessage, View};
use fruitlink_core::domain::supplier::{Supplier, SupplierDraft, SupplierId};
use fruitlink_core::errors::{ApplicationError, DomainError};

use crate::fixtures::SeedDataset;
use crate::repositories::{
    BuyerRepository, InMemoryBuyerRepository, InMemoryMessageRepository,
    InMemorySupplierRepository, MessageRepository, SupplierRepository,
};
use crate::session::ViewStore;

/// Process-wide state: the supplier and buyer directories, the chat log and
/// the current view. Cheap to clone; clones share the same collections.
#[derive(Clone)]
pub struct AppStore {
    suppliers: Arc<dyn SupplierRepository>,
    buyers: Arc<dyn BuyerRepository>,
    messages: Arc<dyn MessageRepository>,
    views: Arc<ViewStore>,
}

impl AppStore {
    pub fn new(
        suppliers: Arc<dyn SupplierRepository>,
        buyers: Arc<dyn BuyerRepository>,
        messages: Arc<dyn MessageRepository>,
    ) -> Self {
        Self { suppliers, buyers, messages, views: Arc::new(ViewStore::default()) }
    }

    pub fn in_memory(dataset: SeedDataset) -> Self {
        Self::new(
            Arc::new(InMemorySupplierRepository::with_records(dataset.suppliers)),
            Arc::new(InMemoryBuyerRepository::with_records(dataset.buyers)),
            Arc::new(InMemoryMessageRepository::default()),
        )
    }

    pub fn seeded() -> Self {
        Self::in_memory(SeedDataset::demo())
    }

    pub fn empty() -> Self {
        Self::in_memory(SeedDataset { suppliers: Vec::new(), buyers: Vec::new() })
    }

    pub async fn suppliers(&self) -> Result<Vec<Supplier>, ApplicationError> {
        Ok(self.suppliers.list().await?)
    }

    pub async fn buyers(&self) -> Result<Vec<Buyer>, ApplicationError> {
        Ok(self.buyers.list().await?)
    }

    pub async fn supplier(&self, id: &SupplierId) -> Result<Option<Supplier>, ApplicationError> {
        Ok(self.suppliers.find_by_id(id).await?)
    }

    pub async fn buyer(&self, id: &BuyerId) -> Result<Option<Buyer>, ApplicationError> {
        Ok(self.buyers.find_by_id(id).await?)
    }

    pub async fn create_supplier(&self, draft: SupplierDraft) -> Result<Supplier, ApplicationError> {
        let supplier = draft.into_supplier(SupplierId::generate())?;
        self.suppliers.insert(supplier.clone()).await?;
        info!(
            event_name = "store.supplier.created",
            supplier_id = %supplier.id.0,
            fruits = supplier.fruits_offered.len(),
            "supplier created"
        );
        Ok(supplier)
    }

    pub async fn create_buyer(&self, draft: BuyerDraft) -> Result<Buyer, ApplicationError> {
        let buyer = draft.into_buyer(BuyerId::generate())?;
        self.buyers.insert(buyer.clone()).await?;
        info!(
            event_name = "store.buyer.created",
            buyer_id = %buyer.id.0,
            fruits = buyer.fruits_interested.len(),
            "buyer created"
        );
        Ok(buyer)
    }

    /// Swaps the whole record for `id`. Unknown ids are `NotFound`; the id is
    /// kept, everything else comes from the draft.
    pub async fn replace_supplier(
        &self,
        id: &SupplierId,
        draft: SupplierDraft,
    ) -> Result<Supplier, ApplicationError> {
        let supplier = draft.into_supplier(id.clone())?;
        if !self.suppliers.replace(supplier.clone()).await? {
            return Err(DomainError::NotFound { entity: "supplier", id: id.0.clone() }.into());
        }
        info!(event_name = "store.supplier.replaced", supplier_id = %id.0, "supplier replaced");
        Ok(supplier)
    }

    pub async fn replace_buyer(&self, id: &BuyerId, draft: BuyerDraft) -> Result<Buyer, ApplicationError> {
        let buyer = draft.into_buyer(id.clone())?;
        if !self.buyers.replace(buyer.clone()).await? {
            return Err(DomainError::NotFound { entity: "buyer", id: id.0.clone() }.into());
        }
        info!(event_name = "store.buyer.replaced", buyer_id = %id.0, "buyer replaced");
        Ok(buyer)
    }

    pub async fn append_message(&self, message: ChatMessage) -> Result<(), ApplicationError> {
        Ok(self.messages.append(message).await?)
    }

    pub async fn messages(&self) -> Result<Vec<ChatMessage>, ApplicationError> {
        Ok(self.messages.list().await?)
    }

    pub async fn view(&self) -> View {
        self.views.current().await
    }

    pub async fn navigate(&self, view: View) -> View {
        let previous = self.views.navigate(view.clone()).await;
        info!(event_name = "store.view.changed", from = ?previous, to = ?view, "view changed");
        previous
    }

    pub async fn back_to_main(&self) -> View {
        self.navigate(View::Main).await
    }
}
