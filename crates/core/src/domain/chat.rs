use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::buyer::{BuyerDraft, BuyerId};
use crate::domain::supplier::{SupplierDraft, SupplierId};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

impl MessageId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    User,
    Bot,
}

/// Follow-up attached to a bot reply. Each kind carries its own payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "data", rename_all = "snake_case")]
pub enum ChatAction {
    AddSupplier(SupplierDraft),
    AddBuyer(BuyerDraft),
    ViewSupplier(SupplierId),
    ViewBuyer(BuyerId),
}

impl ChatAction {
    pub fn action_key(&self) -> &'static str {
        match self {
            Self::AddSupplier(_) => "add_supplier",
            Self::AddBuyer(_) => "add_buyer",
            Self::ViewSupplier(_) => "view_supplier",
            Self::ViewBuyer(_) => "view_buyer",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: MessageId,
    pub sender: Sender,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub action: Option<ChatAction>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Sender::User, content.into(), None)
    }

    pub fn bot(content: impl Into<String>, action: Option<ChatAction>) -> Self {
        Self::new(Sender::Bot, content.into(), action)
    }

    fn new(sender: Sender, content: String, action: Option<ChatAction>) -> Self {
        Self { id: MessageId::generate(), sender, content, timestamp: Utc::now(), action }
    }
}

/// Which screen the session is looking at.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "view", content = "id", rename_all = "snake_case")]
pub enum View {
    #[default]
    Main,
    Supplier(SupplierId),
    Buyer(BuyerId),
}
