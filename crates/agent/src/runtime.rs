use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use fruitlink_core::domain::buyer::Buyer;
use fruitlink_core::domain::chat::{ChatAction, ChatMessage, View};
use fruitlink_core::domain::supplier::Supplier;
use fruitlink_core::errors::{ApplicationError, DomainError};
use fruitlink_db::AppStore;

use crate::conversation::IntentRouter;
use crate::llm::LlmClient;
use crate::navigation::DelayedNavigator;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "record", rename_all = "snake_case")]
pub enum CreatedRecord {
    Supplier(Supplier),
    Buyer(Buyer),
}

impl CreatedRecord {
    pub fn view(&self) -> View {
        match self {
            Self::Supplier(supplier) => View::Supplier(supplier.id.clone()),
            Self::Buyer(buyer) => View::Buyer(buyer.id.clone()),
        }
    }
}

/// One user turn: the stored user message, the bot reply, and what the reply
/// caused.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatExchange {
    pub user: ChatMessage,
    pub reply: ChatMessage,
    pub created: Option<CreatedRecord>,
    pub navigates_to: Option<View>,
}

pub struct ChatRuntime<L> {
    router: IntentRouter<L>,
    store: AppStore,
    navigator: DelayedNavigator,
}

impl<L> ChatRuntime<L>
where
    L: LlmClient,
{
    pub fn new(llm: L, store: AppStore, navigation_delay: Duration) -> Self {
        Self {
            router: IntentRouter::new(llm),
            navigator: DelayedNavigator::new(store.clone(), navigation_delay),
            store,
        }
    }

    pub fn navigator(&self) -> &DelayedNavigator {
        &self.navigator
    }

    pub async fn handle_message(&self, text: &str) -> Result<ChatExchange, ApplicationError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(DomainError::InvariantViolation("message is required".to_string()).into());
        }

        let user = ChatMessage::user(text);
        self.store.append_message(user.clone()).await?;

        let routed = self.router.route(text).await;
        let (content, action, created) = match routed.action {
            Some(action) => match self.create_record(&action).await {
                Ok(record) => (routed.content, Some(action), Some(record)),
                Err(ApplicationError::Domain(error)) => {
                    warn!(
                        event_name = "agent.chat.record_rejected",
                        action = action.action_key(),
                        error = %error,
                        "extracted profile failed validation"
                    );
                    (
                        format!("Sorry, I couldn't create that profile: {error}. Please check the details and try again."),
                        None,
                        None,
                    )
                }
                Err(error) => return Err(error),
            },
            None => (routed.content, None, None),
        };

        let reply = ChatMessage::bot(content, action);
        self.store.append_message(reply.clone()).await?;

        let navigates_to = created.as_ref().map(CreatedRecord::view);
        if let Some(view) = &navigates_to {
            self.navigator.schedule(view.clone());
        }

        info!(
            event_name = "agent.chat.handled",
            intent = ?routed.intent,
            created = created.is_some(),
            "chat message handled"
        );
        Ok(ChatExchange { user, reply, created, navigates_to })
    }

    async fn create_record(&self, action: &ChatAction) -> Result<CreatedRecord, ApplicationError> {
        match action {
            ChatAction::AddSupplier(draft) => {
                Ok(CreatedRecord::Supplier(self.store.create_supplier(draft.clone()).await?))
            }
            ChatAction::AddBuyer(draft) => {
                Ok(CreatedRecord::Buyer(self.store.create_buyer(draft.clone()).await?))
            }
            ChatAction::ViewSupplier(_) | ChatAction::ViewBuyer(_) => Err(DomainError::InvariantViolation(
                format!("`{}` does not create a record", action.action_key()),
            )
            .into()),
        }
    }
}
