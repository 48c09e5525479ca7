use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use fruitlink_db::AppStore;
use serde::Serialize;
use tracing::warn;

#[derive(Clone)]
pub struct HealthState {
    store: AppStore,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub store: HealthCheck,
    pub checked_at: String,
}

pub fn router(store: AppStore) -> Router {
    Router::new().route("/health", get(health)).with_state(HealthState { store })
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let store = store_check(&state.store).await;
    let ready = store.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: "fruitlink-server runtime initialized".to_string(),
        },
        store,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

async fn store_check(store: &AppStore) -> HealthCheck {
    match store.suppliers().await {
        Ok(suppliers) => HealthCheck {
            status: "ready",
            detail: format!("directory readable ({} suppliers)", suppliers.len()),
        },
        Err(error) => {
            warn!(event_name = "system.health.degraded", error = %error, "store check failed");
            HealthCheck { status: "degraded", detail: format!("directory read failed: {error}") }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::{extract::State, http::StatusCode, Json};
    use fruitlink_core::domain::supplier::{Supplier, SupplierId};
    use fruitlink_db::repositories::{
        InMemoryBuyerRepository, InMemoryMessageRepository, SupplierRepository,
    };
    use fruitlink_db::{AppStore, RepositoryError};

    use crate::health::{health, HealthState};

    struct UnavailableSuppliers;

    #[async_trait]
    impl SupplierRepository for UnavailableSuppliers {
        async fn list(&self) -> Result<Vec<Supplier>, RepositoryError> {
            Err(RepositoryError::Unavailable("disk detached".to_string()))
        }

        async fn find_by_id(&self, _id: &SupplierId) -> Result<Option<Supplier>, RepositoryError> {
            Err(RepositoryError::Unavailable("disk detached".to_string()))
        }

        async fn insert(&self, _supplier: Supplier) -> Result<(), RepositoryError> {
            Err(RepositoryError::Unavailable("disk detached".to_string()))
        }

        async fn replace(&self, _supplier: Supplier) -> Result<bool, RepositoryError> {
            Err(RepositoryError::Unavailable("disk detached".to_string()))
        }
    }

    #[tokio::test]
    async fn health_returns_ready_when_store_is_readable() {
        let (status, Json(payload)) = health(State(HealthState { store: AppStore::seeded() })).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.status, "ready");
        assert_eq!(payload.store.detail, "directory readable (4 suppliers)");
        assert_eq!(payload.service.status, "ready");
    }

    #[tokio::test]
    async fn health_returns_service_unavailable_when_store_fails() {
        let store = AppStore::new(
            Arc::new(UnavailableSuppliers),
            Arc::new(InMemoryBuyerRepository::default()),
            Arc::new(InMemoryMessageRepository::default()),
        );

        let (status, Json(payload)) = health(State(HealthState { store })).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(payload.status, "degraded");
        assert_eq!(payload.store.status, "degraded");
        assert!(payload.store.detail.contains("disk detached"));
        assert_eq!(payload.service.status, "ready");
    }
}
