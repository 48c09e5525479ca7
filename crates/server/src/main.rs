mod api;
mod bootstrap;
mod health;
mod proxy;
mod state;

use std::time::Duration;

use anyhow::Result;
use axum::http::{header::CONTENT_TYPE, HeaderValue, Method};
use axum::Router;
use fruitlink_core::config::{AppConfig, LoadOptions, ServerConfig};
use tower_http::cors::CorsLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::state::AppState;

fn init_logging(config: &AppConfig) {
    use fruitlink_core::config::LogFormat::*;

    let filter = EnvFilter::try_new(&config.logging.level).unwrap_or_else(|_| EnvFilter::new("info"));

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_env_filter(filter).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_env_filter(filter).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_env_filter(filter).json().init();
        }
    }
}

/// All routes behind one CORS policy for the configured frontend origin.
fn app(state: AppState, server: &ServerConfig) -> Result<Router> {
    let cors = CorsLayer::new()
        .allow_origin(HeaderValue::from_str(&server.allowed_origin)?)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .allow_credentials(true);

    Ok(Router::new()
        .merge(health::router(state.store.clone()))
        .merge(proxy::router(state.proxy.clone()))
        .merge(api::router(state))
        .layer(cors))
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let app_state = bootstrap::bootstrap_with_config(config)?;
    let server = &app_state.config.server;
    let router = app(app_state.state.clone(), server)?;

    let address = format!("{}:{}", server.bind_address, server.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!(
        event_name = "system.server.started",
        correlation_id = "bootstrap",
        bind_address = %address,
        allowed_origin = %server.allowed_origin,
        "fruitlink-server listening"
    );

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
    let serving = tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
    });

    tokio::signal::ctrl_c().await?;
    info!(
        event_name = "system.server.stopping",
        correlation_id = "shutdown",
        grace_secs = server.graceful_shutdown_secs,
        "fruitlink-server stopping"
    );
    let _ = shutdown_tx.send(());

    match tokio::time::timeout(Duration::from_secs(server.graceful_shutdown_secs), serving).await {
        Ok(joined) => joined??,
        Err(_) => warn!(
            event_name = "system.server.shutdown_timeout",
            correlation_id = "shutdown",
            "in-flight requests did not drain before the grace period elapsed"
        ),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{header, Method, Request, StatusCode},
    };
    use fruitlink_agent::{CertificationSource, CollaboratorError, LlmClient};
    use fruitlink_core::config::{AppConfig, LlmProvider};
    use fruitlink_db::AppStore;
    use serde_json::Value;
    use tower::ServiceExt;

    use super::app;
    use crate::state::{AppState, ProxyState};

    struct Offline;

    #[async_trait]
    impl LlmClient for Offline {
        async fn complete(&self, _prompt: &str) -> Result<String, CollaboratorError> {
            Err(CollaboratorError::Transport("offline".to_string()))
        }
    }

    #[async_trait]
    impl CertificationSource for Offline {
        async fn search_companies(&self, _name: &str) -> Result<Value, CollaboratorError> {
            Err(CollaboratorError::Transport("offline".to_string()))
        }
    }

    fn state(config: &AppConfig) -> AppState {
        let proxy = ProxyState {
            llm: Arc::new(Offline),
            provider: LlmProvider::Ollama,
            certifications: Arc::new(Offline),
        };
        AppState::new(AppStore::seeded(), proxy, config)
    }

    #[tokio::test]
    async fn preflight_allows_configured_origin() {
        let config = AppConfig::default();
        let router = app(state(&config), &config.server).expect("router");

        let response = router
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/api/view")
                    .header(header::ORIGIN, config.server.allowed_origin.as_str())
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "DELETE")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).map(|value| value.as_bytes()),
            Some(config.server.allowed_origin.as_bytes())
        );
    }

    #[tokio::test]
    async fn preflight_allows_put_for_record_replacement() {
        let config = AppConfig::default();
        let router = app(state(&config), &config.server).expect("router");

        let response = router
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/api/suppliers/1")
                    .header(header::ORIGIN, config.server.allowed_origin.as_str())
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "PUT")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        let allowed = response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_METHODS)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();
        assert!(allowed.contains("PUT"), "allowed methods: {allowed}");
    }

    #[tokio::test]
    async fn health_and_api_share_one_router() {
        let config = AppConfig::default();
        let router = app(state(&config), &config.server).expect("router");

        let health = router
            .clone()
            .oneshot(Request::get("/health").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(health.status(), StatusCode::OK);

        let missing = router
            .oneshot(Request::get("/api/buyers/404").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn invalid_origin_is_rejected() {
        let mut config = AppConfig::default();
        config.server.allowed_origin = "bad\norigin".to_string();
        assert!(app(state(&config), &config.server).is_err());
    }
}
