use std::sync::Arc;

use fruitlink_agent::providers::{llm_from_config, GivvableClient};
use fruitlink_agent::CollaboratorError;
use fruitlink_core::config::{AppConfig, ConfigError, LoadOptions};
use fruitlink_db::AppStore;
use thiserror::Error;
use tracing::info;

use crate::state::{AppState, ProxyState};

pub struct Application {
    pub config: AppConfig,
    pub state: AppState,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("upstream client setup failed: {0}")]
    Upstream(#[from] CollaboratorError),
}

pub fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config)
}

pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        llm_provider = config.llm.provider.as_str(),
        "starting application bootstrap"
    );

    let proxy = ProxyState {
        llm: llm_from_config(&config.llm)?,
        provider: config.llm.provider,
        certifications: Arc::new(GivvableClient::from_config(&config.certifications)?),
    };
    let store = AppStore::seeded();
    info!(
        event_name = "system.bootstrap.store_seeded",
        correlation_id = "bootstrap",
        "in-memory directory seeded"
    );

    let state = AppState::new(store, proxy, &config);
    Ok(Application { config, state })
}
