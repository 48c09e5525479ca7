use std::time::Duration;

use fruitlink_agent::{CertificationSource, CertificationSummary, HttpCollaborator};
use fruitlink_core::config::{AppConfig, LoadOptions};

use crate::commands::CommandResult;

/// Looks up certification records for a company through a running server's
/// certification proxy and reports the summarized categories.
pub fn run(name: &str, server: Option<&str>) -> CommandResult {
    let name = name.trim();
    if name.is_empty() {
        return CommandResult::failure(
            "certifications",
            "invalid_input",
            "company name must not be blank",
            2,
        );
    }

    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "certifications",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };
    let base_url = server.unwrap_or(&config.collaborator.base_url);

    let collaborator = match HttpCollaborator::new(
        base_url,
        Duration::from_secs(config.collaborator.timeout_secs),
    ) {
        Ok(collaborator) => collaborator,
        Err(error) => {
            return CommandResult::failure("certifications", "collaborator_init", error.to_string(), 3);
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "certifications",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    match runtime.block_on(collaborator.search_companies(name)) {
        Ok(payload) => {
            let summary = CertificationSummary::from_search(&payload);
            CommandResult::with_data(
                "certifications",
                format!("{} credential(s) found for {name}", summary.credential_count),
                summary,
            )
        }
        Err(error) => CommandResult::failure(
            "certifications",
            "collaborator_unavailable",
            format!("certification lookup failed: {error}"),
            5,
        ),
    }
}
