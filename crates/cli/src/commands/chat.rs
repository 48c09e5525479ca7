use std::time::Duration;

use fruitlink_agent::{HttpCollaborator, IntentRouter};
use fruitlink_core::config::{AppConfig, LoadOptions};

use crate::commands::CommandResult;

/// Routes one message through the collaborator endpoint of a running server.
/// Records are not created; the reply reports the action that would apply.
pub fn run(message: &str, server: Option<&str>) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "chat",
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
        Err(error) => return CommandResult::failure("chat", "collaborator_init", error.to_string(), 3),
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "chat",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    let reply = runtime.block_on(IntentRouter::new(collaborator).route(message));
    CommandResult::with_data("chat", reply.content.clone(), reply)
}
