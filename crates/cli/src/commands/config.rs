use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use fruitlink_core::config::{AppConfig, LoadOptions};
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for (key, value) in effective_values(&config) {
        let source = field_source(&key, config_file_doc.as_ref(), config_file_path.as_deref());
        lines.push(render_line(&key, &value, source));
    }

    lines.join("\n")
}

/// Every reported key paired with its display value. Secrets are never
/// exposed, only whether they are set.
fn effective_values(config: &AppConfig) -> Vec<(String, String)> {
    let secret = |set: bool| if set { "<redacted>" } else { "<unset>" }.to_string();

    vec![
        ("server.bind_address".into(), config.server.bind_address.clone()),
        ("server.port".into(), config.server.port.to_string()),
        ("server.allowed_origin".into(), config.server.allowed_origin.clone()),
        ("server.graceful_shutdown_secs".into(), config.server.graceful_shutdown_secs.to_string()),
        ("collaborator.base_url".into(), config.collaborator.base_url.clone()),
        ("collaborator.timeout_secs".into(), config.collaborator.timeout_secs.to_string()),
        ("llm.provider".into(), config.llm.provider.as_str().to_string()),
        ("llm.model".into(), config.llm.model.clone()),
        ("llm.base_url".into(), config.llm.base_url.clone().unwrap_or_else(|| "<unset>".into())),
        ("llm.api_key".into(), secret(config.llm.api_key.is_some())),
        ("certifications.base_url".into(), config.certifications.base_url.clone()),
        ("certifications.api_key".into(), secret(config.certifications.api_key.is_some())),
        ("forecast.cache_ttl_secs".into(), config.forecast.cache_ttl_secs.to_string()),
        (
            "forecast.insight_cache_ttl_secs".into(),
            config.forecast.insight_cache_ttl_secs.to_string(),
        ),
        (
            "matching.normalize_fruit_names".into(),
            config.matching.normalize_fruit_names.to_string(),
        ),
        ("chat.navigation_delay_ms".into(), config.chat.navigation_delay_ms.to_string()),
        ("logging.level".into(), config.logging.level.clone()),
        ("logging.format".into(), format!("{:?}", config.logging.format)),
    ]
}

fn env_key(key_path: &str) -> String {
    format!("FRUITLINK_{}", key_path.replace('.', "_").to_uppercase())
}

fn detect_config_path() -> Option<PathBuf> {
    ["fruitlink.toml", "config/fruitlink.toml"]
        .into_iter()
        .map(PathBuf::from)
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let raw = fs::read_to_string(path?).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(key_path: &str, config_file_doc: Option<&Value>, config_file_path: Option<&Path>) -> String {
    let env_key = env_key(key_path);
    if env::var_os(&env_key).is_some() {
        return format!("env ({env_key})");
    }

    if config_file_doc.is_some_and(|doc| contains_path(doc, key_path)) {
        let file_path = config_file_path
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| "config file".to_string());
        return format!("file ({file_path})");
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}
