use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub collaborator: CollaboratorConfig,
    pub llm: LlmConfig,
    pub certifications: CertificationsConfig,
    pub forecast: ForecastConfig,
    pub matching: MatchingConfig,
    pub chat: ChatConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    /// Frontend origin allowed by CORS.
    pub allowed_origin: String,
    pub graceful_shutdown_secs: u64,
}

/// Where the agent reaches the proxy endpoints (`/api/vertexChat`, `/api/givvableCerts`).
#[derive(Clone, Debug)]
pub struct CollaboratorConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    pub api_key: Option<SecretString>,
    pub base_url: Option<String>,
    pub model: String,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct CertificationsConfig {
    pub base_url: String,
    pub api_key: Option<SecretString>,
}

#[derive(Clone, Debug)]
pub struct ForecastConfig {
    pub cache_ttl_secs: u64,
    pub insight_cache_ttl_secs: u64,
}

#[derive(Clone, Debug)]
pub struct MatchingConfig {
    pub normalize_fruit_names: bool,
}

#[derive(Clone, Debug)]
pub struct ChatConfig {
    pub navigation_delay_ms: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmProvider {
    #[serde(rename = "openai")]
    OpenAi,
    Ollama,
}

impl LlmProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Ollama => "ollama",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub port: Option<u16>,
    pub allowed_origin: Option<String>,
    pub collaborator_base_url: Option<String>,
    pub log_level: Option<String>,
    pub llm_provider: Option<LlmProvider>,
    pub llm_model: Option<String>,
    pub llm_api_key: Option<String>,
    pub certifications_api_key: Option<String>,
    pub normalize_fruit_names: Option<bool>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 3001,
                allowed_origin: "http://localhost:5173".to_string(),
                graceful_shutdown_secs: 15,
            },
            collaborator: CollaboratorConfig {
                base_url: "http://localhost:3001".to_string(),
                timeout_secs: 30,
            },
            llm: LlmConfig {
                provider: LlmProvider::Ollama,
                api_key: None,
                base_url: Some("http://localhost:11434".to_string()),
                model: "llama3.1".to_string(),
                timeout_secs: 30,
            },
            certifications: CertificationsConfig {
                base_url: "https://api.givvable.com/v1".to_string(),
                api_key: None,
            },
            forecast: ForecastConfig { cache_ttl_secs: 600, insight_cache_ttl_secs: 120 },
            matching: MatchingConfig { normalize_fruit_names: false },
            chat: ChatConfig { navigation_delay_ms: 1000 },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LlmProvider {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "ollama" => Ok(Self::Ollama),
            other => Err(ConfigError::Validation(format!(
                "unsupported llm provider `{other}` (expected openai|ollama)"
            ))),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("fruitlink.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(allowed_origin) = server.allowed_origin {
                self.server.allowed_origin = allowed_origin;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(collaborator) = patch.collaborator {
            if let Some(base_url) = collaborator.base_url {
                self.collaborator.base_url = base_url;
            }
            if let Some(timeout_secs) = collaborator.timeout_secs {
                self.collaborator.timeout_secs = timeout_secs;
            }
        }

        if let Some(llm) = patch.llm {
            if let Some(provider) = llm.provider {
                self.llm.provider = provider;
            }
            if let Some(llm_api_key_value) = llm.api_key {
                self.llm.api_key = Some(secret_value(llm_api_key_value));
            }
            if let Some(base_url) = llm.base_url {
                self.llm.base_url = Some(base_url);
            }
            if let Some(model) = llm.model {
                self.llm.model = model;
            }
            if let Some(timeout_secs) = llm.timeout_secs {
                self.llm.timeout_secs = timeout_secs;
            }
        }

        if let Some(certifications) = patch.certifications {
            if let Some(base_url) = certifications.base_url {
                self.certifications.base_url = base_url;
            }
            if let Some(cert_api_key_value) = certifications.api_key {
                self.certifications.api_key = Some(secret_value(cert_api_key_value));
            }
        }

        if let Some(forecast) = patch.forecast {
            if let Some(cache_ttl_secs) = forecast.cache_ttl_secs {
                self.forecast.cache_ttl_secs = cache_ttl_secs;
            }
            if let Some(insight_cache_ttl_secs) = forecast.insight_cache_ttl_secs {
                self.forecast.insight_cache_ttl_secs = insight_cache_ttl_secs;
            }
        }

        if let Some(matching) = patch.matching {
            if let Some(normalize_fruit_names) = matching.normalize_fruit_names {
                self.matching.normalize_fruit_names = normalize_fruit_names;
            }
        }

        if let Some(chat) = patch.chat {
            if let Some(navigation_delay_ms) = chat.navigation_delay_ms {
                self.chat.navigation_delay_ms = navigation_delay_ms;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("FRUITLINK_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        // PORT is honoured for platforms that inject it.
        let port = read_env("FRUITLINK_SERVER_PORT").map(|value| ("FRUITLINK_SERVER_PORT", value));
        if let Some((key, value)) = port.or_else(|| read_env("PORT").map(|value| ("PORT", value))) {
            self.server.port = parse_u16(key, &value)?;
        }
        if let Some(value) = read_env("FRUITLINK_SERVER_ALLOWED_ORIGIN") {
            self.server.allowed_origin = value;
        }
        if let Some(value) = read_env("FRUITLINK_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("FRUITLINK_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        if let Some(value) = read_env("FRUITLINK_COLLABORATOR_BASE_URL") {
            self.collaborator.base_url = value;
        }
        if let Some(value) = read_env("FRUITLINK_COLLABORATOR_TIMEOUT_SECS") {
            self.collaborator.timeout_secs = parse_u64("FRUITLINK_COLLABORATOR_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("FRUITLINK_LLM_PROVIDER") {
            self.llm.provider = value.parse()?;
        }
        if let Some(value) = read_env("FRUITLINK_LLM_API_KEY") {
            self.llm.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("FRUITLINK_LLM_BASE_URL") {
            self.llm.base_url = Some(value);
        }
        if let Some(value) = read_env("FRUITLINK_LLM_MODEL") {
            self.llm.model = value;
        }
        if let Some(value) = read_env("FRUITLINK_LLM_TIMEOUT_SECS") {
            self.llm.timeout_secs = parse_u64("FRUITLINK_LLM_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("FRUITLINK_CERTIFICATIONS_BASE_URL") {
            self.certifications.base_url = value;
        }
        if let Some(value) = read_env("FRUITLINK_CERTIFICATIONS_API_KEY") {
            self.certifications.api_key = Some(secret_value(value));
        }

        if let Some(value) = read_env("FRUITLINK_FORECAST_CACHE_TTL_SECS") {
            self.forecast.cache_ttl_secs = parse_u64("FRUITLINK_FORECAST_CACHE_TTL_SECS", &value)?;
        }
        if let Some(value) = read_env("FRUITLINK_FORECAST_INSIGHT_CACHE_TTL_SECS") {
            self.forecast.insight_cache_ttl_secs =
                parse_u64("FRUITLINK_FORECAST_INSIGHT_CACHE_TTL_SECS", &value)?;
        }

        if let Some(value) = read_env("FRUITLINK_MATCHING_NORMALIZE_FRUIT_NAMES") {
            self.matching.normalize_fruit_names =
                parse_bool("FRUITLINK_MATCHING_NORMALIZE_FRUIT_NAMES", &value)?;
        }

        if let Some(value) = read_env("FRUITLINK_CHAT_NAVIGATION_DELAY_MS") {
            self.chat.navigation_delay_ms = parse_u64("FRUITLINK_CHAT_NAVIGATION_DELAY_MS", &value)?;
        }

        let log_level =
            read_env("FRUITLINK_LOGGING_LEVEL").or_else(|| read_env("FRUITLINK_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("FRUITLINK_LOGGING_FORMAT").or_else(|| read_env("FRUITLINK_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(allowed_origin) = overrides.allowed_origin {
            self.server.allowed_origin = allowed_origin;
        }
        if let Some(base_url) = overrides.collaborator_base_url {
            self.collaborator.base_url = base_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(llm_provider) = overrides.llm_provider {
            self.llm.provider = llm_provider;
        }
        if let Some(llm_model) = overrides.llm_model {
            self.llm.model = llm_model;
        }
        if let Some(llm_api_key) = overrides.llm_api_key {
            self.llm.api_key = Some(secret_value(llm_api_key));
        }
        if let Some(cert_api_key) = overrides.certifications_api_key {
            self.certifications.api_key = Some(secret_value(cert_api_key));
        }
        if let Some(normalize) = overrides.normalize_fruit_names {
            self.matching.normalize_fruit_names = normalize;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_server(&self.server)?;
        validate_collaborator(&self.collaborator)?;
        validate_llm(&self.llm)?;
        validate_certifications(&self.certifications)?;
        validate_forecast(&self.forecast)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("fruitlink.toml"), PathBuf::from("config/fruitlink.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn is_http_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

fn validate_timeout(field: &str, timeout_secs: u64) -> Result<(), ConfigError> {
    if timeout_secs == 0 || timeout_secs > 300 {
        return Err(ConfigError::Validation(format!("{field} must be in range 1..=300")));
    }
    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    if !is_http_url(server.allowed_origin.trim()) {
        return Err(ConfigError::Validation(
            "server.allowed_origin must start with http:// or https://".to_string(),
        ));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_collaborator(collaborator: &CollaboratorConfig) -> Result<(), ConfigError> {
    if !is_http_url(collaborator.base_url.trim()) {
        return Err(ConfigError::Validation(
            "collaborator.base_url must start with http:// or https://".to_string(),
        ));
    }
    validate_timeout("collaborator.timeout_secs", collaborator.timeout_secs)
}

fn validate_llm(llm: &LlmConfig) -> Result<(), ConfigError> {
    validate_timeout("llm.timeout_secs", llm.timeout_secs)?;

    if llm.model.trim().is_empty() {
        return Err(ConfigError::Validation("llm.model must not be empty".to_string()));
    }

    match llm.provider {
        LlmProvider::OpenAi => {
            let missing = llm
                .api_key
                .as_ref()
                .map(|value| value.expose_secret().trim().is_empty())
                .unwrap_or(true);
            if missing {
                return Err(ConfigError::Validation(
                    "llm.api_key is required for the openai provider".to_string(),
                ));
            }
        }
        LlmProvider::Ollama => {
            let missing =
                llm.base_url.as_ref().map(|value| value.trim().is_empty()).unwrap_or(true);
            if missing {
                return Err(ConfigError::Validation(
                    "llm.base_url is required for the ollama provider".to_string(),
                ));
            }
        }
    }

    Ok(())
}

fn validate_certifications(certifications: &CertificationsConfig) -> Result<(), ConfigError> {
    if !is_http_url(certifications.base_url.trim()) {
        return Err(ConfigError::Validation(
            "certifications.base_url must start with http:// or https://".to_string(),
        ));
    }
    Ok(())
}

fn validate_forecast(forecast: &ForecastConfig) -> Result<(), ConfigError> {
    if forecast.cache_ttl_secs == 0 {
        return Err(ConfigError::Validation(
            "forecast.cache_ttl_secs must be greater than zero".to_string(),
        ));
    }
    if forecast.insight_cache_ttl_secs == 0 {
        return Err(ConfigError::Validation(
            "forecast.insight_cache_ttl_secs must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    value.parse::<bool>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    server: Option<ServerPatch>,
    collaborator: Option<CollaboratorPatch>,
    llm: Option<LlmPatch>,
    certifications: Option<CertificationsPatch>,
    forecast: Option<ForecastPatch>,
    matching: Option<MatchingPatch>,
    chat: Option<ChatPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    allowed_origin: Option<String>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct CollaboratorPatch {
    base_url: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LlmPatch {
    provider: Option<LlmProvider>,
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct CertificationsPatch {
    base_url: Option<String>,
    api_key: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ForecastPatch {
    cache_ttl_secs: Option<u64>,
    insight_cache_ttl_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct MatchingPatch {
    normalize_fruit_names: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct ChatPatch {
    navigation_delay_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
