//! Upstream services sitting behind the proxy endpoints: the generative model
//! (Ollama or an OpenAI-compatible API) and the certification registry.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use fruitlink_core::config::{CertificationsConfig, LlmConfig, LlmProvider};

use crate::llm::{CertificationSource, CollaboratorError, LlmClient};

const OPENAI_DEFAULT_BASE_URL: &str = "https://api.openai.com";
const CERTIFICATION_TIMEOUT_SECS: u64 = 30;

fn build_client(timeout: Duration) -> Result<Client, CollaboratorError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|error| CollaboratorError::Transport(error.to_string()))
}

fn join(base_url: &str, path: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), path)
}

async fn read_success(response: reqwest::Response) -> Result<String, CollaboratorError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|error| CollaboratorError::Transport(error.to_string()))?;
    if !status.is_success() {
        return Err(CollaboratorError::Status { status: status.as_u16(), body });
    }
    Ok(body)
}

/// Builds the configured generation backend.
pub fn llm_from_config(config: &LlmConfig) -> Result<Arc<dyn LlmClient>, CollaboratorError> {
    let timeout = Duration::from_secs(config.timeout_secs);
    let client: Arc<dyn LlmClient> = match config.provider {
        LlmProvider::Ollama => Arc::new(OllamaClient::new(
            config.base_url.clone().unwrap_or_else(|| "http://localhost:11434".to_string()),
            config.model.clone(),
            timeout,
        )?),
        LlmProvider::OpenAi => {
            let api_key = config.api_key.clone().ok_or_else(|| {
                CollaboratorError::Upstream("openai provider requires an api key".to_string())
            })?;
            Arc::new(OpenAiClient::new(
                config.base_url.clone().unwrap_or_else(|| OPENAI_DEFAULT_BASE_URL.to_string()),
                api_key,
                config.model.clone(),
                timeout,
            )?)
        }
    };
    Ok(client)
}

#[derive(Clone, Debug)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
    model: String,
}

#[derive(Deserialize)]
struct OllamaResponse {
    #[serde(default)]
    response: String,
}

impl OllamaClient {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, CollaboratorError> {
        Ok(Self { client: build_client(timeout)?, base_url: base_url.into(), model: model.into() })
    }
}

#[async_trait]
impl LlmClient for OllamaClient {
    async fn complete(&self, prompt: &str) -> Result<String, CollaboratorError> {
        let endpoint = join(&self.base_url, "/api/generate");
        debug!(
            event_name = "agent.provider.request",
            provider = "ollama",
            model = %self.model,
            prompt_len = prompt.len(),
            "sending generation request"
        );
        let response = self
            .client
            .post(&endpoint)
            .json(&json!({ "model": self.model, "prompt": prompt, "stream": false }))
            .send()
            .await
            .map_err(|error| CollaboratorError::Transport(error.to_string()))?;

        let body = read_success(response).await?;
        let parsed: OllamaResponse = serde_json::from_str(&body)
            .map_err(|error| CollaboratorError::Decode(error.to_string()))?;
        Ok(parsed.response)
    }
}

#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    base_url: String,
    api_key: SecretString,
    model: String,
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .finish()
    }
}

#[derive(Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Deserialize)]
struct OpenAiMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: SecretString,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, CollaboratorError> {
        Ok(Self {
            client: build_client(timeout)?,
            base_url: base_url.into(),
            api_key,
            model: model.into(),
        })
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn complete(&self, prompt: &str) -> Result<String, CollaboratorError> {
        let endpoint = join(&self.base_url, "/v1/chat/completions");
        debug!(
            event_name = "agent.provider.request",
            provider = "openai",
            model = %self.model,
            prompt_len = prompt.len(),
            "sending generation request"
        );
        let response = self
            .client
            .post(&endpoint)
            .bearer_auth(self.api_key.expose_secret())
            .json(&json!({
                "model": self.model,
                "messages": [{ "role": "user", "content": prompt }],
                "stream": false,
            }))
            .send()
            .await
            .map_err(|error| CollaboratorError::Transport(error.to_string()))?;

        let body = read_success(response).await?;
        let parsed: OpenAiResponse = serde_json::from_str(&body)
            .map_err(|error| CollaboratorError::Decode(error.to_string()))?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.unwrap_or_default())
            .ok_or_else(|| CollaboratorError::Decode("no choices returned".to_string()))
    }
}

/// Certification registry client. A body that is not JSON comes back as
/// `CollaboratorError::Decode` carrying the raw text.
#[derive(Clone)]
pub struct GivvableClient {
    client: Client,
    base_url: String,
    api_key: Option<SecretString>,
}

impl std::fmt::Debug for GivvableClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GivvableClient")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl GivvableClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<SecretString>,
        timeout: Duration,
    ) -> Result<Self, CollaboratorError> {
        Ok(Self { client: build_client(timeout)?, base_url: base_url.into(), api_key })
    }

    pub fn from_config(config: &CertificationsConfig) -> Result<Self, CollaboratorError> {
        Self::new(
            config.base_url.clone(),
            config.api_key.clone(),
            Duration::from_secs(CERTIFICATION_TIMEOUT_SECS),
        )
    }
}

#[async_trait]
impl CertificationSource for GivvableClient {
    async fn search_companies(&self, name: &str) -> Result<Value, CollaboratorError> {
        let mut request = self
            .client
            .get(join(&self.base_url, "/companies/search"))
            .query(&[("name", name)]);
        if let Some(api_key) = &self.api_key {
            request = request.header("x-api-key", api_key.expose_secret());
        }

        let response = request
            .send()
            .await
            .map_err(|error| CollaboratorError::Transport(error.to_string()))?;
        let body = read_success(response).await?;
        serde_json::from_str(&body).map_err(|_| {
            warn!(
                event_name = "agent.provider.certifications_not_json",
                body_len = body.len(),
                "certification registry returned a non-JSON body"
            );
            CollaboratorError::Decode(body)
        })
    }
}
