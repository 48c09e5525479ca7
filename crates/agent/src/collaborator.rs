//! HTTP client for the backend proxy: `/api/vertexChat` for generation and
//! `/api/givvableCerts` for certification lookups.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use fruitlink_core::config::CollaboratorConfig;

use crate::llm::{CertificationSource, CollaboratorError, LlmClient};

pub const CHAT_PATH: &str = "/api/vertexChat";
pub const CERTIFICATIONS_PATH: &str = "/api/givvableCerts";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

/// Proxy reply. Success carries `content`; failure carries `error` and
/// optionally `details`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificationRequest {
    pub name: String,
}

#[derive(Clone, Debug)]
pub struct HttpCollaborator {
    client: Client,
    base_url: String,
}

impl HttpCollaborator {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, CollaboratorError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| CollaboratorError::Transport(error.to_string()))?;
        Ok(Self { client, base_url: base_url.into() })
    }

    pub fn from_config(config: &CollaboratorConfig) -> Result<Self, CollaboratorError> {
        Self::new(config.base_url.clone(), Duration::from_secs(config.timeout_secs))
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl LlmClient for HttpCollaborator {
    async fn complete(&self, prompt: &str) -> Result<String, CollaboratorError> {
        let response = self
            .client
            .post(self.endpoint(CHAT_PATH))
            .json(&ChatRequest { message: prompt.to_string() })
            .send()
            .await
            .map_err(|error| CollaboratorError::Transport(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .map_err(|error| CollaboratorError::Transport(error.to_string()))?;
            warn!(
                event_name = "agent.collaborator.chat_failed",
                status = %status,
                "collaborator chat request failed"
            );
            return Err(CollaboratorError::Status { status: status.as_u16(), body });
        }

        let reply: ChatReply = response
            .json()
            .await
            .map_err(|error| CollaboratorError::Decode(error.to_string()))?;
        match (reply.content, reply.error) {
            (Some(content), _) => Ok(content),
            (None, Some(error)) => Err(CollaboratorError::Upstream(error)),
            (None, None) => Err(CollaboratorError::Decode("reply has no content".to_string())),
        }
    }
}

#[async_trait]
impl CertificationSource for HttpCollaborator {
    async fn search_companies(&self, name: &str) -> Result<Value, CollaboratorError> {
        let response = self
            .client
            .post(self.endpoint(CERTIFICATIONS_PATH))
            .json(&CertificationRequest { name: name.to_string() })
            .send()
            .await
            .map_err(|error| CollaboratorError::Transport(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .map_err(|error| CollaboratorError::Transport(error.to_string()))?;
            return Err(CollaboratorError::Status { status: status.as_u16(), body });
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|error| CollaboratorError::Decode(error.to_string()))?;
        // The proxy answers 200 with an `error` envelope when the registry is down.
        if let Some(error) = payload.get("error").and_then(Value::as_str) {
            return Err(CollaboratorError::Upstream(error.to_string()));
        }
        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;
    use std::time::Duration;

    use serde_json::json;

    use super::{ChatReply, HttpCollaborator, CHAT_PATH};
    use crate::llm::{CollaboratorError, LlmClient};
    use crate::CertificationSource;

    /// Answers one request with an error status whose body is cut short.
    fn truncated_error_server() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let address = listener.local_addr().expect("addr");
        thread::spawn(move || {
            let Ok((mut stream, _)) = listener.accept() else { return };
            let _ = stream.set_read_timeout(Some(Duration::from_millis(200)));
            let mut buffer = [0_u8; 4096];
            while matches!(stream.read(&mut buffer), Ok(read) if read > 0) {}
            let _ = stream.write_all(
                b"HTTP/1.1 502 Bad Gateway\r\ncontent-length: 64\r\nconnection: close\r\n\r\npartial",
            );
        });
        format!("http://{address}")
    }

    #[test]
    fn endpoint_joins_without_double_slash() {
        let collaborator =
            HttpCollaborator::new("http://localhost:3001/", Duration::from_secs(1)).expect("client");
        assert_eq!(collaborator.endpoint(CHAT_PATH), "http://localhost:3001/api/vertexChat");
    }

    #[test]
    fn reply_envelope_accepts_success_and_error_shapes() {
        let ok: ChatReply = serde_json::from_value(json!({"content": "hi", "raw": {}})).expect("ok");
        assert_eq!(ok.content.as_deref(), Some("hi"));

        let failed: ChatReply =
            serde_json::from_value(json!({"error": "Vertex AI error", "details": "quota"}))
                .expect("error");
        assert_eq!(failed.error.as_deref(), Some("Vertex AI error"));
        assert!(failed.content.is_none());
    }

    #[tokio::test]
    async fn unreachable_proxy_is_a_transport_error() {
        let collaborator =
            HttpCollaborator::new("http://127.0.0.1:9", Duration::from_millis(500)).expect("client");
        let error = collaborator.complete("hello").await.expect_err("nothing listens on port 9");
        assert!(matches!(error, CollaboratorError::Transport(_)));
    }

    #[tokio::test]
    async fn unreadable_error_body_is_a_transport_error() {
        let collaborator =
            HttpCollaborator::new(truncated_error_server(), Duration::from_secs(2)).expect("client");
        let error = collaborator.complete("hello").await.expect_err("body is truncated");
        assert!(matches!(error, CollaboratorError::Transport(_)), "got {error:?}");

        let collaborator =
            HttpCollaborator::new(truncated_error_server(), Duration::from_secs(2)).expect("client");
        let error = collaborator.search_companies("Truong Ton").await.expect_err("body is truncated");
        assert!(matches!(error, CollaboratorError::Transport(_)), "got {error:?}");
    }
}
