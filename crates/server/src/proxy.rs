//! Collaborator endpoints the chat and insight features talk to.
//!
//! - `POST /api/vertexChat`  : `{message}` → `{content}` or `{error, details}`
//! - `POST /api/givvableCerts`: `{name}` → registry JSON or `{error}`; always 200

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use fruitlink_agent::collaborator::{ChatReply, CERTIFICATIONS_PATH, CHAT_PATH};
use fruitlink_agent::conversation::EMPTY_COMPLETION;
use fruitlink_agent::CollaboratorError;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, info, warn};

use crate::state::ProxyState;

pub const CERTIFICATIONS_UNAVAILABLE: &str =
    "GivvableCert API is not available for /api/givvableCerts";
pub const CERTIFICATIONS_NOT_JSON: &str = "Givvable did not return JSON";

#[derive(Debug, Default, Deserialize)]
pub struct ProxyChatRequest {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProxyCertificationRequest {
    #[serde(default)]
    pub name: Option<String>,
}

pub fn router(state: ProxyState) -> Router {
    Router::new()
        .route(CHAT_PATH, post(vertex_chat))
        .route(CERTIFICATIONS_PATH, post(givvable_certs))
        .with_state(state)
}

pub async fn vertex_chat(
    State(state): State<ProxyState>,
    Json(request): Json<ProxyChatRequest>,
) -> (StatusCode, Json<ChatReply>) {
    let Some(message) = request.message.filter(|message| !message.is_empty()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ChatReply { error: Some("Message is required".to_string()), ..ChatReply::default() }),
        );
    };

    match state.llm.complete(&message).await {
        Ok(content) => {
            info!(
                event_name = "proxy.chat.completed",
                provider = state.provider_label(),
                prompt_len = message.len(),
                reply_len = content.len(),
                "completion proxied"
            );
            let content =
                if content.trim().is_empty() { EMPTY_COMPLETION.to_string() } else { content };
            (StatusCode::OK, Json(ChatReply { content: Some(content), ..ChatReply::default() }))
        }
        Err(upstream) => {
            error!(
                event_name = "proxy.chat.failed",
                provider = state.provider_label(),
                error = %upstream,
                "upstream completion failed"
            );
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ChatReply {
                    content: None,
                    error: Some(format!("{} error", state.provider_label())),
                    details: Some(upstream.to_string()),
                }),
            )
        }
    }
}

pub async fn givvable_certs(
    State(state): State<ProxyState>,
    Json(request): Json<ProxyCertificationRequest>,
) -> Json<Value> {
    let name = request.name.unwrap_or_default();
    match state.certifications.search_companies(&name).await {
        Ok(payload) => Json(payload),
        Err(CollaboratorError::Decode(raw)) => {
            Json(json!({ "error": CERTIFICATIONS_NOT_JSON, "raw": raw }))
        }
        Err(upstream) => {
            warn!(
                event_name = "proxy.certifications.unavailable",
                error = %upstream,
                "certification registry unavailable"
            );
            Json(json!({ "error": CERTIFICATIONS_UNAVAILABLE }))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::{
        body::{to_bytes, Body},
        extract::State,
        http::{Request, StatusCode},
        Json,
    };
    use fruitlink_agent::{CertificationSource, CollaboratorError, LlmClient};
    use fruitlink_core::config::LlmProvider;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::{
        givvable_certs, router, vertex_chat, ProxyCertificationRequest, ProxyChatRequest,
        CERTIFICATIONS_NOT_JSON, CERTIFICATIONS_UNAVAILABLE,
    };
    use crate::state::ProxyState;

    struct EchoLlm;

    #[async_trait]
    impl LlmClient for EchoLlm {
        async fn complete(&self, prompt: &str) -> Result<String, CollaboratorError> {
            if prompt == "fail" {
                return Err(CollaboratorError::Status { status: 503, body: "overloaded".to_string() });
            }
            if prompt == "silent" {
                return Ok(String::new());
            }
            Ok(format!("echo: {prompt}"))
        }
    }

    struct Registry(Result<Value, CollaboratorError>);

    #[async_trait]
    impl CertificationSource for Registry {
        async fn search_companies(&self, _name: &str) -> Result<Value, CollaboratorError> {
            self.0.clone()
        }
    }

    fn state(registry: Result<Value, CollaboratorError>) -> ProxyState {
        ProxyState {
            llm: Arc::new(EchoLlm),
            provider: LlmProvider::Ollama,
            certifications: Arc::new(Registry(registry)),
        }
    }

    fn chat(message: Option<&str>) -> Json<ProxyChatRequest> {
        Json(ProxyChatRequest { message: message.map(str::to_string) })
    }

    #[tokio::test]
    async fn missing_message_is_bad_request() {
        let (status, Json(reply)) = vertex_chat(State(state(Ok(json!({})))), chat(None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(reply.error.as_deref(), Some("Message is required"));

        let (status, _) = vertex_chat(State(state(Ok(json!({})))), chat(Some(""))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn upstream_failure_is_internal_error_with_details() {
        let (status, Json(reply)) = vertex_chat(State(state(Ok(json!({})))), chat(Some("fail"))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(reply.error.as_deref(), Some("Ollama error"));
        assert!(reply.details.as_deref().is_some_and(|details| details.contains("503")));
        assert!(reply.content.is_none());
    }

    #[tokio::test]
    async fn empty_completion_gets_placeholder() {
        let (status, Json(reply)) = vertex_chat(State(state(Ok(json!({})))), chat(Some("silent"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(reply.content.as_deref(), Some("Sorry, no response."));
    }

    #[tokio::test]
    async fn certification_errors_keep_ok_envelope() {
        let request = || Json(ProxyCertificationRequest { name: Some("Acme".to_string()) });

        let Json(body) = givvable_certs(
            State(state(Err(CollaboratorError::Status { status: 502, body: String::new() }))),
            request(),
        )
        .await;
        assert_eq!(body, json!({ "error": CERTIFICATIONS_UNAVAILABLE }));

        let Json(body) = givvable_certs(
            State(state(Err(CollaboratorError::Decode("<html>down</html>".to_string())))),
            request(),
        )
        .await;
        assert_eq!(body, json!({ "error": CERTIFICATIONS_NOT_JSON, "raw": "<html>down</html>" }));

        let payload = json!({ "companies": [{ "credentialCount": 2 }] });
        let Json(body) = givvable_certs(State(state(Ok(payload.clone()))), request()).await;
        assert_eq!(body, payload);
    }

    #[tokio::test]
    async fn routes_are_mounted_at_collaborator_paths() {
        let response = router(state(Ok(json!({}))))
            .oneshot(
                Request::post("/api/vertexChat")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"message":"hi"}"#))
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let body: Value = serde_json::from_slice(&bytes).expect("json");
        assert_eq!(body, json!({ "content": "echo: hi" }));
    }
}
