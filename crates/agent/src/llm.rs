use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use fruitlink_core::errors::ApplicationError;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CollaboratorError {
    #[error("collaborator request failed: {0}")]
    Transport(String),
    #[error("collaborator returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("collaborator response could not be decoded: {0}")]
    Decode(String),
    #[error("collaborator reported an error: {0}")]
    Upstream(String),
}

impl From<CollaboratorError> for ApplicationError {
    fn from(error: CollaboratorError) -> Self {
        Self::Integration(error.to_string())
    }
}

/// Free-text generation. One prompt in, one completion out.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, CollaboratorError>;
}

/// Company search against the certification registry. The payload is passed
/// through untouched; callers pick the fields they need.
#[async_trait]
pub trait CertificationSource: Send + Sync {
    async fn search_companies(&self, name: &str) -> Result<Value, CollaboratorError>;
}

#[async_trait]
impl<T> LlmClient for std::sync::Arc<T>
where
    T: LlmClient + ?Sized,
{
    async fn complete(&self, prompt: &str) -> Result<String, CollaboratorError> {
        (**self).complete(prompt).await
    }
}

#[async_trait]
impl<T> CertificationSource for std::sync::Arc<T>
where
    T: CertificationSource + ?Sized,
{
    async fn search_companies(&self, name: &str) -> Result<Value, CollaboratorError> {
        (**self).search_companies(name).await
    }
}

#[async_trait]
impl<T> LlmClient for &T
where
    T: LlmClient + ?Sized,
{
    async fn complete(&self, prompt: &str) -> Result<String, CollaboratorError> {
        (**self).complete(prompt).await
    }
}
