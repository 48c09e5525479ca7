//! Chat and insight layer for FruitLink.
//!
//! - `conversation` routes a chat message to profile extraction or plain
//!   conversation (`extraction` holds the JSON and regex extractors).
//! - `insights` turns forecasts, profiles and directory summaries into
//!   collaborator prompts and never fails.
//! - `runtime` applies a routed message to the store and schedules the view
//!   switch through `navigation`.
//! - `collaborator` is the HTTP client for the backend proxy; `providers`
//!   are the upstream services the proxy itself calls.
//!
//! The model only extracts and comments. Records, matches and forecasts are
//! computed by `fruitlink-core`.

pub mod collaborator;
pub mod conversation;
pub mod extraction;
pub mod insights;
pub mod llm;
pub mod navigation;
pub mod providers;
pub mod runtime;

pub use collaborator::HttpCollaborator;
pub use conversation::{Intent, IntentRouter, RouterReply};
pub use insights::{CertificationSummary, FruitInsight, InsightService, PredictionBoard};
pub use llm::{CertificationSource, CollaboratorError, LlmClient};
pub use runtime::{ChatExchange, ChatRuntime, CreatedRecord};
