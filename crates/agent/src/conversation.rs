use serde::Serialize;
use tracing::{debug, info, warn};

use fruitlink_core::domain::chat::ChatAction;

use crate::extraction::{parse_json_profile, ExtractedProfile, LocalExtractor, ProfileKind};
use crate::llm::LlmClient;

pub const SERVICE_UNAVAILABLE: &str = "Sorry, there was an error connecting to the AI service.";
pub const EMPTY_COMPLETION: &str = "Sorry, no response.";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    AddSupplier,
    AddBuyer,
    Conversation,
}

impl Intent {
    pub fn classify(message: &str) -> Self {
        let lowered = message.to_lowercase();
        if lowered.contains("add supplier") || lowered.contains("create supplier") {
            Self::AddSupplier
        } else if lowered.contains("add buyer") || lowered.contains("create buyer") {
            Self::AddBuyer
        } else {
            Self::Conversation
        }
    }

    pub fn profile_kind(&self) -> Option<ProfileKind> {
        match self {
            Self::AddSupplier => Some(ProfileKind::Supplier),
            Self::AddBuyer => Some(ProfileKind::Buyer),
            Self::Conversation => None,
        }
    }
}

/// Where a successful extraction came from, in the order they are tried.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionSource {
    StrictReply,
    FallbackReply,
    LocalFallbackReply,
    LocalStrictReply,
    LocalMessage,
}

impl ExtractionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StrictReply => "strict_reply",
            Self::FallbackReply => "fallback_reply",
            Self::LocalFallbackReply => "local_fallback_reply",
            Self::LocalStrictReply => "local_strict_reply",
            Self::LocalMessage => "local_message",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RouterReply {
    pub intent: Intent,
    pub content: String,
    pub action: Option<ChatAction>,
    pub source: Option<ExtractionSource>,
}

impl RouterReply {
    fn text(intent: Intent, content: impl Into<String>) -> Self {
        Self { intent, content: content.into(), action: None, source: None }
    }
}

pub fn strict_prompt(kind: ProfileKind, message: &str) -> String {
    let subject = match kind {
        ProfileKind::Supplier => "supplier name, country, and fruits",
        ProfileKind::Buyer => "buyer name, country, and fruits interested",
    };
    format!(
        "Extract the {subject} from the following message.\n\
         Respond ONLY with a valid JSON object with these keys: name, country, fruits (as an array).\n\
         Do not include any explanation or extra text.\n\
         If any field is missing, use null or an empty array.\n\n\
         Message: \"{message}\""
    )
}

pub fn fallback_prompt(message: &str) -> String {
    format!(
        "Just respond with a JSON object with keys: name, country, fruits (as an array). \
         No explanation, no markdown, no template, just JSON. Message: \"{message}\""
    )
}

pub fn success_message(kind: ProfileKind, profile: &ExtractedProfile) -> String {
    let name = profile.name.as_deref().unwrap_or_default();
    let fruits = profile.fruits.join(", ");
    match kind {
        ProfileKind::Supplier => format!(
            "Great! I've created a new supplier profile for {name} from {}. They offer {fruits}. \
             I'll redirect you to their profile page to complete the details.",
            profile.country.as_deref().unwrap_or_default()
        ),
        ProfileKind::Buyer => {
            let origin =
                profile.country.as_ref().map(|country| format!(" from {country}")).unwrap_or_default();
            format!(
                "Excellent! I've created a new buyer profile for {name}{origin}. They're interested in {fruits}. \
                 I'll redirect you to their profile page to add more details."
            )
        }
    }
}

pub fn clarification_message(kind: ProfileKind, best: &ExtractedProfile) -> String {
    if best.field_count() == 0 {
        return match kind {
            ProfileKind::Supplier => "Sorry, I couldn't extract the supplier details. Please provide the name, country, and fruits.".to_string(),
            ProfileKind::Buyer => "Sorry, I couldn't extract the buyer details. Please provide the name and fruits they're interested in.".to_string(),
        };
    }

    let fruits = if best.fruits.is_empty() { "missing".to_string() } else { best.fruits.join(", ") };
    format!(
        "I found the following info: name: {}, country: {}, fruits: {fruits}. Please provide the missing {}.",
        best.name.as_deref().unwrap_or("missing"),
        best.country.as_deref().unwrap_or("missing"),
        best.missing_fields(kind).join(" and "),
    )
}

/// Routes a chat message either to profile extraction or to plain conversation.
///
/// Extraction never fails outright: a strict JSON request, one retry with a
/// terser prompt, then the local regex extractor over both replies and the raw
/// message. Only when all of that resolves nothing after the collaborator
/// failed does the caller see the service-unavailable text.
pub struct IntentRouter<L> {
    llm: L,
    extractor: LocalExtractor,
}

impl<L> IntentRouter<L>
where
    L: LlmClient,
{
    pub fn new(llm: L) -> Self {
        Self { llm, extractor: LocalExtractor::new() }
    }

    pub async fn route(&self, message: &str) -> RouterReply {
        let intent = Intent::classify(message);
        match intent.profile_kind() {
            Some(kind) => self.extract(intent, kind, message).await,
            None => self.converse(message).await,
        }
    }

    async fn converse(&self, message: &str) -> RouterReply {
        match self.llm.complete(message).await {
            Ok(reply) if reply.trim().is_empty() => {
                RouterReply::text(Intent::Conversation, EMPTY_COMPLETION)
            }
            Ok(reply) => RouterReply::text(Intent::Conversation, reply),
            Err(error) => {
                warn!(
                    event_name = "agent.router.conversation_failed",
                    error = %error,
                    "conversation completion failed"
                );
                RouterReply::text(Intent::Conversation, SERVICE_UNAVAILABLE)
            }
        }
    }

    async fn ask(&self, prompt: &str, collaborator_failed: &mut bool) -> Option<String> {
        match self.llm.complete(prompt).await {
            Ok(reply) => Some(reply),
            Err(error) => {
                warn!(
                    event_name = "agent.router.extraction_call_failed",
                    error = %error,
                    "extraction completion failed"
                );
                *collaborator_failed = true;
                None
            }
        }
    }

    async fn extract(&self, intent: Intent, kind: ProfileKind, message: &str) -> RouterReply {
        let mut collaborator_failed = false;
        let mut best = ExtractedProfile::default();

        let strict_reply = self.ask(&strict_prompt(kind, message), &mut collaborator_failed).await;
        if let Some(profile) = strict_reply.as_deref().and_then(parse_json_profile) {
            if profile.is_complete(kind) {
                return resolved(intent, kind, profile, ExtractionSource::StrictReply);
            }
            best = more_complete(best, profile);
        }

        debug!(event_name = "agent.router.retry", kind = kind.as_str(), "retrying extraction");
        let fallback_reply = self.ask(&fallback_prompt(message), &mut collaborator_failed).await;
        if let Some(profile) = fallback_reply.as_deref().and_then(parse_json_profile) {
            if profile.is_complete(kind) {
                return resolved(intent, kind, profile, ExtractionSource::FallbackReply);
            }
            best = more_complete(best, profile);
        }

        let local_sources = [
            (ExtractionSource::LocalFallbackReply, fallback_reply.as_deref()),
            (ExtractionSource::LocalStrictReply, strict_reply.as_deref()),
            (ExtractionSource::LocalMessage, Some(message)),
        ];
        for (source, text) in local_sources {
            let Some(text) = text else { continue };
            let profile = self.extractor.extract(kind, text);
            if profile.is_complete(kind) {
                return resolved(intent, kind, profile, source);
            }
            best = more_complete(best, profile);
        }

        info!(
            event_name = "agent.router.unresolved",
            kind = kind.as_str(),
            collaborator_failed,
            fields_found = best.field_count(),
            "could not extract profile"
        );
        if collaborator_failed {
            return RouterReply::text(intent, SERVICE_UNAVAILABLE);
        }
        RouterReply::text(intent, clarification_message(kind, &best))
    }
}

fn more_complete(current: ExtractedProfile, candidate: ExtractedProfile) -> ExtractedProfile {
    if candidate.field_count() > current.field_count() {
        candidate
    } else {
        current
    }
}

fn resolved(
    intent: Intent,
    kind: ProfileKind,
    profile: ExtractedProfile,
    source: ExtractionSource,
) -> RouterReply {
    info!(
        event_name = "agent.router.resolved",
        kind = kind.as_str(),
        source = source.as_str(),
        fruits = profile.fruits.len(),
        "profile extracted"
    );
    let content = success_message(kind, &profile);
    RouterReply { intent, content, action: profile.into_action(kind), source: Some(source) }
}
