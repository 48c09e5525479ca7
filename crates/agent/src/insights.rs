//! Collaborator-backed commentary: price explanations, compliance summaries,
//! the executive market insight and live certification lookups.
//!
//! None of these fail. A collaborator error becomes a fixed fallback string
//! (or an empty certification summary) and is logged.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::Duration;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use fruitlink_core::analytics::MarketSummary;
use fruitlink_core::cache::TtlCache;
use fruitlink_core::clock::Clock;
use fruitlink_core::domain::buyer::Buyer;
use fruitlink_core::domain::supplier::Supplier;
use fruitlink_core::forecast::{ForecastEngine, PriceHistorySource, PricePrediction};

use crate::llm::{CertificationSource, LlmClient};

pub const NO_EXPLANATION: &str = "No explanation available.";
pub const NO_COMPLIANCE: &str = "Compliance check not available.";
pub const INSIGHT_UNAVAILABLE: &str = "AI insight not available.";
pub const EMPTY_INSIGHT: &str = "No AI insight available.";

/// The profile fields a compliance review looks at.
#[derive(Clone, Copy, Debug)]
pub struct ComplianceProfile<'a> {
    pub name: &'a str,
    pub country: &'a str,
    pub fruits: &'a [String],
    pub certifications: &'a [String],
}

impl<'a> From<&'a Supplier> for ComplianceProfile<'a> {
    fn from(supplier: &'a Supplier) -> Self {
        Self {
            name: &supplier.name,
            country: &supplier.country,
            fruits: &supplier.fruits_offered,
            certifications: &supplier.certifications,
        }
    }
}

impl<'a> From<&'a Buyer> for ComplianceProfile<'a> {
    fn from(buyer: &'a Buyer) -> Self {
        Self {
            name: &buyer.name,
            country: &buyer.country,
            fruits: &buyer.fruits_interested,
            certifications: &buyer.certifications,
        }
    }
}

pub fn explanation_prompt(prediction: &PricePrediction) -> String {
    let history = prediction
        .history
        .iter()
        .map(|point| format!("{}: ${:.2} per kg", point.date, point.price))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "Given the following recent price data for {} (per kg):\n{history}\n\
         The predicted price for next week is ${:.2} per kg.\n\
         Explain the main factors that could affect this price, and provide a confidence score (0-100) for this prediction. \
         Respond in 2-3 sentences.",
        prediction.fruit, prediction.predicted
    )
}

pub fn compliance_prompt(profile: ComplianceProfile<'_>) -> String {
    let certifications = if profile.certifications.is_empty() {
        "None".to_string()
    } else {
        profile.certifications.join(", ")
    };
    format!(
        "You are a global food trade compliance expert. Given the following supplier profile:\n\
         - Name: {}\n- Country: {}\n- Fruits: {}\n- Certifications: {certifications}\n\n\
         Please check and summarize:\n\
         1. If this supplier is compliant with major requirements for exporting to the EU and US markets for these fruits.\n\
         2. If any important certifications are missing for these markets.\n\
         3. Any general best-practices or compliance recommendations for international trade.\n\n\
         Assume all prices and quantities are per kg.\n\
         Respond in 3-5 sentences, clearly mentioning EU, US, and general best practices.",
        profile.name,
        profile.country,
        profile.fruits.join(", "),
    )
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificationSummary {
    pub categories: Vec<String>,
    pub credential_count: u64,
}

impl CertificationSummary {
    /// Reads the first company of a registry search result.
    pub fn from_search(payload: &Value) -> Self {
        let Some(company) = payload.get("companies").and_then(|companies| companies.get(0)) else {
            return Self::default();
        };
        let categories = company
            .get("credentialCategories")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Value::as_str).map(str::to_string).collect())
            .unwrap_or_default();
        let credential_count =
            company.get("credentialCount").and_then(Value::as_u64).unwrap_or_default();
        Self { categories, credential_count }
    }
}

/// A forecast together with its generated explanation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FruitInsight {
    pub prediction: PricePrediction,
    pub explanation: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PredictionTicket {
    fruit: String,
    generation: u64,
}

impl PredictionTicket {
    pub fn fruit(&self) -> &str {
        &self.fruit
    }
}

#[derive(Default)]
struct BoardState {
    generations: HashMap<String, u64>,
    published: HashMap<String, FruitInsight>,
}

/// Latest insight per fruit. Every request takes a ticket first; a result is
/// only published if no newer ticket was issued for the same fruit meanwhile.
#[derive(Default)]
pub struct PredictionBoard {
    state: Mutex<BoardState>,
}

impl PredictionBoard {
    pub fn begin(&self, fruit: &str) -> PredictionTicket {
        let fruit = fruit.trim().to_lowercase();
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let generation = state.generations.entry(fruit.clone()).or_default();
        *generation += 1;
        PredictionTicket { fruit, generation: *generation }
    }

    /// Returns `false` when the ticket was superseded and the insight dropped.
    pub fn publish(&self, ticket: &PredictionTicket, insight: FruitInsight) -> bool {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.generations.get(&ticket.fruit) != Some(&ticket.generation) {
            return false;
        }
        state.published.insert(ticket.fruit.clone(), insight);
        true
    }

    pub fn get(&self, fruit: &str) -> Option<FruitInsight> {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.published.get(&fruit.trim().to_lowercase()).cloned()
    }
}

pub struct InsightService {
    llm: Arc<dyn LlmClient>,
    certifications: Arc<dyn CertificationSource>,
    insight_cache: TtlCache<String, String>,
    board: PredictionBoard,
}

impl InsightService {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        certifications: Arc<dyn CertificationSource>,
        insight_ttl: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            llm,
            certifications,
            insight_cache: TtlCache::new(insight_ttl, clock),
            board: PredictionBoard::default(),
        }
    }

    pub fn board(&self) -> &PredictionBoard {
        &self.board
    }

    pub async fn price_explanation(&self, prediction: &PricePrediction) -> String {
        match self.llm.complete(&explanation_prompt(prediction)).await {
            Ok(text) => text,
            Err(error) => {
                warn!(
                    event_name = "agent.insights.explanation_failed",
                    fruit = %prediction.fruit,
                    error = %error,
                    "price explanation unavailable"
                );
                NO_EXPLANATION.to_string()
            }
        }
    }

    /// Forecasts `fruit`, asks for an explanation and publishes the pair on
    /// the board unless a newer request for the same fruit overtook this one.
    pub async fn fruit_insight<S>(&self, engine: &ForecastEngine<S>, fruit: &str) -> FruitInsight
    where
        S: PriceHistorySource,
    {
        let ticket = self.board.begin(fruit);
        let prediction = engine.predict(ticket.fruit());
        let explanation = self.price_explanation(&prediction).await;
        let insight = FruitInsight { prediction, explanation };
        if !self.board.publish(&ticket, insight.clone()) {
            debug!(
                event_name = "agent.insights.stale_prediction_dropped",
                fruit = ticket.fruit(),
                "newer request superseded this prediction"
            );
        }
        insight
    }

    pub async fn compliance_check(&self, profile: ComplianceProfile<'_>) -> String {
        match self.llm.complete(&compliance_prompt(profile)).await {
            Ok(text) => text,
            Err(error) => {
                warn!(
                    event_name = "agent.insights.compliance_failed",
                    error = %error,
                    "compliance check unavailable"
                );
                NO_COMPLIANCE.to_string()
            }
        }
    }

    /// Executive insight over the directory summary, memoized by prompt.
    pub async fn market_insight(&self, summary: &MarketSummary) -> String {
        let prompt = summary.insight_prompt();
        if let Some(cached) = self.insight_cache.get(&prompt) {
            return cached;
        }

        match self.llm.complete(&prompt).await {
            Ok(text) => {
                let insight =
                    if text.trim().is_empty() { EMPTY_INSIGHT.to_string() } else { text };
                self.insight_cache.insert(prompt, insight.clone());
                insight
            }
            Err(error) => {
                warn!(
                    event_name = "agent.insights.market_insight_failed",
                    error = %error,
                    "market insight unavailable"
                );
                INSIGHT_UNAVAILABLE.to_string()
            }
        }
    }

    pub async fn certification_lookup(&self, name: &str) -> CertificationSummary {
        match self.certifications.search_companies(name).await {
            Ok(payload) => CertificationSummary::from_search(&payload),
            Err(error) => {
                warn!(
                    event_name = "agent.insights.certification_lookup_failed",
                    error = %error,
                    "certification lookup unavailable"
                );
                CertificationSummary::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::{Duration, TimeZone, Utc};
    use serde_json::{json, Value};

    use fruitlink_core::analytics::MarketSummary;
    use fruitlink_core::clock::ManualClock;
    use fruitlink_core::domain::supplier::{SupplierDraft, SupplierId};
    use fruitlink_core::forecast::ForecastEngine;

    use super::{
        compliance_prompt, explanation_prompt, CertificationSummary, ComplianceProfile,
        FruitInsight, InsightService, PredictionBoard, INSIGHT_UNAVAILABLE, NO_COMPLIANCE,
        NO_EXPLANATION,
    };
    use crate::llm::{CertificationSource, CollaboratorError, LlmClient};

    #[derive(Default)]
    struct CountingLlm {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl LlmClient for CountingLlm {
        async fn complete(&self, _prompt: &str) -> Result<String, CollaboratorError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if self.fail {
                return Err(CollaboratorError::Status { status: 500, body: "boom".to_string() });
            }
            Ok(format!("insight #{call}"))
        }
    }

    struct StaticRegistry(Result<Value, CollaboratorError>);

    #[async_trait]
    impl CertificationSource for StaticRegistry {
        async fn search_companies(&self, _name: &str) -> Result<Value, CollaboratorError> {
            self.0.clone()
        }
    }

    fn service(
        llm: Arc<CountingLlm>,
        registry: StaticRegistry,
        clock: Arc<ManualClock>,
    ) -> InsightService {
        InsightService::new(llm, Arc::new(registry), Duration::minutes(2), clock)
    }

    fn clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 7, 1, 9, 0, 0).single().expect("date")))
    }

    #[test]
    fn explanation_prompt_lists_history_per_kg() {
        let prediction = ForecastEngine::default().predict("mango");
        let prompt = explanation_prompt(&prediction);

        assert!(prompt.starts_with("Given the following recent price data for mango (per kg):\n2024-06-01: $2.10 per kg\n"));
        assert!(prompt.contains(&format!("next week is ${:.2} per kg.", prediction.predicted)));
        assert!(prompt.ends_with("Respond in 2-3 sentences."));
    }

    #[test]
    fn compliance_prompt_marks_missing_certifications() {
        let supplier = SupplierDraft::new("Golden Orchard", "Thailand", vec!["mango".to_string(), "durian".to_string()])
            .into_supplier(SupplierId::generate())
            .expect("supplier");
        let prompt = compliance_prompt(ComplianceProfile::from(&supplier));

        assert!(prompt.contains("- Fruits: mango, durian\n- Certifications: None\n"));
    }

    #[tokio::test]
    async fn market_insight_is_cached_for_the_window() {
        let llm = Arc::new(CountingLlm::default());
        let clock = clock();
        let insights = service(llm.clone(), StaticRegistry(Ok(json!({}))), clock.clone());
        let summary = MarketSummary::default();

        assert_eq!(insights.market_insight(&summary).await, "insight #1");
        clock.advance(Duration::seconds(119));
        assert_eq!(insights.market_insight(&summary).await, "insight #1");
        clock.advance(Duration::seconds(1));
        assert_eq!(insights.market_insight(&summary).await, "insight #2");
        assert_eq!(llm.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failures_become_fallback_text_and_are_not_cached() {
        let llm = Arc::new(CountingLlm { fail: true, ..CountingLlm::default() });
        let insights = service(llm.clone(), StaticRegistry(Ok(json!({}))), clock());
        let summary = MarketSummary::default();
        let supplier = SupplierDraft::new("A", "Peru", vec!["avocado".to_string()])
            .into_supplier(SupplierId::generate())
            .expect("supplier");

        assert_eq!(insights.market_insight(&summary).await, INSIGHT_UNAVAILABLE);
        assert_eq!(insights.market_insight(&summary).await, INSIGHT_UNAVAILABLE);
        assert_eq!(llm.calls.load(Ordering::SeqCst), 2);
        assert_eq!(insights.compliance_check(ComplianceProfile::from(&supplier)).await, NO_COMPLIANCE);

        let prediction = ForecastEngine::default().predict("apple");
        assert_eq!(insights.price_explanation(&prediction).await, NO_EXPLANATION);
    }

    #[tokio::test]
    async fn certification_lookup_reads_first_company() {
        let registry = StaticRegistry(Ok(json!({
            "companies": [
                {"credentialCategories": ["Organic", "Fair Trade"], "credentialCount": 3},
                {"credentialCategories": ["Other"], "credentialCount": 9}
            ]
        })));
        let insights = service(Arc::new(CountingLlm::default()), registry, clock());

        let summary = insights.certification_lookup("Tropical Fruits Co.").await;
        assert_eq!(summary.categories, vec!["Organic", "Fair Trade"]);
        assert_eq!(summary.credential_count, 3);
    }

    #[tokio::test]
    async fn certification_failure_is_empty_summary() {
        let registry = StaticRegistry(Err(CollaboratorError::Upstream(
            "GivvableCert API is not available for /api/givvableCerts".to_string(),
        )));
        let insights = service(Arc::new(CountingLlm::default()), registry, clock());

        assert_eq!(insights.certification_lookup("x").await, CertificationSummary::default());
        assert_eq!(CertificationSummary::from_search(&json!({"companies": []})), CertificationSummary::default());
    }

    #[test]
    fn superseded_ticket_cannot_publish() {
        let board = PredictionBoard::default();
        let prediction = ForecastEngine::default().predict("mango");
        let insight = |text: &str| FruitInsight { prediction: prediction.clone(), explanation: text.to_string() };

        let stale = board.begin("Mango");
        let fresh = board.begin("mango");
        assert!(board.publish(&fresh, insight("fresh")));
        assert!(!board.publish(&stale, insight("stale")));
        assert_eq!(board.get("MANGO").map(|published| published.explanation), Some("fresh".to_string()));

        let other = board.begin("durian");
        assert!(board.publish(&other, insight("durian")));
        assert!(board.get("apple").is_none());
    }

    #[tokio::test]
    async fn fruit_insight_publishes_latest_result() {
        let insights = service(Arc::new(CountingLlm::default()), StaticRegistry(Ok(json!({}))), clock());
        let engine = ForecastEngine::default();

        let insight = insights.fruit_insight(&engine, "Durian").await;
        assert_eq!(insight.prediction.fruit, "durian");
        assert_eq!(insight.explanation, "insight #1");
        assert_eq!(insights.board().get("durian"), Some(insight));
    }
}
