//! JSON API over the directory, matcher, forecasts and chat.
//!
//! - `GET    /api/suppliers`                     : filtered suppliers with facets
//! - `POST   /api/suppliers`                     : create a supplier
//! - `GET    /api/suppliers/{id}`                : supplier with matched buyers
//! - `PUT    /api/suppliers/{id}`                : replace a supplier
//! - `GET    /api/suppliers/{id}/compliance`     : compliance text + certifications
//! - `GET    /api/buyers`                        : filtered buyers with facets
//! - `POST   /api/buyers`                        : create a buyer
//! - `GET    /api/buyers/{id}`                   : buyer with matched suppliers and risk
//! - `PUT    /api/buyers/{id}`                   : replace a buyer
//! - `GET    /api/buyers/{id}/compliance`        : compliance text + certifications
//! - `GET    /api/predictions/{fruit}`           : price prediction
//! - `GET    /api/predictions/{fruit}/explanation`: prediction with explanation
//! - `GET    /api/certifications?name=`          : live certification lookup
//! - `GET    /api/analytics`                     : distributions, trade links, insight
//! - `GET    /api/chat/messages`                 : chat history
//! - `POST   /api/chat`                          : send a chat message
//! - `GET    /api/view` / `DELETE /api/view`     : current view / back to main

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use fruitlink_agent::insights::{ComplianceProfile, FruitInsight};
use fruitlink_agent::{CertificationSummary, ChatExchange};
use fruitlink_core::analytics::MarketSummary;
use fruitlink_core::directory::{facet_values, BuyerFilter, SupplierFilter};
use fruitlink_core::domain::buyer::{Buyer, BuyerDraft, BuyerId};
use fruitlink_core::domain::chat::{ChatMessage, View};
use fruitlink_core::domain::supplier::{Supplier, SupplierDraft, SupplierId};
use fruitlink_core::errors::{ApplicationError, DomainError, InterfaceError};
use fruitlink_core::forecast::PricePrediction;
use fruitlink_core::matching::{trade_risk, TradeLink, TradeRisk};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::state::AppState;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorBody {
    pub error: String,
    pub detail: String,
    pub correlation_id: String,
}

pub type ApiError = (StatusCode, Json<ApiErrorBody>);
pub type ApiResult<T> = Result<Json<T>, ApiError>;

pub fn api_error(error: ApplicationError) -> ApiError {
    let interface = error.into_interface(Uuid::new_v4().to_string());
    let (status, detail) = match &interface {
        InterfaceError::BadRequest { message, .. } => (StatusCode::BAD_REQUEST, message.clone()),
        InterfaceError::NotFound { message, .. } => (StatusCode::NOT_FOUND, message.clone()),
        InterfaceError::ServiceUnavailable { message, .. } => {
            (StatusCode::SERVICE_UNAVAILABLE, message.clone())
        }
        InterfaceError::Internal { message, .. } => {
            (StatusCode::INTERNAL_SERVER_ERROR, message.clone())
        }
    };
    if status.is_server_error() {
        warn!(
            event_name = "api.request.failed",
            correlation_id = interface.correlation_id(),
            status = status.as_u16(),
            detail = %detail,
            "request failed"
        );
    }
    (
        status,
        Json(ApiErrorBody {
            error: interface.user_message().to_string(),
            detail,
            correlation_id: interface.correlation_id().to_string(),
        }),
    )
}

fn not_found(entity: &'static str, id: &str) -> ApiError {
    api_error(DomainError::NotFound { entity, id: id.to_string() }.into())
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplierListing {
    pub suppliers: Vec<Supplier>,
    pub total: usize,
    pub countries: Vec<String>,
    pub fruits: Vec<String>,
    pub certifications: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyerListing {
    pub buyers: Vec<Buyer>,
    pub total: usize,
    pub countries: Vec<String>,
    pub fruits: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchedBuyer {
    pub buyer: Buyer,
    pub shared_fruits: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplierDetail {
    pub supplier: Supplier,
    pub matched_buyers: Vec<MatchedBuyer>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchedSupplier {
    pub supplier: Supplier,
    pub shared_fruits: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyerDetail {
    pub buyer: Buyer,
    pub matched_suppliers: Vec<MatchedSupplier>,
    pub risk: TradeRisk,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceReport {
    pub name: String,
    pub compliance: String,
    pub certifications: CertificationSummary,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct CertificationQuery {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsReport {
    pub summary: MarketSummary,
    pub trade_links: Vec<TradeLink>,
    pub insight: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewChange {
    pub previous: View,
    pub current: View,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/suppliers", get(list_suppliers).post(create_supplier))
        .route("/api/suppliers/{id}", get(supplier_detail).put(replace_supplier))
        .route("/api/suppliers/{id}/compliance", get(supplier_compliance))
        .route("/api/buyers", get(list_buyers).post(create_buyer))
        .route("/api/buyers/{id}", get(buyer_detail).put(replace_buyer))
        .route("/api/buyers/{id}/compliance", get(buyer_compliance))
        .route("/api/predictions/{fruit}", get(prediction))
        .route("/api/predictions/{fruit}/explanation", get(prediction_explanation))
        .route("/api/certifications", get(certifications))
        .route("/api/analytics", get(analytics))
        .route("/api/chat", post(send_chat))
        .route("/api/chat/messages", get(chat_messages))
        .route("/api/view", get(current_view).delete(back_to_main))
        .with_state(state)
}

pub async fn list_suppliers(
    State(state): State<AppState>,
    Query(filter): Query<SupplierFilter>,
) -> ApiResult<SupplierListing> {
    let all = state.store.suppliers().await.map_err(api_error)?;
    let suppliers = filter.apply(&all).into_iter().cloned().collect::<Vec<_>>();

    Ok(Json(SupplierListing {
        total: suppliers.len(),
        countries: facet_values(all.iter().map(|supplier| supplier.country.as_str())),
        fruits: facet_values(
            all.iter().flat_map(|supplier| supplier.fruits_offered.iter().map(String::as_str)),
        ),
        certifications: facet_values(
            all.iter().flat_map(|supplier| supplier.certifications.iter().map(String::as_str)),
        ),
        suppliers,
    }))
}

pub async fn create_supplier(
    State(state): State<AppState>,
    Json(draft): Json<SupplierDraft>,
) -> Result<(StatusCode, Json<Supplier>), ApiError> {
    let supplier = state.store.create_supplier(draft).await.map_err(api_error)?;
    Ok((StatusCode::CREATED, Json(supplier)))
}

pub async fn supplier_detail(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> ApiResult<SupplierDetail> {
    let supplier = find_supplier(&state, &id).await?;
    let buyers = state.store.buyers().await.map_err(api_error)?;

    let matched_buyers = state
        .matcher
        .match_buyers(&supplier, &buyers)
        .into_iter()
        .map(|buyer| MatchedBuyer {
            shared_fruits: state.matcher.shared_fruits(&supplier.fruits_offered, &buyer.fruits_interested),
            buyer: buyer.clone(),
        })
        .collect();

    Ok(Json(SupplierDetail { supplier, matched_buyers }))
}

pub async fn replace_supplier(
    Path(id): Path<String>,
    State(state): State<AppState>,
    Json(draft): Json<SupplierDraft>,
) -> ApiResult<Supplier> {
    let supplier =
        state.store.replace_supplier(&SupplierId(id), draft).await.map_err(api_error)?;
    Ok(Json(supplier))
}

pub async fn supplier_compliance(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> ApiResult<ComplianceReport> {
    let supplier = find_supplier(&state, &id).await?;
    let (compliance, certifications) = tokio::join!(
        state.insights.compliance_check(ComplianceProfile::from(&supplier)),
        state.insights.certification_lookup(&supplier.name),
    );
    Ok(Json(ComplianceReport { name: supplier.name, compliance, certifications }))
}

pub async fn list_buyers(
    State(state): State<AppState>,
    Query(filter): Query<BuyerFilter>,
) -> ApiResult<BuyerListing> {
    let all = state.store.buyers().await.map_err(api_error)?;
    let buyers = filter.apply(&all).into_iter().cloned().collect::<Vec<_>>();

    Ok(Json(BuyerListing {
        total: buyers.len(),
        countries: facet_values(all.iter().map(|buyer| buyer.country.as_str())),
        fruits: facet_values(
            all.iter().flat_map(|buyer| buyer.fruits_interested.iter().map(String::as_str)),
        ),
        buyers,
    }))
}

pub async fn create_buyer(
    State(state): State<AppState>,
    Json(draft): Json<BuyerDraft>,
) -> Result<(StatusCode, Json<Buyer>), ApiError> {
    let buyer = state.store.create_buyer(draft).await.map_err(api_error)?;
    Ok((StatusCode::CREATED, Json(buyer)))
}

pub async fn buyer_detail(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> ApiResult<BuyerDetail> {
    let buyer = find_buyer(&state, &id).await?;
    let suppliers = state.store.suppliers().await.map_err(api_error)?;

    let matched = state.matcher.match_suppliers(&buyer, &suppliers);
    let risk = trade_risk(&matched);
    let matched_suppliers = matched
        .into_iter()
        .map(|supplier| MatchedSupplier {
            shared_fruits: state.matcher.shared_fruits(&buyer.fruits_interested, &supplier.fruits_offered),
            supplier: supplier.clone(),
        })
        .collect();

    Ok(Json(BuyerDetail { buyer, matched_suppliers, risk }))
}

pub async fn replace_buyer(
    Path(id): Path<String>,
    State(state): State<AppState>,
    Json(draft): Json<BuyerDraft>,
) -> ApiResult<Buyer> {
    let buyer = state.store.replace_buyer(&BuyerId(id), draft).await.map_err(api_error)?;
    Ok(Json(buyer))
}

pub async fn buyer_compliance(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> ApiResult<ComplianceReport> {
    let buyer = find_buyer(&state, &id).await?;
    let (compliance, certifications) = tokio::join!(
        state.insights.compliance_check(ComplianceProfile::from(&buyer)),
        state.insights.certification_lookup(&buyer.name),
    );
    Ok(Json(ComplianceReport { name: buyer.name, compliance, certifications }))
}

pub async fn prediction(
    Path(fruit): Path<String>,
    State(state): State<AppState>,
) -> Json<PricePrediction> {
    Json(state.forecasts.predict(&fruit))
}

pub async fn prediction_explanation(
    Path(fruit): Path<String>,
    State(state): State<AppState>,
) -> Json<FruitInsight> {
    Json(state.insights.fruit_insight(&*state.forecasts, &fruit).await)
}

pub async fn certifications(
    State(state): State<AppState>,
    Query(query): Query<CertificationQuery>,
) -> ApiResult<CertificationSummary> {
    let name = query.name.unwrap_or_default();
    if name.trim().is_empty() {
        return Err(api_error(
            DomainError::InvariantViolation("name query parameter is required".to_string()).into(),
        ));
    }
    Ok(Json(state.insights.certification_lookup(name.trim()).await))
}

pub async fn analytics(State(state): State<AppState>) -> ApiResult<AnalyticsReport> {
    let suppliers = state.store.suppliers().await.map_err(api_error)?;
    let buyers = state.store.buyers().await.map_err(api_error)?;

    let summary = MarketSummary::from_directory(&suppliers, &buyers);
    let trade_links = state.matcher.trade_links(&suppliers, &buyers);
    let insight = state.insights.market_insight(&summary).await;
    info!(
        event_name = "api.analytics.generated",
        suppliers = suppliers.len(),
        buyers = buyers.len(),
        trade_links = trade_links.len(),
        "analytics report generated"
    );

    Ok(Json(AnalyticsReport { summary, trade_links, insight }))
}

pub async fn send_chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> ApiResult<ChatExchange> {
    let exchange = state.chat.handle_message(&request.message).await.map_err(api_error)?;
    Ok(Json(exchange))
}

pub async fn chat_messages(State(state): State<AppState>) -> ApiResult<Vec<ChatMessage>> {
    Ok(Json(state.store.messages().await.map_err(api_error)?))
}

pub async fn current_view(State(state): State<AppState>) -> Json<View> {
    Json(state.store.view().await)
}

pub async fn back_to_main(State(state): State<AppState>) -> Json<ViewChange> {
    state.chat.navigator().cancel();
    let previous = state.store.back_to_main().await;
    Json(ViewChange { previous, current: View::Main })
}

async fn find_supplier(state: &AppState, id: &str) -> Result<Supplier, ApiError> {
    state
        .store
        .supplier(&SupplierId(id.to_string()))
        .await
        .map_err(api_error)?
        .ok_or_else(|| not_found("supplier", id))
}

async fn find_buyer(state: &AppState, id: &str) -> Result<Buyer, ApiError> {
    state
        .store
        .buyer(&BuyerId(id.to_string()))
        .await
        .map_err(api_error)?
        .ok_or_else(|| not_found("buyer", id))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::{
        body::{to_bytes, Body},
        extract::{Path, Query, State},
        http::{Request, StatusCode},
        Json,
    };
    use fruitlink_agent::{CertificationSource, CollaboratorError, LlmClient};
    use fruitlink_core::config::{AppConfig, LlmProvider};
    use fruitlink_core::directory::{BuyerFilter, SupplierFilter};
    use fruitlink_core::domain::buyer::Volume;
    use fruitlink_core::domain::chat::View;
    use fruitlink_core::domain::supplier::SupplierDraft;
    use fruitlink_core::matching::RiskLevel;
    use fruitlink_db::AppStore;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::{
        analytics, back_to_main, buyer_detail, certifications, create_supplier, list_buyers,
        list_suppliers, router, send_chat, supplier_compliance, supplier_detail,
        BuyerListing, CertificationQuery, ChatRequest, SupplierListing,
    };
    use crate::state::{AppState, ProxyState};

    struct CannedLlm;

    #[async_trait]
    impl LlmClient for CannedLlm {
        async fn complete(&self, prompt: &str) -> Result<String, CollaboratorError> {
            if prompt.starts_with("You are a global food trade compliance expert") {
                return Ok("Compliant with EU and US requirements.".to_string());
            }
            if prompt.starts_with("You are a business intelligence analyst") {
                return Ok("Banana demand dominates.".to_string());
            }
            Err(CollaboratorError::Transport("offline".to_string()))
        }
    }

    struct Registry;

    #[async_trait]
    impl CertificationSource for Registry {
        async fn search_companies(&self, _name: &str) -> Result<Value, CollaboratorError> {
            Ok(json!({ "companies": [{ "credentialCategories": ["Organic"], "credentialCount": 1 }] }))
        }
    }

    fn state() -> AppState {
        let proxy = ProxyState {
            llm: Arc::new(CannedLlm),
            provider: LlmProvider::Ollama,
            certifications: Arc::new(Registry),
        };
        let mut config = AppConfig::default();
        config.chat.navigation_delay_ms = 10;
        AppState::new(AppStore::seeded(), proxy, &config)
    }

    #[tokio::test]
    async fn country_filter_is_exact_and_keeps_order() {
        let filter = SupplierFilter { country: Some("Colombia".to_string()), ..SupplierFilter::default() };
        let Json(listing) = list_suppliers(State(state()), Query(filter)).await.expect("listing");

        let ids = listing.suppliers.iter().map(|supplier| supplier.id.0.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, vec!["2", "3"]);
        assert_eq!(listing.total, 2);
        assert_eq!(listing.countries, vec!["Indonesia", "Colombia", "Vietnam"]);

        let lowercase = SupplierFilter { country: Some("colombia".to_string()), ..SupplierFilter::default() };
        let Json(listing) = list_suppliers(State(state()), Query(lowercase)).await.expect("listing");
        assert_eq!(listing.total, 0);
    }

    #[tokio::test]
    async fn buyer_volume_filter() {
        let filter = BuyerFilter { volume: Some(Volume::Large), ..BuyerFilter::default() };
        let Json(listing) = list_buyers(State(state()), Query(filter)).await.expect("listing");
        let names = listing.buyers.iter().map(|buyer| buyer.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, vec!["PT Sewu Segar Nusantara", "Wismettac"]);
    }

    #[tokio::test]
    async fn supplier_detail_lists_matched_buyers_with_shared_fruits() {
        let Json(detail) =
            supplier_detail(Path("1".to_string()), State(state())).await.expect("detail");

        let matched = detail
            .matched_buyers
            .iter()
            .map(|matched| (matched.buyer.id.0.as_str(), matched.shared_fruits.clone()))
            .collect::<Vec<_>>();
        assert_eq!(
            matched,
            vec![("1", vec!["banana".to_string()]), ("4", vec!["banana".to_string()])]
        );
    }

    #[tokio::test]
    async fn buyer_detail_reports_trade_risk() {
        let Json(detail) = buyer_detail(Path("1".to_string()), State(state())).await.expect("detail");

        assert_eq!(detail.matched_suppliers.len(), 2);
        assert_eq!(detail.risk.level, RiskLevel::Medium);
        assert!((detail.risk.average_reliability - 88.5).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn unknown_record_is_not_found() {
        let (status, Json(body)) =
            supplier_detail(Path("404".to_string()), State(state())).await.expect_err("missing");
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.detail.contains("404"));
        assert!(!body.correlation_id.is_empty());
    }

    #[tokio::test]
    async fn invalid_draft_is_bad_request() {
        let draft = SupplierDraft::new("Golden Orchard", "Thailand", Vec::new());
        let (status, _) = create_supplier(State(state()), Json(draft)).await.expect_err("invalid");
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn compliance_combines_text_and_certifications() {
        let Json(report) =
            supplier_compliance(Path("2".to_string()), State(state())).await.expect("report");
        assert_eq!(report.name, "Colombian Fruits and Minerals");
        assert_eq!(report.compliance, "Compliant with EU and US requirements.");
        assert_eq!(report.certifications.credential_count, 1);
    }

    #[tokio::test]
    async fn certification_lookup_requires_name() {
        let (status, _) = certifications(State(state()), Query(CertificationQuery::default()))
            .await
            .expect_err("name required");
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn analytics_includes_links_and_insight() {
        let Json(report) = analytics(State(state())).await.expect("report");
        assert_eq!(report.insight, "Banana demand dominates.");
        assert_eq!(report.summary.top_fruit.as_deref(), Some("banana"));
        assert!(!report.trade_links.is_empty());
    }

    #[tokio::test]
    async fn chat_creates_supplier_and_back_to_main_cancels_navigation() {
        let state = state();
        let Json(exchange) = send_chat(
            State(state.clone()),
            Json(ChatRequest {
                message: "Add supplier Golden Orchard from Thailand offering mango and durian"
                    .to_string(),
            }),
        )
        .await
        .expect("exchange");
        assert!(exchange.created.is_some());
        assert!(state.chat.navigator().is_pending());

        let Json(change) = back_to_main(State(state.clone())).await;
        assert_eq!(change.current, View::Main);
        assert!(!state.chat.navigator().is_pending());
        assert_eq!(state.store.suppliers().await.expect("suppliers").len(), 5);
    }

    #[tokio::test]
    async fn query_string_filters_are_parsed_by_router() {
        let response = router(state())
            .oneshot(
                Request::get("/api/suppliers?fruit=banana&search=truong")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let listing: SupplierListing = serde_json::from_slice(&bytes).expect("json");
        assert_eq!(listing.suppliers.len(), 1);
        assert_eq!(listing.suppliers[0].name, "Truong Ton");
    }

    #[tokio::test]
    async fn blank_volume_in_query_string_means_any_volume() {
        let response = router(state())
            .oneshot(Request::get("/api/buyers?volume=&country=").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let listing: BuyerListing = serde_json::from_slice(&bytes).expect("json");
        assert_eq!(listing.total, 4);
    }

    #[tokio::test]
    async fn put_replaces_supplier_in_place() {
        let app = router(state());
        let draft = json!({
            "name": "Andes Citrus",
            "country": "Colombia",
            "fruitsOffered": ["Lime"],
        });
        let response = app
            .clone()
            .oneshot(
                Request::put("/api/suppliers/2")
                    .header("content-type", "application/json")
                    .body(Body::from(draft.to_string()))
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let body: Value = serde_json::from_slice(&bytes).expect("json");
        assert_eq!(body["id"], "2");
        assert_eq!(body["name"], "Andes Citrus");

        let missing = app
            .oneshot(
                Request::put("/api/buyers/99")
                    .header("content-type", "application/json")
                    .body(Body::from(json!({ "name": "X", "fruitsInterested": ["Kiwi"] }).to_string()))
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn prediction_route_falls_back_to_reference_series() {
        let response = router(state())
            .oneshot(Request::get("/api/predictions/kiwi").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let body: Value = serde_json::from_slice(&bytes).expect("json");
        assert_eq!(body["current"], json!(1.28));
        assert_eq!(body["forecast"].as_array().map(Vec::len), Some(6));
    }
}
