use std::sync::Arc;
use std::time::Duration;

use fruitlink_agent::{CertificationSource, ChatRuntime, InsightService, LlmClient};
use fruitlink_core::clock::{Clock, SystemClock};
use fruitlink_core::config::{AppConfig, LlmProvider};
use fruitlink_core::forecast::{ForecastEngine, MockMarketData};
use fruitlink_core::matching::{MatchPolicy, Matcher};
use fruitlink_db::AppStore;

/// Upstream services behind `/api/vertexChat` and `/api/givvableCerts`.
#[derive(Clone)]
pub struct ProxyState {
    pub llm: Arc<dyn LlmClient>,
    pub provider: LlmProvider,
    pub certifications: Arc<dyn CertificationSource>,
}

impl ProxyState {
    /// Name used in the `"<provider> error"` envelope.
    pub fn provider_label(&self) -> &'static str {
        match self.provider {
            LlmProvider::OpenAi => "OpenAI",
            LlmProvider::Ollama => "Ollama",
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub store: AppStore,
    pub forecasts: Arc<ForecastEngine>,
    pub matcher: Matcher,
    pub insights: Arc<InsightService>,
    pub chat: Arc<ChatRuntime<Arc<dyn LlmClient>>>,
    pub proxy: ProxyState,
}

impl AppState {
    pub fn new(store: AppStore, proxy: ProxyState, config: &AppConfig) -> Self {
        Self::with_clock(store, proxy, config, Arc::new(SystemClock))
    }

    pub fn with_clock(
        store: AppStore,
        proxy: ProxyState,
        config: &AppConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let forecasts = ForecastEngine::new(
            MockMarketData::default(),
            clock.clone(),
            chrono::Duration::seconds(config.forecast.cache_ttl_secs as i64),
        );
        let insights = InsightService::new(
            proxy.llm.clone(),
            proxy.certifications.clone(),
            chrono::Duration::seconds(config.forecast.insight_cache_ttl_secs as i64),
            clock,
        );
        let policy = if config.matching.normalize_fruit_names {
            MatchPolicy::Normalized
        } else {
            MatchPolicy::Exact
        };
        let chat = ChatRuntime::new(
            proxy.llm.clone(),
            store.clone(),
            Duration::from_millis(config.chat.navigation_delay_ms),
        );

        Self {
            store,
            forecasts: Arc::new(forecasts),
            matcher: Matcher::new(policy),
            insights: Arc::new(insights),
            chat: Arc::new(chat),
            proxy,
        }
    }
}
