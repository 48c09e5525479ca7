//! Price prediction for a single fruit.
//!
//! The pipeline is deliberately small and deterministic:
//! - `current` is the most recent historical price,
//! - `predicted` blends the simple moving average with a one-step OLS
//!   extrapolation,
//! - `forecast` extends the regression line six months past the last sample.
//!
//! Results are memoized per fruit (case-insensitive) in a [`TtlCache`] owned by
//! the engine, so repeated calls inside the window return identical values.

pub mod market;
pub mod regression;

use std::sync::Arc;

use chrono::{Datelike, Duration, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::cache::TtlCache;
use crate::clock::{Clock, SystemClock};

pub use market::{MockMarketData, PriceHistorySource, PricePoint, REFERENCE_FRUIT};
pub use regression::{moving_average, LinearFit};

pub const FORECAST_MONTHS: usize = 6;
pub const DEFAULT_CACHE_TTL_SECS: u64 = 600;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    /// `YYYY-MM`
    pub month: String,
    pub price: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PricePrediction {
    pub fruit: String,
    pub current: f64,
    pub predicted: f64,
    pub history: Vec<PricePoint>,
    pub forecast: Vec<ForecastPoint>,
}

pub struct ForecastEngine<S = MockMarketData> {
    source: S,
    cache: TtlCache<String, PricePrediction>,
}

impl Default for ForecastEngine<MockMarketData> {
    fn default() -> Self {
        Self::new(
            MockMarketData::default(),
            Arc::new(SystemClock),
            Duration::seconds(DEFAULT_CACHE_TTL_SECS as i64),
        )
    }
}

impl<S> ForecastEngine<S>
where
    S: PriceHistorySource,
{
    pub fn new(source: S, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self { source, cache: TtlCache::new(ttl, clock) }
    }

    pub fn predict(&self, fruit: &str) -> PricePrediction {
        let key = fruit.trim().to_lowercase();
        if let Some(cached) = self.cache.get(&key) {
            return cached;
        }

        let prediction = predict_from_history(&key, self.source.history(&key));
        self.cache.insert(key, prediction.clone());
        prediction
    }

    pub fn cached_entries(&self) -> usize {
        self.cache.len()
    }
}

pub fn predict_from_history(fruit: &str, history: Vec<PricePoint>) -> PricePrediction {
    let prices = history.iter().map(|point| point.price).collect::<Vec<_>>();
    let current = prices.last().copied().unwrap_or(0.0);

    let (predicted, forecast) = match (LinearFit::fit(&prices), history.last()) {
        (Some(fit), Some(last)) => {
            let predicted = (moving_average(&prices) + fit.extrapolate(1)) / 2.0;
            let forecast = forecast_months(last.date, FORECAST_MONTHS)
                .into_iter()
                .enumerate()
                .map(|(offset, month)| ForecastPoint { month, price: fit.extrapolate(offset + 1) })
                .collect();
            (predicted, forecast)
        }
        _ => (0.0, Vec::new()),
    };

    PricePrediction { fruit: fruit.to_string(), current, predicted, history, forecast }
}

/// Month labels for the `count` months following `last`.
pub fn forecast_months(last: NaiveDate, count: usize) -> Vec<String> {
    let Some(first_of_month) = last.with_day(1) else {
        return Vec::new();
    };

    (1..=count)
        .filter_map(|offset| first_of_month.checked_add_months(Months::new(offset as u32)))
        .map(|month| month.format("%Y-%m").to_string())
        .collect()
}
