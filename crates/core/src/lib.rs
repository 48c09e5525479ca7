pub mod analytics;
pub mod cache;
pub mod clock;
pub mod config;
pub mod directory;
pub mod domain;
pub mod errors;
pub mod forecast;
pub mod matching;

pub use analytics::{Distribution, DistributionEntry, MarketSummary};
pub use cache::TtlCache;
pub use clock::{Clock, ManualClock, SystemClock};
pub use directory::{BuyerFilter, SupplierFilter};
pub use domain::buyer::{Buyer, BuyerDraft, BuyerId, Volume};
pub use domain::chat::{ChatAction, ChatMessage, MessageId, Sender, View};
pub use domain::price::{PriceRange, PriceTable};
pub use domain::supplier::{Supplier, SupplierDraft, SupplierId};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use forecast::{ForecastEngine, ForecastPoint, PricePoint, PricePrediction};
pub use matching::{trade_risk, MatchPolicy, Matcher, RiskLevel, TradeLink, TradeRisk};
