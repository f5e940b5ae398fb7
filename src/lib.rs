pub mod cache;
pub mod config;
pub mod error;
pub mod fetch;
pub mod risk;
pub mod services;
pub mod utils;

pub use cache::{CacheLookup, TtlCache};
pub use config::GatewayConfig;
pub use error::{AppError, Result};
pub use fetch::{MarketDataGateway, ProviderEndpoints, RateLimiter, RequestOptions};
pub use risk::{
    calculate_portfolio_risk, IntradayQuote, RiskLevel, RiskResult, TrackedInstrument,
};
