use crate::error::Result;

pub mod endpoints;
pub mod gateway;
pub mod limiter;

pub use endpoints::{clean_symbol, ProviderEndpoints, API_KEY_ENV, DEFAULT_BASE_URL};
pub use gateway::{cache_key, MarketDataGateway, RequestOptions};
pub use limiter::RateLimiter;

pub type FetchResult<T> = Result<T>;
