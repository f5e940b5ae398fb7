use std::time::Duration;

/// Client-side throttling and freshness policy for the upstream market-data API.
///
/// Instances are plain values handed to [`crate::fetch::MarketDataGateway`];
/// nothing here is global, so tests and embedders can construct as many
/// isolated gateways as they need.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Upstream request budget enforced by the rate limiter.
    pub requests_per_minute: u32,
    pub quote_ttl: Duration,
    pub profile_ttl: Duration,
    pub news_ttl: Duration,
    pub search_ttl: Duration,
    /// Pause before re-entering the fetch sequence after an upstream 429.
    pub rate_limit_retry_delay: Duration,
    /// Optional cap on 429 retries. `None` keeps retrying until the upstream
    /// recovers; callers that need a latency bound should set this or wrap the
    /// call in a timeout.
    pub max_rate_limit_retries: Option<u32>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            requests_per_minute: 50,
            quote_ttl: Duration::from_secs(60),
            profile_ttl: Duration::from_secs(3600),
            news_ttl: Duration::from_secs(600),
            search_ttl: Duration::from_secs(300),
            rate_limit_retry_delay: Duration::from_millis(2000),
            max_rate_limit_retries: None,
        }
    }
}
