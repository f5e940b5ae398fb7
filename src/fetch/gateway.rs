use log::{debug, warn};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CACHE_CONTROL};
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::time::{sleep, Duration};

use crate::cache::{CacheLookup, TtlCache};
use crate::config::GatewayConfig;
use crate::error::{AppError, Result};

use super::limiter::RateLimiter;
use super::FetchResult;

/// Extra per-request settings layered onto a gateway fetch.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub headers: Vec<(String, String)>,
}

/// What a single dispatched request produced. A 429 is not an error here; the
/// orchestration loop treats it as a signal to wait and go around again.
enum Attempt {
    Success(Value),
    RateLimited,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Category {
    Quote,
    Profile,
    Other,
}

fn classify(url: &str) -> Category {
    if url.contains("/quote?") {
        Category::Quote
    } else if url.contains("/stock/profile2?") {
        Category::Profile
    } else {
        Category::Other
    }
}

/// Cache key for a request URL: the path plus the identifying query parameter
/// (`symbol`, or `q` for search-style URLs), so that irrelevant parameters
/// such as API tokens or date windows collapse onto one entry.
pub fn cache_key(url: &str) -> String {
    let Ok(parsed) = Url::parse(url) else {
        return url.to_string();
    };

    let find = |name: &str| {
        parsed
            .query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    };

    if let Some(symbol) = find("symbol") {
        let symbol = symbol.trim().to_uppercase();
        if !symbol.is_empty() {
            return format!("{}?symbol={}", parsed.path(), symbol);
        }
    }
    if let Some(query) = find("q") {
        return format!("{}?q={}", parsed.path(), query.trim());
    }
    parsed.path().to_string()
}

/// Cached, throttled JSON fetcher for the upstream market-data API.
///
/// Combines the TTL caches and the FIFO rate limiter around plain HTTP GETs,
/// adding the 429 wait-and-retry path and the stale-cache fallback. One
/// instance is meant to be shared (behind an `Arc`) by everything in the
/// process that talks to the provider, so the request budget is enforced
/// globally.
pub struct MarketDataGateway {
    http: Client,
    limiter: RateLimiter,
    quotes: TtlCache<Value>,
    profiles: TtlCache<Value>,
    news: TtlCache<Value>,
    search: TtlCache<Value>,
    retry_delay: Duration,
    max_rate_limit_retries: Option<u32>,
}

impl MarketDataGateway {
    /// Builds a gateway from the given policy; must be called from within a
    /// tokio runtime (the rate limiter spawns its worker immediately).
    pub fn new(config: GatewayConfig) -> Self {
        Self::with_client(config, Client::new())
    }

    pub fn with_client(config: GatewayConfig, http: Client) -> Self {
        Self {
            http,
            limiter: RateLimiter::new(config.requests_per_minute),
            quotes: TtlCache::new(config.quote_ttl),
            profiles: TtlCache::new(config.profile_ttl),
            news: TtlCache::new(config.news_ttl),
            search: TtlCache::new(config.search_ttl),
            retry_delay: config.rate_limit_retry_delay,
            max_rate_limit_retries: config.max_rate_limit_retries,
        }
    }

    /// The rate limiter shared by all fetches through this gateway. Exposed so
    /// callers can throttle non-JSON work against the same request budget.
    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// Dedicated cache for composite search results (separate from the
    /// response caches fed by [`fetch_json`](Self::fetch_json)).
    pub fn search_cache(&self) -> &TtlCache<Value> {
        &self.search
    }

    /// Fetches `url` as JSON with caching, throttling, 429 retry and stale
    /// fallback. See [`fetch_json_with`](Self::fetch_json_with).
    pub async fn fetch_json(&self, url: &str) -> FetchResult<Value> {
        self.fetch_json_with(url, &RequestOptions::default()).await
    }

    /// Like [`fetch_json`](Self::fetch_json) but deserializes the response
    /// into `T`.
    pub async fn fetch<T: DeserializeOwned>(&self, url: &str) -> FetchResult<T> {
        let value = self.fetch_json(url).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// The full fetch sequence:
    ///
    /// 1. fresh cache hit -> returned immediately, no network, no throttling;
    /// 2. otherwise the GET goes through the rate limiter queue;
    /// 3. a 429 response waits out the retry delay and re-enters the whole
    ///    sequence (cache lookup included) -- unbounded unless the config caps
    ///    it;
    /// 4. any other failure is masked by a stale cache entry when one exists,
    ///    and surfaced otherwise.
    pub async fn fetch_json_with(&self, url: &str, options: &RequestOptions) -> FetchResult<Value> {
        let cache = self.cache_for(url);
        let key = cache_key(url);
        let headers = build_headers(options);
        let mut rate_limited_attempts: u32 = 0;

        loop {
            let stale = match cache.lookup(&key) {
                CacheLookup::Fresh(value) => {
                    debug!("cache hit for {}", key);
                    return Ok(value);
                }
                CacheLookup::Stale(value) => Some(value),
                CacheLookup::Missing => None,
            };

            let outcome = self
                .limiter
                .execute(dispatch(self.http.clone(), url.to_string(), headers.clone()))
                .await;

            match outcome {
                Ok(Attempt::Success(value)) => {
                    cache.set(&key, value.clone());
                    return Ok(value);
                }
                Ok(Attempt::RateLimited) => {
                    rate_limited_attempts += 1;
                    if let Some(max) = self.max_rate_limit_retries {
                        if rate_limited_attempts > max {
                            let err =
                                AppError::upstream_status(StatusCode::TOO_MANY_REQUESTS, url);
                            return fall_back_to_stale(stale, url, err);
                        }
                    }
                    warn!(
                        "upstream rate limit hit for {}, retrying in {:?}",
                        url, self.retry_delay
                    );
                    sleep(self.retry_delay).await;
                }
                Err(err) => return fall_back_to_stale(stale, url, err),
            }
        }
    }

    fn cache_for(&self, url: &str) -> &TtlCache<Value> {
        match classify(url) {
            Category::Quote => &self.quotes,
            Category::Profile => &self.profiles,
            Category::Other => &self.news,
        }
    }
}

fn fall_back_to_stale(stale: Option<Value>, url: &str, err: AppError) -> Result<Value> {
    match stale {
        Some(value) => {
            warn!("fetch for {} failed ({}), serving stale cache entry", url, err);
            Ok(value)
        }
        None => Err(err),
    }
}

fn build_headers(options: &RequestOptions) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for (key, value) in &options.headers {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(key.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            headers.insert(name, value);
        }
    }
    // Freshness is governed by the local TTL caches alone.
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
    headers
}

async fn dispatch(client: Client, url: String, headers: HeaderMap) -> Result<Attempt> {
    let response = client.get(&url).headers(headers).send().await?;
    let status = response.status();

    if status == StatusCode::TOO_MANY_REQUESTS {
        return Ok(Attempt::RateLimited);
    }
    if !status.is_success() {
        return Err(AppError::upstream_status(status, url));
    }

    let body = response.text().await?;
    let value: Value = serde_json::from_str(&body)?;
    Ok(Attempt::Success(value))
}
