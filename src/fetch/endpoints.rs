use reqwest::Url;

use crate::error::{AppError, Context, Result};

use super::FetchResult;

pub const DEFAULT_BASE_URL: &str = "https://finnhub.io/api/v1";
pub const API_KEY_ENV: &str = "FINNHUB_API_KEY";

/// Normalize a user-supplied ticker for use in URLs and cache keys.
pub fn clean_symbol(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}

/// Builds provider request URLs from a base URL and API key.
#[derive(Debug, Clone)]
pub struct ProviderEndpoints {
    base_url: String,
    api_key: String,
}

impl ProviderEndpoints {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let base_url = base_url.into().trim().trim_end_matches('/').to_string();
        Self {
            base_url,
            api_key: api_key.into(),
        }
    }

    /// Reads the API key from the environment and points at the default host.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var(API_KEY_ENV)
            .with_context(|| format!("Environment variable {} is not set", API_KEY_ENV))?;
        Ok(Self::new(DEFAULT_BASE_URL, api_key))
    }

    pub fn quote_url(&self, symbol: &str) -> FetchResult<String> {
        self.build("quote", &[("symbol", &clean_symbol(symbol))])
    }

    pub fn profile_url(&self, symbol: &str) -> FetchResult<String> {
        self.build("stock/profile2", &[("symbol", &clean_symbol(symbol))])
    }

    pub fn metrics_url(&self, symbol: &str) -> FetchResult<String> {
        self.build(
            "stock/metric",
            &[("symbol", &clean_symbol(symbol)), ("metric", "all")],
        )
    }

    pub fn search_url(&self, query: &str) -> FetchResult<String> {
        self.build("search", &[("q", query.trim())])
    }

    /// Company news between two `YYYY-MM-DD` dates.
    pub fn company_news_url(&self, symbol: &str, from: &str, to: &str) -> FetchResult<String> {
        self.build(
            "company-news",
            &[("symbol", &clean_symbol(symbol)), ("from", from), ("to", to)],
        )
    }

    pub fn market_news_url(&self) -> FetchResult<String> {
        self.build("news", &[("category", "general")])
    }

    fn build(&self, path: &str, params: &[(&str, &str)]) -> FetchResult<String> {
        let mut url = Url::parse(&format!("{}/{}", self.base_url, path)).map_err(|err| {
            AppError::message(format!("Invalid endpoint URL for {}: {}", path, err))
        })?;
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in params {
                pairs.append_pair(key, value);
            }
            pairs.append_pair("token", &self.api_key);
        }
        Ok(url.to_string())
    }
}
