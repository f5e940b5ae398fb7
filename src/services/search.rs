use futures::future::join_all;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::fetch::{clean_symbol, MarketDataGateway, ProviderEndpoints};

use super::details::ProfileData;

/// Symbols surfaced when the search box is empty.
pub const POPULAR_STOCK_SYMBOLS: [&str; 10] = [
    "AAPL", "MSFT", "GOOGL", "AMZN", "NVDA", "META", "TSLA", "BRK.B", "JPM", "V",
];

const MAX_SEARCH_RESULTS: usize = 15;

#[derive(Debug, Clone, Default, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    result: Vec<SearchHit>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct SearchHit {
    #[serde(default)]
    symbol: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(rename = "displaySymbol", default)]
    display_symbol: Option<String>,
    #[serde(rename = "type", default)]
    kind: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockSearchResult {
    pub symbol: String,
    pub name: String,
    pub exchange: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Symbol lookup. An empty or whitespace query surfaces the popular symbols
/// via their profiles; anything else goes through the provider's search
/// endpoint. Composite results live in the dedicated search cache (keyed by
/// query) on top of the per-response caching inside the gateway.
pub async fn search_stocks(
    gateway: &MarketDataGateway,
    endpoints: &ProviderEndpoints,
    query: Option<&str>,
) -> Result<Vec<StockSearchResult>> {
    let trimmed = query.map(str::trim).filter(|q| !q.is_empty());
    let cache_key = format!("search:{}", trimmed.unwrap_or("popular"));

    if let Some(cached) = gateway.search_cache().get(&cache_key) {
        if let Ok(results) = serde_json::from_value(cached) {
            return Ok(results);
        }
    }

    let results = match trimmed {
        Some(query) => {
            let response: SearchResponse = gateway.fetch(&endpoints.search_url(query)?).await?;
            map_search_hits(response.result)
        }
        None => popular_results(gateway, endpoints).await?,
    };

    if let Ok(value) = serde_json::to_value(&results) {
        gateway.search_cache().set(&cache_key, value);
    }
    Ok(results)
}

async fn popular_results(
    gateway: &MarketDataGateway,
    endpoints: &ProviderEndpoints,
) -> Result<Vec<StockSearchResult>> {
    let fetches = POPULAR_STOCK_SYMBOLS.iter().map(|&symbol| async move {
        let url = endpoints.profile_url(symbol)?;
        let profile = gateway.fetch::<ProfileData>(&url).await?;
        Ok::<_, crate::error::AppError>((symbol, profile))
    });

    let results = join_all(fetches)
        .await
        .into_iter()
        .filter_map(|outcome| match outcome {
            Ok((symbol, profile)) => popular_profile_result(symbol, &profile),
            Err(err) => {
                warn!("profile fetch for popular symbol failed: {}", err);
                None
            }
        })
        .collect();
    Ok(results)
}

fn popular_profile_result(symbol: &str, profile: &ProfileData) -> Option<StockSearchResult> {
    let name = profile
        .name
        .clone()
        .or_else(|| profile.ticker.clone())
        .filter(|name| !name.is_empty())?;
    Some(StockSearchResult {
        symbol: clean_symbol(symbol),
        name,
        exchange: profile.exchange.clone().unwrap_or_else(|| "US".to_string()),
        kind: "Common Stock".to_string(),
    })
}

fn map_search_hits(hits: Vec<SearchHit>) -> Vec<StockSearchResult> {
    hits.into_iter()
        .map(|hit| {
            let symbol = clean_symbol(&hit.symbol);
            let name = hit
                .description
                .filter(|d| !d.is_empty())
                .unwrap_or_else(|| symbol.clone());
            StockSearchResult {
                symbol,
                name,
                exchange: hit
                    .display_symbol
                    .filter(|d| !d.is_empty())
                    .unwrap_or_else(|| "US".to_string()),
                kind: hit.kind.filter(|k| !k.is_empty()).unwrap_or_else(|| "Stock".to_string()),
            }
        })
        .take(MAX_SEARCH_RESULTS)
        .collect()
}
