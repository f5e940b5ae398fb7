use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::fetch::{clean_symbol, MarketDataGateway, ProviderEndpoints};
use crate::risk::{IntradayQuote, TrackedInstrument};
use crate::utils::format::{format_change_percent, format_market_cap_value, format_price};

/// Quote endpoint payload. Field names follow the provider's wire format.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct QuoteData {
    #[serde(rename = "c", default)]
    pub current: f64,
    #[serde(rename = "dp", default)]
    pub change_percent: Option<f64>,
    #[serde(rename = "h", default)]
    pub high: f64,
    #[serde(rename = "l", default)]
    pub low: f64,
    #[serde(rename = "o", default)]
    pub open: f64,
    #[serde(rename = "pc", default)]
    pub previous_close: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileData {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub ticker: Option<String>,
    #[serde(default)]
    pub exchange: Option<String>,
    #[serde(rename = "marketCapitalization", default)]
    pub market_capitalization: Option<f64>,
    #[serde(rename = "finnhubIndustry", default)]
    pub industry: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FinancialsData {
    #[serde(default)]
    pub metric: Option<MetricData>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetricData {
    #[serde(rename = "peNormalizedAnnual", default)]
    pub pe_normalized_annual: Option<f64>,
}

/// Combined view of one symbol: live quote, company profile and the headline
/// valuation metric, with display-ready formatted fields alongside the raw
/// numbers.
#[derive(Debug, Clone, Serialize)]
pub struct StockDetails {
    pub symbol: String,
    pub company: String,
    pub current_price: f64,
    pub change_percent: f64,
    pub high: f64,
    pub low: f64,
    pub sector: String,
    pub market_cap_usd: f64,
    pub pe_ratio: Option<f64>,
    pub price_formatted: String,
    pub change_formatted: String,
    pub market_cap_formatted: String,
    pub pe_formatted: String,
}

impl StockDetails {
    /// View of these details as risk-calculator input.
    pub fn tracked_instrument(&self) -> TrackedInstrument {
        TrackedInstrument {
            symbol: self.symbol.clone(),
            sector: self.sector.clone(),
            current_data: Some(IntradayQuote {
                close: self.current_price,
                high: self.high,
                low: self.low,
            }),
        }
    }
}

/// Fetches quote, profile and financial metrics for `symbol` concurrently
/// through the gateway (each leg still honors the shared request budget and
/// its own cache TTL) and folds them into a [`StockDetails`].
pub async fn get_stock_details(
    gateway: &MarketDataGateway,
    endpoints: &ProviderEndpoints,
    symbol: &str,
) -> Result<StockDetails> {
    let symbol = clean_symbol(symbol);
    let quote_url = endpoints.quote_url(&symbol)?;
    let profile_url = endpoints.profile_url(&symbol)?;
    let metrics_url = endpoints.metrics_url(&symbol)?;
    let (quote, profile, financials) = tokio::try_join!(
        gateway.fetch::<QuoteData>(&quote_url),
        gateway.fetch::<ProfileData>(&profile_url),
        gateway.fetch::<FinancialsData>(&metrics_url),
    )?;

    build_stock_details(&symbol, quote, profile, financials)
}

fn build_stock_details(
    symbol: &str,
    quote: QuoteData,
    profile: ProfileData,
    financials: FinancialsData,
) -> Result<StockDetails> {
    let company = profile
        .name
        .as_deref()
        .filter(|name| !name.is_empty())
        .ok_or_else(|| AppError::message("Invalid stock data received from upstream"))?;
    if quote.current == 0.0 {
        return Err(AppError::message("Invalid stock data received from upstream"));
    }

    let change_percent = quote.change_percent.unwrap_or(0.0);
    // The profile reports market cap in millions of dollars.
    let market_cap_usd = profile.market_capitalization.unwrap_or(0.0) * 1e6;
    let pe_ratio = financials.metric.and_then(|m| m.pe_normalized_annual);
    let pe_formatted = pe_ratio
        .map(|pe| format!("{:.1}", pe))
        .unwrap_or_else(|| "—".to_string());

    Ok(StockDetails {
        symbol: symbol.to_string(),
        company: company.to_string(),
        current_price: quote.current,
        change_percent,
        high: quote.high,
        low: quote.low,
        sector: profile.industry.unwrap_or_else(|| "Unknown".to_string()),
        market_cap_usd,
        pe_ratio,
        price_formatted: format_price(quote.current),
        change_formatted: format_change_percent(Some(change_percent)),
        market_cap_formatted: format_market_cap_value(market_cap_usd),
        pe_formatted,
    })
}
