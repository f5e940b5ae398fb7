use futures::future::join_all;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::fetch::{MarketDataGateway, ProviderEndpoints};
use crate::utils::text::truncate_chars;
use crate::utils::time::date_range;

/// Articles per digest, regardless of watchlist size.
pub const DIGEST_TARGET: usize = 6;

const COMPANY_NEWS_WINDOW_DAYS: i64 = 7;
const MAX_ARTICLES_PER_FETCH: usize = 10;
const COMPANY_SUMMARY_CHARS: usize = 200;
const GENERAL_SUMMARY_CHARS: usize = 150;

/// News payload as the provider sends it; everything optional because the
/// feed routinely omits fields.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawNewsArticle {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub headline: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub datetime: Option<i64>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub related: Option<String>,
}

/// A validated, display-ready article.
#[derive(Debug, Clone, Serialize)]
pub struct NewsArticle {
    pub id: i64,
    pub headline: String,
    pub summary: String,
    pub source: String,
    pub url: String,
    pub datetime: i64,
    pub image: String,
    pub category: String,
    pub related: String,
}

/// An article is usable only with a headline, summary, link and timestamp.
pub fn validate_article(article: &RawNewsArticle) -> bool {
    let filled = |field: &Option<String>| field.as_deref().is_some_and(|s| !s.is_empty());
    filled(&article.headline)
        && filled(&article.summary)
        && filled(&article.url)
        && matches!(article.datetime, Some(ts) if ts > 0)
}

/// Normalizes a validated raw article: trims, truncates the summary (company
/// news keeps a little more text) and fills the fallback fields.
pub fn format_article(
    article: &RawNewsArticle,
    is_company_news: bool,
    symbol: Option<&str>,
    index: usize,
) -> NewsArticle {
    let datetime = article.datetime.unwrap_or(0);
    let id = match article.id {
        Some(id) => id + index as i64,
        None => datetime + index as i64,
    };

    let summary_limit = if is_company_news {
        COMPANY_SUMMARY_CHARS
    } else {
        GENERAL_SUMMARY_CHARS
    };
    let summary = article.summary.as_deref().unwrap_or("").trim();

    NewsArticle {
        id,
        headline: article.headline.as_deref().unwrap_or("").trim().to_string(),
        summary: format!("{}...", truncate_chars(summary, summary_limit)),
        source: article.source.clone().unwrap_or_else(|| {
            if is_company_news {
                "Company News".to_string()
            } else {
                "Market News".to_string()
            }
        }),
        url: article.url.clone().unwrap_or_default(),
        datetime,
        image: article.image.clone().unwrap_or_default(),
        category: if is_company_news {
            "company".to_string()
        } else {
            article.category.clone().unwrap_or_else(|| "general".to_string())
        },
        related: if is_company_news {
            symbol.unwrap_or("").to_string()
        } else {
            article.related.clone().unwrap_or_default()
        },
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewsDistribution {
    pub items_per_symbol: usize,
    pub target_news_count: usize,
}

/// Per-symbol article quota for a watchlist of `symbol_count` symbols: few
/// symbols get more articles each, many symbols get one each.
pub fn news_distribution(symbol_count: usize) -> NewsDistribution {
    let items_per_symbol = match symbol_count {
        0..=2 => 3,
        3 => 2,
        _ => 1,
    };
    NewsDistribution {
        items_per_symbol,
        target_news_count: DIGEST_TARGET,
    }
}

/// Balanced selection across per-symbol article lists: a minimum share from
/// every symbol first, then round-robin interleaving until `target` is met.
pub fn distribute_articles(per_symbol: Vec<Vec<NewsArticle>>, target: usize) -> Vec<NewsArticle> {
    if per_symbol.is_empty() || target == 0 {
        return Vec::new();
    }

    let min_per_symbol = (target / per_symbol.len()).min(2);
    let mut selected: Vec<NewsArticle> = Vec::with_capacity(target);
    for articles in &per_symbol {
        selected.extend(articles.iter().take(min_per_symbol).cloned());
    }

    let max_len = per_symbol.iter().map(Vec::len).max().unwrap_or(0);
    'filling: for index in min_per_symbol..max_len {
        for articles in &per_symbol {
            if selected.len() >= target {
                break 'filling;
            }
            if let Some(article) = articles.get(index) {
                selected.push(article.clone());
            }
        }
    }

    selected.truncate(target);
    selected
}

/// Company news for `symbol` over the past week, or general market news when
/// no symbol is given. Returns at most ten validated articles.
pub async fn get_news(
    gateway: &MarketDataGateway,
    endpoints: &ProviderEndpoints,
    symbol: Option<&str>,
) -> Result<Vec<NewsArticle>> {
    let url = match symbol {
        Some(symbol) => {
            let (from, to) = date_range(COMPANY_NEWS_WINDOW_DAYS);
            endpoints.company_news_url(symbol, &from, &to)?
        }
        None => endpoints.market_news_url()?,
    };

    let payload = gateway.fetch_json(&url).await?;
    // A non-array payload (error object, empty body) simply yields no news.
    let raw: Vec<RawNewsArticle> = serde_json::from_value(payload).unwrap_or_default();

    let is_company_news = symbol.is_some();
    Ok(raw
        .iter()
        .filter(|article| validate_article(article))
        .take(MAX_ARTICLES_PER_FETCH)
        .enumerate()
        .map(|(index, article)| format_article(article, is_company_news, symbol, index))
        .collect())
}

/// Digest for a watchlist: per-symbol news fanned out through the gateway,
/// balanced across symbols, falling back to general market news when the
/// watchlist yields nothing.
pub async fn watchlist_digest(
    gateway: &MarketDataGateway,
    endpoints: &ProviderEndpoints,
    symbols: &[String],
) -> Result<Vec<NewsArticle>> {
    if !symbols.is_empty() {
        let fetches = symbols
            .iter()
            .map(|symbol| get_news(gateway, endpoints, Some(symbol)));
        let per_symbol: Vec<Vec<NewsArticle>> = join_all(fetches)
            .await
            .into_iter()
            .zip(symbols)
            .filter_map(|(result, symbol)| match result {
                Ok(articles) => Some(articles),
                Err(err) => {
                    warn!("news fetch for {} failed: {}", symbol, err);
                    None
                }
            })
            .collect();

        let digest = distribute_articles(per_symbol, DIGEST_TARGET);
        if !digest.is_empty() {
            return Ok(digest);
        }
    }

    let general = get_news(gateway, endpoints, None).await?;
    Ok(general.into_iter().take(DIGEST_TARGET).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(headline: &str, summary: &str) -> RawNewsArticle {
        RawNewsArticle {
            id: Some(100),
            headline: Some(headline.to_string()),
            summary: Some(summary.to_string()),
            source: Some("Newswire".to_string()),
            url: Some("https://news.example.com/1".to_string()),
            datetime: Some(1_700_000_000),
            ..RawNewsArticle::default()
        }
    }

    fn article(id: i64) -> NewsArticle {
        NewsArticle {
            id,
            headline: format!("headline {}", id),
            summary: "s...".to_string(),
            source: "Newswire".to_string(),
            url: "https://news.example.com".to_string(),
            datetime: 1_700_000_000,
            image: String::new(),
            category: "general".to_string(),
            related: String::new(),
        }
    }

    #[test]
    fn articles_missing_required_fields_are_invalid() {
        assert!(validate_article(&raw("h", "s")));

        let mut no_headline = raw("h", "s");
        no_headline.headline = None;
        assert!(!validate_article(&no_headline));

        let mut empty_summary = raw("h", "");
        empty_summary.summary = Some(String::new());
        assert!(!validate_article(&empty_summary));

        let mut zero_datetime = raw("h", "s");
        zero_datetime.datetime = Some(0);
        assert!(!validate_article(&zero_datetime));
    }

    #[test]
    fn formatting_truncates_and_fills_fallbacks() {
        let long_summary = "x".repeat(400);
        let formatted = format_article(&raw(" Fed holds rates ", &long_summary), true, Some("AAPL"), 0);

        assert_eq!(formatted.headline, "Fed holds rates");
        assert_eq!(formatted.summary.chars().count(), 203); // 200 + "..."
        assert_eq!(formatted.category, "company");
        assert_eq!(formatted.related, "AAPL");

        let general = format_article(&raw("h", &long_summary), false, None, 1);
        assert_eq!(general.summary.chars().count(), 153);
        assert_eq!(general.category, "general");
    }

    #[test]
    fn missing_source_depends_on_article_kind() {
        let mut no_source = raw("h", "s");
        no_source.source = None;
        assert_eq!(
            format_article(&no_source, true, Some("AAPL"), 0).source,
            "Company News"
        );
        assert_eq!(format_article(&no_source, false, None, 0).source, "Market News");
    }

    #[test]
    fn distribution_quota_shrinks_with_watchlist_size() {
        assert_eq!(news_distribution(1).items_per_symbol, 3);
        assert_eq!(news_distribution(3).items_per_symbol, 2);
        assert_eq!(news_distribution(8).items_per_symbol, 1);
        assert_eq!(news_distribution(8).target_news_count, DIGEST_TARGET);
    }

    #[test]
    fn distribute_balances_across_symbols() {
        let per_symbol = vec![
            vec![article(1), article(2), article(3)],
            vec![article(4), article(5), article(6)],
            vec![article(7), article(8), article(9)],
        ];
        let digest = distribute_articles(per_symbol, DIGEST_TARGET);

        let ids: Vec<i64> = digest.iter().map(|a| a.id).collect();
        // Two from each symbol before any third article is considered.
        assert_eq!(ids, vec![1, 2, 4, 5, 7, 8]);
    }

    #[test]
    fn distribute_interleaves_when_one_symbol_dominates() {
        let per_symbol = vec![
            vec![article(1), article(2), article(3), article(4), article(5)],
            vec![article(6)],
        ];
        let digest = distribute_articles(per_symbol, DIGEST_TARGET);

        let ids: Vec<i64> = digest.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![1, 2, 6, 3, 4, 5]);
    }

    #[test]
    fn distribute_handles_empty_input() {
        assert!(distribute_articles(Vec::new(), DIGEST_TARGET).is_empty());
        assert!(distribute_articles(vec![Vec::new()], 0).is_empty());
    }
}
