use std::collections::HashMap;

use serde::Serialize;

/// Intraday price snapshot for one instrument, as returned by the quote
/// endpoint. Supplied by the caller; the calculator never fetches.
#[derive(Debug, Clone, Copy)]
pub struct IntradayQuote {
    pub close: f64,
    pub high: f64,
    pub low: f64,
}

/// One tracked instrument with the sector and price data the risk blend needs.
#[derive(Debug, Clone)]
pub struct TrackedInstrument {
    pub symbol: String,
    pub sector: String,
    pub current_data: Option<IntradayQuote>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Serialize)]
pub struct RiskResult {
    pub score: u8,
    pub level: RiskLevel,
    pub volatility: f64,
}

/// Derives a 0-100 portfolio risk score from normalized intraday volatility
/// (70%) and sector concentration (30%). Pure and total: malformed price data
/// contributes zero volatility instead of failing, and the whole thing is
/// recomputed from scratch on every call.
pub fn calculate_portfolio_risk(instruments: &[TrackedInstrument]) -> RiskResult {
    if instruments.is_empty() {
        return RiskResult {
            score: 0,
            level: RiskLevel::Low,
            volatility: 0.0,
        };
    }

    let total: f64 = instruments.iter().map(instrument_volatility).sum();
    // Zero contributions stay in the denominator; bad data drags the average
    // down rather than being excluded.
    let avg_volatility = total / instruments.len() as f64;
    let concentration = concentration_risk(instruments);

    let raw = (avg_volatility * 0.7 + concentration * 0.3).clamp(0.0, 1.0);
    let score = (raw * 100.0).round() as u8;

    RiskResult {
        score,
        level: risk_level(score),
        volatility: avg_volatility,
    }
}

fn instrument_volatility(instrument: &TrackedInstrument) -> f64 {
    let Some(quote) = instrument.current_data else {
        return 0.0;
    };
    if !is_valid_price(quote.close) || !is_valid_price(quote.high) || !is_valid_price(quote.low) {
        return 0.0;
    }

    let normalized_range = (quote.high - quote.low) / quote.close.abs();
    normalized_range * sector_multiplier(&instrument.sector)
}

fn is_valid_price(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

/// Collapse the provider's raw industry labels onto the five scored sectors.
fn sector_category(sector: &str) -> &str {
    match sector {
        "Banking" | "Financial Services" | "Banks" => "Finance",
        "Software" | "Semiconductors" => "Technology",
        "Oil & Gas E&P" | "Oil & Gas Integrated" => "Energy",
        "Pharmaceuticals" | "Biotechnology" => "Healthcare",
        "Retail" => "Consumer",
        other => other,
    }
}

fn sector_multiplier(sector: &str) -> f64 {
    match sector_category(sector) {
        "Technology" => 1.3,
        "Healthcare" => 1.1,
        "Energy" => 1.5,
        "Finance" => 1.2,
        "Consumer" => 0.9,
        _ => 1.0,
    }
}

fn concentration_risk(instruments: &[TrackedInstrument]) -> f64 {
    // Too few holdings to judge the distribution: assume concentrated.
    if instruments.len() < 3 {
        return 0.8;
    }
    // Past ten holdings, sheer count counts as diversification.
    if instruments.len() > 10 {
        return 0.2;
    }

    let mut sector_counts: HashMap<&str, usize> = HashMap::new();
    for instrument in instruments {
        *sector_counts.entry(instrument.sector.as_str()).or_insert(0) += 1;
    }

    let total = instruments.len() as f64;
    let hhi: f64 = sector_counts
        .values()
        .map(|&count| (count as f64 / total).powi(2))
        .sum();

    (hhi * 2.0).clamp(0.0, 1.0)
}

fn risk_level(score: u8) -> RiskLevel {
    if score < 30 {
        RiskLevel::Low
    } else if score < 60 {
        RiskLevel::Medium
    } else {
        RiskLevel::High
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instrument(symbol: &str, sector: &str, quote: Option<IntradayQuote>) -> TrackedInstrument {
        TrackedInstrument {
            symbol: symbol.to_string(),
            sector: sector.to_string(),
            current_data: quote,
        }
    }

    fn quote(close: f64, high: f64, low: f64) -> Option<IntradayQuote> {
        Some(IntradayQuote { close, high, low })
    }

    #[test]
    fn empty_portfolio_scores_zero() {
        let result = calculate_portfolio_risk(&[]);
        assert_eq!(result.score, 0);
        assert_eq!(result.level, RiskLevel::Low);
        assert_eq!(result.volatility, 0.0);
    }

    #[test]
    fn two_technology_instruments_match_the_worked_example() {
        // Per instrument: (102 - 98) / 100 * 1.3 = 0.052; average 0.052.
        // Under 3 instruments forces concentration to 0.8.
        // 0.7 * 0.052 + 0.3 * 0.8 = 0.2764 -> rounds to 28.
        let portfolio = [
            instrument("AAPL", "Technology", quote(100.0, 102.0, 98.0)),
            instrument("MSFT", "Technology", quote(100.0, 102.0, 98.0)),
        ];
        let result = calculate_portfolio_risk(&portfolio);
        assert_eq!(result.score, 28);
        assert_eq!(result.level, RiskLevel::Low);
        assert!((result.volatility - 0.052).abs() < 1e-9);
    }

    #[test]
    fn missing_quote_contributes_zero_volatility() {
        // Only the small-sample concentration override is left:
        // 0.7 * 0 + 0.3 * 0.8 = 0.24 -> 24.
        let portfolio = [instrument("AAPL", "Technology", None)];
        let result = calculate_portfolio_risk(&portfolio);
        assert_eq!(result.score, 24);
        assert_eq!(result.level, RiskLevel::Low);
        assert_eq!(result.volatility, 0.0);
    }

    #[test]
    fn non_positive_and_non_finite_prices_are_zero_signal() {
        let portfolio = [
            instrument("A", "Energy", quote(0.0, 10.0, 9.0)),
            instrument("B", "Energy", quote(10.0, f64::NAN, 9.0)),
            instrument("C", "Energy", quote(10.0, 11.0, -1.0)),
        ];
        let result = calculate_portfolio_risk(&portfolio);
        assert_eq!(result.volatility, 0.0);
    }

    #[test]
    fn single_sector_portfolio_hits_the_medium_boundary() {
        // Four instruments, one sector: HHI = 1.0, doubled and clamped to 1.0.
        // No volatility signal -> raw = 0.3 -> score 30, the LOW/MEDIUM edge.
        let portfolio = [
            instrument("A", "Finance", None),
            instrument("B", "Finance", None),
            instrument("C", "Finance", None),
            instrument("D", "Finance", None),
        ];
        let result = calculate_portfolio_risk(&portfolio);
        assert_eq!(result.score, 30);
        assert_eq!(result.level, RiskLevel::Medium);
    }

    #[test]
    fn large_portfolio_forces_low_concentration() {
        // Eleven instruments in the same sector would max the HHI, but the
        // count override wins: 0.3 * 0.2 = 0.06 -> 6.
        let portfolio: Vec<TrackedInstrument> = (0..11)
            .map(|i| instrument(&format!("S{}", i), "Technology", None))
            .collect();
        let result = calculate_portfolio_risk(&portfolio);
        assert_eq!(result.score, 6);
        assert_eq!(result.level, RiskLevel::Low);
    }

    #[test]
    fn mixed_sectors_use_the_hhi() {
        // Four instruments over two sectors evenly: HHI = 0.5, doubled = 1.0.
        // Three sectors 2/1/1: HHI = 0.375, doubled = 0.75.
        let even = [
            instrument("A", "Finance", None),
            instrument("B", "Finance", None),
            instrument("C", "Energy", None),
            instrument("D", "Energy", None),
        ];
        let spread = [
            instrument("A", "Finance", None),
            instrument("B", "Finance", None),
            instrument("C", "Energy", None),
            instrument("D", "Consumer", None),
        ];
        assert!(
            calculate_portfolio_risk(&spread).score < calculate_portfolio_risk(&even).score,
            "wider sector spread must score lower"
        );
    }

    #[test]
    fn industry_labels_map_onto_scored_sectors() {
        let banking = [
            instrument("JPM", "Banking", quote(100.0, 110.0, 100.0)),
            instrument("BAC", "Banking", quote(100.0, 110.0, 100.0)),
            instrument("C", "Banking", quote(100.0, 110.0, 100.0)),
        ];
        let finance = [
            instrument("JPM", "Finance", quote(100.0, 110.0, 100.0)),
            instrument("BAC", "Finance", quote(100.0, 110.0, 100.0)),
            instrument("C", "Finance", quote(100.0, 110.0, 100.0)),
        ];
        assert_eq!(
            calculate_portfolio_risk(&banking).score,
            calculate_portfolio_risk(&finance).score
        );
    }

    #[test]
    fn unknown_sector_uses_the_default_multiplier() {
        let portfolio = [instrument("X", "Shipping", quote(100.0, 110.0, 100.0))];
        let result = calculate_portfolio_risk(&portfolio);
        // (110 - 100) / 100 * 1.0 = 0.1
        assert!((result.volatility - 0.1).abs() < 1e-9);
    }

    #[test]
    fn high_volatility_concentrated_portfolio_scores_high() {
        let portfolio = [
            instrument("A", "Energy", quote(10.0, 18.0, 10.0)),
            instrument("B", "Energy", quote(10.0, 18.0, 10.0)),
        ];
        // Per instrument: 0.8 * 1.5 = 1.2; avg 1.2; raw = 0.84 + 0.24,
        // clamped to 1.0 -> 100.
        let result = calculate_portfolio_risk(&portfolio);
        assert_eq!(result.score, 100);
        assert_eq!(result.level, RiskLevel::High);
    }
}
