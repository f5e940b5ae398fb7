use chrono::Utc;

/// USD price with thousands separators, e.g. `$1,234.56`.
pub fn format_price(price: f64) -> String {
    if !price.is_finite() {
        return "N/A".to_string();
    }
    let negative = price < 0.0;
    let cents = (price.abs() * 100.0).round() as u64;
    let dollars = group_thousands(cents / 100);
    let sign = if negative { "-" } else { "" };
    format!("{}${}.{:02}", sign, dollars, cents % 100)
}

/// Signed percentage with two decimals; zero or missing renders as empty.
pub fn format_change_percent(change_percent: Option<f64>) -> String {
    match change_percent {
        Some(value) if value != 0.0 && value.is_finite() => {
            let sign = if value > 0.0 { "+" } else { "" };
            format!("{}{:.2}%", sign, value)
        }
        _ => String::new(),
    }
}

/// Compact market-cap rendering: `$3.10T`, `$900.00B`, `$25.00M`, or the full
/// dollar amount below one million. Non-positive input renders as `N/A`.
pub fn format_market_cap_value(market_cap_usd: f64) -> String {
    if !market_cap_usd.is_finite() || market_cap_usd <= 0.0 {
        return "N/A".to_string();
    }
    if market_cap_usd >= 1e12 {
        return format!("${:.2}T", market_cap_usd / 1e12);
    }
    if market_cap_usd >= 1e9 {
        return format!("${:.2}B", market_cap_usd / 1e9);
    }
    if market_cap_usd >= 1e6 {
        return format!("${:.2}M", market_cap_usd / 1e6);
    }
    format!("${:.2}", market_cap_usd)
}

/// Coarse age of a unix timestamp: days, then hours, then minutes.
pub fn format_time_ago(unix_seconds: i64) -> String {
    let diff_minutes = (Utc::now().timestamp() - unix_seconds).max(0) / 60;
    let diff_hours = diff_minutes / 60;

    if diff_hours > 24 {
        let days = diff_hours / 24;
        format!("{} day{} ago", days, plural(days))
    } else if diff_hours >= 1 {
        format!("{} hour{} ago", diff_hours, plural(diff_hours))
    } else {
        format!("{} minute{} ago", diff_minutes, plural(diff_minutes))
    }
}

fn plural(count: i64) -> &'static str {
    if count > 1 {
        "s"
    } else {
        ""
    }
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}
