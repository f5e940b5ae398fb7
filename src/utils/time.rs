use chrono::{Duration, Utc};

/// Today's date as `YYYY-MM-DD` (UTC).
pub fn today_string() -> String {
    Utc::now().format("%Y-%m-%d").to_string()
}

/// The date `days` days ago as `YYYY-MM-DD` (UTC).
pub fn past_date(days: i64) -> String {
    (Utc::now() - Duration::days(days)).format("%Y-%m-%d").to_string()
}

/// `(from, to)` window ending today, used for company-news requests.
pub fn date_range(days: i64) -> (String, String) {
    (past_date(days), today_string())
}
