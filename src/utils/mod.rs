pub mod format;
pub mod text;
pub mod time;

pub use format::{
    format_change_percent, format_market_cap_value, format_price, format_time_ago,
};
pub use text::{html_to_plain_text, truncate_chars};
pub use time::{date_range, past_date, today_string};
