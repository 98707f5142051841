// src/render/format.rs
// =============================================================================
// Small display helpers for cards: relative dates, compact counts and
// description truncation.
// =============================================================================

use chrono::{DateTime, Utc};

/// Descriptions longer than this are cut on cards.
pub const DESCRIPTION_LIMIT: usize = 120;

// Formats a date relative to now
//
// Examples:
//   same day       -> "Today"
//   3 days ago     -> "3 days ago"
//   45 days ago    -> "1 month ago"
pub fn relative_time(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let days = (now - then).num_days().unsigned_abs();

    match days {
        0 => "Today".to_string(),
        1 => "Yesterday".to_string(),
        2..=6 => plural(days, "day"),
        7..=29 => plural(days / 7, "week"),
        30..=364 => plural(days / 30, "month"),
        _ => plural(days / 365, "year"),
    }
}

fn plural(count: u64, unit: &str) -> String {
    if count == 1 {
        format!("1 {} ago", unit)
    } else {
        format!("{} {}s ago", count, unit)
    }
}

/// 999 -> "999", 1500 -> "1.5k", 2000000 -> "2m"
pub fn compact_number(value: u64) -> String {
    let (scaled, suffix) = match value {
        0..=999 => return value.to_string(),
        1_000..=999_999 => (value as f64 / 1_000.0, "k"),
        _ => (value as f64 / 1_000_000.0, "m"),
    };

    let text = format!("{:.1}", scaled);
    format!("{}{}", text.trim_end_matches(".0"), suffix)
}

/// Cuts `text` to `limit` characters, adding "..." when something was cut.
pub fn truncate(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let cut: String = text.chars().take(limit).collect();
    format!("{}...", cut.trim_end())
}
