/// Text processing utilities
pub mod text {
    /// Collapse runs of whitespace (including the line breaks arXiv puts in titles) into single spaces
    pub fn normalize_whitespace(text: &str) -> String {
        text.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    /// Truncate to at most `max_chars` characters, appending `...` when cut
    pub fn truncate_chars(text: &str, max_chars: usize) -> String {
        match text.char_indices().nth(max_chars) {
            Some((idx, _)) => format!("{}...", &text[..idx]),
            None => text.to_string(),
        }
    }
}

/// Date utilities
pub mod time {
    use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
    use interfaces::defs::PUBLISHED_FORMAT;

    /// Start of the lookback window for a fetch made at `now`
    pub fn cutoff(now: DateTime<Utc>, days_back: i64) -> DateTime<Utc> {
        now - Duration::days(days_back)
    }

    /// Calendar-day representation stored in `Paper::published`
    pub fn to_published(at: DateTime<Utc>) -> String {
        at.format(PUBLISHED_FORMAT).to_string()
    }

    /// `YYYY-MM-DD` to an RFC 2822 timestamp at midnight UTC
    pub fn published_to_rfc2822(published: &str) -> Option<String> {
        let date = NaiveDate::parse_from_str(published.trim(), PUBLISHED_FORMAT).ok()?;
        let midnight = date.and_time(NaiveTime::MIN);
        Some(Utc.from_utc_datetime(&midnight).to_rfc2822())
    }
}
