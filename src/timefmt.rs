//! Relative time formatting for timestamps
//!
//! Pure helpers over an injected `now`, so rendering is deterministic.

use chrono::{DateTime, Datelike, Utc};

/// Compact age of a message instant: "now", minutes, hours, days, or a
/// short date once it is older than a week
pub fn format_message_time(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(timestamp);

    if elapsed.num_minutes() < 1 {
        return "now".to_string();
    }
    if elapsed.num_hours() < 1 {
        return format!("{}m", elapsed.num_minutes());
    }
    if elapsed.num_days() < 1 {
        return format!("{}h", elapsed.num_hours());
    }
    if elapsed.num_days() < 7 {
        return format!("{}d", elapsed.num_days());
    }

    timestamp.format("%d/%m").to_string()
}

/// Conversation-list timestamp: clock time today, "yesterday", the weekday
/// within a week, a short date otherwise
pub fn format_timestamp(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let days_apart = now.num_days_from_ce() - timestamp.num_days_from_ce();

    match days_apart {
        0 => timestamp.format("%H:%M").to_string(),
        1 => "yesterday".to_string(),
        2..=6 => timestamp.format("%A").to_string(),
        _ => timestamp.format("%d/%m/%y").to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(raw: &str) -> DateTime<Utc> {
        raw.parse().expect("Failed to parse test timestamp")
    }

    #[test]
    fn test_message_time_buckets() {
        let now = at("2024-03-07T12:00:00Z");

        assert_eq!(format_message_time(at("2024-03-07T11:59:30Z"), now), "now");
        assert_eq!(format_message_time(at("2024-03-07T11:45:00Z"), now), "15m");
        assert_eq!(format_message_time(at("2024-03-07T09:00:00Z"), now), "3h");
        assert_eq!(format_message_time(at("2024-03-05T12:00:00Z"), now), "2d");
        assert_eq!(format_message_time(at("2024-02-20T12:00:00Z"), now), "20/02");
    }

    #[test]
    fn test_timestamp_today_shows_clock_time() {
        let now = at("2024-03-07T18:00:00Z");
        assert_eq!(format_timestamp(at("2024-03-07T09:05:00Z"), now), "09:05");
    }

    #[test]
    fn test_timestamp_yesterday_and_weekday() {
        let now = at("2024-03-07T08:00:00Z");

        assert_eq!(format_timestamp(at("2024-03-06T23:00:00Z"), now), "yesterday");
        // 2024-03-04 was a Monday
        assert_eq!(format_timestamp(at("2024-03-04T10:00:00Z"), now), "Monday");
    }

    #[test]
    fn test_timestamp_older_than_a_week_shows_date() {
        let now = at("2024-03-07T08:00:00Z");
        assert_eq!(format_timestamp(at("2024-02-01T10:00:00Z"), now), "01/02/24");
    }
}
