//! Time and coordinate formatting shared by every renderer.

use chrono::{DateTime, Local, Utc};

const MINUTE_MS: i64 = 60_000;
const HOUR_MS: i64 = 3_600_000;
const DAY_MS: i64 = 86_400_000;

/// Relative time of `timestamp` as seen from `now`.
#[must_use]
pub fn relative_time(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(timestamp).num_milliseconds();
    format_elapsed(elapsed, timestamp)
}

/// Format an elapsed duration in milliseconds.
///
/// Under a minute is "Just now", under an hour counts minutes, under a day
/// counts hours, anything older falls back to the absolute local time of
/// `timestamp`. Alerts from the future (clock skew) read as "Just now".
#[must_use]
pub fn format_elapsed(elapsed_ms: i64, timestamp: DateTime<Utc>) -> String {
    if elapsed_ms < MINUTE_MS {
        "Just now".to_string()
    } else if elapsed_ms < HOUR_MS {
        plural(elapsed_ms / MINUTE_MS, "minute")
    } else if elapsed_ms < DAY_MS {
        plural(elapsed_ms / HOUR_MS, "hour")
    } else {
        localized(timestamp)
    }
}

fn plural(n: i64, unit: &str) -> String {
    let s = if n > 1 { "s" } else { "" };
    format!("{n} {unit}{s} ago")
}

/// Absolute date and time in the local timezone.
#[must_use]
pub fn localized(timestamp: DateTime<Utc>) -> String {
    timestamp
        .with_timezone(&Local)
        .format("%-d/%-m/%Y, %-I:%M:%S %p")
        .to_string()
}

/// Coordinates at six decimal places, as shown in the detail modal.
#[must_use]
pub fn coordinates(latitude: f64, longitude: f64) -> String {
    format!("{latitude:.6}, {longitude:.6}")
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_just_now() {
        assert_eq!(format_elapsed(30_000, ts()), "Just now");
        assert_eq!(format_elapsed(0, ts()), "Just now");
        assert_eq!(format_elapsed(-5_000, ts()), "Just now");
    }

    #[test]
    fn test_minutes() {
        assert_eq!(format_elapsed(60_000, ts()), "1 minute ago");
        assert_eq!(format_elapsed(150_000, ts()), "2 minutes ago");
        assert_eq!(format_elapsed(3_599_999, ts()), "59 minutes ago");
    }

    #[test]
    fn test_hours() {
        assert_eq!(format_elapsed(3_600_000, ts()), "1 hour ago");
        assert_eq!(format_elapsed(7_200_000, ts()), "2 hours ago");
    }

    #[test]
    fn test_absolute_after_a_day() {
        let formatted = format_elapsed(90_000_000, ts());
        assert!(!formatted.ends_with("ago"));
        assert!(formatted.contains("2025"));
        assert_eq!(formatted, localized(ts()));
    }

    #[test]
    fn test_relative_time_from_clock() {
        let now = ts() + Duration::minutes(10);
        assert_eq!(relative_time(ts(), now), "10 minutes ago");
    }

    #[test]
    fn test_coordinates_six_places() {
        assert_eq!(coordinates(20.5937, 78.9629), "20.593700, 78.962900");
    }
}
