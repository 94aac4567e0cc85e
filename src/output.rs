//! Terminal output formatters for alerts.
//!
//! Supports human-readable (with colors), JSON, NDJSON and CSV formats.

use std::io::{self, Write};

use chrono::{DateTime, Utc};

use crate::export;
use crate::models::{AlertRecord, AlertStatus, OutputAlert};
use crate::simulator::FeedEvent;
use crate::timefmt;

// ANSI color codes
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";

// Status colors, matching the map markers
const RED: &str = "\x1b[91m";
const GREEN: &str = "\x1b[92m";

const ICON_SOS: &str = "🆘";
const ICON_RESOLVED: &str = "✅";

/// Output format selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    /// Human-readable terminal output (default)
    #[default]
    Human,
    /// JSON array
    Json,
    /// Newline-delimited JSON (one object per line)
    Ndjson,
    /// Quoted CSV with a header row
    Csv,
}

impl std::str::FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "human" => Ok(Self::Human),
            "json" => Ok(Self::Json),
            "ndjson" => Ok(Self::Ndjson),
            "csv" => Ok(Self::Csv),
            _ => Err(format!(
                "unknown format: {s} (expected: human, json, ndjson, csv)"
            )),
        }
    }
}

fn status_color(status: AlertStatus) -> &'static str {
    match status {
        AlertStatus::Active => RED,
        AlertStatus::Resolved => GREEN,
    }
}

fn write_human_line<W: Write>(
    writer: &mut W,
    alert: &AlertRecord,
    now: DateTime<Utc>,
) -> io::Result<()> {
    let color = status_color(alert.status);
    let icon = if alert.is_active() { ICON_SOS } else { ICON_RESOLVED };
    let status = alert.status.as_str().to_uppercase();
    let age = timefmt::relative_time(alert.timestamp, now);
    let message = alert
        .message
        .as_deref()
        .map(|m| format!(" {DIM}· {m}{RESET}"))
        .unwrap_or_default();

    writeln!(
        writer,
        "{icon} {color}{BOLD}{status:8}{RESET} │ \
         {name:16} │ \
         {location:24} │ \
         {DIM}{age:>16}{RESET}{message}",
        name = alert.name,
        location = alert.location,
    )
}

/// Write alerts in human-readable format, colored by status.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_human<W: Write>(
    writer: &mut W,
    alerts: &[&AlertRecord],
    now: DateTime<Utc>,
) -> io::Result<()> {
    if alerts.is_empty() {
        return writeln!(writer, "{DIM}No SOS alerts match your current filters.{RESET}");
    }
    for alert in alerts {
        write_human_line(writer, alert, now)?;
    }
    Ok(())
}

/// Write alerts as a JSON array.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_json<W: Write>(
    writer: &mut W,
    alerts: &[&AlertRecord],
    now: DateTime<Utc>,
) -> io::Result<()> {
    let output: Vec<OutputAlert> = alerts.iter().map(|a| OutputAlert::new(a, now)).collect();
    let json = serde_json::to_string_pretty(&output)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(writer, "{json}")
}

/// Write alerts as newline-delimited JSON.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_ndjson<W: Write>(
    writer: &mut W,
    alerts: &[&AlertRecord],
    now: DateTime<Utc>,
) -> io::Result<()> {
    for alert in alerts {
        let json = serde_json::to_string(&OutputAlert::new(alert, now))
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        writeln!(writer, "{json}")?;
    }
    Ok(())
}

/// Write alerts in the specified format.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_alerts<W: Write>(
    writer: &mut W,
    alerts: &[&AlertRecord],
    format: Format,
    now: DateTime<Utc>,
) -> io::Result<()> {
    match format {
        Format::Human => write_human(writer, alerts, now),
        Format::Json => write_json(writer, alerts, now),
        Format::Ndjson => write_ndjson(writer, alerts, now),
        Format::Csv => export::write_csv(writer, alerts),
    }
}

/// Write one live feed event.
///
/// Human output gets a short prefix saying what happened; machine formats
/// emit the alert's current state as one record.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_feed_event<W: Write>(
    writer: &mut W,
    event: &FeedEvent,
    format: Format,
    now: DateTime<Utc>,
) -> io::Result<()> {
    let alert = event.alert();
    match format {
        Format::Human => {
            let prefix = match event {
                FeedEvent::Arrived(_) => format!("{RED}▲ NEW    {RESET}"),
                FeedEvent::Resolved(_) => format!("{GREEN}✓ RESOLVED{RESET}"),
            };
            write!(writer, "{prefix} ")?;
            write_human_line(writer, alert, now)
        }
        Format::Json | Format::Ndjson => write_ndjson(writer, &[alert], now),
        // Header-less rows so a stream can be appended to an export
        Format::Csv => {
            let csv = export::to_csv_string(&[alert]);
            match csv.lines().nth(1) {
                Some(row) => writeln!(writer, "{row}"),
                None => Ok(()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::models::fixtures::alert;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_format_parse() {
        assert_eq!("human".parse::<Format>().unwrap(), Format::Human);
        assert_eq!("json".parse::<Format>().unwrap(), Format::Json);
        assert_eq!("ndjson".parse::<Format>().unwrap(), Format::Ndjson);
        assert_eq!("CSV".parse::<Format>().unwrap(), Format::Csv);
        assert!("invalid".parse::<Format>().is_err());
    }

    #[test]
    fn test_human_output() {
        let a = alert(1, "Mumbai, Maharashtra", AlertStatus::Active, 10, now());
        let mut buf = Vec::new();
        write_human(&mut buf, &[&a], now()).unwrap();
        let text = String::from_utf8(buf).unwrap();

        assert!(text.contains("ACTIVE"));
        assert!(text.contains("Mumbai, Maharashtra"));
        assert!(text.contains("10 minutes ago"));
    }

    #[test]
    fn test_human_empty_state() {
        let mut buf = Vec::new();
        write_human(&mut buf, &[], now()).unwrap();
        assert!(String::from_utf8(buf).unwrap().contains("No SOS alerts"));
    }

    #[test]
    fn test_ndjson_one_line_per_alert() {
        let a = alert(1, "Mumbai, Maharashtra", AlertStatus::Active, 10, now());
        let b = alert(2, "Delhi, Delhi", AlertStatus::Resolved, 20, now());
        let mut buf = Vec::new();
        write_ndjson(&mut buf, &[&a, &b], now()).unwrap();
        let text = String::from_utf8(buf).unwrap();

        let lines: Vec<serde_json::Value> = text
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1]["status"], "resolved");
        assert_eq!(lines[0]["age"], "10 minutes ago");
    }

    #[test]
    fn test_feed_event_csv_has_no_header() {
        let a = alert(1, "Mumbai, Maharashtra", AlertStatus::Active, 0, now());
        let mut buf = Vec::new();
        write_feed_event(&mut buf, &FeedEvent::Arrived(a), Format::Csv, now()).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text.lines().count(), 1);
        assert!(!text.contains("User Name"));
    }
}
