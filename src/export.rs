//! CSV export of the filtered alert history.
//!
//! Every cell is double-quoted; embedded quotes are doubled.

use std::io::{self, Write};

use chrono::{DateTime, Local, Utc};

use crate::models::AlertRecord;
use crate::timefmt;

/// Column headers, in output order.
pub const HEADERS: [&str; 7] = [
    "User Name",
    "Location",
    "Time of Alert",
    "Status",
    "Message",
    "Latitude",
    "Longitude",
];

/// Download filename stamped with the local date of `now`.
#[must_use]
pub fn filename(now: DateTime<Utc>) -> String {
    format!(
        "rakshita-alerts-{}.csv",
        now.with_timezone(&Local).format("%Y-%m-%d")
    )
}

fn quote(cell: &str) -> String {
    format!("\"{}\"", cell.replace('"', "\"\""))
}

fn write_row<W: Write>(writer: &mut W, cells: &[String]) -> io::Result<()> {
    let line: Vec<String> = cells.iter().map(|c| quote(c)).collect();
    writeln!(writer, "{}", line.join(","))
}

/// Write `alerts` as CSV with a header row.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_csv<W: Write>(writer: &mut W, alerts: &[&AlertRecord]) -> io::Result<()> {
    let headers: Vec<String> = HEADERS.iter().map(|h| (*h).to_string()).collect();
    write_row(writer, &headers)?;

    for alert in alerts {
        write_row(
            writer,
            &[
                alert.name.clone(),
                alert.location.clone(),
                timefmt::localized(alert.timestamp),
                alert.status.to_string(),
                alert.message.clone().unwrap_or_default(),
                alert.latitude.to_string(),
                alert.longitude.to_string(),
            ],
        )?;
    }
    Ok(())
}

/// Render `alerts` as a CSV string.
#[must_use]
pub fn to_csv_string(alerts: &[&AlertRecord]) -> String {
    let mut buf = Vec::new();
    // Writing into a Vec cannot fail
    let _ = write_csv(&mut buf, alerts);
    String::from_utf8_lossy(&buf).into_owned()
}
