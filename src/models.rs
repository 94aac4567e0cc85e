//! Data models for SOS alerts.
//!
//! `AlertRecord` is the only real entity: one report with a location,
//! a lifecycle status and an optional note.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::RakshitaError;

/// Opaque alert identifier, unique within a store and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlertId(pub u64);

impl fmt::Display for AlertId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for AlertId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(Self)
            .map_err(|e| format!("invalid alert id '{s}': {e}"))
    }
}

/// Lifecycle state of an alert. `Resolved` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    Active,
    Resolved,
}

impl AlertStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Resolved => "resolved",
        }
    }
}

impl fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AlertStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "resolved" => Ok(Self::Resolved),
            _ => Err(format!("unknown status: {s} (expected: active, resolved)")),
        }
    }
}

/// The two alert pages. Each has its own seed set, search scope, sort order
/// and feed schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageKind {
    /// Live map with a side list of alerts
    LiveMap,
    /// Paginated table of recent alerts
    #[default]
    History,
}

impl PageKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LiveMap => "map",
            Self::History => "history",
        }
    }
}

impl std::str::FromStr for PageKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "map" | "live" => Ok(Self::LiveMap),
            "history" => Ok(Self::History),
            _ => Err(format!("unknown page kind: {s} (expected: map, history)")),
        }
    }
}

/// A single SOS alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRecord {
    /// Unique alert ID (stable key for markers and detail lookups)
    pub id: AlertId,

    /// Reporter display name
    pub name: String,

    /// Latitude in degrees
    pub latitude: f64,

    /// Longitude in degrees
    pub longitude: f64,

    /// Human-readable place
    pub location: String,

    /// When the alert was raised
    pub timestamp: DateTime<Utc>,

    pub status: AlertStatus,

    /// Optional note. `None` and `Some("")` are different things.
    pub message: Option<String>,
}

impl AlertRecord {
    /// Validate the record structure.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAlert` if the reporter name is blank or a coordinate
    /// is out of range.
    pub fn validate(&self) -> Result<(), RakshitaError> {
        if self.name.trim().is_empty() {
            return Err(RakshitaError::InvalidAlert(format!(
                "alert {} has an empty reporter name",
                self.id
            )));
        }
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(RakshitaError::InvalidAlert(format!(
                "latitude {} out of range [-90, 90]",
                self.latitude
            )));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(RakshitaError::InvalidAlert(format!(
                "longitude {} out of range [-180, 180]",
                self.longitude
            )));
        }
        Ok(())
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == AlertStatus::Active
    }

    /// Move an active alert to `Resolved`.
    ///
    /// Returns `false` (and changes nothing) if the alert was already resolved.
    pub fn resolve(&mut self) -> bool {
        if self.is_active() {
            self.status = AlertStatus::Resolved;
            true
        } else {
            false
        }
    }

    /// Milliseconds elapsed between the alert and `now`.
    #[must_use]
    pub fn age_ms(&self, now: DateTime<Utc>) -> i64 {
        now.signed_duration_since(self.timestamp).num_milliseconds()
    }
}

/// Simplified alert for output.
///
/// This is the normalized structure we emit in JSON/NDJSON output.
#[derive(Debug, Clone, Serialize)]
pub struct OutputAlert {
    pub id: AlertId,
    pub time: String,
    pub age: String,
    pub name: String,
    pub location: String,
    pub latitude: f64,
    pub longitude: f64,
    pub status: AlertStatus,
    pub message: Option<String>,
}

impl OutputAlert {
    #[must_use]
    pub fn new(alert: &AlertRecord, now: DateTime<Utc>) -> Self {
        Self {
            id: alert.id,
            time: alert.timestamp.to_rfc3339(),
            age: crate::timefmt::relative_time(alert.timestamp, now),
            name: alert.name.clone(),
            location: alert.location.clone(),
            latitude: alert.latitude,
            longitude: alert.longitude,
            status: alert.status,
            message: alert.message.clone(),
        }
    }
}


#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_status_parse() {
        assert_eq!("active".parse::<AlertStatus>().unwrap(), AlertStatus::Active);
        assert_eq!("Resolved".parse::<AlertStatus>().unwrap(), AlertStatus::Resolved);
        assert!("pending".parse::<AlertStatus>().is_err());
    }

    #[test]
    fn test_resolve_is_one_way() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let mut alert = fixtures::alert(1, "Mumbai, Maharashtra", AlertStatus::Active, 5, now);

        assert!(alert.resolve());
        assert_eq!(alert.status, AlertStatus::Resolved);

        // Second resolve is a no-op, never flips back
        assert!(!alert.resolve());
        assert_eq!(alert.status, AlertStatus::Resolved);
    }

    #[test]
    fn test_validate_rejects_bad_records() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let mut alert = fixtures::alert(1, "Delhi, Delhi", AlertStatus::Active, 0, now);
        assert!(alert.validate().is_ok());

        alert.name = "  ".into();
        assert!(alert.validate().is_err());

        alert.name = "Priya Sharma".into();
        alert.latitude = 91.0;
        assert!(alert.validate().is_err());
    }

    #[test]
    fn test_serialize_status_lowercase() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let alert = fixtures::alert(7, "Pune, Maharashtra", AlertStatus::Resolved, 0, now);
        let json = serde_json::to_value(&alert).unwrap();

        assert_eq!(json["status"], "resolved");
        assert_eq!(json["id"], 7);
        assert!(json["message"].is_null());
    }
}
