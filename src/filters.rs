//! Alert filtering logic.
//!
//! Search text, status and time window are independent criteria that are
//! always ANDed together.

use std::cmp::Reverse;

use chrono::{DateTime, Utc};

use crate::models::{AlertRecord, AlertStatus};

/// Status criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(AlertStatus),
}

impl StatusFilter {
    /// Every selectable status, in menu order.
    pub const ALL: [Self; 3] = [
        Self::All,
        Self::Only(AlertStatus::Active),
        Self::Only(AlertStatus::Resolved),
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Only(status) => status.as_str(),
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::All => "All statuses",
            Self::Only(AlertStatus::Active) => "Active",
            Self::Only(AlertStatus::Resolved) => "Resolved",
        }
    }
}

impl std::str::FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "all" => Ok(Self::All),
            other => other
                .parse::<AlertStatus>()
                .map(Self::Only)
                .map_err(|_| format!("unknown status filter: {s} (expected: all, active, resolved)")),
        }
    }
}

/// Time-window criterion, measured backwards from now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeWindow {
    #[default]
    All,
    LastHour,
    Last6Hours,
    Last12Hours,
    Last24Hours,
}

impl TimeWindow {
    /// Every selectable window, in menu order.
    pub const ALL: [Self; 5] = [
        Self::All,
        Self::LastHour,
        Self::Last6Hours,
        Self::Last12Hours,
        Self::Last24Hours,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::LastHour => "1h",
            Self::Last6Hours => "6h",
            Self::Last12Hours => "12h",
            Self::Last24Hours => "24h",
        }
    }

    /// Window length in milliseconds, `None` for `All`.
    #[must_use]
    pub const fn as_millis(self) -> Option<i64> {
        match self {
            Self::All => None,
            Self::LastHour => Some(3_600_000),
            Self::Last6Hours => Some(21_600_000),
            Self::Last12Hours => Some(43_200_000),
            Self::Last24Hours => Some(86_400_000),
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::All => "All Time",
            Self::LastHour => "Last Hour",
            Self::Last6Hours => "Last 6 Hours",
            Self::Last12Hours => "Last 12 Hours",
            Self::Last24Hours => "Last 24 Hours",
        }
    }
}

impl std::str::FromStr for TimeWindow {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "all" => Ok(Self::All),
            "1h" => Ok(Self::LastHour),
            "6h" => Ok(Self::Last6Hours),
            "12h" => Ok(Self::Last12Hours),
            "24h" => Ok(Self::Last24Hours),
            _ => Err(format!("unknown time window: {s} (expected: all, 1h, 6h, 12h, 24h)")),
        }
    }
}

/// Which fields the free-text search looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchScope {
    /// Name and location (live map)
    #[default]
    NameAndLocation,
    /// Name, location and message (history)
    IncludingMessage,
}

/// Combined filter criteria.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AlertFilter {
    /// Lowercased search needle; empty matches everything
    search: String,
    pub status: StatusFilter,
    pub window: TimeWindow,
    pub scope: SearchScope,
}

impl AlertFilter {
    #[must_use]
    pub fn new(scope: SearchScope) -> Self {
        Self {
            scope,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_search(mut self, search: &str) -> Self {
        self.set_search(search);
        self
    }

    #[must_use]
    pub fn with_status(mut self, status: StatusFilter) -> Self {
        self.status = status;
        self
    }

    #[must_use]
    pub fn with_window(mut self, window: TimeWindow) -> Self {
        self.window = window;
        self
    }

    pub fn set_search(&mut self, search: &str) {
        self.search = search.to_lowercase();
    }

    /// Check if an alert passes all filter criteria.
    #[must_use]
    pub fn matches(&self, alert: &AlertRecord, now: DateTime<Utc>) -> bool {
        self.check_search(alert) && self.check_status(alert) && self.check_window(alert, now)
    }

    /// Filter `alerts`, keeping their original order.
    #[must_use]
    pub fn apply<'a>(&self, alerts: &'a [AlertRecord], now: DateTime<Utc>) -> Vec<&'a AlertRecord> {
        alerts.iter().filter(|a| self.matches(a, now)).collect()
    }

    fn check_search(&self, alert: &AlertRecord) -> bool {
        if self.search.is_empty() {
            return true;
        }
        let needle = self.search.as_str();
        let in_message = || {
            self.scope == SearchScope::IncludingMessage
                && alert
                    .message
                    .as_deref()
                    .is_some_and(|m| m.to_lowercase().contains(needle))
        };
        alert.name.to_lowercase().contains(needle)
            || alert.location.to_lowercase().contains(needle)
            || in_message()
    }

    fn check_status(&self, alert: &AlertRecord) -> bool {
        match self.status {
            StatusFilter::All => true,
            StatusFilter::Only(status) => alert.status == status,
        }
    }

    fn check_window(&self, alert: &AlertRecord, now: DateTime<Utc>) -> bool {
        match self.window.as_millis() {
            None => true,
            Some(max_age) => alert.age_ms(now) <= max_age,
        }
    }
}

/// Sort by timestamp descending (most recent first). Stable for equal times.
pub fn sort_newest_first(alerts: &mut [&AlertRecord]) {
    alerts.sort_by_key(|a| Reverse(a.timestamp));
}
