//! In-memory alert store.
//!
//! Holds the session's single ordered alert collection. New arrivals go to
//! the front, records are mutated in place, nothing is ever deleted.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::errors::RakshitaError;
use crate::models::{AlertId, AlertRecord};

#[derive(Debug, Default)]
pub struct AlertStore {
    /// Alerts in display-insertion order (newest arrival first)
    alerts: Vec<AlertRecord>,
    /// Every id ever inserted, for uniqueness checks
    ids: HashSet<AlertId>,
    last_updated: Option<DateTime<Utc>>,
}

impl AlertStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from a seed set, keeping its order.
    ///
    /// # Errors
    ///
    /// Returns an error if a record is invalid or an id repeats.
    pub fn seeded(alerts: Vec<AlertRecord>, now: DateTime<Utc>) -> Result<Self, RakshitaError> {
        let mut store = Self::new();
        for alert in alerts {
            store.push_back(alert)?;
        }
        store.touch(now);
        Ok(store)
    }

    fn admit(&mut self, alert: &AlertRecord) -> Result<(), RakshitaError> {
        alert.validate()?;
        if !self.ids.insert(alert.id) {
            return Err(RakshitaError::DuplicateAlert(alert.id));
        }
        Ok(())
    }

    fn push_back(&mut self, alert: AlertRecord) -> Result<(), RakshitaError> {
        self.admit(&alert)?;
        self.alerts.push(alert);
        Ok(())
    }

    /// Insert a new arrival at the front.
    ///
    /// # Errors
    ///
    /// Returns an error if the record is invalid or its id was already used.
    pub fn prepend(&mut self, alert: AlertRecord) -> Result<(), RakshitaError> {
        self.admit(&alert)?;
        self.alerts.insert(0, alert);
        Ok(())
    }

    /// Resolve an alert by id.
    ///
    /// Returns `true` only if an active alert moved to resolved.
    pub fn resolve(&mut self, id: AlertId) -> bool {
        self.alerts
            .iter_mut()
            .find(|a| a.id == id)
            .is_some_and(AlertRecord::resolve)
    }

    #[must_use]
    pub fn get(&self, id: AlertId) -> Option<&AlertRecord> {
        self.alerts.iter().find(|a| a.id == id)
    }

    #[must_use]
    pub fn as_slice(&self) -> &[AlertRecord] {
        &self.alerts
    }

    pub fn iter(&self) -> impl Iterator<Item = &AlertRecord> {
        self.alerts.iter()
    }

    /// Ids of every currently active alert, in store order.
    #[must_use]
    pub fn active_ids(&self) -> Vec<AlertId> {
        self.iter().filter(|a| a.is_active()).map(|a| a.id).collect()
    }

    #[must_use]
    pub fn active_count(&self) -> usize {
        self.iter().filter(|a| a.is_active()).count()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    /// Record that the set changed at `now`.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_updated = Some(now);
    }

    #[must_use]
    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.last_updated
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::models::AlertStatus;
    use crate::models::fixtures::alert;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_prepend_goes_to_front() {
        let mut store = AlertStore::seeded(
            vec![alert(1, "Delhi, Delhi", AlertStatus::Active, 5, now())],
            now(),
        )
        .unwrap();
        store
            .prepend(alert(2, "Pune, Maharashtra", AlertStatus::Active, 0, now()))
            .unwrap();

        let ids: Vec<u64> = store.iter().map(|a| a.id.0).collect();
        assert_eq!(ids, vec![2, 1]);
        assert_eq!(store.last_updated(), Some(now()));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let mut store = AlertStore::new();
        store
            .prepend(alert(1, "Delhi, Delhi", AlertStatus::Active, 5, now()))
            .unwrap();
        let err = store
            .prepend(alert(1, "Mumbai, Maharashtra", AlertStatus::Active, 0, now()))
            .unwrap_err();
        assert!(matches!(err, RakshitaError::DuplicateAlert(AlertId(1))));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_resolve_once() {
        let mut store = AlertStore::seeded(
            vec![
                alert(1, "Delhi, Delhi", AlertStatus::Active, 5, now()),
                alert(2, "Pune, Maharashtra", AlertStatus::Resolved, 5, now()),
            ],
            now(),
        )
        .unwrap();

        assert_eq!(store.active_count(), 1);
        assert!(store.resolve(AlertId(1)));
        assert!(!store.resolve(AlertId(1)));
        assert!(!store.resolve(AlertId(2)));
        assert!(!store.resolve(AlertId(99)));
        assert_eq!(store.active_count(), 0);
        assert!(store.active_ids().is_empty());
    }
}
