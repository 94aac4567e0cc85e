//! Live feed simulation.
//!
//! Two independent repeating timers drive the alert set: one may add a new
//! arrival, the other may resolve a random active alert. Where alerts come
//! from is hidden behind `AlertFeed`, so a real source can replace
//! `MockFeed` without touching filtering or rendering.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::Rng;
use rand::seq::SliceRandom;
use tokio::sync::{RwLock, broadcast};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::errors::RakshitaError;
use crate::generator::{LIVE_POOLS, MockGenerator};
use crate::models::{AlertId, AlertRecord, PageKind};
use crate::store::AlertStore;

/// Timer periods and firing probabilities for the two feed timers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Schedule {
    pub arrival_every: Duration,
    /// Chance in `[0, 1]` that an arrival tick produces an alert
    pub arrival_chance: f64,
    pub resolution_every: Duration,
    /// Chance in `[0, 1]` that a resolution tick resolves an alert
    pub resolution_chance: f64,
}

impl Schedule {
    /// Map page: 10s / 30% arrivals, 15s / 20% resolutions.
    #[must_use]
    pub const fn live_map() -> Self {
        Self {
            arrival_every: Duration::from_secs(10),
            arrival_chance: 0.3,
            resolution_every: Duration::from_secs(15),
            resolution_chance: 0.2,
        }
    }

    /// History page: 15s / 20% arrivals, 20s / 15% resolutions.
    #[must_use]
    pub const fn history() -> Self {
        Self {
            arrival_every: Duration::from_secs(15),
            arrival_chance: 0.2,
            resolution_every: Duration::from_secs(20),
            resolution_chance: 0.15,
        }
    }

    #[must_use]
    pub const fn for_page(kind: PageKind) -> Self {
        match kind {
            PageKind::LiveMap => Self::live_map(),
            PageKind::History => Self::history(),
        }
    }

    /// Check periods are non-zero and chances are probabilities.
    ///
    /// # Errors
    ///
    /// Returns a description of the first bad field.
    pub fn validate(&self) -> Result<(), String> {
        if self.arrival_every.is_zero() || self.resolution_every.is_zero() {
            return Err("timer periods must be positive".into());
        }
        for (name, chance) in [
            ("arrival", self.arrival_chance),
            ("resolution", self.resolution_chance),
        ] {
            if !(0.0..=1.0).contains(&chance) {
                return Err(format!("{name} chance {chance} out of range [0, 1]"));
            }
        }
        Ok(())
    }
}

impl Default for Schedule {
    fn default() -> Self {
        Self::live_map()
    }
}

/// Source of new alerts and resolutions.
pub trait AlertFeed: Send {
    /// Called on every arrival tick. `Some` means a new alert arrived.
    fn arrival(&mut self, now: DateTime<Utc>) -> Option<AlertRecord>;

    /// Called on every resolution tick. `Some` names an alert to resolve.
    fn resolution(&mut self, store: &AlertStore) -> Option<AlertId>;
}

/// Random feed backed by the mock generator.
#[derive(Debug)]
pub struct MockFeed<R> {
    generator: MockGenerator<R>,
    arrival_chance: f64,
    resolution_chance: f64,
}

impl<R: Rng> MockFeed<R> {
    /// Continue from `generator` so ids keep counting past the seed set.
    #[must_use]
    pub fn new(generator: MockGenerator<R>, schedule: &Schedule) -> Self {
        Self {
            generator,
            arrival_chance: schedule.arrival_chance.clamp(0.0, 1.0),
            resolution_chance: schedule.resolution_chance.clamp(0.0, 1.0),
        }
    }
}

impl<R: Rng + Send> AlertFeed for MockFeed<R> {
    fn arrival(&mut self, now: DateTime<Utc>) -> Option<AlertRecord> {
        if self.generator.rng_mut().gen_bool(self.arrival_chance) {
            Some(self.generator.generate(&LIVE_POOLS, now))
        } else {
            None
        }
    }

    fn resolution(&mut self, store: &AlertStore) -> Option<AlertId> {
        let rng = self.generator.rng_mut();
        if !rng.gen_bool(self.resolution_chance) {
            return None;
        }
        // Uniform over the currently active alerts only
        store.active_ids().choose(rng).copied()
    }
}

/// Which timer fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    Arrival,
    Resolution,
}

/// A change the feed made to the store.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    /// A new alert was prepended
    Arrived(AlertRecord),
    /// An active alert became resolved
    Resolved(AlertRecord),
}

impl FeedEvent {
    #[must_use]
    pub fn alert(&self) -> &AlertRecord {
        match self {
            Self::Arrived(alert) | Self::Resolved(alert) => alert,
        }
    }
}

/// Applies feed output to an alert store.
pub struct Simulator {
    feed: Box<dyn AlertFeed>,
    clock: Arc<dyn Clock>,
}

impl Simulator {
    #[must_use]
    pub fn new(feed: Box<dyn AlertFeed>, clock: Arc<dyn Clock>) -> Self {
        Self { feed, clock }
    }

    /// Handle one timer firing against `store`.
    ///
    /// Every change stamps the store's last-updated time.
    ///
    /// # Errors
    ///
    /// Returns an error if the feed produced an invalid or duplicate alert.
    pub fn tick(
        &mut self,
        tick: Tick,
        store: &mut AlertStore,
    ) -> Result<Option<FeedEvent>, RakshitaError> {
        let now = self.clock.now();
        match tick {
            Tick::Arrival => {
                let Some(alert) = self.feed.arrival(now) else {
                    return Ok(None);
                };
                store.prepend(alert.clone())?;
                store.touch(now);
                Ok(Some(FeedEvent::Arrived(alert)))
            }
            Tick::Resolution => {
                let Some(id) = self.feed.resolution(store) else {
                    return Ok(None);
                };
                if !store.resolve(id) {
                    return Ok(None);
                }
                store.touch(now);
                Ok(store.get(id).cloned().map(FeedEvent::Resolved))
            }
        }
    }

    /// Run both timers forever. Abort the task to stop.
    ///
    /// Ticks are skipped while `active` is false. Each firing takes the
    /// store's write lock for exactly one `tick` call.
    pub async fn run(
        mut self,
        schedule: Schedule,
        store: Arc<RwLock<AlertStore>>,
        tx: broadcast::Sender<FeedEvent>,
        active: Arc<AtomicBool>,
    ) {
        let mut arrivals = tokio::time::interval(schedule.arrival_every);
        let mut resolutions = tokio::time::interval(schedule.resolution_every);
        arrivals.set_missed_tick_behavior(MissedTickBehavior::Delay);
        resolutions.set_missed_tick_behavior(MissedTickBehavior::Delay);

        // The first tick of an interval completes immediately
        arrivals.tick().await;
        resolutions.tick().await;

        loop {
            let tick = tokio::select! {
                _ = arrivals.tick() => Tick::Arrival,
                _ = resolutions.tick() => Tick::Resolution,
            };

            if !active.load(Ordering::Relaxed) {
                continue;
            }

            let result = {
                let mut guard = store.write().await;
                self.tick(tick, &mut guard)
            };

            match result {
                Ok(Some(event)) => {
                    let alert = event.alert();
                    match &event {
                        FeedEvent::Arrived(_) => {
                            info!("new SOS alert {} from {} ({})", alert.id, alert.name, alert.location);
                        }
                        FeedEvent::Resolved(_) => {
                            info!("alert {} from {} resolved", alert.id, alert.name);
                        }
                    }
                    if tx.send(event).is_err() {
                        debug!("no feed subscribers");
                    }
                }
                Ok(None) => debug!("{tick:?} tick: no change"),
                Err(e) => warn!("feed produced a rejected alert: {e}"),
            }
        }
    }
}
