//! Mock alert generation.
//!
//! Synthesizes alerts from fixed name, place and message pools scattered
//! around a fixed center. Ids come from a counter and are never reused.

use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::models::{AlertId, AlertRecord, AlertStatus, PageKind};

/// Map center all mock coordinates are scattered around.
pub const CENTER: (f64, f64) = (20.5937, 78.9629);

/// Full width of the scatter box in degrees, on each axis.
const SPREAD_DEG: f64 = 20.0;

/// Share of seeded history alerts that are still active.
pub const HISTORY_ACTIVE_RATIO: f64 = 0.3;

/// Fixed pools a generator draws from.
#[derive(Debug, Clone, Copy)]
pub struct Pools {
    pub names: &'static [&'static str],
    pub locations: &'static [&'static str],
    /// `None` entries produce alerts without a message.
    pub messages: &'static [Option<&'static str>],
}

/// Pools used for live arrivals.
pub const LIVE_POOLS: Pools = Pools {
    names: &[
        "Priya Sharma",
        "Rahul Kumar",
        "Anjali Patel",
        "Vikram Singh",
        "Meera Reddy",
    ],
    locations: &[
        "Mumbai, Maharashtra",
        "Delhi, Delhi",
        "Bangalore, Karnataka",
        "Chennai, Tamil Nadu",
        "Kolkata, West Bengal",
        "Hyderabad, Telangana",
        "Pune, Maharashtra",
        "Ahmedabad, Gujarat",
    ],
    messages: &[
        Some("Need immediate assistance"),
        Some("Feeling unsafe"),
        Some("Medical emergency"),
        Some("Vehicle breakdown"),
        Some("Lost in unfamiliar area"),
        None,
    ],
};

/// Wider pools used to seed the alert history.
pub const HISTORY_POOLS: Pools = Pools {
    names: &[
        "Priya Sharma",
        "Rahul Kumar",
        "Anjali Patel",
        "Vikram Singh",
        "Meera Reddy",
        "Arjun Mehta",
        "Kavya Iyer",
        "Rohan Desai",
        "Zara Khan",
        "Aditya Verma",
        "Ishita Gupta",
        "Karan Malhotra",
        "Neha Joshi",
        "Aryan Sharma",
        "Diya Kapoor",
    ],
    locations: &[
        "Mumbai, Maharashtra",
        "Delhi, Delhi",
        "Bangalore, Karnataka",
        "Chennai, Tamil Nadu",
        "Kolkata, West Bengal",
        "Hyderabad, Telangana",
        "Pune, Maharashtra",
        "Ahmedabad, Gujarat",
        "Jaipur, Rajasthan",
        "Lucknow, Uttar Pradesh",
        "Chandigarh, Punjab",
        "Bhopal, Madhya Pradesh",
    ],
    messages: &[
        Some("Need immediate assistance"),
        Some("Feeling unsafe in current location"),
        Some("Medical emergency"),
        Some("Vehicle breakdown on highway"),
        Some("Lost in unfamiliar area"),
        Some("Suspicious activity nearby"),
        Some("Accident occurred"),
        Some("Health issue requiring help"),
        Some("Stuck in traffic jam"),
        Some("Car trouble"),
        None,
    ],
};

/// Mock alert factory.
#[derive(Debug)]
pub struct MockGenerator<R> {
    rng: R,
    next_id: u64,
}

impl<R: Rng> MockGenerator<R> {
    #[must_use]
    pub fn new(rng: R) -> Self {
        Self { rng, next_id: 1 }
    }

    fn take_id(&mut self) -> AlertId {
        let id = AlertId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Produce one active alert stamped `now`.
    pub fn generate(&mut self, pools: &Pools, now: DateTime<Utc>) -> AlertRecord {
        let name = pools.names.choose(&mut self.rng).copied().unwrap_or("Anonymous");
        let location = pools
            .locations
            .choose(&mut self.rng)
            .copied()
            .unwrap_or("Unknown location");
        let message = pools.messages.choose(&mut self.rng).copied().flatten();

        let latitude = CENTER.0 + (self.rng.r#gen::<f64>() - 0.5) * SPREAD_DEG;
        let longitude = CENTER.1 + (self.rng.r#gen::<f64>() - 0.5) * SPREAD_DEG;

        AlertRecord {
            id: self.take_id(),
            name: name.to_string(),
            latitude,
            longitude,
            location: location.to_string(),
            timestamp: now,
            status: AlertStatus::Active,
            message: message.map(str::to_string),
        }
    }

    /// Produce one alert raised at a uniformly random point in `[now - max_age, now]`.
    pub fn generate_backdated(
        &mut self,
        pools: &Pools,
        now: DateTime<Utc>,
        max_age: Duration,
    ) -> AlertRecord {
        let span = max_age.num_milliseconds().max(0);
        let offset = if span == 0 {
            0
        } else {
            self.rng.gen_range(0..=span)
        };
        self.generate(pools, now - Duration::milliseconds(offset))
    }

    /// A handful of active alerts from the last hour.
    pub fn seed_live_map(&mut self, count: usize, now: DateTime<Utc>) -> Vec<AlertRecord> {
        (0..count)
            .map(|_| self.generate_backdated(&LIVE_POOLS, now, Duration::hours(1)))
            .collect()
    }

    /// A day of history, `active_ratio` of it still active, newest first.
    pub fn seed_history(
        &mut self,
        count: usize,
        active_ratio: f64,
        now: DateTime<Utc>,
    ) -> Vec<AlertRecord> {
        let mut alerts: Vec<AlertRecord> = (0..count)
            .map(|_| {
                let mut alert = self.generate_backdated(&HISTORY_POOLS, now, Duration::hours(24));
                if !self.rng.gen_bool(active_ratio.clamp(0.0, 1.0)) {
                    alert.resolve();
                }
                alert
            })
            .collect();
        alerts.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        alerts
    }

    /// Seed the starting set of a page with its default proportions.
    pub fn seed(&mut self, kind: PageKind, count: usize, now: DateTime<Utc>) -> Vec<AlertRecord> {
        match kind {
            PageKind::LiveMap => self.seed_live_map(count, now),
            PageKind::History => self.seed_history(count, HISTORY_ACTIVE_RATIO, now),
        }
    }

    /// Direct access to the random source for callers sharing it.
    pub fn rng_mut(&mut self) -> &mut R {
        &mut self.rng
    }
}

impl MockGenerator<StdRng> {
    /// Generator over `StdRng`; reproducible when `seed` is given.
    #[must_use]
    pub fn from_seed(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::new(rng)
    }
}
