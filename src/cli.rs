//! Command-line interface definitions.
//!
//! Uses clap derive API for argument parsing.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use crate::filters::{StatusFilter, TimeWindow};
use crate::models::PageKind;
use crate::output::Format;
use crate::server;
use crate::simulator::Schedule;

/// Live SOS alert dashboard: map, alert history and support desk.
#[derive(Parser, Debug)]
#[command(name = "rakshita")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Command to run
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose debug logging
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(long, global = true)]
    pub quiet: bool,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the web dashboard
    Serve(ServeArgs),

    /// Print the seeded alert set (one-shot and exit)
    Tail(TailArgs),

    /// Stream simulated alert activity
    Live(LiveArgs),

    /// Write the filtered alert history as CSV
    Export(ExportArgs),
}

/// Where the starting alert set comes from.
#[derive(Args, Debug, Clone)]
pub struct SeedArgs {
    /// Starting set to seed: map (a few fresh alerts) or history (a day of alerts)
    #[arg(long, default_value = "history", value_parser = parse_page_kind)]
    pub seed: PageKind,

    /// Number of alerts to seed (defaults to 5 for map, 25 for history)
    #[arg(long)]
    pub count: Option<usize>,

    /// Fixed random seed for reproducible output
    #[arg(long)]
    pub rng_seed: Option<u64>,
}

impl SeedArgs {
    #[must_use]
    pub fn count(&self) -> usize {
        self.count
            .unwrap_or_else(|| server::default_seed_count(self.seed))
    }
}

/// Search, status and time-window criteria.
#[derive(Args, Debug, Clone)]
pub struct FilterArgs {
    /// Case-insensitive text search
    #[arg(long, short = 's', default_value = "")]
    pub search: String,

    /// Status filter: all, active, resolved
    #[arg(long, default_value = "all", value_parser = parse_status_filter)]
    pub status: StatusFilter,

    /// Time window: all, 1h, 6h, 12h, 24h
    #[arg(long, default_value = "all", value_parser = parse_time_window)]
    pub time: TimeWindow,
}

/// Feed timer settings. Unset values come from the preset.
#[derive(Args, Debug, Clone)]
pub struct ScheduleArgs {
    /// Schedule preset: map or history (defaults to the seed kind)
    #[arg(long, value_parser = parse_page_kind)]
    pub schedule: Option<PageKind>,

    /// Seconds between arrival checks
    #[arg(long)]
    pub arrival_every: Option<u64>,

    /// Probability that an arrival check adds an alert
    #[arg(long)]
    pub arrival_chance: Option<f64>,

    /// Seconds between resolution checks
    #[arg(long)]
    pub resolution_every: Option<u64>,

    /// Probability that a resolution check resolves an alert
    #[arg(long)]
    pub resolution_chance: Option<f64>,
}

impl ScheduleArgs {
    /// Build the schedule, starting from the preset for `default`.
    ///
    /// # Errors
    ///
    /// Returns an error if the resulting schedule is invalid.
    pub fn resolve(&self, default: PageKind) -> Result<Schedule, String> {
        let mut schedule = Schedule::for_page(self.schedule.unwrap_or(default));
        if let Some(secs) = self.arrival_every {
            schedule.arrival_every = Duration::from_secs(secs);
        }
        if let Some(chance) = self.arrival_chance {
            schedule.arrival_chance = chance;
        }
        if let Some(secs) = self.resolution_every {
            schedule.resolution_every = Duration::from_secs(secs);
        }
        if let Some(chance) = self.resolution_chance {
            schedule.resolution_chance = chance;
        }
        schedule.validate()?;
        Ok(schedule)
    }
}

/// Arguments for the `serve` command.
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Port to listen on
    #[arg(long, short = 'p', default_value = "8080")]
    pub port: u16,

    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    #[command(flatten)]
    pub seed: SeedArgs,

    #[command(flatten)]
    pub schedule: ScheduleArgs,

    /// Directory for auto-saved support form drafts, one JSON file per
    /// browser session (in memory if omitted)
    #[arg(long)]
    pub cache: Option<PathBuf>,

    /// Open browser automatically
    #[arg(long)]
    pub open: bool,
}

/// Arguments for the `tail` command.
#[derive(Parser, Debug)]
pub struct TailArgs {
    #[command(flatten)]
    pub seed: SeedArgs,

    #[command(flatten)]
    pub filter: FilterArgs,

    /// View to apply: map (store order, no paging) or history (newest first, paged)
    #[arg(long, default_value = "history", value_parser = parse_page_kind)]
    pub view: PageKind,

    /// Page to show in the history view
    #[arg(long, default_value = "1")]
    pub page: usize,

    /// Output format
    #[arg(long, short = 'f', default_value = "human", value_parser = parse_format)]
    pub format: Format,
}

/// Arguments for the `live` command.
#[derive(Parser, Debug)]
pub struct LiveArgs {
    #[command(flatten)]
    pub seed: SeedArgs,

    #[command(flatten)]
    pub schedule: ScheduleArgs,

    #[command(flatten)]
    pub filter: FilterArgs,

    /// Output format
    #[arg(long, short = 'f', default_value = "human", value_parser = parse_format)]
    pub format: Format,
}

/// Arguments for the `export` command.
#[derive(Parser, Debug)]
pub struct ExportArgs {
    #[command(flatten)]
    pub seed: SeedArgs,

    #[command(flatten)]
    pub filter: FilterArgs,

    /// Output file (defaults to rakshita-alerts-YYYY-MM-DD.csv)
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

/// Parse a page kind from string.
fn parse_page_kind(s: &str) -> Result<PageKind, String> {
    s.parse()
}

/// Parse a status filter from string.
fn parse_status_filter(s: &str) -> Result<StatusFilter, String> {
    s.parse()
}

/// Parse a time window from string.
fn parse_time_window(s: &str) -> Result<TimeWindow, String> {
    s.parse()
}

/// Parse an output format from string.
fn parse_format(s: &str) -> Result<Format, String> {
    s.parse()
}
