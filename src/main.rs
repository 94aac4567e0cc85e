//! Rakshita - live SOS alert dashboard.
//!
//! Serves a live map, a paginated alert history and a support desk over a
//! simulated alert feed, and offers the same pipeline from the terminal.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::{RwLock, broadcast};
use tracing::error;

mod cli;
mod clock;
mod contact;
mod errors;
mod export;
mod field_cache;
mod filters;
mod generator;
mod map;
mod models;
mod output;
mod pages;
mod pagination;
mod render;
mod server;
mod simulator;
mod store;
mod timefmt;
mod view;

use cli::{Cli, Command};
use clock::{Clock, SystemClock};
use filters::AlertFilter;
use generator::MockGenerator;
use rand::rngs::StdRng;
use simulator::{MockFeed, Simulator};
use store::AlertStore;
use view::AlertView;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity
    init_tracing(cli.verbose, cli.quiet);

    match cli.command {
        Command::Serve(args) => cmd_serve(args),
        Command::Tail(args) => cmd_tail(args),
        Command::Live(args) => cmd_live(args),
        Command::Export(args) => cmd_export(args),
    }
}

/// Initialize tracing subscriber.
fn init_tracing(verbose: bool, quiet: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// Seed a store the way the dashboard does, keeping the generator so a
/// feed can continue its ids.
fn seed_store(
    args: &cli::SeedArgs,
    clock: &dyn Clock,
) -> Result<(AlertStore, MockGenerator<StdRng>)> {
    let now = clock.now();
    let mut generator = MockGenerator::from_seed(args.rng_seed);
    let alerts = generator.seed(args.seed, args.count(), now);
    let store = AlertStore::seeded(alerts, now).context("failed to seed alert store")?;
    tracing::debug!("seeded {} alerts ({} active)", store.len(), store.active_count());
    Ok((store, generator))
}

/// Build a page view from the filter flags.
fn build_view(kind: models::PageKind, filter: &cli::FilterArgs) -> AlertView {
    let mut view = AlertView::new(kind);
    view.set_search(&filter.search);
    view.set_status(filter.status);
    view.set_window(filter.time);
    view
}

/// Execute the `serve` command - start web server.
fn cmd_serve(args: cli::ServeArgs) -> Result<()> {
    let schedule = args
        .schedule
        .resolve(args.seed.seed)
        .map_err(anyhow::Error::msg)?;

    let config = server::ServerConfig {
        port: args.port,
        host: args.host.clone(),
        seed: args.seed.seed,
        seed_count: args.seed.count(),
        schedule,
        rng_seed: args.seed.rng_seed,
        cache_dir: args.cache.clone(),
        ..Default::default()
    };

    // Print startup message
    let url = format!("http://{}:{}", args.host, args.port);
    println!("\x1b[1m🛡 Rakshita Dashboard\x1b[0m");
    println!("\x1b[2m───────────────────────────────────────\x1b[0m");
    println!("  Local:     \x1b[96m{}\x1b[0m", url);
    println!("  Seed:      {} x{}", config.seed.as_str(), config.seed_count);
    println!(
        "  Arrivals:  every {}s at {:.0}%",
        schedule.arrival_every.as_secs(),
        schedule.arrival_chance * 100.0
    );
    println!(
        "  Resolves:  every {}s at {:.0}%",
        schedule.resolution_every.as_secs(),
        schedule.resolution_chance * 100.0
    );
    println!("\x1b[2m───────────────────────────────────────\x1b[0m");
    println!("\x1b[2mPress Ctrl+C to stop\x1b[0m\n");

    // Open browser if requested (using xdg-open/open command)
    if args.open {
        #[cfg(target_os = "linux")]
        let _ = std::process::Command::new("xdg-open").arg(&url).spawn();
        #[cfg(target_os = "macos")]
        let _ = std::process::Command::new("open").arg(&url).spawn();
        #[cfg(target_os = "windows")]
        let _ = std::process::Command::new("cmd").args(["/c", "start", &url]).spawn();
    }

    // Run the async server on tokio runtime
    tokio::runtime::Runtime::new()
        .context("failed to create tokio runtime")?
        .block_on(server::run_server(config))
}

/// Execute the `tail` command - one-shot view of the seeded set.
fn cmd_tail(args: cli::TailArgs) -> Result<()> {
    let clock = SystemClock;
    let (store, _) = seed_store(&args.seed, &clock)?;
    let now = clock.now();

    let mut view = build_view(args.view, &args.filter);
    let snapshot = view.snapshot(&store, now);
    if args.page != 1 && !view.go_to_page(args.page, &snapshot) {
        tracing::warn!(
            "page {} out of range (1-{}), showing page 1",
            args.page,
            snapshot.page_count()
        );
    }
    let snapshot = view.snapshot(&store, now);

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    output::write_alerts(&mut handle, snapshot.visible(), args.format, now)?;

    if args.format == output::Format::Human && snapshot.kind().paginates() {
        writeln!(
            handle,
            "\x1b[2mPage {} of {} · {} alerts · {} active\x1b[0m",
            snapshot.page(),
            snapshot.page_count(),
            snapshot.total(),
            snapshot.active_count()
        )?;
    }

    Ok(())
}

/// Execute the `live` command - stream simulated feed activity.
fn cmd_live(args: cli::LiveArgs) -> Result<()> {
    let schedule = args
        .schedule
        .resolve(args.seed.seed)
        .map_err(anyhow::Error::msg)?;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let (store, generator) = seed_store(&args.seed, clock.as_ref())?;
    let filter = AlertFilter::new(args.seed.seed.search_scope())
        .with_search(&args.filter.search)
        .with_status(args.filter.status)
        .with_window(args.filter.time);

    tracing::info!(
        "streaming alerts (arrivals every {}s, resolutions every {}s)",
        schedule.arrival_every.as_secs(),
        schedule.resolution_every.as_secs()
    );

    // Print startup banner
    if args.format == output::Format::Human {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        writeln!(handle, "\x1b[1m🛡 Rakshita Live Feed\x1b[0m")?;
        writeln!(
            handle,
            "\x1b[2m{} alerts seeded ({} active) | Press Ctrl+C to stop\x1b[0m",
            store.len(),
            store.active_count()
        )?;
        writeln!(handle, "\x1b[2m─────────────────────────────────────────────────────────────────────\x1b[0m")?;
    }

    let runtime = tokio::runtime::Runtime::new().context("failed to create tokio runtime")?;
    runtime.block_on(async move {
        let store = Arc::new(RwLock::new(store));
        let (tx, mut rx) = broadcast::channel(100);
        let simulator = Simulator::new(
            Box::new(MockFeed::new(generator, &schedule)),
            clock.clone(),
        );
        let feed = tokio::spawn(simulator.run(
            schedule,
            store,
            tx,
            Arc::new(AtomicBool::new(true)),
        ));

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => break,
                received = rx.recv() => match received {
                    Ok(event) => {
                        let now = clock.now();
                        if !filter.matches(event.alert(), now) {
                            continue;
                        }
                        let stdout = io::stdout();
                        let mut handle = stdout.lock();
                        if let Err(e) = output::write_feed_event(&mut handle, &event, args.format, now) {
                            tracing::warn!("failed to write event: {}", e);
                        }
                        // Flush after each event for real-time output
                        let _ = handle.flush();
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!("output fell behind, skipped {} events", n);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
            }
        }

        feed.abort();
        Ok(())
    })
}

/// Execute the `export` command - CSV of the filtered history view.
fn cmd_export(args: cli::ExportArgs) -> Result<()> {
    let clock = SystemClock;
    let (store, _) = seed_store(&args.seed, &clock)?;
    let now = clock.now();

    let view = build_view(models::PageKind::History, &args.filter);
    let snapshot = view.snapshot(&store, now);

    let path = args
        .output
        .unwrap_or_else(|| export::filename(now).into());
    let file = File::create(&path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    export::write_csv(&mut writer, snapshot.filtered())?;
    writer.flush()?;

    tracing::info!("exported {} alerts to {}", snapshot.total(), path.display());
    Ok(())
}
