//! Run command implementation
//!
//! Starts every configured station, prints alerts as they arrive and stops
//! everything on Ctrl+C or when the requested duration has elapsed.

use crate::alerts::{AlertHandler, AlertKind, EventBus, TerminalNotifier};
use crate::cli::args::{OutputFormat, RunArgs};
use crate::cli::output::print_output;
use crate::commands::load_config;
use crate::error::Result;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Execute the run command
pub fn run_monitor(
    args: &RunArgs,
    format: OutputFormat,
    config_path: Option<&str>,
    seed: Option<u64>,
) -> Result<()> {
    let config = load_config(config_path, seed)?
        .with_stations(&args.stations)
        .with_failure_probability(args.failure_probability)
        .with_extreme_probability(args.extreme_probability)
        .build()?;

    let bus = Arc::new(EventBus::new());
    if !args.quiet {
        let notifier: Arc<dyn AlertHandler> = Arc::new(TerminalNotifier::new());
        for kind in AlertKind::ALL {
            bus.register_shared(kind, Arc::clone(&notifier));
        }
    }

    let manager = config.build_manager(bus)?;

    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        log::info!("Received shutdown signal");
        r.store(false, Ordering::SeqCst);
    })?;

    let report = manager.start_all();
    for (id, e) in &report.failures {
        log::error!("Station {} failed to start: {}", id, e);
    }
    if report.succeeded.is_empty() {
        if let Some((_, e)) = report.failures.into_iter().next() {
            return Err(e.into());
        }
    }

    match args.duration {
        Some(secs) => log::info!("Monitoring {} stations for {}s", manager.len(), secs),
        None => log::info!("Monitoring {} stations. Press Ctrl+C to stop.", manager.len()),
    }

    let deadline = deadline_after(args.duration);
    while running.load(Ordering::SeqCst) {
        if deadline.is_some_and(|d| Instant::now() >= d) {
            break;
        }
        thread::sleep(POLL_INTERVAL);
    }

    let report = manager.stop_all();
    for (id, e) in &report.failures {
        log::warn!("Station {}: {}", id, e);
    }

    print_output(&manager.summary(), format)?;
    Ok(())
}

/// Instant the run ends, or `None` to run until Ctrl+C.
///
/// A duration too large to represent is treated as unbounded.
fn deadline_after(duration: Option<u64>) -> Option<Instant> {
    duration.and_then(|secs| Instant::now().checked_add(Duration::from_secs(secs)))
}
