//! Batch jobs behind the `update`, `backfill` and `check` subcommands.
//!
//! Each job loads the history, does its work against the in-memory store and
//! only writes the file back once the store is in a consistent state.

use std::thread;
use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use chrono::{Days, Local, NaiveDate};
use log::{debug, info, warn};

use crate::alerts::{format_alert_message, Alert, AlertSink, DeviationEngine, Evaluation};
use crate::cli::AppConfig;
use crate::data::{RateSource, RateStore, Storage, Upsert};

/// Pause between consecutive provider requests during a backfill
pub const BACKFILL_PAUSE: Duration = Duration::from_millis(100);

/// Longest backfill accepted, in days
pub const MAX_BACKFILL_DAYS: u32 = 3650;

/// What `update` did
#[derive(Debug)]
pub struct UpdateReport {
    /// None when the fetch failed or the snapshot was rejected
    pub upsert: Option<Upsert>,
    pub alerts: Vec<Alert>,
}

/// Tally of a backfill run
#[derive(Debug, Default, PartialEq)]
pub struct BackfillReport {
    pub stored: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// Fetch the latest rates, store them, then check every tracked pair.
///
/// A failed fetch is logged and leaves the history file untouched; alerts are
/// still evaluated against what is already stored.
pub fn update(
    config: &AppConfig,
    source: &dyn RateSource,
    sinks: &[&dyn AlertSink],
) -> Result<UpdateReport> {
    let storage = Storage::new(config.data_file.clone());
    let mut history = storage.load_store()?;
    info!("Loaded {} days of history", history.store.len());

    let upsert = match source.fetch_latest() {
        Ok(snapshot) => {
            for (currency, rate) in &snapshot.rates {
                info!("{}/{currency}: {rate}", snapshot.base);
            }
            match history.store.upsert(snapshot.clone()) {
                Ok(outcome) => {
                    match outcome {
                        Upsert::Replaced => info!("Updated existing entry for {}", snapshot.date),
                        Upsert::Appended => info!("Appended {}", snapshot.date),
                    }
                    storage.save(&history.store, Some(&snapshot), &config.deviation.currencies)?;
                    info!("Saved {} days to {:?}", history.store.len(), storage.path());
                    Some(outcome)
                }
                Err(e) => {
                    warn!("Discarding fetched rates: {e}");
                    None
                }
            }
        }
        Err(e) => {
            warn!("Failed to fetch latest rates: {e:#}");
            None
        }
    };

    let alerts = evaluate(config, &history.store);
    notify(&alerts, sinks)?;

    Ok(UpdateReport { upsert, alerts })
}

/// Fetch `days` past days up to `today`, oldest first, skipping failures.
///
/// Days older than the newest stored day are not fetched since the store only
/// accepts entries at its tail.
pub fn backfill(
    config: &AppConfig,
    source: &dyn RateSource,
    days: u32,
    today: NaiveDate,
    pause: Duration,
) -> Result<BackfillReport> {
    if days > MAX_BACKFILL_DAYS {
        bail!("Backfill of {days} days exceeds the limit of {MAX_BACKFILL_DAYS}");
    }
    let start = today
        .checked_sub_days(Days::new(u64::from(days)))
        .ok_or_else(|| anyhow!("Cannot go back {days} days from {today}"))?;

    let storage = Storage::new(config.data_file.clone());
    let mut history = storage.load_store()?;
    let mut report = BackfillReport::default();

    let total = days as usize + 1;
    info!("Backfilling {total} days from {start} to {today}");

    for (idx, date) in start.iter_days().take_while(|d| *d <= today).enumerate() {
        if idx > 0 && idx % 50 == 0 {
            info!(
                "Progress: {idx}/{total} ({} stored, {} failed)",
                report.stored, report.failed
            );
        }

        if history.store.last_date().is_some_and(|last| date < last) {
            report.skipped += 1;
            continue;
        }

        match source.fetch_on(date) {
            Ok(snapshot) => match history.store.upsert(snapshot) {
                Ok(_) => report.stored += 1,
                Err(e) => {
                    debug!("Skipping {date}: {e}");
                    report.skipped += 1;
                }
            },
            Err(e) => {
                warn!("Failed for {date}: {e:#}");
                report.failed += 1;
            }
        }

        if !pause.is_zero() {
            thread::sleep(pause);
        }
    }

    match source.fetch_latest() {
        Ok(snapshot) => history.current = Some(snapshot),
        Err(e) => warn!("Failed to fetch current rates: {e:#}"),
    }
    // Fall back to the newest stored day rather than a stale fetch
    let current = history
        .current
        .filter(|c| history.store.last_date().map_or(true, |last| c.date >= last));

    storage.save(&history.store, current.as_ref(), &config.deviation.currencies)?;
    info!(
        "Backfill complete: {} stored, {} failed, {} skipped; {} days on file",
        report.stored,
        report.failed,
        report.skipped,
        history.store.len()
    );

    Ok(report)
}

/// Evaluate the stored history and deliver any alerts
pub fn check(config: &AppConfig, sinks: &[&dyn AlertSink]) -> Result<Vec<Alert>> {
    let storage = Storage::new(config.data_file.clone());
    let history = storage.load_store()?;
    if history.store.is_empty() {
        warn!("No rate history at {:?}", storage.path());
    }

    let alerts = evaluate(config, &history.store);
    notify(&alerts, sinks)?;
    Ok(alerts)
}

fn evaluate(config: &AppConfig, store: &RateStore) -> Vec<Alert> {
    let engine = DeviationEngine::new(config.deviation.clone());
    for currency in &engine.config().currencies {
        match engine.evaluate(currency, store) {
            Evaluation::Scored(r) => debug!(
                "{currency}: current {:.4}, mean {:.4}, stdev {:.4}, {:+.2}σ",
                r.current, r.mean, r.stdev, r.deviation
            ),
            Evaluation::InsufficientData { points } => {
                debug!("{currency}: not enough data ({points} points)")
            }
            Evaluation::Degenerate => debug!("{currency}: no variation in window"),
        }
    }

    let alerts = engine.check_alerts(store);
    if alerts.is_empty() {
        info!("All currency pairs normal, no alerts");
    } else {
        info!("Found {} alert(s)", alerts.len());
    }
    alerts
}

fn notify(alerts: &[Alert], sinks: &[&dyn AlertSink]) -> Result<()> {
    let Some(message) = format_alert_message(alerts, Local::now()) else {
        return Ok(());
    };
    for sink in sinks {
        sink.deliver(&message)?;
    }
    Ok(())
}
