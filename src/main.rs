//! fxwatch: daily USD exchange-rate history with deviation alerts
//!
//! Keeps a JSON history of USD rates against a fixed set of currencies, flags
//! days whose rate sits unusually far from its rolling mean, and charts the
//! history in a keyboard-driven terminal dashboard.

mod alerts;
mod app;
mod cli;
mod data;
mod jobs;
mod ui;

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Local;
use cli::{AppConfig, Cli, Commands};

use alerts::{AlertSink, FileSink, StdoutSink};
use data::{HttpRateSource, Upsert};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    // Parse CLI arguments
    let cli = Cli::parse_args();
    let config = AppConfig::from_cli(&cli)?;

    match cli.command {
        Commands::Update { alert_log } => {
            let source = HttpRateSource::new(config.deviation.currencies.clone())?;
            let file_sink = alert_log.map(|p| FileSink::new(PathBuf::from(p)));
            let sinks = sinks(&file_sink);
            let report = jobs::update(&config, &source, &sinks)?;
            match report.upsert {
                Some(Upsert::Appended) => println!("➕ Stored new rates"),
                Some(Upsert::Replaced) => println!("🔁 Replaced today's rates"),
                None => println!("❌ No rates stored this run"),
            }
            if report.alerts.is_empty() {
                println!("✅ All currency pairs normal, no alerts");
            }
        }
        Commands::Backfill { days } => {
            let source = HttpRateSource::new(config.deviation.currencies.clone())?;
            let today = Local::now().date_naive();
            let report = jobs::backfill(&config, &source, days, today, jobs::BACKFILL_PAUSE)?;
            println!(
                "✅ Stored {} days ({} failed, {} skipped)",
                report.stored, report.failed, report.skipped
            );
        }
        Commands::Check { alert_log, json } => {
            let file_sink = alert_log.map(|p| FileSink::new(PathBuf::from(p)));
            if json {
                let file_only: Vec<&dyn AlertSink> =
                    file_sink.iter().map(|s| s as &dyn AlertSink).collect();
                let alerts = jobs::check(&config, &file_only)?;
                let rendered =
                    serde_json::to_string_pretty(&alerts).context("Failed to encode alerts")?;
                println!("{rendered}");
            } else {
                let alerts = jobs::check(&config, &sinks(&file_sink))?;
                if alerts.is_empty() {
                    println!("✅ All currency pairs normal, no alerts");
                }
            }
        }
        Commands::Show { range, interval } => {
            // Run the TUI application
            app::run(config, range, interval)?;
        }
    }

    Ok(())
}

/// Stdout plus the optional alert log file
fn sinks(file_sink: &Option<FileSink>) -> Vec<&dyn AlertSink> {
    let mut sinks: Vec<&dyn AlertSink> = vec![&StdoutSink];
    if let Some(sink) = file_sink {
        sinks.push(sink);
    }
    sinks
}
