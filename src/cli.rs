//! Command-line interface argument parsing for fxwatch.
//!
//! - `fxwatch update` fetches today's rates, stores them and checks for alerts
//! - `fxwatch backfill --days 730` fills in past days, skipping failures
//! - `fxwatch check` evaluates the stored history without fetching
//! - `fxwatch show` opens the terminal dashboard

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::alerts::DeviationConfig;

/// Track daily USD exchange rates and flag unusual moves.
#[derive(Parser, Debug)]
#[command(name = "fxwatch")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the rate history JSON file
    /// Defaults to $FXWATCH_DATA, then <data dir>/fxwatch/historical.json
    #[arg(long, global = true)]
    pub data_file: Option<String>,

    /// Comma-separated currency codes tracked against USD
    /// Example: "CNY,SGD,JPY,AUD"
    #[arg(long, global = true)]
    pub currencies: Option<String>,

    /// Deviation (in standard deviations) that raises a red alert
    #[arg(long, global = true, default_value = "2.0")]
    pub alert_sigma: f64,

    /// Deviation (in standard deviations) that raises a yellow warning
    #[arg(long, global = true, default_value = "1.5")]
    pub warning_sigma: f64,

    /// Number of most recent days used for the mean and deviation
    #[arg(long, global = true, default_value = "365")]
    pub window_days: usize,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch the latest rates, store them and check for alerts
    Update {
        /// Also append alert messages to this file
        #[arg(long)]
        alert_log: Option<String>,
    },

    /// Fetch historical rates for past days, skipping days that fail
    Backfill {
        /// How many days back to fetch
        #[arg(
            short,
            long,
            default_value = "365",
            value_parser = clap::value_parser!(u32).range(1..=3650)
        )]
        days: u32,
    },

    /// Check stored rates for deviation alerts without fetching
    Check {
        /// Also append alert messages to this file
        #[arg(long)]
        alert_log: Option<String>,

        /// Print alerts as JSON instead of a formatted message
        #[arg(long)]
        json: bool,
    },

    /// Launch the terminal dashboard
    Show {
        /// Days of history to chart (30, 90, 180 or 365)
        #[arg(short, long, default_value = "365")]
        range: usize,

        /// Seconds between reloads of the history file
        #[arg(short, long, default_value = "60")]
        interval: u64,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

/// Configuration shared by every subcommand
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_file: PathBuf,
    pub deviation: DeviationConfig,
}

impl AppConfig {
    /// Create AppConfig from the global CLI options
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        Self::from_options(
            cli.data_file.clone(),
            cli.currencies.clone(),
            cli.alert_sigma,
            cli.warning_sigma,
            cli.window_days,
        )
    }

    pub fn from_options(
        data_file: Option<String>,
        currencies: Option<String>,
        alert_sigma: f64,
        warning_sigma: f64,
        window_days: usize,
    ) -> Result<Self> {
        let currencies = currencies
            .map(|list| parse_currency_list(&list))
            .unwrap_or_else(|| DeviationConfig::default().currencies);

        let deviation = DeviationConfig {
            alert_sigma,
            warning_sigma,
            window_days,
            currencies,
        };
        deviation.validate()?;

        // Determine history file path
        let data_file = data_file.map(PathBuf::from).unwrap_or_else(|| {
            // Check FXWATCH_DATA environment variable first
            if let Ok(path) = std::env::var("FXWATCH_DATA") {
                PathBuf::from(path)
            } else {
                dirs::data_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join("fxwatch")
                    .join("historical.json")
            }
        });

        Ok(AppConfig {
            data_file,
            deviation,
        })
    }
}

/// Split a comma-separated list into upper-case codes, dropping blanks and repeats
fn parse_currency_list(list: &str) -> Vec<String> {
    let mut codes: Vec<String> = Vec::new();
    for code in list.split(',').map(|s| s.trim().to_uppercase()) {
        if !code.is_empty() && !codes.contains(&code) {
            codes.push(code);
        }
    }
    codes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config =
            AppConfig::from_options(Some("rates.json".into()), None, 2.0, 1.5, 365).unwrap();
        assert_eq!(config.data_file, PathBuf::from("rates.json"));
        assert_eq!(config.deviation, DeviationConfig::default());
    }

    #[test]
    fn test_custom_currencies() {
        let config = AppConfig::from_options(
            Some("rates.json".into()),
            Some(" jpy, AUD,,jpy ".to_string()),
            2.0,
            1.5,
            90,
        )
        .unwrap();
        assert_eq!(config.deviation.currencies, vec!["JPY", "AUD"]);
        assert_eq!(config.deviation.window_days, 90);
    }

    #[test]
    fn test_invalid_thresholds_rejected() {
        assert!(AppConfig::from_options(None, None, 1.0, 1.5, 365).is_err());
        assert!(AppConfig::from_options(None, Some(",".into()), 2.0, 1.5, 365).is_err());
    }

    #[test]
    fn test_parse_subcommands() {
        let cli = Cli::try_parse_from([
            "fxwatch",
            "check",
            "--json",
            "--alert-sigma",
            "2.5",
            "--data-file",
            "/tmp/h.json",
        ])
        .unwrap();
        assert_eq!(cli.alert_sigma, 2.5);
        assert_eq!(cli.data_file.as_deref(), Some("/tmp/h.json"));
        assert!(matches!(cli.command, Commands::Check { json: true, .. }));

        let cli = Cli::try_parse_from(["fxwatch", "backfill", "--days", "730"]).unwrap();
        assert!(matches!(cli.command, Commands::Backfill { days: 730 }));

        assert!(Cli::try_parse_from(["fxwatch", "backfill", "--days", "0"]).is_err());
        assert!(Cli::try_parse_from(["fxwatch", "backfill", "--days", "5000"]).is_err());
    }
}
