//! Data models for daily exchange-rate snapshots and the persisted history file.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Currency every snapshot is quoted against
pub const BASE_CURRENCY: &str = "USD";

/// Rejection reasons for a snapshot's contents
#[derive(Debug, Error, PartialEq)]
pub enum SnapshotError {
    #[error("rate for {currency} must be finite and positive, got {value}")]
    InvalidRate { currency: String, value: f64 },

    #[error("no tracked currency present in quotes for {0}")]
    NoTrackedRates(NaiveDate),
}

fn default_base() -> String {
    BASE_CURRENCY.to_string()
}

/// Rates for a single calendar day, quoted as units of `currency` per one `base`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub date: NaiveDate,
    #[serde(default = "default_base")]
    pub base: String,
    pub rates: BTreeMap<String, f64>,
}

impl Snapshot {
    /// Build a snapshot from raw provider quotes.
    ///
    /// Codes are upper-cased and anything outside `tracked` is dropped. Every
    /// kept rate must be finite and strictly positive.
    pub fn from_quotes<I>(
        date: NaiveDate,
        base: &str,
        quotes: I,
        tracked: &[String],
    ) -> Result<Self, SnapshotError>
    where
        I: IntoIterator<Item = (String, f64)>,
    {
        let mut rates = BTreeMap::new();
        for (code, value) in quotes {
            let code = code.to_uppercase();
            if !tracked.iter().any(|t| *t == code) {
                continue;
            }
            check_rate(&code, value)?;
            rates.insert(code, value);
        }

        if rates.is_empty() {
            return Err(SnapshotError::NoTrackedRates(date));
        }

        Ok(Snapshot {
            date,
            base: base.to_uppercase(),
            rates,
        })
    }

    /// Check every stored rate is finite and strictly positive
    pub fn validate(&self) -> Result<(), SnapshotError> {
        self.rates
            .iter()
            .try_for_each(|(code, value)| check_rate(code, *value))
    }

    /// Rate for a currency code, if this day has one
    pub fn rate(&self, currency: &str) -> Option<f64> {
        self.rates.get(currency).copied()
    }
}

fn check_rate(currency: &str, value: f64) -> Result<(), SnapshotError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SnapshotError::InvalidRate {
            currency: currency.to_string(),
            value,
        })
    }
}

/// Summary block written at the top of the history file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(alias = "base")]
    pub base_currency: String,
    pub currencies: Vec<String>,
    #[serde(default)]
    pub total_days: usize,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    pub last_updated: Option<DateTime<Utc>>,
}

/// On-disk layout of the rate history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateHistory {
    pub metadata: Metadata,
    #[serde(default)]
    pub current: Option<Snapshot>,
    #[serde(default)]
    pub historical: Vec<Snapshot>,
}

/// Parse a timestamp string into a DateTime<Utc>
///
/// Older history files carry naive local timestamps without an offset; those
/// are read as UTC.
pub fn parse_timestamp(timestamp: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(timestamp)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            chrono::NaiveDateTime::parse_from_str(timestamp, "%Y-%m-%dT%H:%M:%S%.f")
                .map(|dt| dt.and_utc())
                .ok()
        })
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_timestamp))
}
