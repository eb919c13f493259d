//! JSON file storage for the rate history.
//!
//! File layout:
//! - `metadata`: base currency, tracked currencies, date range, last-updated time
//! - `current`: the most recently fetched snapshot
//! - `historical`: every stored snapshot, oldest first

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::debug;

use super::models::{Metadata, RateHistory, Snapshot, BASE_CURRENCY};
use super::store::RateStore;

/// A history file decoded into a usable store
#[derive(Debug, Default)]
pub struct LoadedHistory {
    pub store: RateStore,
    pub current: Option<Snapshot>,
    pub last_updated: Option<DateTime<Utc>>,
}

/// Storage interface for the history file on disk
pub struct Storage {
    path: PathBuf,
}

impl Storage {
    /// Create a new Storage instance pointing at a history file
    pub fn new(path: PathBuf) -> Self {
        Storage { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the history file. A missing file is not an error: it means there
    /// is no prior state and the caller starts from an empty store.
    pub fn load(&self) -> Result<Option<RateHistory>> {
        if !self.path.exists() {
            debug!("No history file at {:?}", self.path);
            return Ok(None);
        }

        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read history file: {:?}", self.path))?;
        let history: RateHistory = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse history file: {:?}", self.path))?;

        debug!(
            "Loaded {} snapshots from {:?}",
            history.historical.len(),
            self.path
        );
        Ok(Some(history))
    }

    /// Load the store and the last fetched snapshot, starting empty if the
    /// file does not exist yet
    pub fn load_store(&self) -> Result<LoadedHistory> {
        let Some(history) = self.load()? else {
            return Ok(LoadedHistory::default());
        };
        let store = RateStore::from_snapshots(history.historical)
            .with_context(|| format!("Corrupt history in {:?}", self.path))?;
        if let Some(current) = &history.current {
            current.validate().with_context(|| {
                format!("Corrupt current snapshot ({}) in {:?}", current.date, self.path)
            })?;
        }
        Ok(LoadedHistory {
            store,
            current: history.current,
            last_updated: history.metadata.last_updated,
        })
    }

    /// Write the store to disk.
    ///
    /// The document goes to a sibling temp file first and is renamed over the
    /// target, so a failed write never leaves a truncated history behind.
    pub fn save(
        &self,
        store: &RateStore,
        current: Option<&Snapshot>,
        currencies: &[String],
    ) -> Result<()> {
        let history = build_history(store, current, currencies, Utc::now());
        let json = serde_json::to_string_pretty(&history)
            .context("Failed to serialize rate history")?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {parent:?}"))?;
        }

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).with_context(|| format!("Failed to write {tmp:?}"))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to replace history file: {:?}", self.path))?;

        debug!("Saved {} snapshots to {:?}", store.len(), self.path);
        Ok(())
    }
}

/// Assemble the on-disk document, deriving metadata from the store
fn build_history(
    store: &RateStore,
    current: Option<&Snapshot>,
    currencies: &[String],
    now: DateTime<Utc>,
) -> RateHistory {
    RateHistory {
        metadata: Metadata {
            base_currency: BASE_CURRENCY.to_string(),
            currencies: currencies.to_vec(),
            total_days: store.len(),
            start_date: store.first_date(),
            end_date: store.last_date(),
            last_updated: Some(now),
        },
        current: current.or_else(|| store.latest()).cloned(),
        historical: store.snapshots().to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn snap(date: &str, cny: f64, sgd: Option<f64>) -> Snapshot {
        let mut rates = std::collections::BTreeMap::new();
        rates.insert("CNY".to_string(), cny);
        if let Some(sgd) = sgd {
            rates.insert("SGD".to_string(), sgd);
        }
        Snapshot {
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            base: "USD".to_string(),
            rates,
        }
    }

    fn currencies() -> Vec<String> {
        vec!["CNY".to_string(), "SGD".to_string()]
    }

    #[test]
    fn test_load_missing_file_is_empty_start() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::new(dir.path().join("nothing-here.json"));

        assert!(storage.load().unwrap().is_none());
        let loaded = storage.load_store().unwrap();
        assert!(loaded.store.is_empty());
        assert!(loaded.current.is_none());
        assert!(loaded.last_updated.is_none());
    }

    #[test]
    fn test_save_and_reload_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::new(dir.path().join("data").join("historical.json"));

        let mut store = RateStore::new();
        store.upsert(snap("2024-03-01", 7.10, Some(1.34))).unwrap();
        store.upsert(snap("2024-03-02", 7.12, None)).unwrap();
        store.upsert(snap("2024-03-04", 7.09, Some(1.35))).unwrap();

        storage.save(&store, None, &currencies()).unwrap();
        let loaded = storage.load_store().unwrap();

        assert_eq!(loaded.store, store);
        assert_eq!(loaded.current.as_ref(), store.latest());
        assert!(loaded.last_updated.is_some());
    }

    #[test]
    fn test_saved_metadata_describes_store() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::new(dir.path().join("historical.json"));

        let mut store = RateStore::new();
        store.upsert(snap("2024-03-01", 7.10, None)).unwrap();
        store.upsert(snap("2024-03-02", 7.12, None)).unwrap();
        let fetched = snap("2024-03-02", 7.15, None);

        storage.save(&store, Some(&fetched), &currencies()).unwrap();
        let history = storage.load().unwrap().unwrap();

        assert_eq!(history.metadata.base_currency, "USD");
        assert_eq!(history.metadata.total_days, 2);
        assert_eq!(history.metadata.currencies, currencies());
        assert_eq!(
            history.metadata.end_date,
            NaiveDate::from_ymd_opt(2024, 3, 2)
        );
        assert!(history.metadata.last_updated.is_some());
        assert_eq!(history.current, Some(fetched));
        assert!(!dir.path().join("historical.json.tmp").exists());
    }

    #[test]
    fn test_load_rejects_unordered_history() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("historical.json");
        let json = r#"{
            "metadata": {"base_currency": "USD", "currencies": ["CNY"]},
            "current": null,
            "historical": [
                {"date": "2024-03-02", "base": "USD", "rates": {"CNY": 7.1}},
                {"date": "2024-03-01", "base": "USD", "rates": {"CNY": 7.2}}
            ]
        }"#;
        fs::write(&path, json).unwrap();

        let storage = Storage::new(path);
        assert!(storage.load().unwrap().is_some());
        assert!(storage.load_store().is_err());
    }

    #[test]
    fn test_load_rejects_non_positive_rates() {
        let dir = tempfile::tempdir().unwrap();
        let cases = [
            (r#"{"CNY": 0.0, "EUR": 0.9}"#, r#"{"CNY": 7.2}"#),
            (r#"{"CNY": 7.1}"#, r#"{"CNY": -7.2}"#),
        ];

        for (i, (first, second)) in cases.iter().enumerate() {
            let path = dir.path().join(format!("historical-{i}.json"));
            let json = format!(
                r#"{{
                    "metadata": {{"base_currency": "USD", "currencies": ["CNY"]}},
                    "current": null,
                    "historical": [
                        {{"date": "2024-03-01", "base": "USD", "rates": {first}}},
                        {{"date": "2024-03-02", "base": "USD", "rates": {second}}}
                    ]
                }}"#
            );
            fs::write(&path, json).unwrap();

            let err = Storage::new(path).load_store().unwrap_err();
            assert!(format!("{err:#}").contains("must be finite and positive"));
        }
    }

    #[test]
    fn test_load_rejects_bad_current_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("historical.json");
        let json = r#"{
            "metadata": {"base_currency": "USD", "currencies": ["CNY"]},
            "current": {"date": "2024-03-02", "base": "USD", "rates": {"CNY": 0.0}},
            "historical": [
                {"date": "2024-03-01", "base": "USD", "rates": {"CNY": 7.1}}
            ]
        }"#;
        fs::write(&path, json).unwrap();

        assert!(Storage::new(path).load_store().is_err());
    }

    #[test]
    fn test_failed_save_keeps_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("historical.json");
        let storage = Storage::new(path.clone());

        let mut store = RateStore::new();
        store.upsert(snap("2024-03-01", 7.10, None)).unwrap();
        storage.save(&store, None, &currencies()).unwrap();
        let before = fs::read_to_string(&path).unwrap();

        // A directory squatting on the temp path makes the write fail
        fs::create_dir(dir.path().join("historical.json.tmp")).unwrap();
        store.upsert(snap("2024-03-02", 7.20, None)).unwrap();
        assert!(storage.save(&store, None, &currencies()).is_err());

        assert_eq!(fs::read_to_string(&path).unwrap(), before);
        assert_eq!(store.len(), 2);
    }
}
