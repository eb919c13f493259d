//! In-memory daily rate history.
//!
//! The store only ever grows at its tail: a snapshot either replaces the most
//! recent day (same-date correction) or is appended after it. Anything older
//! than the latest stored day is rejected.

use chrono::NaiveDate;
use thiserror::Error;

use super::models::{Snapshot, SnapshotError};

#[derive(Debug, Error, PartialEq)]
pub enum StoreError {
    #[error("snapshot for {date} is older than the latest stored day {latest}")]
    OutOfOrder { date: NaiveDate, latest: NaiveDate },

    #[error("snapshot #{index} ({date}) is not later than the one before it")]
    Unordered { index: usize, date: NaiveDate },

    #[error("snapshot #{index} ({date}) is invalid: {source}")]
    InvalidSnapshot {
        index: usize,
        date: NaiveDate,
        #[source]
        source: SnapshotError,
    },
}

/// What an upsert did to the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Appended,
    Replaced,
}

/// Snapshots ordered ascending by date, at most one per day
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateStore {
    snapshots: Vec<Snapshot>,
}

impl RateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from persisted snapshots, which must already be strictly
    /// ascending by date and carry only finite positive rates.
    pub fn from_snapshots(snapshots: Vec<Snapshot>) -> Result<Self, StoreError> {
        for (index, snapshot) in snapshots.iter().enumerate() {
            snapshot
                .validate()
                .map_err(|source| StoreError::InvalidSnapshot {
                    index,
                    date: snapshot.date,
                    source,
                })?;
        }
        for (index, pair) in snapshots.windows(2).enumerate() {
            if pair[1].date <= pair[0].date {
                return Err(StoreError::Unordered {
                    index: index + 1,
                    date: pair[1].date,
                });
            }
        }
        Ok(RateStore { snapshots })
    }

    /// Insert a day, or overwrite the latest day when the dates match.
    ///
    /// On error the store is left untouched.
    pub fn upsert(&mut self, snapshot: Snapshot) -> Result<Upsert, StoreError> {
        let Some(last) = self.snapshots.last_mut() else {
            self.snapshots.push(snapshot);
            return Ok(Upsert::Appended);
        };

        if snapshot.date == last.date {
            *last = snapshot;
            Ok(Upsert::Replaced)
        } else if snapshot.date > last.date {
            self.snapshots.push(snapshot);
            Ok(Upsert::Appended)
        } else {
            Err(StoreError::OutOfOrder {
                date: snapshot.date,
                latest: last.date,
            })
        }
    }

    /// The most recent `max_days` snapshots (fewer if the store is shorter)
    fn recent(&self, max_days: usize) -> &[Snapshot] {
        let start = self.snapshots.len().saturating_sub(max_days);
        &self.snapshots[start..]
    }

    /// Rates for `currency` across the most recent `max_days` snapshots, oldest first.
    ///
    /// Days without a quote for `currency` are skipped rather than counted as
    /// zero, so the result can be shorter than `max_days` even on a full store.
    pub fn window(&self, currency: &str, max_days: usize) -> Vec<f64> {
        self.recent(max_days)
            .iter()
            .filter_map(|s| s.rate(currency))
            .collect()
    }

    /// Dated form of [`RateStore::window`], used for charting
    pub fn series(&self, currency: &str, max_days: usize) -> Vec<(NaiveDate, f64)> {
        self.recent(max_days)
            .iter()
            .filter_map(|s| s.rate(currency).map(|r| (s.date, r)))
            .collect()
    }

    pub fn latest(&self) -> Option<&Snapshot> {
        self.snapshots.last()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.snapshots.first().map(|s| s.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.snapshots.last().map(|s| s.date)
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn snap(date: &str, rates: &[(&str, f64)]) -> Snapshot {
        Snapshot {
            date: day(date),
            base: "USD".to_string(),
            rates: rates
                .iter()
                .map(|(c, r)| (c.to_string(), *r))
                .collect::<BTreeMap<_, _>>(),
        }
    }

    #[test]
    fn test_upsert_appends_in_date_order() {
        let mut store = RateStore::new();
        let s1 = snap("2024-03-01", &[("CNY", 7.10)]);
        let s2 = snap("2024-03-02", &[("CNY", 7.12)]);

        assert_eq!(store.upsert(s1.clone()).unwrap(), Upsert::Appended);
        assert_eq!(store.upsert(s2.clone()).unwrap(), Upsert::Appended);

        assert_eq!(store.len(), 2);
        assert_eq!(store.snapshots(), &[s1, s2]);
    }

    #[test]
    fn test_upsert_same_day_replaces_latest() {
        let mut store = RateStore::new();
        store.upsert(snap("2024-03-01", &[("CNY", 7.10)])).unwrap();
        store.upsert(snap("2024-03-02", &[("CNY", 7.12)])).unwrap();

        let result = store.upsert(snap("2024-03-02", &[("CNY", 7.20), ("SGD", 1.34)]));

        assert_eq!(result, Ok(Upsert::Replaced));
        assert_eq!(store.len(), 2);
        let latest = store.latest().unwrap();
        assert_eq!(latest.rate("CNY"), Some(7.20));
        assert_eq!(latest.rate("SGD"), Some(1.34));
    }

    #[test]
    fn test_upsert_rejects_older_day_and_leaves_store_alone() {
        let mut store = RateStore::new();
        store.upsert(snap("2024-03-01", &[("CNY", 7.10)])).unwrap();
        store.upsert(snap("2024-03-03", &[("CNY", 7.12)])).unwrap();
        let before = store.clone();

        let result = store.upsert(snap("2024-03-02", &[("CNY", 9.99)]));

        assert_eq!(
            result,
            Err(StoreError::OutOfOrder {
                date: day("2024-03-02"),
                latest: day("2024-03-03"),
            })
        );
        assert_eq!(store, before);
    }

    #[test]
    fn test_window_is_bounded_and_ascending() {
        let mut store = RateStore::new();
        for (i, rate) in [1.0, 2.0, 3.0, 4.0, 5.0].iter().enumerate() {
            store
                .upsert(snap(&format!("2024-03-0{}", i + 1), &[("AUD", *rate)]))
                .unwrap();
        }

        assert_eq!(store.window("AUD", 3), vec![3.0, 4.0, 5.0]);
        assert_eq!(store.window("AUD", 100), vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        assert!(store.window("AUD", 0).is_empty());
    }

    #[test]
    fn test_window_skips_days_missing_the_currency() {
        let mut store = RateStore::new();
        store.upsert(snap("2024-03-01", &[("JPY", 150.0), ("CNY", 7.1)])).unwrap();
        store.upsert(snap("2024-03-02", &[("CNY", 7.2)])).unwrap();
        store.upsert(snap("2024-03-03", &[("JPY", 151.0), ("CNY", 7.3)])).unwrap();

        // The window covers the last two days, only one of which has JPY
        assert_eq!(store.window("JPY", 2), vec![151.0]);
        assert_eq!(store.window("JPY", 3), vec![150.0, 151.0]);
        assert_eq!(
            store.series("JPY", 3),
            vec![(day("2024-03-01"), 150.0), (day("2024-03-03"), 151.0)]
        );
    }

    #[test]
    fn test_empty_store_reads() {
        let store = RateStore::new();
        assert!(store.latest().is_none());
        assert!(store.window("CNY", 365).is_empty());
        assert!(store.first_date().is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_from_snapshots_validates_order() {
        let ok = RateStore::from_snapshots(vec![
            snap("2024-03-01", &[("CNY", 7.1)]),
            snap("2024-03-02", &[("CNY", 7.2)]),
        ])
        .unwrap();
        assert_eq!(ok.first_date(), Some(day("2024-03-01")));
        assert_eq!(ok.last_date(), Some(day("2024-03-02")));

        let dup = RateStore::from_snapshots(vec![
            snap("2024-03-01", &[("CNY", 7.1)]),
            snap("2024-03-02", &[("CNY", 7.2)]),
            snap("2024-03-02", &[("CNY", 7.3)]),
        ]);
        assert_eq!(
            dup,
            Err(StoreError::Unordered {
                index: 2,
                date: day("2024-03-02"),
            })
        );
    }

    #[test]
    fn test_from_snapshots_rejects_bad_rates() {
        let zero = RateStore::from_snapshots(vec![
            snap("2024-03-01", &[("CNY", 7.1)]),
            snap("2024-03-02", &[("CNY", 0.0)]),
        ]);
        assert_eq!(
            zero,
            Err(StoreError::InvalidSnapshot {
                index: 1,
                date: day("2024-03-02"),
                source: SnapshotError::InvalidRate {
                    currency: "CNY".to_string(),
                    value: 0.0,
                },
            })
        );

        let infinite = RateStore::from_snapshots(vec![snap("2024-03-01", &[("JPY", f64::INFINITY)])]);
        assert!(matches!(infinite, Err(StoreError::InvalidSnapshot { index: 0, .. })));
    }
}
