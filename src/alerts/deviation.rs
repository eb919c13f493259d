//! Rolling z-score of the latest rate against its recent history.

use serde::Serialize;

use super::alert::{Alert, AlertLevel};
use crate::data::RateStore;

/// Thresholds, lookback and tracked currencies for an evaluation run.
///
/// Built once at startup and never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviationConfig {
    /// |z| at or above this is a red alert
    pub alert_sigma: f64,
    /// |z| at or above this (but below `alert_sigma`) is a yellow warning
    pub warning_sigma: f64,
    /// Number of most recent snapshots considered
    pub window_days: usize,
    /// Tracked quote currencies, in display order
    pub currencies: Vec<String>,
}

impl Default for DeviationConfig {
    fn default() -> Self {
        DeviationConfig {
            alert_sigma: 2.0,
            warning_sigma: 1.5,
            window_days: 365,
            currencies: ["CNY", "SGD", "JPY", "AUD"]
                .iter()
                .map(|c| c.to_string())
                .collect(),
        }
    }
}

impl DeviationConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if !(self.warning_sigma > 0.0 && self.alert_sigma > 0.0) {
            anyhow::bail!("Sigma thresholds must be positive");
        }
        if self.warning_sigma > self.alert_sigma {
            anyhow::bail!(
                "Warning threshold ({}) must not exceed alert threshold ({})",
                self.warning_sigma,
                self.alert_sigma
            );
        }
        if self.window_days < 2 {
            anyhow::bail!("Window must cover at least 2 days, got {}", self.window_days);
        }
        if self.currencies.is_empty() {
            anyhow::bail!("At least one currency must be tracked");
        }
        Ok(())
    }

    /// Alert level for an absolute deviation, or None when it is within bounds
    pub fn classify(&self, abs_deviation: f64) -> Option<AlertLevel> {
        if abs_deviation >= self.alert_sigma {
            Some(AlertLevel::Alert)
        } else if abs_deviation >= self.warning_sigma {
            Some(AlertLevel::Warning)
        } else {
            None
        }
    }
}

/// Statistics for the latest rate of one currency
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviationResult {
    pub currency: String,
    pub current: f64,
    pub mean: f64,
    pub stdev: f64,
    /// Signed z-score of `current`
    pub deviation: f64,
    pub abs_deviation: f64,
}

/// Outcome of evaluating one currency
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
    Scored(DeviationResult),
    /// Fewer than two rates in the window
    InsufficientData { points: usize },
    /// Every rate in the window is identical
    Degenerate,
}

impl Evaluation {
    pub fn result(&self) -> Option<&DeviationResult> {
        match self {
            Evaluation::Scored(result) => Some(result),
            _ => None,
        }
    }
}

/// Descriptive statistics over a window, shown on the dashboard
#[derive(Debug, Clone, PartialEq)]
pub struct RateSummary {
    pub current: f64,
    pub previous: f64,
    pub change_pct: f64,
    pub mean: f64,
    pub stdev: f64,
    pub min: f64,
    pub max: f64,
    pub points: usize,
}

impl RateSummary {
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let &current = values.last()?;
        let previous = if values.len() > 1 {
            values[values.len() - 2]
        } else {
            current
        };
        let (min, max) = values
            .iter()
            .fold((f64::MAX, f64::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v)));

        Some(RateSummary {
            current,
            previous,
            change_pct: (current - previous) / previous * 100.0,
            mean: mean(values),
            stdev: sample_stdev(values).unwrap_or(0.0),
            min,
            max,
            points: values.len(),
        })
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (N-1 denominator); None below two values
fn sample_stdev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values);
    let sum_sq: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Some((sum_sq / (values.len() - 1) as f64).sqrt())
}

/// Scores the latest rate of each tracked currency against its window
pub struct DeviationEngine {
    config: DeviationConfig,
}

impl DeviationEngine {
    pub fn new(config: DeviationConfig) -> Self {
        DeviationEngine { config }
    }

    pub fn config(&self) -> &DeviationConfig {
        &self.config
    }

    pub fn evaluate(&self, currency: &str, store: &RateStore) -> Evaluation {
        let rates = store.window(currency, self.config.window_days);
        score(currency, &rates)
    }

    /// One alert per currency at warning level or above, in configured order
    pub fn check_alerts(&self, store: &RateStore) -> Vec<Alert> {
        self.config
            .currencies
            .iter()
            .filter_map(|currency| {
                let Evaluation::Scored(data) = self.evaluate(currency, store) else {
                    return None;
                };
                let level = self.config.classify(data.abs_deviation)?;
                Some(Alert {
                    level,
                    currency: currency.clone(),
                    data,
                })
            })
            .collect()
    }

    /// Descriptive statistics over the last `max_days` snapshots
    pub fn summary(&self, currency: &str, store: &RateStore, max_days: usize) -> Option<RateSummary> {
        RateSummary::from_values(&store.window(currency, max_days))
    }
}

fn score(currency: &str, rates: &[f64]) -> Evaluation {
    let Some(stdev) = sample_stdev(rates) else {
        return Evaluation::InsufficientData {
            points: rates.len(),
        };
    };
    if stdev == 0.0 {
        return Evaluation::Degenerate;
    }

    let current = rates[rates.len() - 1];
    let mean = mean(rates);
    let deviation = (current - mean) / stdev;

    Evaluation::Scored(DeviationResult {
        currency: currency.to_string(),
        current,
        mean,
        stdev,
        deviation,
        abs_deviation: deviation.abs(),
    })
}
