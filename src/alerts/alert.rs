//! Alert records and the notification message built from them.

use std::fmt;

use chrono::{DateTime, Local};
use serde::Serialize;

use super::deviation::DeviationResult;
use crate::data::BASE_CURRENCY;

/// How far outside its usual range a rate has moved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AlertLevel {
    Warning,
    Alert,
}

impl AlertLevel {
    pub fn marker(self) -> &'static str {
        match self {
            AlertLevel::Alert => "🔴",
            AlertLevel::Warning => "🟡",
        }
    }
}

impl fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertLevel::Warning => write!(f, "WARNING"),
            AlertLevel::Alert => write!(f, "ALERT"),
        }
    }
}

/// A currency whose latest rate cleared the warning threshold
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    pub level: AlertLevel,
    pub currency: String,
    pub data: DeviationResult,
}

/// Render alerts into a single message for a notification sink.
///
/// Returns None when there is nothing to report.
pub fn format_alert_message(alerts: &[Alert], checked_at: DateTime<Local>) -> Option<String> {
    if alerts.is_empty() {
        return None;
    }

    let mut message = String::from("⚠️ *FX deviation alert*\n\n");
    for alert in alerts {
        let data = &alert.data;
        message.push_str(&format!(
            "{} *{BASE_CURRENCY}/{}*\n",
            alert.level.marker(),
            alert.currency
        ));
        message.push_str(&format!("Current: {:.4}\n", data.current));
        message.push_str(&format!("Mean: {:.4}\n", data.mean));
        message.push_str(&format!("Deviation: {:+.2}σ\n\n", data.deviation));
    }
    message.push_str(&format!(
        "_Checked at: {}_",
        checked_at.format("%Y-%m-%d %H:%M:%S")
    ));

    Some(message)
}
