//! Deviation scoring, alert classification and alert delivery.

mod alert;
mod deviation;
mod sink;

pub use alert::{format_alert_message, Alert, AlertLevel};
pub use deviation::{DeviationConfig, DeviationEngine, Evaluation, RateSummary};
pub use sink::{AlertSink, FileSink, StdoutSink};
