//! Delivery targets for rendered alert messages.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};

/// Accepts a pre-formatted alert message and takes care of delivering it
pub trait AlertSink {
    fn deliver(&self, message: &str) -> Result<()>;
}

/// Prints messages to standard output
pub struct StdoutSink;

impl AlertSink for StdoutSink {
    fn deliver(&self, message: &str) -> Result<()> {
        let mut out = std::io::stdout().lock();
        writeln!(out, "{message}").context("Failed to write alert to stdout")
    }
}

/// Appends messages to a log file, one blank line between entries
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    pub fn new(path: PathBuf) -> Self {
        FileSink { path }
    }
}

impl AlertSink for FileSink {
    fn deliver(&self, message: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open alert log: {:?}", self.path))?;
        writeln!(file, "{message}\n")
            .with_context(|| format!("Failed to append to alert log: {:?}", self.path))
    }
}
