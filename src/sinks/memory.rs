use std::sync::Mutex;

use super::Sink;
use crate::errors::{AppError, AppResult};
use crate::report::ErrorReport;

/// Keeps every formatted report in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: Mutex<Vec<String>>,
    reports: Mutex<Vec<ErrorReport>>,
}

impl MemorySink {
    /// Formatted text written so far, oldest first
    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Reports written so far, oldest first
    pub fn reports(&self) -> Vec<ErrorReport> {
        self.reports.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

impl Sink for MemorySink {
    fn name(&self) -> &str {
        "memory"
    }

    fn write(&self, formatted: &str, report: &ErrorReport) -> AppResult<()> {
        self.entries
            .lock()
            .map_err(|_| AppError::sink("memory", "lock poisoned"))?
            .push(formatted.to_string());
        self.reports
            .lock()
            .map_err(|_| AppError::sink("memory", "lock poisoned"))?
            .push(report.clone());
        Ok(())
    }
}
