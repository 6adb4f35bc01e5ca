use std::io::Write;
use std::sync::{Arc, Mutex};

use super::Sink;
use crate::errors::{AppError, AppResult};
use crate::report::ErrorReport;

type SharedWriter = Arc<Mutex<Box<dyn Write + Send>>>;

/// Writes formatted reports to the process's diagnostic stream
///
/// Cloning shares the underlying writer, so output from clones never
/// interleaves within a single report.
#[derive(Clone)]
pub struct ConsoleSink {
    writer: SharedWriter,
}

impl ConsoleSink {
    /// Console sink on stderr
    pub fn stderr() -> Self {
        Self::with_writer(std::io::stderr())
    }

    /// Console sink on stdout
    pub fn stdout() -> Self {
        Self::with_writer(std::io::stdout())
    }

    pub fn with_writer(writer: impl Write + Send + 'static) -> Self {
        Self {
            writer: Arc::new(Mutex::new(Box::new(writer))),
        }
    }

    /// Write a free-form line, used for local failure records
    pub fn write_line(&self, line: &str) -> AppResult<()> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| AppError::sink("console", "writer lock poisoned"))?;
        writeln!(writer, "{line}")
            .and_then(|_| writer.flush())
            .map_err(|e| AppError::sink_with_source("console", "write failed", e))
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::stderr()
    }
}

impl std::fmt::Debug for ConsoleSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsoleSink").finish_non_exhaustive()
    }
}

impl Sink for ConsoleSink {
    fn name(&self) -> &str {
        "console"
    }

    fn write(&self, formatted: &str, _report: &ErrorReport) -> AppResult<()> {
        self.write_line(formatted)
    }
}
