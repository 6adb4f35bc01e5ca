//! Destinations for formatted error reports
//!
//! - **ConsoleSink**: writes the formatted text to stderr (or any writer)
//! - **RemoteSink**: hands the report to a notification client on a
//!   background task
//! - **MemorySink**: keeps formatted text in memory, for tests and previews
//!
//! A sink may fail, but its failure is the reporter's problem to log, never
//! the application's: see [`Reporter`](crate::reporter::Reporter).

pub mod console;
pub mod memory;
pub mod remote;

use std::sync::Arc;

use crate::errors::AppResult;
use crate::report::ErrorReport;

pub use console::ConsoleSink;
pub use memory::MemorySink;
pub use remote::RemoteSink;

/// Anything that consumes formatted reports
pub trait Sink: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Write one formatted report
    ///
    /// `report` is the structured value behind `formatted`; sinks that
    /// transmit structured data use it instead of the text.
    fn write(&self, formatted: &str, report: &ErrorReport) -> AppResult<()>;
}

impl<S: Sink + ?Sized> Sink for Arc<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn write(&self, formatted: &str, report: &ErrorReport) -> AppResult<()> {
        (**self).write(formatted, report)
    }
}

impl<S: Sink + ?Sized> Sink for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn write(&self, formatted: &str, report: &ErrorReport) -> AppResult<()> {
        (**self).write(formatted, report)
    }
}
