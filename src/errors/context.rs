//! Error context enhancement utilities
//!
//! [`ErrorContextExt`] wraps foreign errors into [`AppError`] with a
//! description of the failed operation. [`ReportExt`] routes a failing
//! `Result` through a [`Reporter`] and hands it back untouched, which is the
//! "catch, log, continue" shape most call sites want.

use std::path::PathBuf;

use super::types::AppError;
use crate::report::ErrorReport;
use crate::reporter::Reporter;

/// Extension trait for adding context to error types
pub trait ErrorContextExt<T> {
    /// Add operation and file context
    fn in_file_operation(
        self,
        path: impl Into<PathBuf>,
        operation: impl Into<String>,
    ) -> Result<T, AppError>;
}

impl<T, E> ErrorContextExt<T> for Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn in_file_operation(
        self,
        path: impl Into<PathBuf>,
        operation: impl Into<String>,
    ) -> Result<T, AppError> {
        let path = path.into();
        let operation = operation.into();
        self.map_err(|e| AppError::Io {
            operation: format!("{operation}: {e}"),
            path,
            source: Some(Box::new(e)),
        })
    }
}

/// Report the error side of a `Result` and pass the `Result` through
pub trait ReportExt<T, E> {
    /// Capture the error, classifying it with the reporter's expected kinds
    fn report_err(self, reporter: &Reporter) -> Result<T, E>;

    /// Capture the error with an explicit expected flag
    fn report_err_as(self, reporter: &Reporter, expected: bool) -> Result<T, E>;
}

impl<T, E> ReportExt<T, E> for Result<T, E>
where
    E: std::error::Error + 'static,
{
    fn report_err(self, reporter: &Reporter) -> Result<T, E> {
        if let Err(ref error) = self {
            reporter.capture(error);
        }
        self
    }

    fn report_err_as(self, reporter: &Reporter, expected: bool) -> Result<T, E> {
        if let Err(ref error) = self {
            reporter.report(ErrorReport::from_error(error).expected(expected).build());
        }
        self
    }
}
