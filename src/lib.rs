//! errbrake: error capture and reporting
//!
//! Errors caught by an application are turned into [`ErrorReport`]s,
//! classified as expected or unexpected, formatted as text and handed to one
//! or more [`Sink`]s. The console sink writes to stderr; the remote sink
//! forwards reports to a collector service through [`NotifierClient`].
//!
//! ```rust,no_run
//! use errbrake::{Reporter, sinks::ConsoleSink};
//!
//! let reporter = Reporter::builder()
//!     .expected_kinds(["NotFound"])
//!     .sink(ConsoleSink::stderr())
//!     .build();
//!
//! let err = std::io::Error::new(std::io::ErrorKind::NotFound, "settings.toml");
//! reporter.capture(&err);
//! ```

pub mod classifier;
pub mod clients;
pub mod config;
pub mod errors;
pub mod formatter;
pub mod global;
pub mod layer;
pub mod report;
pub mod reporter;
pub mod sinks;

pub use classifier::Classifier;
pub use clients::{DeliveryResult, NotificationClient, NotifierClient};
pub use config::{Config, ConfigManager, NotifierConfig};
pub use errors::{AppError, AppResult, ReportExt};
pub use layer::ReportLayer;
pub use report::{ErrorReport, ErrorReportBuilder, StackFrame};
pub use reporter::{install_panic_hook, Reporter, ReporterBuilder};
pub use sinks::{ConsoleSink, MemorySink, RemoteSink, Sink};
