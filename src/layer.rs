//! Tracing layer that reports error-level events
//!
//! Installing [`ReportLayer`] next to the usual fmt layer makes every
//! `tracing::error!` in the application produce an [`ErrorReport`]:
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use errbrake::{layer::ReportLayer, Reporter};
//! use tracing_subscriber::prelude::*;
//!
//! let reporter = Arc::new(Reporter::console());
//! tracing_subscriber::registry()
//!     .with(tracing_subscriber::fmt::layer())
//!     .with(ReportLayer::new(reporter))
//!     .init();
//!
//! tracing::error!(kind = "Timeout", request_id = "r-17", "upstream did not answer");
//! ```
//!
//! The event message becomes the report message. A `kind` field sets the
//! kind, otherwise the event target is used. Remaining fields land in the
//! report context. Events emitted by errbrake itself are ignored.

use std::fmt;
use std::sync::Arc;

use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

use crate::global;
use crate::report::{ErrorReport, StackFrame};
use crate::reporter::Reporter;

const OWN_TARGET: &str = env!("CARGO_CRATE_NAME");

pub struct ReportLayer {
    reporter: Option<Arc<Reporter>>,
    level: Level,
}

impl ReportLayer {
    /// Report through an explicit reporter
    pub fn new(reporter: Arc<Reporter>) -> Self {
        Self {
            reporter: Some(reporter),
            level: Level::ERROR,
        }
    }

    /// Report through whatever [`global::reporter`] returns at event time
    pub fn global() -> Self {
        Self {
            reporter: None,
            level: Level::ERROR,
        }
    }

    /// Also report events down to `level` (`WARN` reports warnings too)
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    fn reporter(&self) -> Arc<Reporter> {
        match &self.reporter {
            Some(reporter) => reporter.clone(),
            None => global::reporter(),
        }
    }
}

impl<S: Subscriber> Layer<S> for ReportLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        // More verbose levels compare greater
        if *metadata.level() > self.level || is_own_target(metadata.target()) {
            return;
        }

        let mut fields = EventFields::default();
        event.record(&mut fields);

        let reporter = self.reporter();
        let kind = fields.kind.unwrap_or_else(|| metadata.target().to_string());
        let mut builder = ErrorReport::builder(kind, fields.message.unwrap_or_default())
            .context("target", metadata.target())
            .context("level", metadata.level().as_str());

        if let (Some(file), Some(line)) = (metadata.file(), metadata.line()) {
            let function = metadata.module_path().unwrap_or(metadata.target());
            builder = builder.frame(StackFrame::new(function, file, line));
        }
        for (key, value) in fields.context {
            builder = builder.context(key, value);
        }

        let expected = reporter.classifier().is_expected(builder.kind());
        reporter.report(builder.expected(expected).build());
    }
}

fn is_own_target(target: &str) -> bool {
    target == OWN_TARGET
        || target
            .strip_prefix(OWN_TARGET)
            .is_some_and(|rest| rest.starts_with("::"))
}

#[derive(Default)]
struct EventFields {
    message: Option<String>,
    kind: Option<String>,
    context: Vec<(String, String)>,
}

impl EventFields {
    fn store(&mut self, field: &Field, value: String) {
        match field.name() {
            "message" => self.message = Some(value),
            "kind" => self.kind = Some(value),
            name => self.context.push((name.to_string(), value)),
        }
    }
}

impl Visit for EventFields {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.store(field, value.to_string());
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.store(field, value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.store(field, format!("{value:?}"));
    }
}
