//! Capture pipeline: classify, format, dispatch to sinks
//!
//! A [`Reporter`] is constructed explicitly and passed to the code that
//! catches errors. Every capture produces at least one record on some sink;
//! sink failures are written to a dedicated console sink and never reach the
//! calling code.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::classifier::Classifier;
use crate::clients::{context_filter, DeliveryResult, NotifierClient};
use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::formatter;
use crate::report::ErrorReport;
use crate::sinks::{ConsoleSink, RemoteSink, Sink};

pub struct Reporter {
    classifier: Classifier,
    sinks: Vec<Arc<dyn Sink>>,
    remote: Option<Arc<RemoteSink>>,
    fallback: ConsoleSink,
}

impl Reporter {
    pub fn builder() -> ReporterBuilder {
        ReporterBuilder::default()
    }

    /// Reporter that only writes to stderr
    pub fn console() -> Self {
        Self::builder().build()
    }

    /// Build a reporter from loaded configuration
    ///
    /// The console sink is always present. A remote sink is added when
    /// reporting is enabled and the notifier section is filled in; a notifier
    /// section left entirely blank means "no remote reporting". An invalid
    /// notifier section is logged and the reporter runs console-only; use
    /// [`Reporter::try_from_config`] to treat it as fatal instead.
    pub fn from_config(config: &Config) -> Self {
        Self::try_from_config(config).unwrap_or_else(|e| {
            warn!(error = %e, "remote reporting disabled: invalid notifier configuration");
            Self::builder()
                .expected_kinds(config.reporting.expected_kinds.iter().cloned())
                .sink(ConsoleSink::stderr())
                .build()
        })
    }

    /// Like [`Reporter::from_config`], but surfaces notifier configuration errors
    ///
    /// # Errors
    ///
    /// Returns the configuration error from [`NotifierClient::configure`]
    /// when the notifier section is partially filled or invalid.
    pub fn try_from_config(config: &Config) -> AppResult<Self> {
        let mut builder = Self::builder()
            .expected_kinds(config.reporting.expected_kinds.iter().cloned())
            .sink(ConsoleSink::stderr());

        let notifier = &config.notifier;
        let blank = [&notifier.endpoint, &notifier.project_id, &notifier.project_key]
            .iter()
            .all(|value| value.trim().is_empty());

        if !config.reporting.remote_enabled {
            debug!("remote reporting disabled by configuration");
        } else if blank {
            debug!("remote reporting disabled: notifier not configured");
        } else {
            let client = NotifierClient::configure(notifier.clone())?
                .with_shared_filter(context_filter(config.reporting.context.clone()));
            builder = builder.remote(RemoteSink::new(Arc::new(client)));
        }

        Ok(builder.build())
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn has_remote(&self) -> bool {
        self.remote.is_some()
    }

    /// Capture an error value, classifying it by [`crate::report::error_kind`]
    pub fn capture<E>(&self, error: &E) -> ErrorReport
    where
        E: std::error::Error + 'static,
    {
        let builder = ErrorReport::from_error(error);
        let expected = self.classifier.is_expected(builder.kind());
        self.report(builder.expected(expected).build())
    }

    /// Capture a trait-object error under an explicit kind
    pub fn capture_dyn(
        &self,
        kind: &str,
        error: &(dyn std::error::Error + 'static),
    ) -> ErrorReport {
        let expected = self.classifier.is_expected(kind);
        self.report(ErrorReport::from_dyn_error(kind, error).expected(expected).build())
    }

    /// Capture a failure that has no error value, only a kind and message
    #[track_caller]
    pub fn capture_message(&self, kind: &str, message: &str) -> ErrorReport {
        self.capture_with(kind, message, None)
    }

    /// Capture a kind and message, optionally overriding classification
    #[track_caller]
    pub fn capture_with(&self, kind: &str, message: &str, expected: Option<bool>) -> ErrorReport {
        let location = std::panic::Location::caller();
        let report = ErrorReport::builder(kind, message)
            .frames(crate::report::capture_frames())
            .context("location", format!("{}:{}", location.file(), location.line()))
            .expected(expected.unwrap_or_else(|| self.classifier.is_expected(kind)))
            .build();
        self.report(report)
    }

    /// Format a finished report and hand it to every sink
    ///
    /// The report keeps its own `expected` flag; no reclassification happens.
    pub fn report(&self, report: ErrorReport) -> ErrorReport {
        let formatted = formatter::format(&report);
        for sink in &self.sinks {
            if let Err(e) = sink.write(&formatted, &report) {
                self.log_sink_failure(sink.name(), &report, &e);
            }
        }
        report
    }

    /// Wait for in-flight remote deliveries, up to `timeout`
    pub async fn flush(&self, timeout: Duration) -> Vec<DeliveryResult> {
        match &self.remote {
            Some(remote) => remote.flush(timeout).await,
            None => Vec::new(),
        }
    }

    fn log_sink_failure(&self, sink: &str, report: &ErrorReport, error: &AppError) {
        warn!(
            sink,
            capture_id = %report.id(),
            category = error.category(),
            error = %error,
            "sink failed to write report"
        );
        let _ = self.fallback.write_line(&format!(
            "[errbrake] sink '{sink}' failed for report {}: {error}",
            report.id()
        ));
    }
}

impl std::fmt::Debug for Reporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reporter")
            .field("classifier", &self.classifier)
            .field(
                "sinks",
                &self.sinks.iter().map(|s| s.name().to_string()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Builder for [`Reporter`]
///
/// With no sinks added, the reporter writes to stderr.
#[derive(Default)]
pub struct ReporterBuilder {
    classifier: Classifier,
    sinks: Vec<Arc<dyn Sink>>,
    remote: Option<Arc<RemoteSink>>,
    fallback: Option<ConsoleSink>,
}

impl ReporterBuilder {
    pub fn expected_kinds<I, S>(mut self, kinds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.classifier = Classifier::new(kinds);
        self
    }

    pub fn classifier(mut self, classifier: Classifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn sink(mut self, sink: impl Sink + 'static) -> Self {
        self.sinks.push(Arc::new(sink));
        self
    }

    /// Add a remote sink and keep a handle to it for [`Reporter::flush`]
    pub fn remote(mut self, remote: RemoteSink) -> Self {
        let remote = Arc::new(remote);
        self.sinks.push(remote.clone());
        self.remote = Some(remote);
        self
    }

    /// Console sink that receives sink failure records, stderr by default
    pub fn fallback(mut self, fallback: ConsoleSink) -> Self {
        self.fallback = Some(fallback);
        self
    }

    pub fn build(self) -> Reporter {
        let fallback = self.fallback.unwrap_or_default();
        let sinks = if self.sinks.is_empty() {
            vec![Arc::new(fallback.clone()) as Arc<dyn Sink>]
        } else {
            self.sinks
        };

        Reporter {
            classifier: self.classifier,
            sinks,
            remote: self.remote,
            fallback,
        }
    }
}

/// Report panics through `reporter`, then run the previously installed hook
pub fn install_panic_hook(reporter: Arc<Reporter>) {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        reporter.report(ErrorReport::from_panic(info));
        previous(info);
    }));
}
