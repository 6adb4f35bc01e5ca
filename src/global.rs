//! Process-scoped reporter with explicit initialization
//!
//! Call [`init`] once at startup; afterwards [`capture`] and friends can be
//! used from anywhere without threading a reporter through. Before `init`
//! (or if it never happens) a stderr-only reporter is used, so nothing is
//! silently dropped.

use std::sync::Arc;

use once_cell::sync::{Lazy, OnceCell};

use crate::report::ErrorReport;
use crate::reporter::Reporter;

static GLOBAL: OnceCell<Arc<Reporter>> = OnceCell::new();
static FALLBACK: Lazy<Arc<Reporter>> = Lazy::new(|| Arc::new(Reporter::console()));

/// Install the process-wide reporter; returns false if one was already installed
pub fn init(reporter: Reporter) -> bool {
    let installed = GLOBAL.set(Arc::new(reporter)).is_ok();
    if !installed {
        tracing::warn!("global reporter already initialized, keeping the first one");
    }
    installed
}

pub fn is_initialized() -> bool {
    GLOBAL.get().is_some()
}

/// The installed reporter, or the stderr-only fallback
pub fn reporter() -> Arc<Reporter> {
    GLOBAL.get().unwrap_or(&FALLBACK).clone()
}

pub fn capture<E>(error: &E) -> ErrorReport
where
    E: std::error::Error + 'static,
{
    reporter().capture(error)
}

#[track_caller]
pub fn capture_message(kind: &str, message: &str) -> ErrorReport {
    reporter().capture_message(kind, message)
}

pub fn report(report: ErrorReport) -> ErrorReport {
    reporter().report(report)
}

/// Report panics through whichever reporter is current when the panic happens
pub fn install_panic_hook() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        reporter().report(ErrorReport::from_panic(info));
        previous(info);
    }));
}
