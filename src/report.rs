//! Captured error reports
//!
//! An [`ErrorReport`] is built once at the moment an error is caught and is
//! never mutated afterwards. Filters that want to change a report go through
//! [`ErrorReport::into_builder`], which keeps the capture id so the result is
//! still the same capture event.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::backtrace::{Backtrace, BacktraceStatus};
use std::collections::BTreeMap;
use std::panic::{Location, PanicHookInfo};
use uuid::Uuid;

/// Kind used for reports raised from the panic hook
pub const PANIC_KIND: &str = "panic";

/// Upper bound on frames kept from a captured backtrace
const MAX_FRAMES: usize = 64;

/// Frames belonging to the capture machinery, the runtime or a test harness
///
/// Matched against the function name with any leading `<` removed, so
/// `<alloc::boxed::Box<F,A> as core::ops::function::FnOnce<Args>>` is caught.
const SKIPPED_FRAME_PREFIXES: &[&str] = &[
    "std::backtrace",
    "std::panicking",
    "std::panic::",
    "core::panicking",
    "core::panic::",
    "rust_begin_unwind",
    "core::ops::function",
    "alloc::boxed::Box<F",
    "std::rt::",
    "std::sys",
    "std::thread::",
    "__rust_begin_short_backtrace",
    "__rust_end_short_backtrace",
    "test::",
    "tokio::runtime",
    "errbrake::report::",
    "errbrake::reporter::",
    "errbrake::global::",
];

/// A single stack frame, innermost first when part of a report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackFrame {
    pub function: String,
    pub file: String,
    pub line: u32,
}

impl StackFrame {
    pub fn new(function: impl Into<String>, file: impl Into<String>, line: u32) -> Self {
        Self {
            function: function.into(),
            file: file.into(),
            line,
        }
    }

    /// Frame for the caller's source location
    #[track_caller]
    pub fn caller(function: impl Into<String>) -> Self {
        Self::from_location(function, Location::caller())
    }

    pub fn from_location(function: impl Into<String>, location: &Location<'_>) -> Self {
        Self::new(function, location.file(), location.line())
    }
}

/// Immutable record of a single caught error
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorReport {
    #[serde(default = "Uuid::new_v4")]
    id: Uuid,
    kind: String,
    message: String,
    #[serde(default)]
    stack_frames: Vec<StackFrame>,
    #[serde(default = "Utc::now")]
    occurred_at: DateTime<Utc>,
    #[serde(default)]
    expected: bool,
    #[serde(default)]
    context: BTreeMap<String, String>,
}

impl ErrorReport {
    /// Start building a report for the given kind and message
    pub fn builder(kind: impl Into<String>, message: impl Into<String>) -> ErrorReportBuilder {
        ErrorReportBuilder::new(kind, message)
    }

    /// Build a report from a concrete error value
    ///
    /// The kind comes from [`error_kind`]: an `std::io::Error` is reported
    /// under its `ErrorKind` (`NotFound`, `TimedOut`, ...), other types under
    /// [`kind_name`] (`serde_json::Error`, `AppError`). Each `source()` in the
    /// chain lands in the context as `cause.0`, `cause.1`, and so on. Frames
    /// come from `Backtrace::capture`, so they are only present when
    /// `RUST_BACKTRACE`/`RUST_LIB_BACKTRACE` enables capture.
    pub fn from_error<E>(error: &E) -> ErrorReportBuilder
    where
        E: std::error::Error + 'static,
    {
        Self::from_dyn_error(error_kind(error), error)
    }

    /// Build a report from a trait object, with the kind supplied by the caller
    pub fn from_dyn_error(
        kind: impl Into<String>,
        error: &(dyn std::error::Error + 'static),
    ) -> ErrorReportBuilder {
        let mut builder = ErrorReportBuilder::new(kind, error.to_string()).frames(capture_frames());

        let mut source = error.source();
        let mut depth = 0;
        while let Some(cause) = source {
            builder = builder.context(format!("cause.{depth}"), cause.to_string());
            source = cause.source();
            depth += 1;
        }

        builder
    }

    /// Build an unexpected report for a panic
    pub fn from_panic(info: &PanicHookInfo<'_>) -> Self {
        let message = panic_message(info);

        let mut frames = capture_frames();
        if frames.is_empty() {
            if let Some(location) = info.location() {
                frames.push(StackFrame::from_location("<unknown>", location));
            }
        }

        let mut builder = ErrorReportBuilder::new(PANIC_KIND, message)
            .frames(frames)
            .expected(false);
        if let Some(name) = std::thread::current().name() {
            builder = builder.context("thread", name);
        }
        builder.build()
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn stack_frames(&self) -> &[StackFrame] {
        &self.stack_frames
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    pub fn expected(&self) -> bool {
        self.expected
    }

    pub fn context(&self) -> &BTreeMap<String, String> {
        &self.context
    }

    /// Turn this report back into a builder that keeps its id and timestamp
    pub fn into_builder(self) -> ErrorReportBuilder {
        ErrorReportBuilder {
            id: Some(self.id),
            kind: self.kind,
            message: self.message,
            stack_frames: self.stack_frames,
            occurred_at: Some(self.occurred_at),
            expected: self.expected,
            context: self.context,
        }
    }
}

/// Builder for [`ErrorReport`]
#[derive(Debug, Clone)]
pub struct ErrorReportBuilder {
    id: Option<Uuid>,
    kind: String,
    message: String,
    stack_frames: Vec<StackFrame>,
    occurred_at: Option<DateTime<Utc>>,
    expected: bool,
    context: BTreeMap<String, String>,
}

impl ErrorReportBuilder {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: None,
            kind: kind.into(),
            message: message.into(),
            stack_frames: Vec::new(),
            occurred_at: None,
            expected: false,
            context: BTreeMap::new(),
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn frame(mut self, frame: StackFrame) -> Self {
        self.stack_frames.push(frame);
        self
    }

    pub fn frames(mut self, frames: impl IntoIterator<Item = StackFrame>) -> Self {
        self.stack_frames.extend(frames);
        self
    }

    pub fn expected(mut self, expected: bool) -> Self {
        self.expected = expected;
        self
    }

    /// Add a context entry, replacing any previous value for the key
    pub fn context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Add a context entry only when the key is not set yet
    pub fn context_default(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.entry(key.into()).or_insert_with(|| value.into());
        self
    }

    pub fn occurred_at(mut self, occurred_at: DateTime<Utc>) -> Self {
        self.occurred_at = Some(occurred_at);
        self
    }

    pub fn build(self) -> ErrorReport {
        ErrorReport {
            id: self.id.unwrap_or_else(Uuid::new_v4),
            kind: self.kind,
            message: self.message,
            stack_frames: self.stack_frames,
            occurred_at: self.occurred_at.unwrap_or_else(Utc::now),
            expected: self.expected,
            context: self.context,
        }
    }
}

/// Kind for a concrete error value
pub fn error_kind<E>(error: &E) -> String
where
    E: std::error::Error + 'static,
{
    let error: &(dyn std::error::Error + 'static) = error;
    match error.downcast_ref::<std::io::Error>() {
        Some(io_error) => format!("{:?}", io_error.kind()),
        None => kind_name::<E>(),
    }
}

/// Type name short enough to read but distinct enough to classify
///
/// The last path segment, without generic arguments, unless it is the bare
/// name `Error`: then it is qualified by the crate (`serde_json::Error`,
/// `reqwest::Error`) or, for the standard library, by the module
/// (`io::Error`, `fmt::Error`).
pub fn kind_name<T: ?Sized>() -> String {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    let segments: Vec<&str> = base.split("::").collect();
    let last = segments.last().copied().unwrap_or(base);

    if last != "Error" || segments.len() < 2 {
        return last.to_string();
    }
    match segments[0] {
        "std" | "core" | "alloc" if segments.len() > 2 => format!("{}::{last}", segments[1]),
        owner => format!("{owner}::{last}"),
    }
}

/// Capture the current stack, honoring the `RUST_BACKTRACE` settings
pub fn capture_frames() -> Vec<StackFrame> {
    let backtrace = Backtrace::capture();
    if backtrace.status() != BacktraceStatus::Captured {
        return Vec::new();
    }
    parse_backtrace(&backtrace.to_string())
}

/// Parse the text rendering of a `std::backtrace::Backtrace`
///
/// Each frame looks like `  3: crate::module::function` optionally followed
/// by `             at ./src/file.rs:12:5`. Frames without a location get an
/// empty file and line 0.
pub fn parse_backtrace(text: &str) -> Vec<StackFrame> {
    let mut frames: Vec<StackFrame> = Vec::new();
    let mut pending: Option<StackFrame> = None;

    for line in text.lines() {
        let trimmed = line.trim();

        if let Some(location) = trimmed.strip_prefix("at ") {
            if let Some(frame) = pending.as_mut() {
                let (file, line_no) = split_location(location);
                frame.file = file;
                frame.line = line_no;
            }
            continue;
        }

        let Some((index, function)) = trimmed.split_once(": ") else {
            continue;
        };
        if index.is_empty() || !index.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }

        if let Some(frame) = pending.take() {
            frames.push(frame);
        }
        pending = Some(StackFrame::new(strip_hash(function), "", 0));
    }

    if let Some(frame) = pending.take() {
        frames.push(frame);
    }

    let mut frames: Vec<StackFrame> = frames
        .into_iter()
        .filter(|frame| !is_skipped(&frame.function))
        .collect();

    // Process entry points (`__libc_start_main`, `_start`) carry no source
    while frames.last().is_some_and(|frame| frame.file.is_empty()) {
        frames.pop();
    }
    frames.truncate(MAX_FRAMES);
    frames
}

fn is_skipped(function: &str) -> bool {
    let function = function.trim_start_matches('<');
    SKIPPED_FRAME_PREFIXES
        .iter()
        .any(|prefix| function.starts_with(prefix))
}

/// Split `path:line:column` (column optional) into path and line
fn split_location(location: &str) -> (String, u32) {
    let mut parts = location.rsplitn(3, ':');
    let last = parts.next().unwrap_or_default();
    let middle = parts.next();
    let rest = parts.next();

    match (rest, middle) {
        (Some(path), Some(line)) => (path.to_string(), line.parse().unwrap_or(0)),
        (None, Some(path)) => (path.to_string(), last.parse().unwrap_or(0)),
        _ => (location.to_string(), 0),
    }
}

/// Drop a trailing `::h0123456789abcdef` symbol hash
fn strip_hash(function: &str) -> String {
    if let Some((head, hash)) = function.rsplit_once("::h") {
        if hash.len() == 16 && hash.chars().all(|c| c.is_ascii_hexdigit()) {
            return head.to_string();
        }
    }
    function.to_string()
}

fn panic_message(info: &PanicHookInfo<'_>) -> String {
    let payload = info.payload();
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "Box<dyn Any>".to_string()
    }
}

/// Stack frame for the current source location, named after the enclosing module
#[macro_export]
macro_rules! here {
    () => {
        $crate::report::StackFrame::new(module_path!(), file!(), line!())
    };
    ($function:expr) => {
        $crate::report::StackFrame::new($function, file!(), line!())
    };
}
