//! Expected/unexpected classification
//!
//! Whether an error was "expected" is caller-supplied metadata: a set of
//! kinds the calling code anticipates. It only changes how a report is
//! displayed, never control flow.

use std::collections::HashSet;

use crate::report::ErrorReport;

/// True when `kind` is one of `expected_kinds`
pub fn classify(kind: &str, expected_kinds: &HashSet<String>) -> bool {
    expected_kinds.contains(kind)
}

/// Holds the set of expected kinds for a reporting site
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    expected_kinds: HashSet<String>,
}

impl Classifier {
    pub fn new<I, S>(expected_kinds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            expected_kinds: expected_kinds.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_expected(&self, kind: &str) -> bool {
        classify(kind, &self.expected_kinds)
    }

    pub fn classify_report(&self, report: &ErrorReport) -> bool {
        self.is_expected(report.kind())
    }

    pub fn expected_kinds(&self) -> &HashSet<String> {
        &self.expected_kinds
    }
}
