//! Report filters applied before remote delivery
//!
//! A filter receives a report by value and returns either the report to send
//! (possibly rebuilt with extra context) or `None` to drop it.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::report::ErrorReport;

pub type ReportFilter = Arc<dyn Fn(ErrorReport) -> Option<ErrorReport> + Send + Sync>;

/// Filter that adds static context entries without overriding the report's own keys
pub fn context_filter(entries: BTreeMap<String, String>) -> ReportFilter {
    Arc::new(move |report: ErrorReport| {
        if entries.is_empty() {
            return Some(report);
        }
        let builder = entries
            .iter()
            .fold(report.into_builder(), |builder, (key, value)| {
                builder.context_default(key.clone(), value.clone())
            });
        Some(builder.build())
    })
}

/// Filter that drops reports whose kind is in `kinds`
pub fn ignore_kinds<I, S>(kinds: I) -> ReportFilter
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let kinds: Vec<String> = kinds.into_iter().map(Into::into).collect();
    Arc::new(move |report: ErrorReport| {
        if kinds.iter().any(|kind| kind == report.kind()) {
            None
        } else {
            Some(report)
        }
    })
}

/// Run filters in order, stopping at the first drop
pub fn apply(filters: &[ReportFilter], report: ErrorReport) -> Option<ErrorReport> {
    filters
        .iter()
        .try_fold(report, |report, filter| filter(report))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_filter_keeps_report_values() {
        let filter = context_filter(BTreeMap::from([
            ("environment".to_string(), "development".to_string()),
            ("user".to_string(), "default".to_string()),
        ]));
        let report = ErrorReport::builder("Io", "x").context("user", "12345").build();
        let id = report.id();

        let filtered = filter(report).unwrap();
        assert_eq!(filtered.id(), id);
        assert_eq!(filtered.context()["user"], "12345");
        assert_eq!(filtered.context()["environment"], "development");
    }

    #[test]
    fn test_apply_stops_at_drop() {
        let filters = vec![
            ignore_kinds(["Cancelled"]),
            context_filter(BTreeMap::from([("a".to_string(), "b".to_string())])),
        ];

        let dropped = ErrorReport::builder("Cancelled", "user aborted").build();
        assert!(apply(&filters, dropped).is_none());

        let kept = ErrorReport::builder("Io", "disk full").build();
        assert_eq!(apply(&filters, kept).unwrap().context()["a"], "b");
    }

    #[test]
    fn test_apply_without_filters_is_identity() {
        let report = ErrorReport::builder("Io", "x").build();
        assert_eq!(apply(&[], report.clone()), Some(report));
    }
}
