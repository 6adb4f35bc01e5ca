use std::io::{self, Read};

use anyhow::{Context, Result};
use errbrake::formatter;
use errbrake::report::ErrorReport;

/// Formats a JSON report read from stdin
#[derive(Default)]
pub struct FormatHandler;

impl FormatHandler {
    pub fn new() -> Self {
        Self
    }

    pub fn handle_format(&self) -> Result<()> {
        let mut input = String::new();
        io::stdin()
            .read_to_string(&mut input)
            .context("Failed to read report from stdin")?;

        println!("{}", Self::format_json(&input)?);
        Ok(())
    }

    fn format_json(input: &str) -> Result<String> {
        let report: ErrorReport =
            serde_json::from_str(input.trim()).context("Failed to parse error report JSON")?;
        tracing::debug!(capture_id = %report.id(), "formatting report");
        Ok(formatter::format(&report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_minimal_report() {
        let formatted = FormatHandler::format_json(
            r#"{"kind": "NullReference", "message": "object is null", "expected": true}"#,
        )
        .unwrap();
        assert_eq!(formatted, "[EXPECTED] NullReference: object is null");
    }

    #[test]
    fn test_format_with_frames() {
        let formatted = FormatHandler::format_json(
            r#"{
                "kind": "IndexOutOfRange",
                "message": "index 7, len 3",
                "stackFrames": [{"function": "load", "file": "src/store.rs", "line": 42}]
            }"#,
        )
        .unwrap();
        assert_eq!(
            formatted,
            "[UNEXPECTED] IndexOutOfRange: index 7, len 3\n  at load (src/store.rs:42)"
        );
    }

    #[test]
    fn test_format_rejects_garbage() {
        assert!(FormatHandler::format_json("not json").is_err());
    }
}
