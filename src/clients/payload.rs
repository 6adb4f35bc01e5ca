//! Wire format sent to the collector
//!
//! The payload carries the report fields plus transport metadata
//! (environment, notifier identity, host information). Only the report
//! fields take part in round-trip equality.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::report::{ErrorReport, StackFrame};

pub const NOTIFIER_NAME: &str = env!("CARGO_PKG_NAME");
pub const NOTIFIER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// JSON body of a notify request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoticePayload {
    pub capture_id: Uuid,
    pub kind: String,
    pub message: String,
    pub stack_frames: Vec<StackFrame>,
    pub occurred_at: DateTime<Utc>,
    pub expected: bool,
    pub environment: String,
    pub context: BTreeMap<String, String>,
    pub notifier: NotifierInfo,
    pub host: HostInfo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifierInfo {
    pub name: String,
    pub version: String,
}

impl Default for NotifierInfo {
    fn default() -> Self {
        Self {
            name: NOTIFIER_NAME.to_string(),
            version: NOTIFIER_VERSION.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostInfo {
    pub hostname: Option<String>,
    pub os: String,
    pub arch: String,
}

impl HostInfo {
    /// Details of the machine the process runs on
    pub fn current() -> Self {
        Self {
            hostname: hostname::get().ok().and_then(|h| h.into_string().ok()),
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
        }
    }
}

/// Report fields recovered from a payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportParts {
    pub kind: String,
    pub message: String,
    pub stack_frames: Vec<StackFrame>,
    pub context: BTreeMap<String, String>,
}

impl ReportParts {
    pub fn of(report: &ErrorReport) -> Self {
        Self {
            kind: report.kind().to_string(),
            message: report.message().to_string(),
            stack_frames: report.stack_frames().to_vec(),
            context: report.context().clone(),
        }
    }
}

impl NoticePayload {
    pub fn new(report: &ErrorReport, environment: &str, host: HostInfo) -> Self {
        Self {
            capture_id: report.id(),
            kind: report.kind().to_string(),
            message: report.message().to_string(),
            stack_frames: report.stack_frames().to_vec(),
            occurred_at: report.occurred_at(),
            expected: report.expected(),
            environment: environment.to_string(),
            context: report.context().clone(),
            notifier: NotifierInfo::default(),
            host,
        }
    }

    /// The report-owned fields, dropping transport metadata
    pub fn into_parts(self) -> ReportParts {
        ReportParts {
            kind: self.kind,
            message: self.message,
            stack_frames: self.stack_frames,
            context: self.context,
        }
    }
}
