use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::report::ErrorReport;

/// Client that forwards error reports to a remote collector
///
/// Implementations never return transport failures as errors: every outcome
/// is described by the returned [`DeliveryResult`].
#[async_trait]
pub trait NotificationClient: Send + Sync {
    /// Attempt a single delivery of the report
    async fn notify(&self, report: &ErrorReport) -> DeliveryResult;

    /// Get client delivery statistics
    fn stats(&self) -> ClientStats;

    /// Get client configuration info
    fn config_info(&self) -> ClientConfigInfo;
}

/// Outcome of one notify attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryResult {
    pub succeeded: bool,
    pub remote_id: Option<String>,
    pub failure_reason: Option<String>,
}

impl DeliveryResult {
    /// Successful delivery, with the collector-assigned id if one came back
    pub fn delivered(remote_id: Option<String>) -> Self {
        Self {
            succeeded: true,
            remote_id,
            failure_reason: None,
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        Self {
            succeeded: false,
            remote_id: None,
            failure_reason: Some(if reason.is_empty() {
                "unknown delivery failure".to_string()
            } else {
                reason
            }),
        }
    }
}

impl std::fmt::Display for DeliveryResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.succeeded, &self.remote_id, &self.failure_reason) {
            (true, Some(id), _) => write!(f, "delivered (id {id})"),
            (true, None, _) => write!(f, "delivered"),
            (false, _, Some(reason)) => write!(f, "failed: {reason}"),
            (false, _, None) => write!(f, "failed"),
        }
    }
}

/// Delivery statistics for notification clients
///
/// Latency figures cover successful deliveries only and stay at zero until
/// the first one.
#[derive(Debug, Clone, Default)]
pub struct ClientStats {
    /// Reports accepted by the collector
    pub reports_delivered: u64,
    /// Reports that failed or were dropped
    pub reports_failed: u64,
    /// Sum of delivery latencies in milliseconds
    pub total_latency_ms: u64,
    /// Average latency in milliseconds
    pub average_latency_ms: u64,
    /// Minimum recorded latency
    pub min_latency_ms: u64,
    /// Maximum recorded latency
    pub max_latency_ms: u64,
    /// Last failure reason (if any)
    pub last_error: Option<String>,
    /// Client uptime duration
    pub uptime: Duration,
}

impl ClientStats {
    /// Update statistics with a successful delivery
    pub fn record_success(&mut self, latency_ms: u64) {
        self.min_latency_ms = if self.reports_delivered == 0 {
            latency_ms
        } else {
            self.min_latency_ms.min(latency_ms)
        };
        self.max_latency_ms = self.max_latency_ms.max(latency_ms);
        self.reports_delivered += 1;
        self.total_latency_ms = self.total_latency_ms.saturating_add(latency_ms);
        self.average_latency_ms = self.total_latency_ms / self.reports_delivered;
    }

    /// Update statistics with a failed delivery
    pub fn record_failure(&mut self, error: String) {
        self.reports_failed += 1;
        self.last_error = Some(error);
    }

    /// Get success rate as a percentage
    pub fn success_rate(&self) -> f64 {
        let total = self.reports_delivered + self.reports_failed;
        if total == 0 {
            0.0
        } else {
            (self.reports_delivered as f64 / total as f64) * 100.0
        }
    }
}

/// Configuration summary for a notification client, safe to log
#[derive(Debug, Clone)]
pub struct ClientConfigInfo {
    pub endpoint: String,
    pub project_id: String,
    pub environment: String,
    pub timeout_ms: u64,
    pub filters: usize,
}
