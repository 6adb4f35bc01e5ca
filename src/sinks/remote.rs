use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use super::{ConsoleSink, Sink};
use crate::clients::{DeliveryResult, NotificationClient};
use crate::errors::{AppError, AppResult};
use crate::report::ErrorReport;
use uuid::Uuid;

/// How many capture ids a remote sink remembers for duplicate suppression
pub const SEEN_CAPACITY: usize = 1024;

/// Forwards reports to a remote collector without blocking the caller
///
/// Each `write` spawns one delivery on the current tokio runtime and returns
/// immediately. Failed deliveries are recorded on a console sink, never on
/// another remote sink. A report whose capture id was already handed to this
/// sink is skipped, so re-submitting a report never posts it twice.
pub struct RemoteSink {
    client: Arc<dyn NotificationClient>,
    fallback: ConsoleSink,
    in_flight: Mutex<JoinSet<DeliveryResult>>,
    seen: Mutex<SeenIds>,
}

/// Bounded memory of capture ids, oldest evicted first
#[derive(Debug)]
struct SeenIds {
    order: VecDeque<Uuid>,
    ids: HashSet<Uuid>,
    capacity: usize,
}

impl SeenIds {
    fn new(capacity: usize) -> Self {
        Self {
            order: VecDeque::with_capacity(capacity),
            ids: HashSet::with_capacity(capacity),
            capacity,
        }
    }

    /// Record `id`; false if it was already present
    fn insert(&mut self, id: Uuid) -> bool {
        if !self.ids.insert(id) {
            return false;
        }
        self.order.push_back(id);
        if self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.ids.remove(&oldest);
            }
        }
        true
    }
}

impl RemoteSink {
    pub fn new(client: Arc<dyn NotificationClient>) -> Self {
        Self::with_fallback(client, ConsoleSink::stderr())
    }

    /// Remote sink that logs delivery failures to the given console sink
    pub fn with_fallback(client: Arc<dyn NotificationClient>, fallback: ConsoleSink) -> Self {
        Self {
            client,
            fallback,
            in_flight: Mutex::new(JoinSet::new()),
            seen: Mutex::new(SeenIds::new(SEEN_CAPACITY)),
        }
    }

    pub fn client(&self) -> &Arc<dyn NotificationClient> {
        &self.client
    }

    /// Number of deliveries spawned and not yet collected
    pub fn pending(&self) -> usize {
        self.in_flight.lock().map(|set| set.len()).unwrap_or(0)
    }

    /// Wait for in-flight deliveries, giving up after `timeout`
    ///
    /// Returns the results that completed in time. Deliveries still running
    /// at the deadline are abandoned.
    pub async fn flush(&self, timeout: Duration) -> Vec<DeliveryResult> {
        let mut set = match self.in_flight.lock() {
            Ok(mut guard) => std::mem::take(&mut *guard),
            Err(_) => return Vec::new(),
        };

        let mut results = Vec::new();
        let drained = tokio::time::timeout(timeout, async {
            while let Some(joined) = set.join_next().await {
                match joined {
                    Ok(result) => results.push(result),
                    Err(e) => warn!(error = %e, "remote delivery task did not complete"),
                }
            }
        })
        .await;

        if drained.is_err() {
            warn!(
                abandoned = set.len(),
                "flush deadline reached, abandoning in-flight deliveries"
            );
        }

        results
    }
}

impl std::fmt::Debug for RemoteSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteSink")
            .field("endpoint", &self.client.config_info().endpoint)
            .field("pending", &self.pending())
            .finish()
    }
}

impl Sink for RemoteSink {
    fn name(&self) -> &str {
        "remote"
    }

    fn write(&self, _formatted: &str, report: &ErrorReport) -> AppResult<()> {
        let handle = Handle::try_current().map_err(|_| AppError::NoRuntime {
            operation: "remote delivery".to_string(),
        })?;

        let first_seen = self
            .seen
            .lock()
            .map_err(|_| AppError::sink("remote", "seen-id set lock poisoned"))?
            .insert(report.id());
        if !first_seen {
            debug!(capture_id = %report.id(), "report already sent to collector, skipping");
            return Ok(());
        }

        let client = Arc::clone(&self.client);
        let fallback = self.fallback.clone();
        let report = report.clone();

        let delivery = async move {
            let result = client.notify(&report).await;
            if result.succeeded {
                debug!(
                    capture_id = %report.id(),
                    remote_id = ?result.remote_id,
                    "error report delivered"
                );
            } else {
                let reason = result.failure_reason.as_deref().unwrap_or("unknown");
                warn!(capture_id = %report.id(), reason, "error report delivery failed");
                let _ = fallback.write_line(&format!(
                    "[errbrake] delivery of report {} ({}) failed: {reason}",
                    report.id(),
                    report.kind()
                ));
            }
            result
        };

        let mut set = self
            .in_flight
            .lock()
            .map_err(|_| AppError::sink("remote", "in-flight set lock poisoned"))?;
        // Collect finished tasks so the set only tracks live deliveries
        while set.try_join_next().is_some() {}
        set.spawn_on(delivery, &handle);
        Ok(())
    }
}
