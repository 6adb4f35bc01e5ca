use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::task::JoinHandle;
use tracing::{debug, info_span, Instrument};
use url::Url;

use super::filters::{self, ReportFilter};
use super::payload::{HostInfo, NoticePayload};
use super::traits::{ClientConfigInfo, ClientStats, DeliveryResult, NotificationClient};
use crate::config::NotifierConfig;
use crate::errors::{AppError, AppResult};
use crate::report::ErrorReport;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Header carrying the project id alongside the query parameter
pub const PROJECT_ID_HEADER: &str = "X-Project-Id";

/// Longest collector error body kept in a failure reason, in characters
pub const MAX_REASON_CHARS: usize = 512;

/// Async client that delivers error reports to a remote collector
///
/// Built with [`NotifierClient::configure`]; once configured it stays
/// configured, and every [`notify`](NotifierClient::notify) call is an
/// independent single attempt. Cloning is cheap and clones share statistics.
#[derive(Clone)]
pub struct NotifierClient {
    client: Client,
    config: Arc<NotifierConfig>,
    url: Url,
    host: HostInfo,
    filters: Vec<ReportFilter>,
    stats: Arc<Mutex<ClientStats>>,
    created_at: Instant,
}

impl NotifierClient {
    /// Validate the configuration and build a ready client
    ///
    /// No network call happens here.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Configuration`] naming the first of `endpoint`,
    /// `project_id` or `project_key` that is empty, or naming `timeout` when
    /// it is zero. Returns [`AppError::InvalidEndpoint`] when the endpoint is
    /// not an absolute http(s) URL.
    pub fn configure(config: NotifierConfig) -> AppResult<Self> {
        for (field, value) in [
            ("endpoint", &config.endpoint),
            ("project_id", &config.project_id),
            ("project_key", &config.project_key),
        ] {
            if value.trim().is_empty() {
                return Err(AppError::missing_field(field));
            }
        }
        if config.timeout.is_zero() {
            return Err(AppError::configuration("timeout", "must be greater than zero"));
        }

        let url = Self::build_url(&config)?;

        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| AppError::HttpClient {
                message: "failed to create HTTP client".to_string(),
                source: Some(Box::new(e)),
            })?;

        debug!(endpoint = %config.endpoint, project_id = %config.project_id, "notifier configured");

        Ok(Self {
            client,
            config: Arc::new(config),
            url,
            host: HostInfo::current(),
            filters: Vec::new(),
            stats: Arc::new(Mutex::new(ClientStats::default())),
            created_at: Instant::now(),
        })
    }

    /// Add a filter that runs before every delivery
    pub fn with_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(ErrorReport) -> Option<ErrorReport> + Send + Sync + 'static,
    {
        self.filters.push(Arc::new(filter));
        self
    }

    /// Add an already shared filter
    pub fn with_shared_filter(mut self, filter: ReportFilter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn config(&self) -> &NotifierConfig {
        &self.config
    }

    /// Fire-and-forget delivery on the current tokio runtime
    ///
    /// The returned handle can be awaited for the result or dropped; dropping
    /// it does not cancel the delivery.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime, like `tokio::spawn`.
    pub fn notify_detached(&self, report: ErrorReport) -> JoinHandle<DeliveryResult> {
        let client = self.clone();
        tokio::spawn(async move { client.notify(&report).await })
    }

    /// Single delivery attempt
    ///
    /// Transport errors, timeouts, non-2xx answers and filter drops all come
    /// back as a failed [`DeliveryResult`].
    pub async fn notify(&self, report: &ErrorReport) -> DeliveryResult {
        let start = Instant::now();
        let span = info_span!(
            "error_report_delivery",
            capture_id = %report.id(),
            kind = %report.kind(),
            endpoint = %self.config.endpoint
        );

        let result = async {
            let Some(report) = filters::apply(&self.filters, report.clone()) else {
                debug!("report dropped by filter");
                return DeliveryResult::failed("report dropped by filter");
            };

            match tokio::time::timeout(self.config.timeout, self.send(&report)).await {
                Ok(Ok(remote_id)) => DeliveryResult::delivered(remote_id),
                Ok(Err(e)) => DeliveryResult::failed(self.describe_failure(&e)),
                Err(_) => DeliveryResult::failed(format!(
                    "timed out after {} ms",
                    self.config.timeout.as_millis()
                )),
            }
        }
        .instrument(span)
        .await;

        let elapsed = start.elapsed().as_millis() as u64;
        if let Ok(mut stats) = self.stats.lock() {
            match &result.failure_reason {
                None => stats.record_success(elapsed),
                Some(reason) => stats.record_failure(reason.clone()),
            }
        }

        result
    }

    /// POST the payload and extract the collector-assigned id
    async fn send(&self, report: &ErrorReport) -> AppResult<Option<String>> {
        let payload = self.build_payload(report);
        let headers = self.build_headers()?;

        let response = self
            .client
            .post(self.url.clone())
            .headers(headers)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::HttpStatus {
                status_code: status.as_u16(),
                reason: truncate_reason(body.trim()),
            });
        }

        let body = response.text().await?;
        Ok(Self::extract_remote_id(&body))
    }

    fn build_payload(&self, report: &ErrorReport) -> NoticePayload {
        NoticePayload::new(report, &self.config.environment, self.host.clone())
    }

    /// Authentication and content headers
    fn build_headers(&self) -> AppResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let auth_value = format!("Bearer {}", self.config.project_key);
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth_value).map_err(|_| AppError::InvalidConfigValue {
                key: "project_key".to_string(),
                value: "<redacted>".to_string(),
                source: None,
            })?,
        );
        headers.insert(
            PROJECT_ID_HEADER,
            HeaderValue::from_str(&self.config.project_id).map_err(|e| {
                AppError::InvalidConfigValue {
                    key: "project_id".to_string(),
                    value: self.config.project_id.clone(),
                    source: Some(Box::new(e)),
                }
            })?,
        );

        Ok(headers)
    }

    /// Endpoint with the `project_id` query parameter appended
    fn build_url(config: &NotifierConfig) -> AppResult<Url> {
        let mut url = Url::parse(config.endpoint.trim()).map_err(|e| AppError::InvalidEndpoint {
            url: config.endpoint.clone(),
            source: Some(Box::new(e)),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(AppError::InvalidEndpoint {
                url: config.endpoint.clone(),
                source: None,
            });
        }
        url.query_pairs_mut()
            .append_pair("project_id", &config.project_id);
        Ok(url)
    }

    /// `id` from a JSON response body, as a string or a number
    fn extract_remote_id(body: &str) -> Option<String> {
        let value: serde_json::Value = serde_json::from_str(body).ok()?;
        match value.get("id")? {
            serde_json::Value::String(id) if !id.is_empty() => Some(id.clone()),
            serde_json::Value::Number(id) => Some(id.to_string()),
            _ => None,
        }
    }

    fn describe_failure(&self, error: &AppError) -> String {
        match error {
            AppError::NetworkTimeout { .. } => {
                format!("timed out after {} ms", self.config.timeout.as_millis())
            }
            AppError::HttpStatus { status_code, reason } if reason.is_empty() => {
                format!("collector answered HTTP {status_code}")
            }
            AppError::HttpStatus { status_code, reason } => {
                format!("collector answered HTTP {status_code}: {reason}")
            }
            AppError::HttpRequest { source: Some(source), .. } => {
                format!("{error}: {source}")
            }
            other => other.to_string(),
        }
    }
}

/// Cut `body` to [`MAX_REASON_CHARS`] characters, marking the cut
fn truncate_reason(body: &str) -> String {
    match body.char_indices().nth(MAX_REASON_CHARS) {
        Some((cut, _)) => format!("{}... ({} bytes total)", &body[..cut], body.len()),
        None => body.to_string(),
    }
}

#[async_trait]
impl NotificationClient for NotifierClient {
    async fn notify(&self, report: &ErrorReport) -> DeliveryResult {
        NotifierClient::notify(self, report).await
    }

    fn stats(&self) -> ClientStats {
        if let Ok(mut stats) = self.stats.lock() {
            stats.uptime = self.created_at.elapsed();
            stats.clone()
        } else {
            ClientStats::default()
        }
    }

    fn config_info(&self) -> ClientConfigInfo {
        ClientConfigInfo {
            endpoint: self.config.endpoint.clone(),
            project_id: self.config.project_id.clone(),
            environment: self.config.environment.clone(),
            timeout_ms: self.config.timeout.as_millis() as u64,
            filters: self.filters.len(),
        }
    }
}

impl std::fmt::Debug for NotifierClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifierClient")
            .field("endpoint", &self.config.endpoint)
            .field("project_id", &self.config.project_id)
            .field("environment", &self.config.environment)
            .field("timeout", &self.config.timeout)
            .field("filters", &self.filters.len())
            .finish()
    }
}
