//! NotifierClient against a stub collector

use std::sync::Arc;
use std::time::{Duration, Instant};

use errbrake::clients::{ClientConfigInfo, NoticePayload, NotificationClient, ReportParts};
use errbrake::config::NotifierConfig;
use errbrake::report::{ErrorReport, StackFrame};
use errbrake::sinks::{MemorySink, RemoteSink};
use errbrake::{AppError, NotifierClient, Reporter};
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn notifier_config(endpoint: String, timeout: Duration) -> NotifierConfig {
    NotifierConfig {
        endpoint,
        project_id: "144031".to_string(),
        project_key: "5a2fb879e83b".to_string(),
        environment: "test".to_string(),
        timeout,
    }
}

fn sample_report() -> ErrorReport {
    ErrorReport::builder("ZeroDivision", "division by zero")
        .frame(StackFrame::new("ratio", "src/stats.rs", 31))
        .frame(StackFrame::new("main", "src/main.rs", 9))
        .context("request_id", "req-17")
        .build()
}

#[tokio::test]
async fn delivery_succeeds_with_remote_id() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/notices"))
        .and(query_param("project_id", "144031"))
        .and(header("Authorization", "Bearer 5a2fb879e83b"))
        .and(header("X-Project-Id", "144031"))
        .and(body_partial_json(serde_json::json!({
            "kind": "ZeroDivision",
            "environment": "test"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({"id": "n-42"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = NotifierClient::configure(notifier_config(
        format!("{}/api/notices", mock_server.uri()),
        Duration::from_secs(5),
    ))
    .unwrap();

    let result = client.notify(&sample_report()).await;
    assert!(result.succeeded, "{result}");
    assert_eq!(result.remote_id.as_deref(), Some("n-42"));
    assert!(result.failure_reason.is_none());

    let stats = NotificationClient::stats(&client);
    assert_eq!(stats.reports_delivered, 1);
    assert_eq!(stats.reports_failed, 0);
}

#[tokio::test]
async fn numeric_id_is_accepted() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": 991})))
        .mount(&mock_server)
        .await;

    let client = NotifierClient::configure(notifier_config(mock_server.uri(), Duration::from_secs(5)))
        .unwrap();

    let result = client.notify(&sample_report()).await;
    assert_eq!(result.remote_id.as_deref(), Some("991"));
}

#[tokio::test]
async fn server_error_is_a_failed_result() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("collector exploded"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = NotifierClient::configure(notifier_config(mock_server.uri(), Duration::from_secs(5)))
        .unwrap();

    let result = client.notify(&sample_report()).await;
    assert!(!result.succeeded);
    assert!(result.remote_id.is_none());
    let reason = result.failure_reason.unwrap();
    assert!(reason.contains("500"), "{reason}");
    assert!(reason.contains("collector exploded"), "{reason}");

    let stats = NotificationClient::stats(&client);
    assert_eq!(stats.reports_failed, 1);
}

#[tokio::test]
async fn hanging_collector_returns_within_timeout() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(10)))
        .mount(&mock_server)
        .await;

    let timeout = Duration::from_millis(300);
    let client = NotifierClient::configure(notifier_config(mock_server.uri(), timeout)).unwrap();

    let start = Instant::now();
    let result = client.notify(&sample_report()).await;
    let elapsed = start.elapsed();

    assert!(!result.succeeded);
    assert!(result.failure_reason.is_some());
    assert!(elapsed < timeout + Duration::from_secs(2), "took {elapsed:?}");
}

#[tokio::test]
async fn unreachable_collector_is_a_failed_result() {
    // Bind then drop a listener so the port is closed
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let timeout = Duration::from_secs(2);
    let client = NotifierClient::configure(notifier_config(
        format!("http://127.0.0.1:{port}/api/notices"),
        timeout,
    ))
    .unwrap();

    let start = Instant::now();
    let result = client.notify(&sample_report()).await;

    assert!(!result.succeeded);
    assert!(result.failure_reason.is_some());
    assert!(start.elapsed() < timeout + Duration::from_secs(2));
}

#[tokio::test]
async fn payload_round_trips_through_collector() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let client = NotifierClient::configure(notifier_config(mock_server.uri(), Duration::from_secs(5)))
        .unwrap();
    let report = sample_report();

    let result = client.notify(&report).await;
    assert!(result.succeeded);
    assert!(result.remote_id.is_none());

    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let payload: NoticePayload = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(payload.capture_id, report.id());
    assert_eq!(payload.environment, "test");
    assert_eq!(payload.into_parts(), ReportParts::of(&report));
}

#[tokio::test]
async fn filters_rewrite_and_drop_reports() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_partial_json(serde_json::json!({
            "context": {"service": "billing", "request_id": "req-17"}
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = NotifierClient::configure(notifier_config(mock_server.uri(), Duration::from_secs(5)))
        .unwrap()
        .with_shared_filter(errbrake::clients::context_filter(
            [("service".to_string(), "billing".to_string())].into(),
        ))
        .with_shared_filter(errbrake::clients::filters::ignore_kinds(["Cancelled"]));

    assert!(client.notify(&sample_report()).await.succeeded);

    let cancelled = ErrorReport::builder("Cancelled", "user aborted").build();
    let result = client.notify(&cancelled).await;
    assert!(!result.succeeded);
    assert_eq!(result.failure_reason.as_deref(), Some("report dropped by filter"));

    let ClientConfigInfo { filters, .. } = client.config_info();
    assert_eq!(filters, 2);
}

#[test]
fn missing_endpoint_names_the_field() {
    let err = NotifierClient::configure(notifier_config(String::new(), Duration::from_secs(5)))
        .unwrap_err();

    assert!(matches!(err, AppError::Configuration { .. }));
    assert_eq!(err.config_field(), Some("endpoint"));
}

#[test]
fn non_http_endpoint_is_rejected() {
    let err = NotifierClient::configure(notifier_config(
        "ftp://collector.example.com".to_string(),
        Duration::from_secs(5),
    ))
    .unwrap_err();

    assert!(matches!(err, AppError::InvalidEndpoint { .. }));
}

#[tokio::test]
async fn reporter_delivers_through_remote_sink() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_partial_json(serde_json::json!({"kind": "Timeout", "expected": true})))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({"id": "n-7"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = NotifierClient::configure(notifier_config(mock_server.uri(), Duration::from_secs(5)))
        .unwrap();
    let memory = Arc::new(MemorySink::default());
    let reporter = Reporter::builder()
        .expected_kinds(["Timeout"])
        .sink(memory.clone())
        .remote(RemoteSink::new(Arc::new(client)))
        .build();

    reporter.capture_message("Timeout", "upstream did not answer");

    let results = reporter.flush(Duration::from_secs(5)).await;
    assert_eq!(results.len(), 1);
    assert!(results[0].succeeded);
    assert_eq!(results[0].remote_id.as_deref(), Some("n-7"));
    assert_eq!(
        memory.entries()[0].lines().next(),
        Some("[EXPECTED] Timeout: upstream did not answer")
    );
}

#[tokio::test]
async fn resubmitted_report_is_posted_once() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({"id": "n-8"})))
        .mount(&mock_server)
        .await;

    let client = NotifierClient::configure(notifier_config(mock_server.uri(), Duration::from_secs(5)))
        .unwrap();
    let reporter = Reporter::builder()
        .sink(MemorySink::default())
        .remote(RemoteSink::new(Arc::new(client)))
        .build();

    let report = reporter.capture_message("Timeout", "upstream did not answer");
    reporter.report(report.clone());
    reporter.report(report.into_builder().context("retry", "1").build());

    let results = reporter.flush(Duration::from_secs(5)).await;
    assert_eq!(results.len(), 1);
    assert_eq!(mock_server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn detached_delivery_survives_dropped_handle() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let client = NotifierClient::configure(notifier_config(mock_server.uri(), Duration::from_secs(5)))
        .unwrap();
    drop(client.notify_detached(sample_report()));

    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        let received = mock_server.received_requests().await.unwrap().len();
        if received == 1 {
            break;
        }
        assert!(Instant::now() < deadline, "collector never received the report");
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

#[tokio::test]
async fn capture_dyn_reports_boxed_errors_under_given_kind() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_partial_json(serde_json::json!({
            "kind": "ConfigLoad",
            "message": "missing field `port`",
            "expected": true
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = NotifierClient::configure(notifier_config(mock_server.uri(), Duration::from_secs(5)))
        .unwrap();
    let reporter = Reporter::builder()
        .expected_kinds(["ConfigLoad"])
        .sink(MemorySink::default())
        .remote(RemoteSink::new(Arc::new(client)))
        .build();

    let boxed: Box<dyn std::error::Error + Send + Sync> = "missing field `port`".into();
    let report = reporter.capture_dyn("ConfigLoad", boxed.as_ref());
    assert!(report.expected());

    let results = reporter.flush(Duration::from_secs(5)).await;
    assert!(results[0].succeeded);
}

#[tokio::test]
async fn oversized_error_body_is_truncated() {
    let mock_server = MockServer::start().await;
    let page = format!("<html>{}</html>", "x".repeat(10_000));

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502).set_body_string(page))
        .mount(&mock_server)
        .await;

    let client = NotifierClient::configure(notifier_config(mock_server.uri(), Duration::from_secs(5)))
        .unwrap();

    let reason = client.notify(&sample_report()).await.failure_reason.unwrap();
    assert!(reason.contains("502"), "{reason}");
    assert!(reason.len() < 700, "{} chars", reason.len());
    assert!(reason.contains("bytes total"));
}
