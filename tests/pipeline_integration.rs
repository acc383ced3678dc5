//! End-to-end pipeline tests.
//!
//! Provider and page endpoints are served by `httptest`; artifact delivery
//! goes to an in-memory stub sink. The WebDriver endpoint points at a
//! discard port, so captures fail fast and the pipeline exercises its
//! degraded path — the record must still be assembled and delivered.
//!
//! Tests marked `#[ignore]` need a live WebDriver (set `SELENIUM_URL`) and
//! are run separately: `cargo test -- --ignored`.

mod helpers;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use httptest::{matchers::*, responders::*, Expectation, Server};

use helpers::{test_config, StubSink};
use url_preview::{ResourceURL, UrlExtractor};

fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 4, 12, 0, 0).unwrap()
}

/// A repository URL ends up tagged with its provider, and the metadata
/// record reaches the sink even though the capture failed.
#[tokio::test]
async fn repo_url_resolves_and_delivers_metadata() {
    let server = Server::run();
    server.expect(
        Expectation::matching(request::method_path("GET", "/repos/foo/bar")).respond_with(
            json_encoded(serde_json::json!({
                "id": 1296269,
                "full_name": "foo/bar",
            })),
        ),
    );

    let config = test_config(&format!("http://{}", server.addr()));
    let sink = Arc::new(StubSink::new());
    let extractor = UrlExtractor::new(&config, Arc::new(reqwest::Client::new()), sink.clone());

    let resource = ResourceURL::parse(&server.url_str("/foo/bar")).unwrap();
    let record = extractor.process("test-resource", &resource).await.unwrap();

    assert!(record.is_git_repo);
    assert_eq!(record.git_provider.as_deref(), Some("github"));
    // No live browser: the record degrades rather than failing
    assert!(record.title.is_none());
    assert!(record.preview_id.is_none());

    assert_eq!(sink.metadata_calls.load(Ordering::SeqCst), 1);
    assert_eq!(sink.preview_calls.load(Ordering::SeqCst), 0);

    let delivered = sink.last_metadata.lock().unwrap().clone().unwrap();
    assert_eq!(delivered["attachedTo"]["id"], "test-resource");
    assert_eq!(delivered["content"]["is_git_repo"], true);
    assert_eq!(delivered["content"]["git_provider"], "github");
}

/// A plain page goes down the probe branch: status and security headers
/// are recorded, and a failed HTTPS upgrade check yields false.
#[tokio::test]
async fn plain_page_is_probed_and_delivered() {
    let server = Server::run();
    server.expect(
        Expectation::matching(request::method_path("GET", "/page")).respond_with(
            status_code(200)
                .append_header("X-Frame-Options", "SAMEORIGIN")
                .append_header("Strict-Transport-Security", "max-age=31536000")
                .body("<html><title>A page</title></html>"),
        ),
    );

    let config = test_config("http://127.0.0.1:9");
    let sink = Arc::new(StubSink::new());
    let extractor = UrlExtractor::new(&config, Arc::new(reqwest::Client::new()), sink.clone());

    // Single path segment: no repository candidate, no provider calls
    let resource = ResourceURL::parse(&server.url_str("/page")).unwrap();
    let record = extractor.process("test-resource", &resource).await.unwrap();

    assert!(!record.is_git_repo);
    assert_eq!(record.status_code, Some(200));
    // The https variant of the mock server's URL refuses TLS, so no upgrade
    assert_eq!(record.tls_upgradeable, Some(false));
    let headers = record.security_headers.unwrap();
    assert_eq!(headers.get("X-Frame-Options").unwrap(), "SAMEORIGIN");
    assert!(record.youtube_id.is_none());

    assert_eq!(sink.metadata_calls.load(Ordering::SeqCst), 1);
}

/// Exhausting the metadata retry budget is the one delivery failure that
/// aborts the invocation.
#[tokio::test]
async fn metadata_delivery_exhaustion_is_fatal() {
    let server = Server::run();
    server.expect(
        Expectation::matching(request::method_path("GET", "/page"))
            .respond_with(status_code(200).body("<html></html>")),
    );

    let config = test_config("http://127.0.0.1:9");
    let sink = Arc::new(StubSink::failing_metadata(usize::MAX));
    let extractor = UrlExtractor::new(&config, Arc::new(reqwest::Client::new()), sink.clone());

    let resource = ResourceURL::parse(&server.url_str("/page")).unwrap();
    let result = extractor.process("test-resource", &resource).await;

    assert!(result.is_err());
    // The whole configured budget was spent before giving up
    assert_eq!(
        sink.metadata_calls.load(Ordering::SeqCst),
        config.upload_attempts
    );
}

/// A transiently unavailable sink is ridden out by the retry combinator.
#[tokio::test]
async fn transient_sink_failure_is_retried() {
    let server = Server::run();
    server.expect(
        Expectation::matching(request::method_path("GET", "/page"))
            .respond_with(status_code(200).body("<html></html>")),
    );

    let config = test_config("http://127.0.0.1:9");
    let sink = Arc::new(StubSink::failing_metadata(1));
    let extractor = UrlExtractor::new(&config, Arc::new(reqwest::Client::new()), sink.clone());

    let resource = ResourceURL::parse(&server.url_str("/page")).unwrap();
    let record = extractor.process("test-resource", &resource).await;

    assert!(record.is_ok());
    assert_eq!(sink.metadata_calls.load(Ordering::SeqCst), 2);
}

/// Two runs against unchanged external state produce structurally
/// identical records once the timestamps are aligned.
#[tokio::test]
async fn repeated_runs_are_structurally_identical() {
    let server = Server::run();
    server.expect(
        Expectation::matching(request::method_path("GET", "/page"))
            .times(2)
            .respond_with(
                status_code(200)
                    .append_header("X-Frame-Options", "DENY")
                    .body("<html></html>"),
            ),
    );

    let config = test_config("http://127.0.0.1:9");
    let resource = ResourceURL::parse(&server.url_str("/page")).unwrap();

    let sink = Arc::new(StubSink::new());
    let extractor = UrlExtractor::new(&config, Arc::new(reqwest::Client::new()), sink)
        .with_clock(fixed_now);

    let first = extractor.process("test-resource", &resource).await.unwrap();
    let second = extractor.process("test-resource", &resource).await.unwrap();

    assert_eq!(first, second);
}

/// Full end-to-end run including a real browser capture. Needs a live
/// WebDriver endpoint (SELENIUM_URL) and network access.
#[tokio::test]
#[ignore]
async fn live_capture_uploads_preview_and_thumbnail() {
    let server = Server::run();
    server.expect(
        Expectation::matching(request::method_path("GET", "/repos/foo/bar"))
            .respond_with(json_encoded(serde_json::json!({"id": 1}))),
    );

    let mut config = test_config(&format!("http://{}", server.addr()));
    config.webdriver_url = std::env::var("SELENIUM_URL").ok();

    let sink = Arc::new(StubSink::new());
    let extractor = UrlExtractor::new(&config, Arc::new(reqwest::Client::new()), sink.clone());

    let resource = ResourceURL::parse(&server.url_str("/foo/bar")).unwrap();
    let record = extractor.process("test-resource", &resource).await.unwrap();

    assert!(record.is_git_repo);
    assert_eq!(record.preview_id.as_deref(), Some("preview-artifact-1"));
    assert_eq!(sink.preview_calls.load(Ordering::SeqCst), 1);
    assert_eq!(sink.thumbnail_calls.load(Ordering::SeqCst), 1);
}
