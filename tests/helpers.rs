// Shared test helpers: an in-memory artifact sink and config construction.
//
// This module provides common utilities used across multiple test files to
// reduce duplication.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use url_preview::{ArtifactSink, Config, SinkError};

/// In-memory artifact sink that records every delivery.
///
/// `metadata_failures` makes the first N metadata deliveries fail with a
/// 503, to exercise the retry combinator; `usize::MAX` means "always
/// fail".
#[derive(Default)]
pub struct StubSink {
    pub metadata_failures: usize,
    pub preview_calls: AtomicUsize,
    pub thumbnail_calls: AtomicUsize,
    pub metadata_calls: AtomicUsize,
    pub last_metadata: Mutex<Option<Value>>,
}

impl StubSink {
    #[allow(dead_code)] // Used by other test files
    pub fn new() -> Self {
        StubSink::default()
    }

    #[allow(dead_code)]
    pub fn failing_metadata(failures: usize) -> Self {
        StubSink {
            metadata_failures: failures,
            ..StubSink::default()
        }
    }

    fn unavailable(what: &str) -> SinkError {
        SinkError::Status {
            what: what.to_string(),
            status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

#[async_trait]
impl ArtifactSink for StubSink {
    async fn upload_preview(&self, _resource_id: &str, _file: &Path) -> Result<String, SinkError> {
        self.preview_calls.fetch_add(1, Ordering::SeqCst);
        Ok("preview-artifact-1".to_string())
    }

    async fn upload_thumbnail(&self, _resource_id: &str, _file: &Path) -> Result<(), SinkError> {
        self.thumbnail_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn upload_metadata(&self, _resource_id: &str, record: &Value) -> Result<(), SinkError> {
        let call = self.metadata_calls.fetch_add(1, Ordering::SeqCst);
        if call < self.metadata_failures {
            return Err(Self::unavailable("metadata"));
        }
        *self.last_metadata.lock().unwrap() = Some(record.clone());
        Ok(())
    }
}

/// A config wired for tests: tiny retry budget, no waits, and a WebDriver
/// endpoint on a discard port so captures fail fast.
#[allow(dead_code)] // Used by other test files
pub fn test_config(github_api_root: &str) -> Config {
    Config {
        resource_id: "test-resource".to_string(),
        sink_url: "http://unused.invalid".to_string(),
        github_api_root: github_api_root.to_string(),
        webdriver_url: Some("http://127.0.0.1:9".to_string()),
        upload_attempts: 2,
        upload_wait_secs: 0,
        timeout_seconds: 5,
        ..Config::default()
    }
}
