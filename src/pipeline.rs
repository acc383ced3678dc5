//! Per-invocation extraction pipeline.
//!
//! `UrlExtractor` owns the injected collaborators (HTTP client, browser
//! capturer, artifact sink, clock) and runs the strictly sequential flow:
//! classify, resolve or probe, capture, deliver. Every sub-probe is
//! allowed to fail individually; only malformed input and an exhausted
//! metadata-delivery budget abort the invocation.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::{info, warn};

use crate::browser::{ScreenshotArtifact, ScreenshotCapturer};
use crate::classify::ResourceURL;
use crate::config::Config;
use crate::error_handling::{BrowserError, ErrorStats, ErrorType};
use crate::git_host::{GitHostResolver, RepoMetadata};
use crate::metadata::{assemble, MetadataEnvelope, ResultMetadata};
use crate::probe::{probe_page, PageProbeResult};
use crate::sink::ArtifactSink;
use crate::uploader::{try_upload, RetryPolicy};
use crate::youtube::video_id;

/// The extraction pipeline with its injected collaborators.
pub struct UrlExtractor {
    client: Arc<reqwest::Client>,
    resolver: GitHostResolver,
    capturer: ScreenshotCapturer,
    sink: Arc<dyn ArtifactSink>,
    retry_policy: RetryPolicy,
    error_stats: Arc<ErrorStats>,
    clock: fn() -> DateTime<Utc>,
}

impl UrlExtractor {
    /// Wires the pipeline from configuration plus the shared client and
    /// sink.
    pub fn new(config: &Config, client: Arc<reqwest::Client>, sink: Arc<dyn ArtifactSink>) -> Self {
        let resolver = GitHostResolver::new(
            Arc::clone(&client),
            config.provider_priority,
            config.github_api_root.clone(),
        );
        let capturer = ScreenshotCapturer::new(
            config.resolved_webdriver_url(),
            (config.window_width, config.window_height),
        );
        let retry_policy = RetryPolicy::new(
            config.upload_attempts,
            std::time::Duration::from_secs(config.upload_wait_secs),
        );
        UrlExtractor {
            client,
            resolver,
            capturer,
            sink,
            retry_policy,
            error_stats: Arc::new(ErrorStats::new()),
            clock: Utc::now,
        }
    }

    /// Replaces the clock, so tests can pin the timestamp.
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    /// Error counters accumulated by this pipeline instance.
    pub fn error_stats(&self) -> &ErrorStats {
        &self.error_stats
    }

    /// Runs one full extraction for the given URL.
    ///
    /// # Errors
    ///
    /// Fails only when the scratch directory cannot be created or the
    /// metadata record cannot be delivered within the retry budget. All
    /// other failures degrade the record instead.
    pub async fn process(
        &self,
        resource_id: &str,
        resource: &ResourceURL,
    ) -> Result<ResultMetadata> {
        let date = (self.clock)();

        // Scratch space for screenshot files; removed unconditionally when
        // the invocation ends, whatever happened in between.
        let workdir = tempfile::Builder::new()
            .prefix("url-preview-")
            .tempdir()
            .context("Failed to create scratch directory")?;

        let repo = self.resolve_repository(resource).await;

        let (probe, youtube) = if repo.is_repo {
            (None, None)
        } else {
            (self.probe(resource).await, video_id(resource))
        };

        // One capture attempt per invocation, repo or not
        let screenshot = self.capture(resource, workdir.path()).await;

        let preview_id = match &screenshot {
            Some(artifact) => self.deliver_images(resource_id, artifact).await,
            None => None,
        };

        let record = assemble(
            resource.as_str(),
            date,
            &repo,
            probe.as_ref(),
            youtube,
            screenshot.map(|s| s.title),
            preview_id,
        );

        self.deliver_metadata(resource_id, &record).await?;

        Ok(record)
    }

    /// Resolves a repository candidate, degrading to the absent sentinel
    /// on classification misses and network failures alike.
    async fn resolve_repository(&self, resource: &ResourceURL) -> RepoMetadata {
        let Some(candidate) = resource.repo_candidate() else {
            return RepoMetadata::absent();
        };
        match self.resolver.resolve(&candidate, resource).await {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!("Provider chain failed for {}: {e}", resource.as_str());
                self.error_stats.increment(ErrorType::ProviderLookupError);
                RepoMetadata::absent()
            }
        }
    }

    async fn probe(&self, resource: &ResourceURL) -> Option<PageProbeResult> {
        match probe_page(&self.client, resource).await {
            Ok(result) => Some(result),
            Err(e) => {
                warn!("Failed to probe {}: {e}", resource.as_str());
                self.error_stats.increment(ErrorType::PageProbeError);
                None
            }
        }
    }

    async fn capture(
        &self,
        resource: &ResourceURL,
        workdir: &std::path::Path,
    ) -> Option<ScreenshotArtifact> {
        match self.capturer.capture(resource.as_str(), workdir).await {
            Ok(artifact) => Some(artifact),
            Err(e) => {
                warn!("Failed to capture {}: {e}", resource.as_str());
                self.error_stats.increment(match &e {
                    BrowserError::Session(_) => ErrorType::BrowserSessionError,
                    BrowserError::Command(_) => ErrorType::BrowserCaptureError,
                    BrowserError::Encode(_) | BrowserError::Io(_) => {
                        ErrorType::ScreenshotEncodeError
                    }
                });
                None
            }
        }
    }

    /// Delivers the preview and thumbnail images.
    ///
    /// Each delivery gets its own retry budget; exhausting one is fatal for
    /// that artifact only. Returns the preview's artifact id when the sink
    /// accepted it.
    async fn deliver_images(
        &self,
        resource_id: &str,
        artifact: &ScreenshotArtifact,
    ) -> Option<String> {
        let preview_id = match try_upload("preview", &self.retry_policy, || {
            self.sink.upload_preview(resource_id, &artifact.encoded_file)
        })
        .await
        {
            Ok(id) => Some(id),
            Err(e) => {
                log::error!("Giving up on preview delivery: {e}");
                self.error_stats.increment(ErrorType::PreviewUploadError);
                None
            }
        };

        if let Err(e) = try_upload("thumbnail", &self.retry_policy, || {
            self.sink
                .upload_thumbnail(resource_id, &artifact.encoded_file)
        })
        .await
        {
            log::error!("Giving up on thumbnail delivery: {e}");
            self.error_stats.increment(ErrorType::ThumbnailUploadError);
        }

        preview_id
    }

    /// Delivers the metadata record. Exhaustion here fails the invocation.
    async fn deliver_metadata(&self, resource_id: &str, record: &ResultMetadata) -> Result<()> {
        let envelope = serde_json::to_value(MetadataEnvelope::wrap(resource_id, record.clone()))
            .context("Failed to serialize metadata record")?;

        try_upload("metadata", &self.retry_policy, || {
            self.sink.upload_metadata(resource_id, &envelope)
        })
        .await
        .map_err(|e| {
            self.error_stats.increment(ErrorType::MetadataUploadError);
            e
        })
        .context("Metadata delivery failed after exhausting retries")?;

        info!("Delivered metadata record for {}", record.url);
        Ok(())
    }
}
