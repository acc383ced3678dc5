//! url_preview library: URL classification and preview extraction
//!
//! Given one web URL, this library decides whether it references a hosted
//! git repository (resolving canonical metadata through a two-provider
//! fallback chain), recognizes known video-sharing URL shapes, probes the
//! live page for security/transport properties, renders the page in a
//! remote browser for a visual snapshot, and delivers every derived
//! artifact to an external sink with bounded retries.
//!
//! # Example
//!
//! ```no_run
//! use url_preview::{run_extraction, Config};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config {
//!     input: std::path::PathBuf::from("input.jsonurl"),
//!     resource_id: "5d1a...".to_string(),
//!     sink_url: "http://sink:9000".to_string(),
//!     ..Default::default()
//! };
//!
//! let report = run_extraction(config).await?;
//! println!("Processed {} (repository: {})", report.url, report.is_repo);
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. Use `#[tokio::main]` in your
//! application or ensure you're calling library functions within an async
//! context.

#![warn(missing_docs)]

mod browser;
mod classify;
pub mod config;
mod error_handling;
mod git_host;
pub mod initialization;
mod input;
mod metadata;
mod pipeline;
mod probe;
mod sink;
mod uploader;
mod youtube;

// Re-export public API
pub use browser::{ScreenshotArtifact, ScreenshotCapturer};
pub use classify::{RepoCandidate, ResourceURL};
pub use config::{Config, LogFormat, LogLevel, ProviderPriority};
pub use error_handling::{
    BrowserError, ErrorStats, ErrorType, InitializationError, InputError, NetworkError,
};
pub use git_host::{GitHostResolver, ProviderKind, RepoMetadata, Resolution};
pub use input::{load_url_document, UrlDocument};
pub use metadata::{assemble, MetadataEnvelope, ResultMetadata};
pub use pipeline::UrlExtractor;
pub use probe::{probe_page, PageProbeResult};
pub use run::{run_extraction, ExtractionReport};
pub use sink::{ArtifactSink, HttpSink, SinkError};
pub use uploader::{try_upload, RetryPolicy};
pub use youtube::video_id;

// Internal run module (wires the pipeline from configuration)
mod run {
    use anyhow::{Context, Result};
    use log::info;
    use std::sync::Arc;

    use crate::classify::ResourceURL;
    use crate::config::Config;
    use crate::initialization::init_client;
    use crate::input::load_url_document;
    use crate::pipeline::UrlExtractor;
    use crate::sink::{ArtifactSink, HttpSink};

    /// Results of a completed extraction run.
    #[derive(Debug, Clone)]
    pub struct ExtractionReport {
        /// Identifier of the resource the artifacts were attached to
        pub resource_id: String,
        /// The processed URL
        pub url: String,
        /// Whether the URL resolved to a hosted git repository
        pub is_repo: bool,
        /// Provider tag (`github`/`gitlab`) when a repository was resolved
        pub provider: Option<String>,
        /// Artifact id of the uploaded preview, when a capture succeeded
        pub preview_id: Option<String>,
        /// Elapsed time in seconds
        pub elapsed_seconds: f64,
    }

    /// Runs one extraction with the provided configuration.
    ///
    /// This is the main entry point for the library. It reads the
    /// invocation document, wires the pipeline against the configured
    /// sink and WebDriver endpoint, and processes the single URL.
    ///
    /// # Errors
    ///
    /// This function will return an error if:
    /// - The input document cannot be read or carries no usable URL
    /// - The HTTP client cannot be initialized
    /// - The metadata record cannot be delivered within the retry budget
    ///
    /// Sub-probe failures (provider lookups, page probe, browser capture,
    /// preview/thumbnail delivery) degrade the output record instead of
    /// failing the run.
    pub async fn run_extraction(config: Config) -> Result<ExtractionReport> {
        let document =
            load_url_document(&config.input).context("Failed to load invocation document")?;
        let resource = ResourceURL::parse(&document.url)?;
        info!("Extracting {}", resource.as_str());

        let client = init_client(&config).context("Failed to initialize HTTP client")?;
        let sink: Arc<dyn ArtifactSink> = Arc::new(HttpSink::new(
            Arc::clone(&client),
            config.sink_url.clone(),
            config.resolved_sink_key(),
        ));

        let start_time = std::time::Instant::now();
        let extractor = UrlExtractor::new(&config, client, sink);
        let record = extractor.process(&config.resource_id, &resource).await?;

        extractor.error_stats().log_summary();

        Ok(ExtractionReport {
            resource_id: config.resource_id,
            url: record.url.clone(),
            is_repo: record.is_git_repo,
            provider: record.git_provider.clone(),
            preview_id: record.preview_id.clone(),
            elapsed_seconds: start_time.elapsed().as_secs_f64(),
        })
    }
}
