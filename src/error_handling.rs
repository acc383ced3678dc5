//! Error types and per-run error statistics.
//!
//! Each failure family gets its own typed error so callers can tell a
//! malformed input from a transport failure from a misbehaving browser:
//! - `InputError`: the invocation document or URL is unusable (fatal)
//! - `NetworkError`: a provider lookup or page probe failed (recoverable)
//! - `BrowserError`: the remote browser session failed (recoverable)
//!
//! Sink delivery errors live in `crate::sink` next to the sink client.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use log::SetLoggerError;
use strum::IntoEnumIterator;
use strum_macros::EnumIter as EnumIterMacro;
use thiserror::Error;

/// Error types for initialization failures.
#[derive(Error, Debug)]
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),

    /// Error initializing the HTTP client.
    #[error("HTTP client initialization error: {0}")]
    HttpClientError(#[from] reqwest::Error),
}

/// The invocation input could not be used. Fatal: no uploads are attempted.
#[derive(Error, Debug)]
pub enum InputError {
    /// The input document could not be read from disk.
    #[error("failed to read input document {path}: {source}")]
    DocumentRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The input document is not valid JSON or lacks the URL field.
    #[error("failed to parse input document {path}: {source}")]
    DocumentParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The URL does not match a minimal `http(s)://` shape.
    #[error("invalid url: {0}")]
    InvalidUrl(String),
}

/// A network-level failure during a provider lookup or page probe.
///
/// Distinct from an "absent" result: a well-formed 404 from a git-hosting
/// provider is not a `NetworkError`, it is a negative answer.
#[derive(Error, Debug)]
pub enum NetworkError {
    /// Transport failure: DNS, connection, timeout, protocol.
    #[error("request for {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status.
    #[error("{url} returned {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
}

impl NetworkError {
    pub fn transport(url: impl Into<String>, source: reqwest::Error) -> Self {
        NetworkError::Transport {
            url: url.into(),
            source,
        }
    }
}

/// A remote browser session failed somewhere between session creation and
/// screenshot encoding. Always recoverable: the pipeline proceeds without
/// a preview.
#[derive(Error, Debug)]
pub enum BrowserError {
    /// Could not create a session on the remote automation endpoint.
    #[error("failed to create browser session: {0}")]
    Session(#[from] fantoccini::error::NewSessionError),

    /// Navigation, title read, or screenshot command failed or timed out.
    #[error("browser command failed: {0}")]
    Command(#[from] fantoccini::error::CmdError),

    /// The captured raster could not be re-encoded.
    #[error("failed to encode screenshot: {0}")]
    Encode(#[from] image::ImageError),

    /// Screenshot file I/O failed.
    #[error("screenshot I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Types of errors that can occur while processing a URL.
///
/// Each variant represents a specific failure mode in the extraction
/// pipeline, counted for end-of-run reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum ErrorType {
    ProviderLookupError,
    PageProbeError,
    BrowserSessionError,
    BrowserCaptureError,
    ScreenshotEncodeError,
    PreviewUploadError,
    ThumbnailUploadError,
    MetadataUploadError,
}

impl ErrorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorType::ProviderLookupError => "Git-host provider lookup error",
            ErrorType::PageProbeError => "Page probe error",
            ErrorType::BrowserSessionError => "Browser session error",
            ErrorType::BrowserCaptureError => "Browser capture error",
            ErrorType::ScreenshotEncodeError => "Screenshot encode error",
            ErrorType::PreviewUploadError => "Preview upload error",
            ErrorType::ThumbnailUploadError => "Thumbnail upload error",
            ErrorType::MetadataUploadError => "Metadata upload error",
        }
    }
}

/// Thread-safe error statistics tracker.
///
/// Tracks the count of each error type using atomic counters. All error
/// types are initialized to zero on creation.
pub struct ErrorStats {
    errors: HashMap<ErrorType, AtomicUsize>,
}

impl ErrorStats {
    pub fn new() -> Self {
        let mut errors = HashMap::new();
        for error in ErrorType::iter() {
            errors.insert(error, AtomicUsize::new(0));
        }
        ErrorStats { errors }
    }

    pub fn increment(&self, error: ErrorType) {
        // All ErrorType variants are initialized in new(), so unwrap() is safe
        self.errors
            .get(&error)
            .unwrap()
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_count(&self, error: ErrorType) -> usize {
        // All ErrorType variants are initialized in new(), so unwrap() is safe
        self.errors.get(&error).unwrap().load(Ordering::SeqCst)
    }

    /// Logs a one-line count for every error type that occurred.
    pub fn log_summary(&self) {
        for error_type in ErrorType::iter() {
            let count = self.get_count(error_type);
            if count > 0 {
                log::info!("{}: {}", error_type.as_str(), count);
            }
        }
    }
}

impl Default for ErrorStats {
    fn default() -> Self {
        Self::new()
    }
}
