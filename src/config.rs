use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::git_host::ProviderKind;

// Network operation timeouts
/// Per-request HTTP timeout in seconds
pub const HTTP_TIMEOUT_SECS: u64 = 10;
/// Browser page-load timeout, bounds how long a navigation may suspend
pub const BROWSER_PAGE_LOAD_TIMEOUT: Duration = Duration::from_secs(30);
/// Browser script timeout
pub const BROWSER_SCRIPT_TIMEOUT: Duration = Duration::from_secs(30);

// Upload retry policy
/// Maximum delivery attempts per artifact before the last error surfaces
pub const UPLOAD_MAX_ATTEMPTS: usize = 12;
/// Fixed wait between delivery attempts in seconds
pub const UPLOAD_RETRY_WAIT_SECS: u64 = 15;

// Browser viewport defaults
/// Default render viewport width in pixels
pub const DEFAULT_WINDOW_WIDTH: u32 = 1366;
/// Default render viewport height in pixels
pub const DEFAULT_WINDOW_HEIGHT: u32 = 768;

/// Default remote WebDriver endpoint, overridable via `SELENIUM_URL`
pub const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:4444";

/// Root of the GitHub-style provider's REST API
pub const GITHUB_API_ROOT: &str = "https://api.github.com";
/// Path of the GitLab-style provider's project-by-id endpoint, relative to
/// the repository's own host
pub const GITLAB_API_PROJECTS_PATH: &str = "/api/v4/projects";

/// Default User-Agent string for HTTP requests.
///
/// Uses a generic Chrome-like string without a specific version number to avoid
/// becoming outdated. Users can override this via the `--user-agent` CLI flag.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

// URL validation
pub const URL_SCHEME_PATTERN: &str = r"^https?://";

// Security header names
pub const HEADER_CONTENT_SECURITY_POLICY: &str = "Content-Security-Policy";
pub const HEADER_STRICT_TRANSPORT_SECURITY: &str = "Strict-Transport-Security";
pub const HEADER_X_CONTENT_TYPE_OPTIONS: &str = "X-Content-Type-Options";
pub const HEADER_X_FRAME_OPTIONS: &str = "X-Frame-Options";
pub const HEADER_X_XSS_PROTECTION: &str = "X-XSS-Protection";
pub const HEADER_REFERRER_POLICY: &str = "Referrer-Policy";
pub const HEADER_PERMISSIONS_POLICY: &str = "Permissions-Policy";

/// List of security headers the page probe records.
/// To add/remove headers, modify this array.
pub const SECURITY_HEADERS: &[&str] = &[
    HEADER_CONTENT_SECURITY_POLICY,
    HEADER_STRICT_TRANSPORT_SECURITY,
    HEADER_X_CONTENT_TYPE_OPTIONS,
    HEADER_X_FRAME_OPTIONS,
    HEADER_X_XSS_PROTECTION,
    HEADER_REFERRER_POLICY,
    HEADER_PERMISSIONS_POLICY,
];

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace). Used with the `--log-level` CLI option.
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// Controls how log messages are formatted:
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    Plain,
    Json,
}

/// Order in which the git-hosting providers are tried.
///
/// Historical deployments of this pipeline disagreed on the canonical
/// order, so it is a configuration parameter rather than a constant.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ProviderPriority {
    /// Try the GitHub-style provider first, then GitLab-style.
    GithubFirst,
    /// Try the GitLab-style provider first, then GitHub-style.
    GitlabFirst,
}

impl ProviderPriority {
    /// The fallback chain, highest priority first.
    pub fn order(self) -> [ProviderKind; 2] {
        match self {
            ProviderPriority::GithubFirst => [ProviderKind::Github, ProviderKind::Gitlab],
            ProviderPriority::GitlabFirst => [ProviderKind::Gitlab, ProviderKind::Github],
        }
    }
}

/// Command-line options and configuration.
///
/// This struct is automatically generated by `clap` from the field attributes.
/// All options have sensible defaults and can be overridden via command-line flags.
///
/// # Examples
///
/// ```bash
/// # Basic usage: extract one URL document and deliver to a sink
/// url_preview input.jsonurl --resource-id 5d1a... --sink-url http://sink:9000
///
/// # Self-hosted GitLab tried first, custom viewport
/// url_preview input.jsonurl --resource-id 5d1a... --sink-url http://sink:9000 \
///     --provider-priority gitlab-first --window-width 1920 --window-height 1080
/// ```
#[derive(Debug, Clone, Parser)]
#[command(
    name = "url_preview",
    about = "Classifies a URL, captures a page preview, and uploads metadata artifacts."
)]
pub struct Config {
    /// Input document (JSON with a top-level "URL" field)
    #[arg(value_parser)]
    pub input: PathBuf,

    /// Identifier of the resource the artifacts attach to in the sink
    #[arg(long)]
    pub resource_id: String,

    /// Base URL of the artifact sink
    #[arg(long)]
    pub sink_url: String,

    /// Sink API key (falls back to the SINK_API_KEY environment variable)
    #[arg(long)]
    pub sink_key: Option<String>,

    /// Remote WebDriver endpoint (falls back to SELENIUM_URL, then localhost)
    #[arg(long)]
    pub webdriver_url: Option<String>,

    /// Render viewport width in pixels
    #[arg(long, default_value_t = DEFAULT_WINDOW_WIDTH)]
    pub window_width: u32,

    /// Render viewport height in pixels
    #[arg(long, default_value_t = DEFAULT_WINDOW_HEIGHT)]
    pub window_height: u32,

    /// Which git-hosting provider to try first
    #[arg(long, value_enum, default_value_t = ProviderPriority::GithubFirst)]
    pub provider_priority: ProviderPriority,

    /// Root URL of the GitHub-style provider REST API
    #[arg(long, default_value = GITHUB_API_ROOT)]
    pub github_api_root: String,

    /// Maximum delivery attempts per artifact
    #[arg(long, default_value_t = UPLOAD_MAX_ATTEMPTS)]
    pub upload_attempts: usize,

    /// Seconds to wait between delivery attempts
    #[arg(long, default_value_t = UPLOAD_RETRY_WAIT_SECS)]
    pub upload_wait_secs: u64,

    /// Per-request HTTP timeout in seconds
    #[arg(long, default_value_t = HTTP_TIMEOUT_SECS)]
    pub timeout_seconds: u64,

    /// HTTP User-Agent header value
    #[arg(long, default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,

    /// Log level: error|warn|info|debug|trace
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// Log format: plain|json
    #[arg(long, value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            input: PathBuf::new(),
            resource_id: String::new(),
            sink_url: String::new(),
            sink_key: None,
            webdriver_url: None,
            window_width: DEFAULT_WINDOW_WIDTH,
            window_height: DEFAULT_WINDOW_HEIGHT,
            provider_priority: ProviderPriority::GithubFirst,
            github_api_root: GITHUB_API_ROOT.to_string(),
            upload_attempts: UPLOAD_MAX_ATTEMPTS,
            upload_wait_secs: UPLOAD_RETRY_WAIT_SECS,
            timeout_seconds: HTTP_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            log_level: LogLevel::Info,
            log_format: LogFormat::Plain,
        }
    }
}

impl Config {
    /// Resolves the WebDriver endpoint: CLI flag, then `SELENIUM_URL`, then
    /// the localhost default.
    pub fn resolved_webdriver_url(&self) -> String {
        self.webdriver_url
            .clone()
            .or_else(|| std::env::var("SELENIUM_URL").ok())
            .unwrap_or_else(|| DEFAULT_WEBDRIVER_URL.to_string())
    }

    /// Resolves the sink API key: CLI flag, then `SINK_API_KEY`.
    pub fn resolved_sink_key(&self) -> Option<String> {
        self.sink_key
            .clone()
            .or_else(|| std::env::var("SINK_API_KEY").ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_priority_order() {
        assert_eq!(
            ProviderPriority::GithubFirst.order(),
            [ProviderKind::Github, ProviderKind::Gitlab]
        );
        assert_eq!(
            ProviderPriority::GitlabFirst.order(),
            [ProviderKind::Gitlab, ProviderKind::Github]
        );
    }

    #[test]
    fn test_default_retry_constants() {
        let config = Config::default();
        assert_eq!(config.upload_attempts, 12);
        assert_eq!(config.upload_wait_secs, 15);
        assert_eq!(config.window_width, 1366);
        assert_eq!(config.window_height, 768);
    }
}
