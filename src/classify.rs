//! URL classification: parsing the raw input URL and extracting an
//! organization/repository candidate from its path.
//!
//! Everything here is pure; network-facing resolution of a candidate lives
//! in `crate::git_host`.

use std::sync::LazyLock;

use percent_encoding::percent_decode_str;
use regex::Regex;
use url::Url;

use crate::config::URL_SCHEME_PATTERN;
use crate::error_handling::InputError;

static URL_SCHEME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(URL_SCHEME_PATTERN).expect("Failed to parse URL scheme pattern - this is a bug")
});

/// Immutable parsed view of the input URL.
///
/// Created once at pipeline entry; all later stages borrow it. Path
/// segments are percent-decoded and the empty leading segment is
/// discarded.
#[derive(Debug, Clone)]
pub struct ResourceURL {
    url: Url,
    segments: Vec<String>,
}

impl ResourceURL {
    /// Parses and validates a raw URL string.
    ///
    /// The string must match a minimal `http(s)://` shape; anything else is
    /// an `InputError` and aborts the invocation before any network access.
    pub fn parse(raw: &str) -> Result<Self, InputError> {
        let raw = raw.trim();
        if !URL_SCHEME_RE.is_match(raw) {
            return Err(InputError::InvalidUrl(raw.to_string()));
        }
        let url = Url::parse(raw).map_err(|_| InputError::InvalidUrl(raw.to_string()))?;
        if url.host_str().is_none() {
            return Err(InputError::InvalidUrl(raw.to_string()));
        }

        let segments = url
            .path_segments()
            .map(|split| {
                split
                    .filter(|s| !s.is_empty())
                    .map(|s| percent_decode_str(s).decode_utf8_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default();

        Ok(ResourceURL { url, segments })
    }

    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    pub fn as_url(&self) -> &Url {
        &self.url
    }

    pub fn scheme(&self) -> &str {
        self.url.scheme()
    }

    /// Host, lowercased by the URL parser.
    pub fn host(&self) -> &str {
        // parse() rejects host-less URLs, so unwrap() is safe
        self.url.host_str().unwrap()
    }

    /// Raw path with the leading slash removed.
    pub fn path_tail(&self) -> &str {
        self.url.path().trim_start_matches('/')
    }

    /// Non-empty, percent-decoded path segments.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// First value of a query parameter, if present.
    pub fn query_first(&self, key: &str) -> Option<String> {
        self.url
            .query_pairs()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    }

    /// The same URL with the scheme upgraded to https.
    ///
    /// Returns `None` when the URL is already https.
    pub fn https_variant(&self) -> Option<Url> {
        if self.scheme() == "https" {
            return None;
        }
        let mut upgraded = self.url.clone();
        upgraded.set_scheme("https").ok()?;
        Some(upgraded)
    }

    /// Extracts an organization/repository candidate from the path.
    ///
    /// Present iff at least two meaningful segments remain after the host.
    /// The repository segment has `;`-delimited matrix parameters discarded
    /// and a trailing `.git` stripped before use; deeper segments are
    /// ignored.
    pub fn repo_candidate(&self) -> Option<RepoCandidate> {
        if self.segments.len() < 2 {
            return None;
        }
        let org = self.segments[0].clone();
        let mut repo = self.segments[1].as_str();
        repo = repo.split(';').next().unwrap_or(repo);
        repo = repo.strip_suffix(".git").unwrap_or(repo);
        if org.is_empty() || repo.is_empty() {
            return None;
        }
        Some(RepoCandidate {
            org,
            repo: repo.to_string(),
        })
    }
}

/// An (organization, repository) pair extracted from the URL path, not yet
/// confirmed against any provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoCandidate {
    /// Organization or user segment of the path.
    pub org: String,
    /// Repository name, already stripped of `.git` and matrix parameters.
    pub repo: String,
}
