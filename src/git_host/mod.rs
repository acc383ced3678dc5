//! Git-hosting provider resolution.
//!
//! A `RepoCandidate` is checked against the configured providers in strict
//! priority order. Each attempt yields `Present` (the provider confirmed
//! the repository and returned a record with an identifier field) or
//! `Absent` (a well-formed "not found": HTTP 404, another non-2xx status,
//! or a response lacking the identifier field). The first present result
//! wins and the remaining providers are skipped.
//!
//! Transport failures are never conflated with absence: they surface as
//! `NetworkError` so the caller can decide how to degrade.

mod github;
mod gitlab;

use std::sync::Arc;

use log::debug;
use serde_json::{Map, Value};

use crate::classify::{RepoCandidate, ResourceURL};
use crate::config::ProviderPriority;
use crate::error_handling::NetworkError;

/// A git-hosting provider supported by the resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Github,
    Gitlab,
}

impl ProviderKind {
    /// Tag recorded in the output metadata.
    pub fn as_str(self) -> &'static str {
        match self {
            ProviderKind::Github => "github",
            ProviderKind::Gitlab => "gitlab",
        }
    }
}

/// Outcome of a single provider attempt.
#[derive(Debug)]
pub enum Resolution {
    /// The provider confirmed the repository.
    Present(RepoMetadata),
    /// The provider answered, and the answer is "no such repository".
    Absent,
}

/// Repository metadata resolved through the provider chain.
///
/// Starts as the absent sentinel; `resolved()` is the only way to mark a
/// repository present, so `is_repo`, `provider`, and `api_url` are always
/// set together.
#[derive(Debug, Clone)]
pub struct RepoMetadata {
    /// Whether any provider confirmed the repository.
    pub is_repo: bool,
    /// The confirming provider; set together with `is_repo`.
    pub provider: Option<ProviderKind>,
    /// REST endpoint the record came from; set together with `is_repo`.
    pub api_url: Option<String>,
    /// The provider's own record, passed through to the output metadata.
    pub raw: Map<String, Value>,
}

impl RepoMetadata {
    /// The "not a repository" sentinel.
    pub fn absent() -> Self {
        RepoMetadata {
            is_repo: false,
            provider: None,
            api_url: None,
            raw: Map::new(),
        }
    }

    /// A confirmed repository record.
    pub fn resolved(provider: ProviderKind, api_url: String, raw: Map<String, Value>) -> Self {
        RepoMetadata {
            is_repo: true,
            provider: Some(provider),
            api_url: Some(api_url),
            raw,
        }
    }
}

/// Resolves repository candidates against the provider fallback chain.
pub struct GitHostResolver {
    client: Arc<reqwest::Client>,
    order: [ProviderKind; 2],
    github_api_root: String,
}

impl GitHostResolver {
    /// Creates a resolver with the given priority order.
    ///
    /// `github_api_root` is overridable so tests can point the GitHub-style
    /// provider at a local mock server.
    pub fn new(
        client: Arc<reqwest::Client>,
        priority: ProviderPriority,
        github_api_root: impl Into<String>,
    ) -> Self {
        GitHostResolver {
            client,
            order: priority.order(),
            github_api_root: github_api_root.into().trim_end_matches('/').to_string(),
        }
    }

    /// Walks the provider chain in priority order, short-circuiting on the
    /// first present result.
    ///
    /// Providers are never tried concurrently: a lower-priority provider is
    /// only consulted after its predecessor reports absent, and a present
    /// result is never overwritten.
    ///
    /// # Errors
    ///
    /// Returns `NetworkError` on a transport-level failure during any
    /// attempt. A well-formed "not found" is not an error; with every
    /// provider absent the returned metadata is the absent sentinel.
    pub async fn resolve(
        &self,
        candidate: &RepoCandidate,
        resource: &ResourceURL,
    ) -> Result<RepoMetadata, NetworkError> {
        for provider in self.order {
            let resolution = match provider {
                ProviderKind::Github => {
                    github::resolve(&self.client, &self.github_api_root, candidate).await?
                }
                ProviderKind::Gitlab => gitlab::resolve(&self.client, resource).await?,
            };
            match resolution {
                Resolution::Present(metadata) => {
                    debug!(
                        "Resolved {}/{} via {}",
                        candidate.org,
                        candidate.repo,
                        provider.as_str()
                    );
                    return Ok(metadata);
                }
                Resolution::Absent => {
                    debug!(
                        "Provider {} reports {}/{} absent",
                        provider.as_str(),
                        candidate.org,
                        candidate.repo
                    );
                }
            }
        }
        Ok(RepoMetadata::absent())
    }
}

/// True iff the provider's record carries the required identifier field.
pub(crate) fn has_identifier(body: &Value) -> bool {
    body.get("id").is_some()
}
