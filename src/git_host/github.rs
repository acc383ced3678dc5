//! GitHub-style provider: a single REST call to the repos-by-org-and-name
//! endpoint.

use log::debug;
use serde_json::Value;

use super::{has_identifier, ProviderKind, RepoMetadata, Resolution};
use crate::classify::RepoCandidate;
use crate::error_handling::NetworkError;

/// Looks the candidate up at `{api_root}/repos/{org}/{repo}`.
///
/// Absent on any non-2xx status (a 404 here is the expected negative
/// answer) and on a 2xx body without an identifier field. Transport
/// failures propagate as `NetworkError`.
pub(super) async fn resolve(
    client: &reqwest::Client,
    api_root: &str,
    candidate: &RepoCandidate,
) -> Result<Resolution, NetworkError> {
    let api_url = format!("{}/repos/{}/{}", api_root, candidate.org, candidate.repo);

    let response = client
        .get(&api_url)
        .header(reqwest::header::ACCEPT, "application/vnd.github+json")
        .send()
        .await
        .map_err(|e| NetworkError::transport(&api_url, e))?;

    let status = response.status();
    if !status.is_success() {
        debug!("GitHub-style lookup of {api_url} returned {status}");
        return Ok(Resolution::Absent);
    }

    let body: Value = match response.json().await {
        Ok(body) => body,
        Err(e) => {
            debug!("GitHub-style response for {api_url} was not parseable JSON: {e}");
            return Ok(Resolution::Absent);
        }
    };

    if !has_identifier(&body) {
        debug!("GitHub-style response for {api_url} lacks an identifier field");
        return Ok(Resolution::Absent);
    }

    let raw = body.as_object().cloned().unwrap_or_default();
    Ok(Resolution::Present(RepoMetadata::resolved(
        ProviderKind::Github,
        api_url,
        raw,
    )))
}
