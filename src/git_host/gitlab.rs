//! GitLab-style provider: two-step resolution against the repository's own
//! host.
//!
//! GitLab's project REST endpoint is keyed by an internal numeric project
//! id, so the id has to be discovered first by scraping a
//! `data-project-id` attribute from the repository's web page. Any failure
//! at the discovery step is a negative answer, not an error.

use std::sync::LazyLock;

use log::debug;
use scraper::{Html, Selector};
use serde_json::Value;

use super::{has_identifier, ProviderKind, RepoMetadata, Resolution};
use crate::classify::ResourceURL;
use crate::config::GITLAB_API_PROJECTS_PATH;
use crate::error_handling::NetworkError;

const PROJECT_ID_SELECTOR_STR: &str = "[data-project-id]";

static PROJECT_ID_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(PROJECT_ID_SELECTOR_STR)
        .expect("Failed to parse project id selector - this is a bug")
});

/// Resolves the candidate against a GitLab-style instance on the input
/// URL's own scheme and host.
///
/// Step 1 fetches the repository web page and scrapes the numeric project
/// id; step 2 calls the project-by-id REST endpoint. A missing id
/// attribute, a non-2xx status at either step, or an identifier-less REST
/// body are all Absent. Transport failures propagate as `NetworkError`.
pub(super) async fn resolve(
    client: &reqwest::Client,
    resource: &ResourceURL,
) -> Result<Resolution, NetworkError> {
    let page_url = resource.as_str();
    let response = client
        .get(page_url)
        .send()
        .await
        .map_err(|e| NetworkError::transport(page_url, e))?;

    let status = response.status();
    if !status.is_success() {
        debug!("GitLab-style page fetch of {page_url} returned {status}");
        return Ok(Resolution::Absent);
    }

    let html = match response.text().await {
        Ok(html) => html,
        Err(e) => {
            debug!("Could not read GitLab-style page body for {page_url}: {e}");
            return Ok(Resolution::Absent);
        }
    };

    // Html is not Send; extract the id in a sync block before awaiting again
    let project_id = {
        let document = Html::parse_document(&html);
        document
            .select(&PROJECT_ID_SELECTOR)
            .next()
            .and_then(|element| element.value().attr("data-project-id"))
            .and_then(|value| value.parse::<u64>().ok())
    };

    let Some(project_id) = project_id else {
        debug!("No project id attribute found in page markup for {page_url}");
        return Ok(Resolution::Absent);
    };

    // Same scheme and host as the input URL, so self-hosted instances work
    let mut api = resource.as_url().clone();
    api.set_path(&format!("{GITLAB_API_PROJECTS_PATH}/{project_id}"));
    api.set_query(None);
    api.set_fragment(None);
    let api_url = api.to_string();

    let response = client
        .get(api.clone())
        .send()
        .await
        .map_err(|e| NetworkError::transport(&api_url, e))?;

    let status = response.status();
    if !status.is_success() {
        debug!("GitLab-style project lookup {api_url} returned {status}");
        return Ok(Resolution::Absent);
    }

    let body: Value = match response.json().await {
        Ok(body) => body,
        Err(e) => {
            debug!("GitLab-style response for {api_url} was not parseable JSON: {e}");
            return Ok(Resolution::Absent);
        }
    };

    if !has_identifier(&body) {
        debug!("GitLab-style response for {api_url} lacks an identifier field");
        return Ok(Resolution::Absent);
    }

    let raw = body.as_object().cloned().unwrap_or_default();
    Ok(Resolution::Present(RepoMetadata::resolved(
        ProviderKind::Gitlab,
        api_url,
        raw,
    )))
}
