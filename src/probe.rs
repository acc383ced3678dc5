//! Live-page probing: security headers and HTTPS upgradeability.
//!
//! Runs only on the non-repository branch of the pipeline. A failed probe
//! is recoverable: the caller records an absent result and moves on.

use std::collections::HashMap;

use log::debug;
use reqwest::StatusCode;

use crate::classify::ResourceURL;
use crate::config::SECURITY_HEADERS;
use crate::error_handling::NetworkError;

/// What a successful page probe determined.
///
/// Absent entirely (not defaulted) when the initial fetch fails.
#[derive(Debug, Clone)]
pub struct PageProbeResult {
    /// Status of the initial GET.
    pub status_code: u16,
    /// Security headers present on the response, keyed by canonical name.
    pub security_headers: HashMap<String, String>,
    /// Whether the page is reachable over HTTPS: true by definition for
    /// https inputs, otherwise probed against the https variant.
    pub tls_upgradeable: bool,
}

/// Probes the URL with a GET request.
///
/// # Errors
///
/// Returns `NetworkError` on transport failure or a non-2xx status. The
/// pipeline recovers by omitting the probe fields from the output record.
pub async fn probe_page(
    client: &reqwest::Client,
    resource: &ResourceURL,
) -> Result<PageProbeResult, NetworkError> {
    let url = resource.as_str();
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| NetworkError::transport(url, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(NetworkError::Status {
            url: url.to_string(),
            status,
        });
    }

    let security_headers = extract_security_headers(response.headers());

    let tls_upgradeable = if resource.scheme() == "https" {
        true
    } else {
        check_https_upgrade(client, resource).await
    };

    Ok(PageProbeResult {
        status_code: status.as_u16(),
        security_headers,
        tls_upgradeable,
    })
}

/// Extracts security-related HTTP headers from a response.
///
/// Scans the header map for the headers named in
/// `config::SECURITY_HEADERS`. Only headers present in the response appear
/// in the map, keyed by their canonical name.
pub fn extract_security_headers(headers: &reqwest::header::HeaderMap) -> HashMap<String, String> {
    SECURITY_HEADERS
        .iter()
        .filter_map(|&header_name| {
            headers.get(header_name).map(|value| {
                (
                    header_name.to_string(),
                    value.to_str().unwrap_or_default().to_string(),
                )
            })
        })
        .collect()
}

/// Issues a GET against the https variant of the URL.
///
/// Only a 200 counts as upgradeable; content equivalence is not checked.
/// Any transport failure means no upgrade.
async fn check_https_upgrade(client: &reqwest::Client, resource: &ResourceURL) -> bool {
    let Some(https_url) = resource.https_variant() else {
        return false;
    };
    match client.get(https_url.clone()).send().await {
        Ok(response) => upgrade_status_ok(response.status()),
        Err(e) => {
            debug!("HTTPS upgrade check for {https_url} failed: {e}");
            false
        }
    }
}

fn upgrade_status_ok(status: StatusCode) -> bool {
    status == StatusCode::OK
}
