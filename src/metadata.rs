//! Output record assembly.
//!
//! The assembler is a pure merge of whichever partial results the pipeline
//! managed to produce. Field presence, not null-ness, indicates what was
//! determined: absent probes and failed captures simply leave their fields
//! out of the serialized record.

use std::collections::HashMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::git_host::RepoMetadata;
use crate::probe::PageProbeResult;

/// The final aggregate delivered through the metadata upload.
///
/// Always carries at least the URL and timestamp, even under total
/// sub-probe failure; the pipeline degrades rather than failing closed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultMetadata {
    /// The processed URL, exactly as parsed at pipeline entry.
    #[serde(rename = "URL")]
    pub url: String,
    /// ISO-8601 timestamp of the run.
    pub date: String,

    /// Whether the URL resolved to a hosted git repository.
    pub is_git_repo: bool,
    /// Provider tag (`github`/`gitlab`) when a repository was resolved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git_provider: Option<String>,
    /// REST endpoint the repository record came from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git_api_url: Option<String>,
    /// The resolved provider's own record, passed through unmodified.
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub repository: Map<String, Value>,

    /// Status of the page probe's initial GET (non-repo branch only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    /// Security headers present on the probed page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_headers: Option<HashMap<String, String>>,
    /// Whether the page is reachable over HTTPS.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tls_upgradeable: Option<bool>,
    /// Video identifier for recognized video-sharing URL shapes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub youtube_id: Option<String>,

    /// Rendered document title, when the capture succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Sink artifact id of the uploaded preview image.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview_id: Option<String>,
}

/// Merges the partial results of one invocation into the output record.
///
/// Repository fields are folded in when the resolver confirmed a repo;
/// otherwise the probe fields and video id take their place. Title and
/// preview id appear only when the capture (and its upload) succeeded.
pub fn assemble(
    url: &str,
    date: DateTime<Utc>,
    repo: &RepoMetadata,
    probe: Option<&PageProbeResult>,
    youtube_id: Option<String>,
    title: Option<String>,
    preview_id: Option<String>,
) -> ResultMetadata {
    let mut record = ResultMetadata {
        url: url.to_string(),
        date: date.to_rfc3339_opts(SecondsFormat::Secs, true),
        is_git_repo: repo.is_repo,
        git_provider: None,
        git_api_url: None,
        repository: Map::new(),
        status_code: None,
        security_headers: None,
        tls_upgradeable: None,
        youtube_id: None,
        title,
        preview_id,
    };

    if repo.is_repo {
        record.git_provider = repo.provider.map(|p| p.as_str().to_string());
        record.git_api_url = repo.api_url.clone();
        record.repository = repo.raw.clone();
    } else {
        if let Some(probe) = probe {
            record.status_code = Some(probe.status_code);
            record.security_headers = Some(probe.security_headers.clone());
            record.tls_upgradeable = Some(probe.tls_upgradeable);
        }
        record.youtube_id = youtube_id;
    }

    record
}

/// JSON-LD style envelope the sink expects around a metadata record:
/// which resource the record attaches to and which agent produced it.
#[derive(Debug, Clone, Serialize)]
pub struct MetadataEnvelope {
    /// JSON-LD context reference.
    #[serde(rename = "@context")]
    pub context: Value,
    /// The sink resource the record attaches to.
    #[serde(rename = "attachedTo")]
    pub attached_to: AttachedTo,
    /// The producing agent.
    pub agent: Agent,
    /// The assembled record itself.
    pub content: ResultMetadata,
}

/// Reference to the sink resource a metadata record attaches to.
#[derive(Debug, Clone, Serialize)]
pub struct AttachedTo {
    /// Resource type within the sink, always `file` here.
    #[serde(rename = "resourceType")]
    pub resource_type: String,
    /// Resource identifier within the sink.
    pub id: String,
}

/// Identification of the agent that produced a metadata record.
#[derive(Debug, Clone, Serialize)]
pub struct Agent {
    /// Agent category tag.
    #[serde(rename = "@type")]
    pub agent_type: String,
    /// Crate name.
    pub name: String,
    /// Crate version at build time.
    pub version: String,
}

impl MetadataEnvelope {
    /// Wraps an assembled record for delivery, naming the attached
    /// resource and this extractor as the producing agent.
    pub fn wrap(resource_id: &str, content: ResultMetadata) -> Self {
        MetadataEnvelope {
            context: Value::String("https://www.w3.org/2013/json-ld-context".to_string()),
            attached_to: AttachedTo {
                resource_type: "file".to_string(),
                id: resource_id.to_string(),
            },
            agent: Agent {
                agent_type: "extractor".to_string(),
                name: env!("CARGO_PKG_NAME").to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            content,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git_host::ProviderKind;
    use chrono::TimeZone;

    fn fixed_date() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 4, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_minimal_record_has_url_and_date_only() {
        let record = assemble(
            "http://example.com",
            fixed_date(),
            &RepoMetadata::absent(),
            None,
            None,
            None,
            None,
        );
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["URL"], "http://example.com");
        assert_eq!(json["date"], "2024-05-04T12:00:00Z");
        assert_eq!(json["is_git_repo"], false);
        // Undetermined fields stay out of the serialized record entirely
        assert!(json.get("status_code").is_none());
        assert!(json.get("title").is_none());
        assert!(json.get("git_provider").is_none());
        assert!(json.get("repository").is_none());
    }

    #[test]
    fn test_repo_branch_folds_git_fields_and_suppresses_probe() {
        let mut raw = Map::new();
        raw.insert("id".to_string(), Value::from(42));
        raw.insert("full_name".to_string(), Value::from("org/repo"));
        let repo = RepoMetadata::resolved(
            ProviderKind::Github,
            "https://api.github.com/repos/org/repo".to_string(),
            raw,
        );
        let probe = PageProbeResult {
            status_code: 200,
            security_headers: HashMap::new(),
            tls_upgradeable: true,
        };

        let record = assemble(
            "https://github.com/org/repo",
            fixed_date(),
            &repo,
            Some(&probe),
            Some("ignored".to_string()),
            Some("org/repo".to_string()),
            Some("prev-1".to_string()),
        );

        assert!(record.is_git_repo);
        assert_eq!(record.git_provider.as_deref(), Some("github"));
        assert_eq!(record.repository["id"], Value::from(42));
        // The repo branch never carries probe or video fields
        assert!(record.status_code.is_none());
        assert!(record.youtube_id.is_none());
        assert_eq!(record.preview_id.as_deref(), Some("prev-1"));
    }

    #[test]
    fn test_page_branch_folds_probe_and_video_fields() {
        let mut headers = HashMap::new();
        headers.insert("X-Frame-Options".to_string(), "DENY".to_string());
        let probe = PageProbeResult {
            status_code: 200,
            security_headers: headers,
            tls_upgradeable: false,
        };

        let record = assemble(
            "http://youtu.be/SA2iWivDJiE",
            fixed_date(),
            &RepoMetadata::absent(),
            Some(&probe),
            Some("SA2iWivDJiE".to_string()),
            Some("A video".to_string()),
            None,
        );

        assert_eq!(record.status_code, Some(200));
        assert_eq!(record.tls_upgradeable, Some(false));
        assert_eq!(record.youtube_id.as_deref(), Some("SA2iWivDJiE"));
        assert_eq!(record.title.as_deref(), Some("A video"));
        assert!(record.git_provider.is_none());
    }

    #[test]
    fn test_records_identical_apart_from_date() {
        let repo = RepoMetadata::absent();
        let first = assemble("http://example.com", fixed_date(), &repo, None, None, None, None);
        let second = assemble(
            "http://example.com",
            Utc.with_ymd_and_hms(2024, 5, 4, 12, 0, 1).unwrap(),
            &repo,
            None,
            None,
            None,
            None,
        );
        assert_ne!(first.date, second.date);
        let mut second_aligned = second.clone();
        second_aligned.date = first.date.clone();
        assert_eq!(first, second_aligned);
    }

    #[test]
    fn test_envelope_names_attached_resource_and_agent() {
        let record = assemble(
            "http://example.com",
            fixed_date(),
            &RepoMetadata::absent(),
            None,
            None,
            None,
            None,
        );
        let envelope = MetadataEnvelope::wrap("file-9", record);
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["attachedTo"]["id"], "file-9");
        assert_eq!(json["attachedTo"]["resourceType"], "file");
        assert_eq!(json["agent"]["name"], "url_preview");
        assert_eq!(json["content"]["URL"], "http://example.com");
    }
}
