//! Artifact sink client.
//!
//! The sink durably stores uploaded preview images, thumbnails, and
//! metadata records, addressed by a resource identifier. The trait exists
//! so tests can substitute an in-memory sink; `HttpSink` is the production
//! implementation against a REST endpoint.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use log::debug;
use reqwest::multipart;
use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// A single artifact delivery failed. Deliveries are independent: one
/// artifact's failure never aborts another's attempts.
#[derive(Error, Debug)]
pub enum SinkError {
    /// The sink could not be reached or the request could not be built.
    #[error("artifact sink request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The sink answered with a non-success status.
    #[error("artifact sink returned {status} for {what}")]
    Status { what: String, status: StatusCode },

    /// The artifact file could not be read from the scratch directory.
    #[error("could not read artifact file {path}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The sink accepted the upload but returned no artifact identifier.
    #[error("artifact sink response carries no id field")]
    MissingId,
}

/// External artifact store addressed by resource identifier.
#[async_trait]
pub trait ArtifactSink: Send + Sync {
    /// Uploads a preview image; returns the sink's artifact identifier.
    async fn upload_preview(&self, resource_id: &str, file: &Path) -> Result<String, SinkError>;

    /// Uploads the same image as the resource's thumbnail.
    async fn upload_thumbnail(&self, resource_id: &str, file: &Path) -> Result<(), SinkError>;

    /// Attaches a metadata record to the resource.
    async fn upload_metadata(&self, resource_id: &str, record: &Value) -> Result<(), SinkError>;
}

/// REST implementation of the artifact sink protocol.
pub struct HttpSink {
    client: Arc<reqwest::Client>,
    base_url: String,
    api_key: Option<String>,
}

impl HttpSink {
    pub fn new(
        client: Arc<reqwest::Client>,
        base_url: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        HttpSink {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }

    fn endpoint(&self, resource_id: &str, suffix: &str) -> String {
        match &self.api_key {
            Some(key) => format!(
                "{}/api/files/{}/{}?key={}",
                self.base_url, resource_id, suffix, key
            ),
            None => format!("{}/api/files/{}/{}", self.base_url, resource_id, suffix),
        }
    }

    /// Posts a file as multipart form data and returns the parsed response
    /// body, if any.
    async fn post_file(&self, url: &str, what: &str, file: &Path) -> Result<Value, SinkError> {
        let bytes = tokio::fs::read(file).await.map_err(|e| SinkError::File {
            path: file.to_path_buf(),
            source: e,
        })?;
        let filename = file
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("artifact")
            .to_string();
        let part = multipart::Part::bytes(bytes)
            .file_name(filename)
            .mime_str("image/webp")?;
        let form = multipart::Form::new().part("File", part);

        let response = self.client.post(url).multipart(form).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SinkError::Status {
                what: what.to_string(),
                status,
            });
        }
        debug!("Delivered {what} to sink ({status})");
        Ok(response.json().await.unwrap_or(Value::Null))
    }
}

#[async_trait]
impl ArtifactSink for HttpSink {
    async fn upload_preview(&self, resource_id: &str, file: &Path) -> Result<String, SinkError> {
        let url = self.endpoint(resource_id, "previews");
        let body = self.post_file(&url, "preview", file).await?;
        match body.get("id") {
            Some(Value::String(id)) => Ok(id.clone()),
            Some(Value::Number(id)) => Ok(id.to_string()),
            _ => Err(SinkError::MissingId),
        }
    }

    async fn upload_thumbnail(&self, resource_id: &str, file: &Path) -> Result<(), SinkError> {
        let url = self.endpoint(resource_id, "thumbnails");
        self.post_file(&url, "thumbnail", file).await?;
        Ok(())
    }

    async fn upload_metadata(&self, resource_id: &str, record: &Value) -> Result<(), SinkError> {
        let url = self.endpoint(resource_id, "metadata.jsonld");
        let response = self.client.post(&url).json(record).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SinkError::Status {
                what: "metadata".to_string(),
                status,
            });
        }
        debug!("Delivered metadata to sink ({status})");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sink(key: Option<&str>) -> HttpSink {
        HttpSink::new(
            Arc::new(reqwest::Client::new()),
            "http://sink.example:9000/",
            key.map(str::to_string),
        )
    }

    #[test]
    fn test_endpoint_without_key() {
        assert_eq!(
            sink(None).endpoint("abc123", "previews"),
            "http://sink.example:9000/api/files/abc123/previews"
        );
    }

    #[test]
    fn test_endpoint_with_key_and_trailing_slash_trimmed() {
        assert_eq!(
            sink(Some("s3cr3t")).endpoint("abc123", "metadata.jsonld"),
            "http://sink.example:9000/api/files/abc123/metadata.jsonld?key=s3cr3t"
        );
    }
}
