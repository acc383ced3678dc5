//! Invocation-document loading.
//!
//! An invocation is driven by a small JSON document whose body carries the
//! URL to process, e.g. `{"URL": "https://example.com"}`.

use std::path::Path;

use serde::Deserialize;

use crate::error_handling::InputError;

/// The structured input document.
#[derive(Debug, Clone, Deserialize)]
pub struct UrlDocument {
    /// The URL to process.
    #[serde(rename = "URL")]
    pub url: String,
}

/// Reads and parses the invocation document.
///
/// # Errors
///
/// Returns `InputError` when the file cannot be read, is not valid JSON,
/// or lacks the `URL` field. All of these abort the invocation before any
/// network access.
pub fn load_url_document(path: &Path) -> Result<UrlDocument, InputError> {
    let contents = std::fs::read_to_string(path).map_err(|e| InputError::DocumentRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    serde_json::from_str(&contents).map_err(|e| InputError::DocumentParse {
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_valid_document() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"URL": "https://example.com/page"}}"#).unwrap();
        let doc = load_url_document(file.path()).unwrap();
        assert_eq!(doc.url, "https://example.com/page");
    }

    #[test]
    fn test_missing_url_field_is_an_input_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"link": "https://example.com"}}"#).unwrap();
        assert!(matches!(
            load_url_document(file.path()),
            Err(InputError::DocumentParse { .. })
        ));
    }

    #[test]
    fn test_unreadable_file_is_an_input_error() {
        assert!(matches!(
            load_url_document(Path::new("/nonexistent/input.jsonurl")),
            Err(InputError::DocumentRead { .. })
        ));
    }
}
