//! Loading of JSON and TOML documents from disk.
//!
//! Templates may be authored in either format; graphs and exclusion files are
//! JSON. The format is chosen from the file extension.

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;

use crate::error::Error;
use crate::result::Result;

/// Serialization format of a document on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Toml,
}

impl DocumentFormat {
    /// Detect the format from a path's extension (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns `Error::UnsupportedFormat` for any extension other than
    /// `json` or `toml`.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        match ext.as_deref() {
            Some("json") => Ok(Self::Json),
            Some("toml") => Ok(Self::Toml),
            _ => Err(Error::unsupported_format(path)),
        }
    }
}

/// Read a whole UTF-8 file.
///
/// # Errors
///
/// Returns `Error::FileReadFailed` if the file cannot be read.
pub fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| Error::file_read_failed(path, e.to_string()))
}

/// Write a whole UTF-8 file, replacing any previous content.
///
/// # Errors
///
/// Returns `Error::FileWriteFailed` if the file cannot be written.
pub fn write_text(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents).map_err(|e| Error::file_write_failed(path, e.to_string()))
}

/// Parse document text in the given format.
///
/// # Errors
///
/// Returns `Error::JsonParseFailed` or `Error::TomlParseFailed` when the text
/// does not deserialize into `T`.
pub fn parse_document<T: DeserializeOwned>(text: &str, format: DocumentFormat) -> Result<T> {
    match format {
        DocumentFormat::Json => {
            serde_json::from_str(text).map_err(|e| Error::json_parse_failed(e.to_string()))
        }
        DocumentFormat::Toml => {
            toml::from_str(text).map_err(|e| Error::toml_parse_failed(e.to_string()))
        }
    }
}

/// Load and deserialize a document, picking the format from its extension.
///
/// # Errors
///
/// Returns an error if the extension is unsupported, the file cannot be read,
/// or its content does not parse.
pub fn load_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let format = DocumentFormat::from_path(path)?;
    let text = read_text(path)?;
    tracing::debug!(path = %path.display(), ?format, "Loading document");
    parse_document(&text, format)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]
    #![allow(clippy::panic)]

    use super::*;
    use serde::Deserialize;
    use std::collections::BTreeMap;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Sample {
        name: String,
        #[serde(default)]
        tags: Vec<String>,
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            DocumentFormat::from_path(Path::new("a/template.json")).ok(),
            Some(DocumentFormat::Json)
        );
        assert_eq!(
            DocumentFormat::from_path(Path::new("template.TOML")).ok(),
            Some(DocumentFormat::Toml)
        );
        assert!(matches!(
            DocumentFormat::from_path(Path::new("template.yaml")),
            Err(Error::UnsupportedFormat { .. })
        ));
        assert!(DocumentFormat::from_path(Path::new("template")).is_err());
    }

    #[test]
    fn test_parse_json_and_toml_agree() {
        let json: Sample =
            parse_document(r#"{"name":"dag","tags":["a"]}"#, DocumentFormat::Json).unwrap();
        let toml: Sample =
            parse_document("name = \"dag\"\ntags = [\"a\"]\n", DocumentFormat::Toml).unwrap();
        assert_eq!(json, toml);
    }

    #[test]
    fn test_parse_failure_reports_format() {
        let json: Result<Sample> = parse_document("{", DocumentFormat::Json);
        assert!(matches!(json, Err(Error::JsonParseFailed { .. })));

        let toml: Result<Sample> = parse_document("name = ", DocumentFormat::Toml);
        assert!(matches!(toml, Err(Error::TomlParseFailed { .. })));
    }

    #[test]
    fn test_load_document_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");
        write_text(&path, r#"{"b":"2","a":"1"}"#).unwrap();

        let loaded: BTreeMap<String, String> = load_document(&path).unwrap();
        assert_eq!(loaded.get("a").map(String::as_str), Some("1"));
        assert_eq!(loaded.len(), 2);
    }

    #[test]
    fn test_read_missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        assert!(matches!(
            read_text(&missing),
            Err(Error::FileReadFailed { .. })
        ));
    }
}
