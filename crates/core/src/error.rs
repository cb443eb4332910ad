//! Core error types for Plexus file and document handling.
//!
//! All errors are explicit, typed, and recoverable - no panics allowed.

use std::path::PathBuf;

use thiserror::Error;

/// Core error type for Plexus I/O and document operations.
#[derive(Debug, Error)]
pub enum Error {
    // I/O errors
    #[error("failed to read file '{path}': {reason}")]
    FileReadFailed { path: PathBuf, reason: String },

    #[error("failed to write file '{path}': {reason}")]
    FileWriteFailed { path: PathBuf, reason: String },

    // Parsing errors
    #[error("JSON parse error: {reason}")]
    JsonParseFailed { reason: String },

    #[error("TOML parse error: {reason}")]
    TomlParseFailed { reason: String },

    #[error("unsupported document format for '{path}' (expected .json or .toml)")]
    UnsupportedFormat { path: PathBuf },

    // Generic errors
    #[error("invalid record: {reason}")]
    InvalidRecord { reason: String },
}

impl Error {
    /// Create a file read error.
    pub fn file_read_failed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::FileReadFailed {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a file write error.
    pub fn file_write_failed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::FileWriteFailed {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a JSON parse error.
    pub fn json_parse_failed(reason: impl Into<String>) -> Self {
        Self::JsonParseFailed {
            reason: reason.into(),
        }
    }

    /// Create a TOML parse error.
    pub fn toml_parse_failed(reason: impl Into<String>) -> Self {
        Self::TomlParseFailed {
            reason: reason.into(),
        }
    }

    /// Create an unsupported format error.
    pub fn unsupported_format(path: impl Into<PathBuf>) -> Self {
        Self::UnsupportedFormat { path: path.into() }
    }

    /// Create an invalid record error.
    pub fn invalid_record(reason: impl Into<String>) -> Self {
        Self::InvalidRecord {
            reason: reason.into(),
        }
    }
}
