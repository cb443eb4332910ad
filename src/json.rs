//! JSON output envelopes for `--json` mode.
//!
//! Every command prints either `{"success": true, ...report}` or
//! `{"success": false, "error": {...}}`.

use serde::{Deserialize, Serialize};

use crate::commands::CommandError;

/// Standard JSON success response wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonSuccess<T> {
    pub success: bool,
    #[serde(flatten)]
    pub data: T,
}

impl<T> JsonSuccess<T> {
    pub const fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Standard JSON error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonError {
    pub success: bool,
    pub error: ErrorDetail,
}

/// Detailed error information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable error code (`SCREAMING_SNAKE_CASE`)
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Process exit code
    pub exit_code: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl JsonError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: ErrorDetail {
                code: code.as_str().to_string(),
                message: message.into(),
                exit_code: code.exit_code(),
                details: None,
                suggestion: None,
            },
        }
    }

    #[must_use]
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.error.details = Some(details);
        self
    }

    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.error.suggestion = Some(suggestion.into());
        self
    }

    /// Classify a command failure.
    ///
    /// The first `plexus_core::Error` or `CommandError` in the chain decides
    /// the code; the message is the full context chain.
    #[must_use]
    pub fn from_anyhow(error: &anyhow::Error) -> Self {
        let code = error
            .chain()
            .find_map(|cause| {
                cause
                    .downcast_ref::<plexus_core::Error>()
                    .map(ErrorCode::from)
                    .or_else(|| cause.downcast_ref::<CommandError>().map(|_| ErrorCode::InvalidArgument))
            })
            .unwrap_or(ErrorCode::Unknown);

        let json = Self::new(code, format!("{error:#}"));
        match code.suggestion() {
            Some(suggestion) => json.with_suggestion(suggestion),
            None => json,
        }
    }

    /// # Errors
    ///
    /// Returns an error if the envelope cannot be serialized.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Error codes for machine-readable errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Graph checks
    ValidationFailed,
    ConstraintViolated,

    // File errors
    FileReadFailed,
    FileWriteFailed,
    UnsupportedFormat,

    // Parsing errors
    ParseFailed,
    InvalidTemplate,

    // Generic errors
    InvalidArgument,
    Unknown,
}

impl ErrorCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ValidationFailed => "VALIDATION_FAILED",
            Self::ConstraintViolated => "CONSTRAINT_VIOLATED",
            Self::FileReadFailed => "FILE_READ_FAILED",
            Self::FileWriteFailed => "FILE_WRITE_FAILED",
            Self::UnsupportedFormat => "UNSUPPORTED_FORMAT",
            Self::ParseFailed => "PARSE_FAILED",
            Self::InvalidTemplate => "INVALID_TEMPLATE",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Semantic exit code.
    ///
    /// - 1: the input was read but failed a check
    /// - 2: a file could not be read or written
    /// - 3: a file could not be parsed
    /// - 4: anything else
    #[must_use]
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::ValidationFailed | Self::ConstraintViolated | Self::InvalidArgument => 1,
            Self::FileReadFailed | Self::FileWriteFailed => 2,
            Self::UnsupportedFormat | Self::ParseFailed | Self::InvalidTemplate => 3,
            Self::Unknown => 4,
        }
    }

    #[must_use]
    pub const fn suggestion(self) -> Option<&'static str> {
        match self {
            Self::UnsupportedFormat => Some("Use a .json or .toml file"),
            Self::InvalidTemplate => Some("Special types must be non-empty and unique"),
            _ => None,
        }
    }
}

impl From<&plexus_core::Error> for ErrorCode {
    fn from(error: &plexus_core::Error) -> Self {
        use plexus_core::Error;
        match error {
            Error::FileReadFailed { .. } => Self::FileReadFailed,
            Error::FileWriteFailed { .. } => Self::FileWriteFailed,
            Error::UnsupportedFormat { .. } => Self::UnsupportedFormat,
            Error::JsonParseFailed { .. } | Error::TomlParseFailed { .. } => Self::ParseFailed,
            Error::InvalidRecord { .. } => Self::InvalidTemplate,
        }
    }
}

impl From<ErrorCode> for String {
    fn from(code: ErrorCode) -> Self {
        code.as_str().to_string()
    }
}
