//! Result type definition and extension traits for Railway-Oriented Programming.
//!
//! `ResultExt` lets call sites log a failure on its way up without
//! unwrapping it.

use crate::error::Error;

/// The standard Result type for Plexus I/O and document operations.
///
/// # Examples
///
/// ```
/// use plexus_core::{Error, Result};
///
/// fn require_extension(name: &str) -> Result<&str> {
///     name.rsplit_once('.')
///         .map(|(_, ext)| ext)
///         .ok_or_else(|| Error::invalid_record(format!("'{name}' has no extension")))
/// }
///
/// assert_eq!(require_extension("graph.json").ok(), Some("json"));
/// assert!(require_extension("graph").is_err());
/// ```
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for observing failures without consuming them.
pub trait ResultExt<T> {
    /// Run `f` on the error, if any, and pass the Result through.
    #[must_use]
    fn inspect_error<F: FnOnce(&Error)>(self, f: F) -> Self;
}

impl<T> ResultExt<T> for Result<T> {
    fn inspect_error<F: FnOnce(&Error)>(self, f: F) -> Self {
        if let Err(ref e) = self {
            f(e);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]
    #![allow(clippy::panic)]

    use super::*;

    #[test]
    fn test_result_inspect_error() {
        let result: Result<i32> = Err(Error::invalid_record("test"));
        let mut called = false;
        let _ = result.inspect_error(|_| {
            called = true;
        });
        assert!(called);
    }

    #[test]
    fn test_result_inspect_error_skips_ok() {
        let result: Result<i32> = Ok(1);
        let mut called = false;
        let _ = result.inspect_error(|_| {
            called = true;
        });
        assert!(!called);
    }
}
