#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

//! # plexus-core
//!
//! Shared plumbing for the Plexus workspace: the file/parse error type,
//! Railway-style result combinators, and the JSON/TOML document loader used
//! for templates, graphs and exclusion files.

pub mod document;
pub mod error;
pub mod result;

pub use document::{DocumentFormat, load_document, parse_document, read_text, write_text};
pub use error::Error;
pub use result::{Result, ResultExt};
