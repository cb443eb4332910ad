#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

//! # Plexus
//!
//! Command-line front end for the `plexus-graph` engine.

pub mod cli;
pub mod commands;
pub mod json;
