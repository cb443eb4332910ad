//! # Plexus CLI entry point
//!
//! Parses arguments, installs the tracing subscriber, runs one command and
//! prints its report as text or as a JSON envelope.
//!
//! Logs go to stderr so `--json` output on stdout stays machine-readable.

#![forbid(unsafe_code)]
#![forbid(clippy::unwrap_used)]
#![forbid(clippy::panic)]
#![deny(clippy::expect_used)]

use std::process::ExitCode;

use clap::Parser;
use plexus::cli::Cli;
use plexus::commands::{Report, execute_command};
use plexus::json::{JsonError, JsonSuccess};
use tracing::{debug, error};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    debug!(command = ?cli.command, "Running command");

    match execute_command(cli.command) {
        Ok(report) => emit_report(&report, cli.json),
        Err(err) => emit_error(&err, cli.json),
    }
}

/// Initialize tracing: `RUST_LOG` wins, otherwise `-v` flags pick the level.
fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("plexus={default_level},plexus_graph={default_level},plexus_core={default_level}"))
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn emit_report(report: &Report, json: bool) -> ExitCode {
    let passed = report.passed();
    if !json {
        println!("{}", report.render_text());
        return if passed { ExitCode::SUCCESS } else { ExitCode::from(1) };
    }

    let rendered = if passed {
        serde_json::to_string_pretty(&JsonSuccess::new(report))
    } else {
        let code = report.failure_code();
        serde_json::to_value(report).and_then(|details| {
            JsonError::new(code, "Check failed")
                .with_details(details)
                .to_json()
        })
    };

    match rendered {
        Ok(text) => {
            println!("{text}");
            if passed { ExitCode::SUCCESS } else { ExitCode::from(1) }
        }
        Err(err) => {
            error!(error = %err, "Failed to serialize report");
            ExitCode::from(4)
        }
    }
}

fn emit_error(err: &anyhow::Error, json: bool) -> ExitCode {
    let envelope = JsonError::from_anyhow(err);
    let exit_code = u8::try_from(envelope.error.exit_code).unwrap_or(4);

    if json {
        match envelope.to_json() {
            Ok(text) => println!("{text}"),
            Err(ser) => error!(error = %ser, "Failed to serialize error"),
        }
    } else {
        eprintln!("Error: {err:#}");
        if let Some(suggestion) = &envelope.error.suggestion {
            eprintln!("Hint: {suggestion}");
        }
    }

    ExitCode::from(exit_code)
}
