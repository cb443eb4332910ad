//! CLI command definitions using clap.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};
use plexus_graph::GraphType;

/// Plexus - immutable graph engine
#[derive(Parser, Debug)]
#[command(name = "plexus")]
#[command(version)]
#[command(about = "Validate, diff, merge and path-track graph files")]
#[command(
    long_about = "Plexus checks graph files against graph-type constraints, diffs and three-way merges them, and computes DAG path tags with upstream exclusion propagation."
)]
pub struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Print machine-readable JSON instead of text
    #[arg(long, global = true, default_value_t = false)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Where graph-type constraints come from.
#[derive(Args, Debug, Clone, Default)]
#[group(multiple = false)]
pub struct RuleSource {
    /// Template file (.json or .toml) naming the graph type
    #[arg(long)]
    pub template: Option<PathBuf>,

    /// Graph type: UCG, UTree, DAG, DG or Forest
    #[arg(long)]
    pub graph_type: Option<GraphType>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate a graph file and check it against a graph type
    Validate {
        /// Graph file
        graph: PathBuf,

        #[command(flatten)]
        rules: RuleSource,
    },

    /// List what changed between a baseline and a current graph
    Diff {
        /// Baseline graph file
        base: PathBuf,

        /// Current graph file
        current: PathBuf,
    },

    /// Merge an incoming graph into a target graph
    Merge {
        /// Graph being merged into
        target: PathBuf,

        /// Graph whose changes are pulled in
        incoming: PathBuf,

        /// Common baseline; enables deletion propagation
        #[arg(long)]
        base: Option<PathBuf>,

        /// Only merge what feeds these node ids (repeatable)
        #[arg(long = "scope")]
        scope: Vec<String>,

        /// Write the merged graph here instead of printing it
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        rules: RuleSource,
    },

    /// Compute path tags and exclusions for a DAG
    Tags {
        /// Graph file
        graph: PathBuf,

        /// Template naming the special types
        #[arg(long)]
        template: PathBuf,

        /// Direct exclusions file: {"source→target": ["<serialized tag>", ...]}
        #[arg(long)]
        exclusions: Option<PathBuf>,
    },

    /// Check whether an edge may be added
    CheckEdge {
        /// Graph file
        graph: PathBuf,

        /// Edge source label
        source: String,

        /// Edge target label
        target: String,

        #[command(flatten)]
        rules: RuleSource,
    },
}
