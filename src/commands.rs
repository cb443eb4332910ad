//! CLI command handlers.
//!
//! Each handler loads its inputs, runs the engine and returns a [`Report`].
//! Rendering and exit codes are decided by `main`.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use plexus_core::{ResultExt, load_document, write_text};
use plexus_graph::diff::{DiffEntry, DiffSummary, compute_diff};
use plexus_graph::exclusions::ExclusionMap;
use plexus_graph::io::{load_graph, to_json_pretty};
use plexus_graph::merge::{MergeReport, MergeStrategy, merge_with_strategy};
use plexus_graph::tracking::TrackingSnapshot;
use plexus_graph::validate::{has_cycle, validate_edge_add, validate_graph};
use plexus_graph::{EdgeKey, Graph, GraphType, Template};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::cli::{Commands, RuleSource};
use crate::json::ErrorCode;

/// Invalid combinations of otherwise well-formed arguments.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("'{command}' needs a graph type: pass --template or --graph-type")]
    MissingGraphType { command: &'static str },

    #[error("Template '{path}' does not enable path tracking (needs graphType DAG and at least one special type)")]
    PathTrackingDisabled { path: PathBuf },
}

/// Result of `validate`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateReport {
    pub nodes: usize,
    pub edges: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graph_type: Option<GraphType>,
    pub violations: Vec<String>,
}

/// Result of `diff`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffReport {
    pub summary: DiffSummary,
    pub entries: Vec<DiffEntry>,
}

/// Result of `merge`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeOutcome {
    pub report: MergeReport,
    pub nodes: usize,
    pub edges: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graph: Option<Graph>,
    pub violations: Vec<String>,
}

/// One edge of a `tags` report.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeTags {
    pub edge: EdgeKey,
    pub tags: Vec<String>,
    pub serialized: Vec<String>,
    pub excluded: Vec<String>,
}

/// Result of `tags`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TagsReport {
    pub special_types: Vec<String>,
    pub edges: Vec<EdgeTags>,
    pub direct_exclusions: ExclusionMap,
    pub stale_exclusions: ExclusionMap,
    pub fully_excluded: Vec<String>,
}

/// Result of `check-edge`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckEdgeReport {
    pub source: String,
    pub target: String,
    pub graph_type: GraphType,
    pub allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Report {
    Validate(ValidateReport),
    Diff(DiffReport),
    Merge(Box<MergeOutcome>),
    Tags(TagsReport),
    CheckEdge(CheckEdgeReport),
}

impl Report {
    /// Whether the command's check succeeded.
    #[must_use]
    pub fn passed(&self) -> bool {
        match self {
            Self::Validate(report) => report.violations.is_empty(),
            Self::Merge(outcome) => outcome.violations.is_empty(),
            Self::CheckEdge(report) => report.allowed,
            Self::Diff(_) | Self::Tags(_) => true,
        }
    }

    /// Error code to report when [`Report::passed`] is false.
    #[must_use]
    pub const fn failure_code(&self) -> ErrorCode {
        match self {
            Self::CheckEdge(_) => ErrorCode::ConstraintViolated,
            _ => ErrorCode::ValidationFailed,
        }
    }

    /// Plain-text rendering for terminals.
    #[must_use]
    pub fn render_text(&self) -> String {
        match self {
            Self::Validate(report) => render_validate(report),
            Self::Diff(report) => render_diff(report),
            Self::Merge(outcome) => render_merge(outcome),
            Self::Tags(report) => render_tags(report),
            Self::CheckEdge(report) => render_check_edge(report),
        }
    }
}

/// Execute a CLI command.
///
/// # Errors
///
/// Returns an error if an input file cannot be loaded or parsed, or if the
/// arguments are inconsistent.
pub fn execute_command(command: Commands) -> Result<Report> {
    match command {
        Commands::Validate { graph, rules } => cmd_validate(&graph, &rules).map(Report::Validate),
        Commands::Diff { base, current } => cmd_diff(&base, &current).map(Report::Diff),
        Commands::Merge {
            target,
            incoming,
            base,
            scope,
            output,
            rules,
        } => cmd_merge(&target, &incoming, base.as_deref(), scope, output, &rules)
            .map(|outcome| Report::Merge(Box::new(outcome))),
        Commands::Tags {
            graph,
            template,
            exclusions,
        } => cmd_tags(&graph, &template, exclusions.as_deref()).map(Report::Tags),
        Commands::CheckEdge {
            graph,
            source,
            target,
            rules,
        } => cmd_check_edge(&graph, source, target, &rules).map(Report::CheckEdge),
    }
}

fn cmd_validate(path: &Path, rules: &RuleSource) -> Result<ValidateReport> {
    let graph = read_graph(path)?;
    let graph_type = resolve_graph_type(rules)?;
    let violations = graph_type
        .map(|graph_type| violations_of(&graph, graph_type))
        .unwrap_or_default();

    info!(path = %path.display(), violations = violations.len(), "Validated graph");
    Ok(ValidateReport {
        nodes: graph.node_count(),
        edges: graph.edge_count(),
        graph_type,
        violations,
    })
}

fn cmd_diff(base: &Path, current: &Path) -> Result<DiffReport> {
    let base = read_graph(base)?;
    let current = read_graph(current)?;

    let mut entries = compute_diff(&base, &current);
    entries.sort_by(|a, b| (a.kind, &a.key).cmp(&(b.kind, &b.key)));
    let summary = DiffSummary::from_entries(&entries);

    info!(changes = summary.total(), "Computed diff");
    Ok(DiffReport { summary, entries })
}

fn cmd_merge(
    target: &Path,
    incoming: &Path,
    base: Option<&Path>,
    scope: Vec<String>,
    output: Option<PathBuf>,
    rules: &RuleSource,
) -> Result<MergeOutcome> {
    let target = read_graph(target)?;
    let incoming = read_graph(incoming)?;
    let base = base.map(read_graph).transpose()?;
    let graph_type = resolve_graph_type(rules)?;

    let strategy = if scope.is_empty() {
        MergeStrategy::Full
    } else {
        MergeStrategy::Scoped(scope)
    };
    debug!(?strategy, with_base = base.is_some(), "Merging graphs");

    let (merged, report) = merge_with_strategy(&target, &incoming, base.as_ref(), &strategy);
    let violations = graph_type
        .map(|graph_type| violations_of(&merged, graph_type))
        .unwrap_or_default();
    if !violations.is_empty() {
        warn!(violations = violations.len(), "Merged graph breaks its graph type");
    }

    let (nodes, edges) = (merged.node_count(), merged.edge_count());
    let graph = match &output {
        Some(path) => {
            let text = to_json_pretty(&merged).context("Failed to serialize merged graph")?;
            write_text(path, &text)
                .with_context(|| format!("Failed to write merged graph to {}", path.display()))?;
            info!(path = %path.display(), "Wrote merged graph");
            None
        }
        None => Some(merged),
    };

    Ok(MergeOutcome {
        report,
        nodes,
        edges,
        output,
        graph,
        violations,
    })
}

fn cmd_tags(path: &Path, template_path: &Path, exclusions: Option<&Path>) -> Result<TagsReport> {
    let graph = read_graph(path)?;
    let template = read_template(template_path)?;
    if !template.path_tracking_enabled() {
        return Err(CommandError::PathTrackingDisabled {
            path: template_path.to_path_buf(),
        }
        .into());
    }
    if has_cycle(&graph, true) {
        warn!(path = %path.display(), "Graph has a cycle; path tags are only meaningful on a DAG");
    }

    let direct: ExclusionMap = match exclusions {
        Some(file) => load_document(file)
            .with_context(|| format!("Failed to load exclusions from {}", file.display()))?,
        None => ExclusionMap::new(),
    };

    let snapshot = TrackingSnapshot::compute(&graph, &direct, &template.special_types);
    if !snapshot.stale.is_empty() {
        warn!(stale = snapshot.stale.len(), "Dropped exclusions that no longer match any path");
    }

    let edges = snapshot
        .path_tags
        .iter()
        .map(|(key, tags)| EdgeTags {
            edge: key.clone(),
            tags: tags.iter().map(|tag| snapshot.path_tags.format(tag)).collect(),
            serialized: tags.iter().map(|tag| snapshot.path_tags.serialize(tag)).collect(),
            excluded: snapshot
                .effective
                .get(key)
                .map(|set| set.iter().cloned().collect())
                .unwrap_or_default(),
        })
        .collect();

    Ok(TagsReport {
        special_types: template.special_types,
        edges,
        direct_exclusions: snapshot.direct,
        stale_exclusions: snapshot.stale,
        fully_excluded: snapshot.fully_excluded,
    })
}

fn cmd_check_edge(
    path: &Path,
    source: String,
    target: String,
    rules: &RuleSource,
) -> Result<CheckEdgeReport> {
    let graph = read_graph(path)?;
    let graph_type = resolve_graph_type(rules)?.ok_or(CommandError::MissingGraphType {
        command: "check-edge",
    })?;

    let verdict = validate_edge_add(&graph, &source, &target, graph_type.constraints());
    debug!(%source, %target, %graph_type, allowed = verdict.is_ok(), "Checked edge");

    Ok(CheckEdgeReport {
        source,
        target,
        graph_type,
        allowed: verdict.is_ok(),
        reason: verdict.err().map(|violation| violation.to_string()),
    })
}

fn read_graph(path: &Path) -> Result<Graph> {
    load_graph(path)
        .inspect_error(|e| debug!(path = %path.display(), error = %e, "Graph import failed"))
        .with_context(|| format!("Failed to load graph from {}", path.display()))
}

fn read_template(path: &Path) -> Result<Template> {
    Template::load(path)
        .inspect_error(|e| debug!(path = %path.display(), error = %e, "Template load failed"))
        .with_context(|| format!("Failed to load template from {}", path.display()))
}

fn resolve_graph_type(rules: &RuleSource) -> Result<Option<GraphType>> {
    match (&rules.template, rules.graph_type) {
        (Some(path), _) => read_template(path).map(|template| Some(template.graph_type)),
        (None, graph_type) => Ok(graph_type),
    }
}

fn violations_of(graph: &Graph, graph_type: GraphType) -> Vec<String> {
    validate_graph(graph, graph_type.constraints())
        .iter()
        .map(ToString::to_string)
        .collect()
}

fn render_validate(report: &ValidateReport) -> String {
    let header = format!("{} nodes, {} edges", report.nodes, report.edges);
    match (report.graph_type, report.violations.is_empty()) {
        (None, _) => format!("{header}: valid graph file"),
        (Some(graph_type), true) => format!("{header}: valid {graph_type}"),
        (Some(graph_type), false) => std::iter::once(format!("{header}: not a valid {graph_type}"))
            .chain(report.violations.iter().map(|v| format!("  - {v}")))
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

fn render_diff(report: &DiffReport) -> String {
    if report.entries.is_empty() {
        return "No changes".to_string();
    }
    let s = &report.summary;
    std::iter::once(format!(
        "nodes: +{} ~{} -{}  edges: +{} ~{} -{}",
        s.nodes_added, s.nodes_modified, s.nodes_removed, s.edges_added, s.edges_modified, s.edges_removed
    ))
    .chain(report.entries.iter().map(|entry| {
        let kind = if entry.is_node() { "node" } else { "edge" };
        format!("  {:<8} {kind} {}", entry.action.to_string(), entry.key)
    }))
    .collect::<Vec<_>>()
    .join("\n")
}

fn render_merge(outcome: &MergeOutcome) -> String {
    let r = &outcome.report;
    let mut lines = vec![
        format!("Merged: {} nodes, {} edges", outcome.nodes, outcome.edges),
        format!(
            "  nodes: +{} ~{} -{}  edges: +{} ~{} -{} (pruned {})",
            r.nodes_added,
            r.nodes_updated,
            r.nodes_deleted,
            r.edges_added,
            r.edges_updated,
            r.edges_deleted,
            r.edges_pruned
        ),
    ];
    lines.extend(outcome.violations.iter().map(|v| format!("  ! {v}")));
    match (&outcome.output, &outcome.graph) {
        (Some(path), _) => lines.push(format!("Wrote {}", path.display())),
        (None, Some(graph)) => match to_json_pretty(graph) {
            Ok(text) => lines.push(text),
            Err(error) => {
                warn!(error = %error, "Failed to serialize merged graph");
                lines.push(format!("  ! could not render merged graph: {error}"));
            }
        },
        (None, None) => {}
    }
    lines.join("\n")
}

fn render_tags(report: &TagsReport) -> String {
    let mut lines: Vec<String> = report
        .edges
        .iter()
        .map(|row| {
            let tags = row
                .tags
                .iter()
                .zip(&row.serialized)
                .map(|(label, serialized)| {
                    if row.excluded.contains(serialized) {
                        format!("[{label}] (excluded)")
                    } else {
                        format!("[{label}]")
                    }
                })
                .collect::<Vec<_>>()
                .join(" ");
            format!("{}: {tags}", row.edge)
        })
        .collect();
    if !report.fully_excluded.is_empty() {
        lines.push(format!("Fully excluded: {}", report.fully_excluded.join(", ")));
    }
    if !report.stale_exclusions.is_empty() {
        lines.push(format!("Dropped {} stale exclusion entries", report.stale_exclusions.len()));
    }
    lines.join("\n")
}

fn render_check_edge(report: &CheckEdgeReport) -> String {
    match &report.reason {
        None => format!("{} → {}: allowed in {}", report.source, report.target, report.graph_type),
        Some(reason) => format!("{} → {}: rejected in {}: {reason}", report.source, report.target, report.graph_type),
    }
}
