//! # Tracked graphs
//!
//! Path tags and effective exclusions are derived from
//! `(graph, direct exclusions, special type ids)` and recomputed after every
//! mutation. [`TrackingSnapshot::compute`] runs the refresh sequence:
//!
//! 1. recompute path tags;
//! 2. propagate the direct exclusions;
//! 3. drop direct exclusions whose tag no longer exists on their edge;
//! 4. propagate again against the cleaned direct set.
//!
//! Stopping after step 2 leaves effective exclusions that were derived from
//! stale entries, so step 4 runs whenever step 3 removed anything.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::exclusions::{
    ExclusionMap, exclusion_difference, fully_excluded_nodes, merge_exclusions,
    propagate_exclusions, prune_stale_exclusions,
};
use crate::merge::{MergeReport, MergeStrategy, merge_with_strategy};
use crate::model::Graph;
use crate::path_tags::{PathTags, compute_path_tags};

/// Everything derived from a graph and its direct exclusions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingSnapshot {
    pub path_tags: PathTags,
    /// Direct exclusions with stale entries removed.
    pub direct: ExclusionMap,
    pub effective: ExclusionMap,
    /// Direct exclusions that were dropped as stale.
    pub stale: ExclusionMap,
    pub fully_excluded: Vec<String>,
}

impl TrackingSnapshot {
    #[must_use]
    pub fn compute<S: AsRef<str>>(graph: &Graph, direct: &ExclusionMap, special_type_ids: &[S]) -> Self {
        let path_tags = compute_path_tags(graph, special_type_ids);
        let first_pass = propagate_exclusions(graph, direct, &path_tags);

        let cleaned = prune_stale_exclusions(direct, &path_tags);
        let stale = exclusion_difference(direct, &cleaned);
        let effective = if stale.is_empty() {
            first_pass
        } else {
            debug!(stale_edges = stale.len(), "Re-propagating after dropping stale exclusions");
            propagate_exclusions(graph, &cleaned, &path_tags)
        };

        let fully_excluded = fully_excluded_nodes(graph, &path_tags, &effective);
        debug!(
            tagged_edges = path_tags.len(),
            direct = cleaned.len(),
            effective = effective.len(),
            fully_excluded = fully_excluded.len(),
            "Refreshed tracking snapshot"
        );

        Self {
            path_tags,
            direct: cleaned,
            effective,
            stale,
            fully_excluded,
        }
    }

    #[must_use]
    pub fn is_fully_excluded(&self, label: &str) -> bool {
        self.fully_excluded.iter().any(|l| l == label)
    }
}

/// The persisted unit: a graph plus its user-authored exclusions.
///
/// Effective exclusions are never stored here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedGraph {
    pub graph: Graph,
    #[serde(default)]
    pub direct_exclusions: ExclusionMap,
    #[serde(default)]
    pub path_tracking: bool,
}

impl TrackedGraph {
    #[must_use]
    pub fn new(graph: Graph, path_tracking: bool) -> Self {
        Self {
            graph,
            direct_exclusions: ExclusionMap::new(),
            path_tracking,
        }
    }

    #[must_use]
    pub fn with_exclusions(mut self, direct_exclusions: ExclusionMap) -> Self {
        self.direct_exclusions = direct_exclusions;
        self
    }

    #[must_use]
    pub fn snapshot<S: AsRef<str>>(&self, special_type_ids: &[S]) -> TrackingSnapshot {
        TrackingSnapshot::compute(&self.graph, &self.direct_exclusions, special_type_ids)
    }

    /// Replace the graph and garbage-collect exclusions against it.
    #[must_use]
    pub fn with_graph<S: AsRef<str>>(self, graph: Graph, special_type_ids: &[S]) -> (Self, TrackingSnapshot) {
        let snapshot = TrackingSnapshot::compute(&graph, &self.direct_exclusions, special_type_ids);
        let tracked = Self {
            graph,
            direct_exclusions: snapshot.direct.clone(),
            path_tracking: self.path_tracking,
        };
        (tracked, snapshot)
    }
}

/// Outcome of [`merge_tracked`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedMerge {
    pub tracked: TrackedGraph,
    pub snapshot: TrackingSnapshot,
    pub report: MergeReport,
}

/// Merge two tracked graphs and refresh the result.
///
/// Graphs merge under `strategy`; exclusions merge under the trust rule of
/// [`merge_exclusions`]; the merged direct set is then cleaned against the
/// merged graph's tags.
#[must_use]
pub fn merge_tracked<S: AsRef<str>>(
    target: &TrackedGraph,
    incoming: &TrackedGraph,
    base: Option<&Graph>,
    strategy: &MergeStrategy,
    special_type_ids: &[S],
) -> TrackedMerge {
    let (graph, report) = merge_with_strategy(&target.graph, &incoming.graph, base, strategy);
    let exclusions = merge_exclusions(
        &target.direct_exclusions,
        &incoming.direct_exclusions,
        incoming.path_tracking,
    );

    let (tracked, snapshot) = TrackedGraph {
        graph: Graph::new(),
        direct_exclusions: exclusions,
        path_tracking: target.path_tracking,
    }
    .with_graph(graph, special_type_ids);

    info!(
        nodes = tracked.graph.node_count(),
        edges = tracked.graph.edge_count(),
        exclusions = tracked.direct_exclusions.len(),
        stale = snapshot.stale.len(),
        "Merged tracked graph"
    );

    TrackedMerge {
        tracked,
        snapshot,
        report,
    }
}
