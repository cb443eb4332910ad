//! # Merge engine
//!
//! Last-writer-wins merge of an incoming graph into a target graph, with
//! optional baseline-driven deletion propagation and scope filtering.
//!
//! ## Algorithm
//!
//! 1. Start from the target's nodes and edges keyed by identity.
//! 2. Upsert every incoming element: existing keys take the incoming props
//!    wholesale, new keys are appended.
//! 3. With a baseline, delete every element present in the baseline but
//!    absent from the incoming graph. Target-only additions are untouched.
//! 4. Prune edges whose endpoints no longer exist.

use std::collections::{HashMap, HashSet};

use im::Vector;
use serde::{Deserialize, Serialize};
use tap::Pipe;
use tracing::debug;

use crate::adjacency::Adjacency;
use crate::model::{Edge, Graph, Keyed, Node};

/// How much of the incoming graph participates in a merge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", content = "scope", rename_all = "camelCase")]
pub enum MergeStrategy {
    /// Merge the whole incoming graph.
    #[default]
    Full,
    /// Merge only the upstream closure of the listed node ids.
    Scoped(Vec<String>),
}

impl MergeStrategy {
    #[must_use]
    pub fn scoped<I, S>(scope: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Scoped(scope.into_iter().map(Into::into).collect())
    }

    /// Restrict `graph` to this strategy's scope.
    #[must_use]
    pub fn apply(&self, graph: &Graph) -> Graph {
        match self {
            Self::Full => graph.clone(),
            Self::Scoped(scope) => filter_upstream_subgraph(graph, scope),
        }
    }
}

/// What a merge changed, counted per element kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeReport {
    pub nodes_added: usize,
    pub nodes_updated: usize,
    pub nodes_deleted: usize,
    pub edges_added: usize,
    pub edges_updated: usize,
    pub edges_deleted: usize,
    pub edges_pruned: usize,
}

/// Merge `incoming` into `target`, deleting what `base` had but `incoming` lost.
///
/// # Examples
///
/// ```
/// use plexus_graph::{Graph, Node, merge::merge_graphs};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let base = Graph::new().add_node(Node::new("shared"))?;
/// let target = base.add_node(Node::new("local"))?;
/// let incoming = Graph::new().add_node(Node::new("upstream"))?;
///
/// let merged = merge_graphs(&target, &incoming, Some(&base));
/// assert!(!merged.contains_node("shared"));
/// assert!(merged.contains_node("local"));
/// assert!(merged.contains_node("upstream"));
/// # Ok(())
/// # }
/// ```
#[must_use]
pub fn merge_graphs(target: &Graph, incoming: &Graph, base: Option<&Graph>) -> Graph {
    merge_with_report(target, incoming, base).0
}

/// [`merge_graphs`], also returning counts of what changed.
#[must_use]
pub fn merge_with_report(
    target: &Graph,
    incoming: &Graph,
    base: Option<&Graph>,
) -> (Graph, MergeReport) {
    let mut report = MergeReport::default();

    let (nodes, added, updated) = upsert(target.nodes(), incoming.nodes());
    report.nodes_added = added;
    report.nodes_updated = updated;

    let (edges, added, updated) = upsert(target.edges(), incoming.edges());
    report.edges_added = added;
    report.edges_updated = updated;

    let (nodes, edges) = match base {
        Some(base) => {
            let (nodes, deleted) = delete_upstream_removals(nodes, incoming.nodes(), base.nodes());
            report.nodes_deleted = deleted;
            let (edges, deleted) = delete_upstream_removals(edges, incoming.edges(), base.edges());
            report.edges_deleted = deleted;
            (nodes, edges)
        }
        None => (nodes, edges),
    };

    let (edges, pruned) = prune_dangling(&nodes, edges);
    report.edges_pruned = pruned;

    debug!(
        nodes_added = report.nodes_added,
        nodes_updated = report.nodes_updated,
        nodes_deleted = report.nodes_deleted,
        edges_added = report.edges_added,
        edges_updated = report.edges_updated,
        edges_deleted = report.edges_deleted,
        edges_pruned = report.edges_pruned,
        with_base = base.is_some(),
        "Merged graphs"
    );

    (
        Graph::from_parts(nodes.into_iter().collect(), edges.into_iter().collect()),
        report,
    )
}

/// Merge under a [`MergeStrategy`].
///
/// A scoped strategy filters the incoming graph and the baseline through the
/// same scope. Filtering only the incoming graph would make every out-of-scope
/// baseline element look deleted upstream.
#[must_use]
pub fn merge_with_strategy(
    target: &Graph,
    incoming: &Graph,
    base: Option<&Graph>,
    strategy: &MergeStrategy,
) -> (Graph, MergeReport) {
    let scoped_incoming = strategy.apply(incoming);
    let scoped_base = base.map(|base| strategy.apply(base));
    merge_with_report(target, &scoped_incoming, scoped_base.as_ref())
}

/// The induced subgraph of every node that can reach one of `scope_node_ids`.
///
/// An empty scope returns the graph unchanged.
#[must_use]
pub fn filter_upstream_subgraph<S: AsRef<str>>(graph: &Graph, scope_node_ids: &[S]) -> Graph {
    if scope_node_ids.is_empty() {
        return graph.clone();
    }

    let scoped = Adjacency::new(graph)
        .ancestors_of(scope_node_ids.iter().map(AsRef::as_ref))
        .pipe(|visited| graph.induced_subgraph(&visited));
    debug!(
        seeds = scope_node_ids.len(),
        nodes = scoped.node_count(),
        edges = scoped.edge_count(),
        "Filtered upstream scope"
    );
    scoped
}

fn upsert<T: Keyed>(target: &Vector<T>, incoming: &Vector<T>) -> (Vec<T>, usize, usize) {
    let mut working: Vec<T> = target.iter().cloned().collect();
    let mut positions: HashMap<T::Key, usize> = working
        .iter()
        .enumerate()
        .map(|(i, el)| (el.identity(), i))
        .collect();
    let (mut added, mut updated) = (0, 0);

    for element in incoming {
        match positions.get(&element.identity()).and_then(|&i| working.get_mut(i)) {
            Some(existing) => {
                existing.set_props(element.props().clone());
                updated += 1;
            }
            None => {
                positions.insert(element.identity(), working.len());
                working.push(element.clone());
                added += 1;
            }
        }
    }

    (working, added, updated)
}

fn delete_upstream_removals<T: Keyed>(
    mut working: Vec<T>,
    incoming: &Vector<T>,
    base: &Vector<T>,
) -> (Vec<T>, usize) {
    let still_upstream: HashSet<T::Key> = incoming.iter().map(Keyed::identity).collect();
    let removed_upstream: HashSet<T::Key> = base
        .iter()
        .map(Keyed::identity)
        .filter(|key| !still_upstream.contains(key))
        .collect();

    let before = working.len();
    working.retain(|el| !removed_upstream.contains(&el.identity()));
    let deleted = before - working.len();
    (working, deleted)
}

fn prune_dangling(nodes: &[Node], mut edges: Vec<Edge>) -> (Vec<Edge>, usize) {
    let labels: HashSet<&str> = nodes.iter().map(|node| node.label.as_str()).collect();
    let before = edges.len();
    edges.retain(|edge| labels.contains(edge.source.as_str()) && labels.contains(edge.target.as_str()));
    let pruned = before - edges.len();
    (edges, pruned)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]
    #![allow(clippy::panic)]

    use super::*;
    use crate::model::Props;

    fn graph_of(nodes: &[(&str, &str)], edges: &[(&str, &str)]) -> Graph {
        let graph = nodes
            .iter()
            .try_fold(Graph::new(), |g, (label, v)| {
                g.add_node(Node::new(*label).with_prop("v", *v))
            })
            .unwrap();
        edges
            .iter()
            .try_fold(graph, |g, (s, t)| g.add_edge(Edge::new(*s, *t)))
            .unwrap()
    }

    fn prop(graph: &Graph, label: &str) -> Option<String> {
        graph.node(label).and_then(|n| n.props.get("v").cloned())
    }

    #[test]
    fn test_incoming_props_overwrite_target() {
        let target = graph_of(&[("a", "local"), ("b", "local")], &[("a", "b")]);
        let incoming = graph_of(&[("a", "remote")], &[]);

        let merged = merge_graphs(&target, &incoming, None);
        assert_eq!(prop(&merged, "a").as_deref(), Some("remote"));
        assert_eq!(prop(&merged, "b").as_deref(), Some("local"));
        assert!(merged.contains_edge("a", "b"));
    }

    #[test]
    fn test_overwrite_is_not_a_property_merge() {
        let target = graph_of(&[], &[])
            .add_node(Node::new("a").with_prop("x", "1").with_prop("y", "2"))
            .unwrap();
        let incoming = Graph::new()
            .add_node(Node::new("a").with_prop("x", "9"))
            .unwrap();

        let merged = merge_graphs(&target, &incoming, None);
        assert_eq!(
            merged.node("a").map(|n| n.props.clone()),
            Some(Props::unit("x".into(), "9".into()))
        );
    }

    #[test]
    fn test_without_base_nothing_is_deleted() {
        let target = graph_of(&[("a", "1"), ("b", "1")], &[("a", "b")]);
        let incoming = graph_of(&[("c", "1")], &[]);

        let (merged, report) = merge_with_report(&target, &incoming, None);
        assert_eq!(merged.node_count(), 3);
        assert_eq!(report.nodes_added, 1);
        assert_eq!(report.nodes_deleted, 0);
    }

    #[test]
    fn test_base_drives_deletions_but_spares_local_additions() {
        let base = graph_of(&[("a", "1"), ("b", "1")], &[("a", "b")]);
        let target = graph_of(&[("a", "1"), ("b", "1"), ("local", "1")], &[("a", "b"), ("local", "a")]);
        let incoming = graph_of(&[("a", "1")], &[]);

        let (merged, report) = merge_with_report(&target, &incoming, Some(&base));
        assert!(!merged.contains_node("b"));
        assert!(merged.contains_node("local"));
        assert!(merged.contains_edge("local", "a"));
        assert!(!merged.contains_edge("a", "b"));
        assert_eq!(report.nodes_deleted, 1);
        assert_eq!(report.edges_deleted, 1);
    }

    #[test]
    fn test_dangling_edges_are_pruned() {
        // Upstream deleted node b; the local edge b->local must go with it.
        let base = graph_of(&[("a", "1"), ("b", "1")], &[]);
        let target = graph_of(&[("a", "1"), ("b", "1"), ("local", "1")], &[("b", "local")]);
        let incoming = graph_of(&[("a", "1")], &[]);

        let (merged, report) = merge_with_report(&target, &incoming, Some(&base));
        assert_eq!(merged.edge_count(), 0);
        assert_eq!(report.edges_pruned, 1);
    }

    #[test]
    fn test_merge_is_idempotent() {
        let target = graph_of(&[("a", "1"), ("x", "1")], &[("x", "a")]);
        let incoming = graph_of(&[("a", "2"), ("b", "2")], &[("a", "b")]);

        let once = merge_graphs(&target, &incoming, None);
        let twice = merge_graphs(&once, &incoming, None);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_filter_upstream_subgraph() {
        // r1 <- c1 <- p1, r2 <- p2
        let graph = graph_of(
            &[("r1", ""), ("c1", ""), ("p1", ""), ("r2", ""), ("p2", "")],
            &[("p1", "c1"), ("c1", "r1"), ("p2", "r2")],
        );

        let scoped = filter_upstream_subgraph(&graph, &["c1"]);
        assert_eq!(scoped.labels().collect::<Vec<_>>(), vec!["c1", "p1"]);
        assert_eq!(scoped.edge_count(), 1);

        let multi = filter_upstream_subgraph(&graph, &["r1", "r2"]);
        assert_eq!(multi.node_count(), 5);
    }

    #[test]
    fn test_empty_scope_is_identity() {
        let graph = graph_of(&[("a", "1")], &[]);
        let empty: [&str; 0] = [];
        assert_eq!(filter_upstream_subgraph(&graph, &empty), graph);
        assert_eq!(MergeStrategy::scoped(empty).apply(&graph), graph);
    }

    #[test]
    fn test_scoped_merge_filters_base_with_same_scope() {
        // Upstream has two branches; we pull only the r1 branch.
        let upstream = graph_of(
            &[("r1", "new"), ("c1", "new"), ("r2", "1")],
            &[("c1", "r1")],
        );
        let base = graph_of(&[("r1", "1"), ("c1", "1"), ("r2", "1")], &[("c1", "r1")]);
        let target = base.clone();

        let strategy = MergeStrategy::scoped(["r1"]);
        let (merged, report) = merge_with_strategy(&target, &upstream, Some(&base), &strategy);

        assert_eq!(prop(&merged, "r1").as_deref(), Some("new"));
        assert!(merged.contains_node("r2"), "out-of-scope node must survive");
        assert_eq!(report.nodes_deleted, 0);
    }

    #[test]
    fn test_unscoped_base_with_scoped_incoming_deletes_out_of_scope() {
        // The failure mode merge_with_strategy exists to prevent.
        let upstream = graph_of(&[("r1", "1"), ("r2", "1")], &[]);
        let base = upstream.clone();
        let scoped_incoming = filter_upstream_subgraph(&upstream, &["r1"]);

        let merged = merge_graphs(&base, &scoped_incoming, Some(&base));
        assert!(!merged.contains_node("r2"));
    }

    #[test]
    fn test_strategy_serde_shape() {
        let json = serde_json::to_value(MergeStrategy::scoped(["a"])).unwrap();
        assert_eq!(json, serde_json::json!({"strategy": "scoped", "scope": ["a"]}));
        let full: MergeStrategy = serde_json::from_str(r#"{"strategy":"full"}"#).unwrap();
        assert_eq!(full, MergeStrategy::Full);
    }
}
