//! # Exclusions
//!
//! A *direct* exclusion says that a tag should not count as reachable through
//! an edge. Exclusions travel upstream: if tag `T` is excluded on `u→v` and a
//! parent edge `w→u` also carries `T`, then `T` is excluded on `w→u` as well.
//! The closure of that rule over the direct set is the *effective* set.
//!
//! Tags are identified by their canonical serialization
//! ([`serialize_tag`](crate::path_tags::serialize_tag)). Effective exclusions
//! are derived state and never persisted.

use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};

use tracing::debug;

use crate::adjacency::Adjacency;
use crate::model::{EdgeKey, Graph};
use crate::path_tags::PathTags;

/// Serialized tags excluded per edge.
pub type ExclusionMap = BTreeMap<EdgeKey, BTreeSet<String>>;

/// Close `direct` under upstream propagation.
///
/// BFS against edge direction, seeded at the source of every directly
/// excluded edge. Crossing a parent edge keeps only the tags that edge itself
/// carries; an empty intersection stops the walk. Visited states are
/// `(node, tag set)` pairs.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeSet;
/// use plexus_graph::{Edge, EdgeKey, Graph, Node};
/// use plexus_graph::exclusions::{ExclusionMap, propagate_exclusions};
/// use plexus_graph::path_tags::compute_path_tags;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let graph = Graph::new()
///     .add_node(Node::new("A"))?
///     .add_node(Node::new("B"))?
///     .add_node(Node::new("C").with_type("reporter"))?
///     .add_edge(Edge::new("A", "B"))?
///     .add_edge(Edge::new("B", "C"))?;
/// let tags = compute_path_tags(&graph, &["reporter"]);
///
/// let direct = ExclusionMap::from([(EdgeKey::new("B", "C"), BTreeSet::from([r#"["C"]"#.to_string()]))]);
/// let effective = propagate_exclusions(&graph, &direct, &tags);
/// assert!(effective.contains_key(&EdgeKey::new("A", "B")));
/// # Ok(())
/// # }
/// ```
#[must_use]
pub fn propagate_exclusions(graph: &Graph, direct: &ExclusionMap, path_tags: &PathTags) -> ExclusionMap {
    let adjacency = Adjacency::new(graph);
    let mut effective: ExclusionMap = direct
        .iter()
        .filter(|(_, tags)| !tags.is_empty())
        .map(|(key, tags)| (key.clone(), tags.clone()))
        .collect();

    let mut frontier: VecDeque<(&str, BTreeSet<String>)> = direct
        .iter()
        .filter(|(_, tags)| !tags.is_empty())
        .filter_map(|(key, tags)| adjacency.resolve(&key.source).map(|node| (node, tags.clone())))
        .collect();
    let mut visited: HashSet<(&str, BTreeSet<String>)> = HashSet::new();

    while let Some((node, tags)) = frontier.pop_front() {
        if !visited.insert((node, tags.clone())) {
            continue;
        }
        for edge in adjacency.incoming(node) {
            let key = edge.key();
            let carried: BTreeSet<String> = path_tags
                .serialized(&key)
                .intersection(&tags)
                .cloned()
                .collect();
            if carried.is_empty() {
                continue;
            }
            effective.entry(key).or_default().extend(carried.iter().cloned());
            frontier.push_back((edge.source.as_str(), carried));
        }
    }

    debug!(
        direct = direct.len(),
        effective = effective.len(),
        states = visited.len(),
        "Propagated exclusions"
    );
    effective
}

/// A non-leaf node whose every outgoing edge has all of its tags excluded.
///
/// An outgoing edge without tags counts as excluded.
#[must_use]
pub fn is_node_fully_excluded(
    graph: &Graph,
    label: &str,
    path_tags: &PathTags,
    effective: &ExclusionMap,
) -> bool {
    let adjacency = Adjacency::new(graph);
    fully_excluded_with(&adjacency, label, path_tags, effective)
}

/// Labels of every fully excluded node, in graph order.
#[must_use]
pub fn fully_excluded_nodes(graph: &Graph, path_tags: &PathTags, effective: &ExclusionMap) -> Vec<String> {
    let adjacency = Adjacency::new(graph);
    graph
        .labels()
        .filter(|label| fully_excluded_with(&adjacency, label, path_tags, effective))
        .map(str::to_string)
        .collect()
}

fn fully_excluded_with(
    adjacency: &Adjacency<'_>,
    label: &str,
    path_tags: &PathTags,
    effective: &ExclusionMap,
) -> bool {
    let outgoing = adjacency.outgoing(label);
    !outgoing.is_empty()
        && outgoing.iter().all(|edge| {
            let key = edge.key();
            let tags = path_tags.serialized(&key);
            effective
                .get(&key)
                .map_or(tags.is_empty(), |excluded| tags.is_subset(excluded))
        })
}

/// Combine the direct exclusions of two graphs being merged.
///
/// Exclusions from a source without path tracking are discarded: their tags
/// were not computed against a matching template.
#[must_use]
pub fn merge_exclusions(target: &ExclusionMap, source: &ExclusionMap, source_tracked: bool) -> ExclusionMap {
    if !source_tracked {
        debug!(discarded = source.len(), "Ignoring exclusions from untracked source");
        return target.clone();
    }

    source.iter().fold(target.clone(), |mut merged, (key, tags)| {
        merged.entry(key.clone()).or_default().extend(tags.iter().cloned());
        merged
    })
}

/// Drop direct exclusions whose tag no longer appears on their edge.
///
/// Entries for edges that no longer exist, and entries left empty, are
/// removed.
#[must_use]
pub fn prune_stale_exclusions(direct: &ExclusionMap, path_tags: &PathTags) -> ExclusionMap {
    direct
        .iter()
        .filter_map(|(key, tags)| {
            let current = path_tags.serialized(key);
            let kept: BTreeSet<String> = tags.intersection(&current).cloned().collect();
            (!kept.is_empty()).then(|| (key.clone(), kept))
        })
        .collect()
}

/// Entries of `before` that are missing from `after`.
#[must_use]
pub fn exclusion_difference(before: &ExclusionMap, after: &ExclusionMap) -> ExclusionMap {
    before
        .iter()
        .filter_map(|(key, tags)| {
            let dropped: BTreeSet<String> = match after.get(key) {
                Some(kept) => tags.difference(kept).cloned().collect(),
                None => tags.clone(),
            };
            (!dropped.is_empty()).then(|| (key.clone(), dropped))
        })
        .collect()
}
