//! # Path tags
//!
//! On a DAG whose templates designate some node types as *special*, every
//! edge is tagged with the combinations of special-typed nodes reachable
//! through it. A [`PathTag`] maps special type id to the label of the node of
//! that type on one downstream path; `{}` is the wildcard tag of a path that
//! reaches no special node.
//!
//! ## Algorithm
//!
//! Nodes are processed leaves first. A leaf's descriptor set is its own anchor
//! (or the wildcard). An internal node unions its children's sets, then
//! stamps its own anchor into every descriptor. Each edge `u→v` carries `v`'s
//! descriptor set.
//!
//! Descriptor sets can grow combinatorially on wide DAGs with many
//! special-typed leaves. See `benches/path_tags.rs`.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::fmt;

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::adjacency::Adjacency;
use crate::model::{EdgeKey, Graph, Node};

/// Partial map from special type id to the label of the node of that type.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PathTag(BTreeMap<String, String>);

impl PathTag {
    /// The tag of a path that reaches no special node.
    #[must_use]
    pub const fn wildcard() -> Self {
        Self(BTreeMap::new())
    }

    /// A tag holding a single anchor.
    #[must_use]
    pub fn anchored(type_id: impl Into<String>, label: impl Into<String>) -> Self {
        Self::wildcard().stamp(type_id, label)
    }

    /// Set `type_id` to `label`, replacing any previous label for that type.
    #[must_use]
    pub fn stamp(mut self, type_id: impl Into<String>, label: impl Into<String>) -> Self {
        self.0.insert(type_id.into(), label.into());
        self
    }

    #[must_use]
    pub fn get(&self, type_id: &str) -> Option<&str> {
        self.0.get(type_id).map(String::as_str)
    }

    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PathTag {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Canonical serialization of a tag: a JSON array of labels in
/// `special_type_ids` order, with `""` for a type the tag does not mention.
///
/// Used as the identity of a tag in exclusion sets.
///
/// # Examples
///
/// ```
/// use plexus_graph::path_tags::{PathTag, serialize_tag};
///
/// let tag = PathTag::anchored("reporter", "R1");
/// assert_eq!(serialize_tag(&tag, &["reporter", "category"]), r#"["R1",""]"#);
/// ```
#[must_use]
pub fn serialize_tag<S: AsRef<str>>(tag: &PathTag, special_type_ids: &[S]) -> String {
    let labels: Vec<&str> = special_type_ids
        .iter()
        .map(|id| tag.get(id.as_ref()).unwrap_or(""))
        .collect();
    serde_json::Value::from(labels).to_string()
}

/// Human-readable tag label, e.g. `reporter: R1, category: C1`.
///
/// The wildcard renders as `*`.
#[must_use]
pub fn format_path_tag<S: AsRef<str>>(tag: &PathTag, special_type_ids: &[S]) -> String {
    let parts = special_type_ids
        .iter()
        .filter_map(|id| tag.get(id.as_ref()).map(|label| format!("{}: {label}", id.as_ref())))
        .join(", ");
    if parts.is_empty() { "*".to_string() } else { parts }
}

/// Path tags for every edge of a graph, together with the special type order
/// they were computed for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PathTags {
    special_type_ids: Vec<String>,
    by_edge: BTreeMap<EdgeKey, Vec<PathTag>>,
}

impl PathTags {
    #[must_use]
    pub fn special_type_ids(&self) -> &[String] {
        &self.special_type_ids
    }

    /// Tags carried by an edge. `None` for an edge that was not in the graph.
    #[must_use]
    pub fn get(&self, key: &EdgeKey) -> Option<&[PathTag]> {
        self.by_edge.get(key).map(Vec::as_slice)
    }

    #[must_use]
    pub fn tags_for(&self, source: &str, target: &str) -> Option<&[PathTag]> {
        self.get(&EdgeKey::new(source, target))
    }

    /// Canonical serializations of an edge's tags. Empty for an unknown edge.
    #[must_use]
    pub fn serialized(&self, key: &EdgeKey) -> BTreeSet<String> {
        self.get(key)
            .unwrap_or_default()
            .iter()
            .map(|tag| self.serialize(tag))
            .collect()
    }

    #[must_use]
    pub fn serialize(&self, tag: &PathTag) -> String {
        serialize_tag(tag, &self.special_type_ids)
    }

    #[must_use]
    pub fn format(&self, tag: &PathTag) -> String {
        format_path_tag(tag, &self.special_type_ids)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&EdgeKey, &[PathTag])> {
        self.by_edge.iter().map(|(key, tags)| (key, tags.as_slice()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_edge.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_edge.is_empty()
    }
}

/// Node labels ordered so every node comes after all of its children.
///
/// Kahn's algorithm on out-degree. Nodes on a cycle are never released and
/// are appended in graph order.
#[must_use]
pub fn leaves_first_order(graph: &Graph) -> Vec<&str> {
    let adjacency = Adjacency::new(graph);
    let mut out_degree: HashMap<&str, usize> = graph
        .labels()
        .map(|label| (label, adjacency.outgoing(label).len()))
        .collect();

    let mut queue: VecDeque<&str> = graph
        .labels()
        .filter(|label| out_degree.get(label) == Some(&0))
        .collect();
    let mut order: Vec<&str> = Vec::with_capacity(graph.node_count());

    while let Some(label) = queue.pop_front() {
        order.push(label);
        for edge in adjacency.incoming(label) {
            let parent = edge.source.as_str();
            if let Some(degree) = out_degree.get_mut(parent) {
                *degree = degree.saturating_sub(1);
                if *degree == 0 {
                    queue.push_back(parent);
                }
            }
        }
    }

    if order.len() < graph.node_count() {
        let placed: HashSet<&str> = order.iter().copied().collect();
        let stranded: Vec<&str> = graph.labels().filter(|label| !placed.contains(label)).collect();
        debug!(stranded = stranded.len(), "Cycle detected while ordering path tags");
        order.extend(stranded);
    }

    order
}

/// Compute the tags of every edge.
///
/// # Examples
///
/// ```
/// use plexus_graph::{Edge, EdgeKey, Graph, Node, path_tags::{PathTag, compute_path_tags}};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let graph = Graph::new()
///     .add_node(Node::new("R1").with_type("reporter"))?
///     .add_node(Node::new("C1").with_type("category"))?
///     .add_node(Node::new("P1"))?
///     .add_edge(Edge::new("C1", "R1"))?
///     .add_edge(Edge::new("P1", "C1"))?;
///
/// let tags = compute_path_tags(&graph, &["reporter", "category"]);
/// assert_eq!(
///     tags.get(&EdgeKey::new("P1", "C1")),
///     Some(&[PathTag::anchored("reporter", "R1").stamp("category", "C1")][..])
/// );
/// # Ok(())
/// # }
/// ```
#[must_use]
pub fn compute_path_tags<S: AsRef<str>>(graph: &Graph, special_type_ids: &[S]) -> PathTags {
    let special_type_ids: Vec<String> = special_type_ids
        .iter()
        .map(|id| id.as_ref().to_string())
        .collect();
    let adjacency = Adjacency::new(graph);
    let mut descriptors: HashMap<&str, Vec<PathTag>> = HashMap::with_capacity(graph.node_count());

    for label in leaves_first_order(graph) {
        let Some(node) = adjacency.node(label) else {
            continue;
        };
        let anchor = own_anchor(node, &special_type_ids);
        let children = adjacency.outgoing(label);

        let set = if children.is_empty() {
            vec![anchor.map_or_else(PathTag::wildcard, |type_id| {
                PathTag::anchored(type_id, label)
            })]
        } else {
            let mut merged = DescriptorSet::new(&special_type_ids);
            children
                .iter()
                .filter_map(|edge| descriptors.get(edge.target.as_str()))
                .flatten()
                .for_each(|tag| merged.insert(tag.clone()));

            match anchor {
                Some(type_id) => {
                    let mut stamped = DescriptorSet::new(&special_type_ids);
                    merged
                        .into_tags()
                        .into_iter()
                        .for_each(|tag| stamped.insert(tag.stamp(type_id, label)));
                    stamped.into_tags()
                }
                None => merged.into_tags(),
            }
        };

        descriptors.insert(label, set);
    }

    let by_edge: BTreeMap<EdgeKey, Vec<PathTag>> = adjacency
        .edges()
        .map(|edge| {
            let tags = descriptors
                .get(edge.target.as_str())
                .cloned()
                .unwrap_or_default();
            (edge.key(), tags)
        })
        .collect();

    debug!(
        edges = by_edge.len(),
        tags = by_edge.values().map(Vec::len).sum::<usize>(),
        "Computed path tags"
    );

    PathTags {
        special_type_ids,
        by_edge,
    }
}

fn own_anchor<'n>(node: &'n Node, special_type_ids: &[String]) -> Option<&'n str> {
    node.node_type
        .as_deref()
        .filter(|node_type| special_type_ids.iter().any(|id| id == node_type))
}

/// Tags deduplicated by canonical serialization, in first-seen order.
struct DescriptorSet<'a> {
    special_type_ids: &'a [String],
    seen: HashSet<String>,
    tags: Vec<PathTag>,
}

impl<'a> DescriptorSet<'a> {
    fn new(special_type_ids: &'a [String]) -> Self {
        Self {
            special_type_ids,
            seen: HashSet::new(),
            tags: Vec::new(),
        }
    }

    fn insert(&mut self, tag: PathTag) {
        if self.seen.insert(serialize_tag(&tag, self.special_type_ids)) {
            self.tags.push(tag);
        }
    }

    fn into_tags(self) -> Vec<PathTag> {
        self.tags
    }
}

impl fmt::Display for PathTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let body = self.0.iter().map(|(k, v)| format!("{k}: {v}")).join(", ");
        if body.is_empty() { write!(f, "*") } else { write!(f, "{{{body}}}") }
    }
}
