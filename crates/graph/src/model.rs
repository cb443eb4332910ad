//! # Graph value model
//!
//! `Graph`, `Node` and `Edge` are plain values. A graph's node and edge lists
//! are persistent `im::Vector`s, so deriving a new graph from an old one
//! shares structure instead of deep-copying.

use std::fmt;
use std::str::FromStr;

use im::{OrdMap, Vector};
use serde::{Deserialize, Serialize};

use crate::error::GraphError;

/// Flat string property map attached to nodes and edges.
pub type Props = OrdMap<String, String>;

/// Separator used when an edge key is rendered as a single string.
pub const EDGE_KEY_SEPARATOR: &str = "→";

/// A labelled node. The label is the node's identity within a graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Node {
    pub label: String,
    #[serde(rename = "type")]
    pub node_type: Option<String>,
    pub props: Props,
}

impl Node {
    /// Create an untyped node with no properties.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            node_type: None,
            props: Props::new(),
        }
    }

    #[must_use]
    pub fn with_type(mut self, node_type: impl Into<String>) -> Self {
        self.node_type = Some(node_type.into());
        self
    }

    #[must_use]
    pub fn with_prop(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.props.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_props(mut self, props: Props) -> Self {
        self.props = props;
        self
    }
}

/// A connection between two node labels.
///
/// Identity is the ordered `(source, target)` pair regardless of whether the
/// graph type treats edges as undirected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Edge {
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub edge_type: Option<String>,
    pub props: Props,
}

impl Edge {
    /// Create an untyped edge with no properties.
    #[must_use]
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            edge_type: None,
            props: Props::new(),
        }
    }

    #[must_use]
    pub fn with_type(mut self, edge_type: impl Into<String>) -> Self {
        self.edge_type = Some(edge_type.into());
        self
    }

    #[must_use]
    pub fn with_prop(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.props.insert(key.into(), value.into());
        self
    }

    /// The identity key of this edge.
    #[must_use]
    pub fn key(&self) -> EdgeKey {
        EdgeKey::new(self.source.clone(), self.target.clone())
    }

    /// True if this edge has `label` as either endpoint.
    #[must_use]
    pub fn touches(&self, label: &str) -> bool {
        self.source == label || self.target == label
    }

    /// True if this edge joins `a` and `b` in either direction.
    #[must_use]
    pub fn joins(&self, a: &str, b: &str) -> bool {
        (self.source == a && self.target == b) || (self.source == b && self.target == a)
    }
}

/// Ordered `(source, target)` identity of an edge.
///
/// Serialized as the single string `"source→target"` so it can key JSON maps.
/// Node labels never contain the separator, so the split is unambiguous.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct EdgeKey {
    pub source: String,
    pub target: String,
}

impl EdgeKey {
    #[must_use]
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

impl fmt::Display for EdgeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.source, EDGE_KEY_SEPARATOR, self.target)
    }
}

impl FromStr for EdgeKey {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split_once(EDGE_KEY_SEPARATOR)
            .filter(|(source, target)| !source.is_empty() && !target.is_empty())
            .map(|(source, target)| Self::new(source, target))
            .ok_or_else(|| GraphError::InvalidEdgeKey(s.to_string()))
    }
}

impl TryFrom<String> for EdgeKey {
    type Error = GraphError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<EdgeKey> for String {
    fn from(key: EdgeKey) -> Self {
        key.to_string()
    }
}

/// Immutable graph value.
///
/// Construct through [`Graph::new`] and the store operations, or by importing
/// JSON; both paths uphold unique labels and non-dangling edges.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Graph {
    pub(crate) nodes: Vector<Node>,
    pub(crate) edges: Vector<Edge>,
}

impl Graph {
    /// Assemble a graph from parts that have already been validated.
    pub(crate) const fn from_parts(nodes: Vector<Node>, edges: Vector<Edge>) -> Self {
        Self { nodes, edges }
    }

    #[must_use]
    pub const fn nodes(&self) -> &Vector<Node> {
        &self.nodes
    }

    #[must_use]
    pub const fn edges(&self) -> &Vector<Edge> {
        &self.edges
    }
}

/// Elements that carry an identity key and a property map.
pub(crate) trait Keyed: Clone {
    type Key: std::hash::Hash + Eq + Clone;

    fn identity(&self) -> Self::Key;

    fn props(&self) -> &Props;

    fn set_props(&mut self, props: Props);
}

impl Keyed for Node {
    type Key = String;

    fn identity(&self) -> String {
        self.label.clone()
    }

    fn props(&self) -> &Props {
        &self.props
    }

    fn set_props(&mut self, props: Props) {
        self.props = props;
    }
}

impl Keyed for Edge {
    type Key = EdgeKey;

    fn identity(&self) -> EdgeKey {
        self.key()
    }

    fn props(&self) -> &Props {
        &self.props
    }

    fn set_props(&mut self, props: Props) {
        self.props = props;
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]
    #![allow(clippy::panic)]

    use super::*;

    #[test]
    fn test_edge_key_display_and_parse() {
        let key = EdgeKey::new("P1", "C1");
        assert_eq!(key.to_string(), "P1→C1");
        assert_eq!("P1→C1".parse::<EdgeKey>(), Ok(key));
    }

    #[test]
    fn test_edge_key_rejects_malformed() {
        assert!("P1-C1".parse::<EdgeKey>().is_err());
        assert!("→C1".parse::<EdgeKey>().is_err());
        assert!("P1→".parse::<EdgeKey>().is_err());
    }

    #[test]
    fn test_edge_key_serializes_as_string() {
        let key = EdgeKey::new("a", "b");
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, "\"a→b\"");
        let back: EdgeKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, key);
    }

    #[test]
    fn test_edge_joins_either_direction() {
        let edge = Edge::new("a", "b");
        assert!(edge.joins("a", "b"));
        assert!(edge.joins("b", "a"));
        assert!(!edge.joins("a", "c"));
        assert!(edge.touches("b"));
    }

    #[test]
    fn test_props_equality_ignores_insertion_order() {
        let left = Node::new("n").with_prop("x", "1").with_prop("y", "2");
        let right = Node::new("n").with_prop("y", "2").with_prop("x", "1");
        assert_eq!(left, right);
    }
}
