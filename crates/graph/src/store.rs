//! # Graph store operations
//!
//! Every operation takes `&Graph` and returns a new [`Graph`]; the argument is
//! never mutated. Because node and edge lists are `im::Vector`s, unchanged
//! halves of a graph are shared between the old and the new value.

use std::collections::HashSet;

use im::Vector;
use tap::Pipe;

use crate::adjacency::Adjacency;
use crate::error::{GraphError, GraphResult};
use crate::model::{EDGE_KEY_SEPARATOR, Edge, Graph, Node, Props};

impl Graph {
    /// Create an empty graph.
    ///
    /// # Examples
    ///
    /// ```
    /// use plexus_graph::Graph;
    ///
    /// let graph = Graph::new();
    /// assert_eq!(graph.node_count(), 0);
    /// assert!(graph.is_empty());
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Look up a node by label.
    #[must_use]
    pub fn node(&self, label: &str) -> Option<&Node> {
        self.nodes.iter().find(|node| node.label == label)
    }

    #[must_use]
    pub fn contains_node(&self, label: &str) -> bool {
        self.node(label).is_some()
    }

    /// Look up an edge by its exact `(source, target)` key.
    #[must_use]
    pub fn edge(&self, source: &str, target: &str) -> Option<&Edge> {
        self.edges
            .iter()
            .find(|edge| edge.source == source && edge.target == target)
    }

    #[must_use]
    pub fn contains_edge(&self, source: &str, target: &str) -> bool {
        self.edge(source, target).is_some()
    }

    /// Node labels in insertion order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(|node| node.label.as_str())
    }

    /// Add a node.
    ///
    /// # Errors
    ///
    /// * `GraphError::EmptyLabel` if the label is empty
    /// * `GraphError::ReservedLabel` if the label contains [`EDGE_KEY_SEPARATOR`]
    /// * `GraphError::NodeAlreadyExists` if the label is taken
    ///
    /// # Examples
    ///
    /// ```
    /// use plexus_graph::{Graph, Node};
    ///
    /// let empty = Graph::new();
    /// let graph = empty.add_node(Node::new("a")).unwrap();
    /// assert_eq!(graph.node_count(), 1);
    /// assert_eq!(empty.node_count(), 0);
    /// assert!(graph.add_node(Node::new("a")).is_err());
    /// ```
    pub fn add_node(&self, node: Node) -> GraphResult<Self> {
        if node.label.is_empty() {
            return Err(GraphError::EmptyLabel);
        }
        if node.label.contains(EDGE_KEY_SEPARATOR) {
            return Err(GraphError::ReservedLabel(node.label));
        }
        if self.contains_node(&node.label) {
            return Err(GraphError::node_already_exists(node.label));
        }

        let mut nodes = self.nodes.clone();
        nodes.push_back(node);
        Ok(Self::from_parts(nodes, self.edges.clone()))
    }

    /// Remove a node together with every edge touching it.
    ///
    /// Removing an unknown label yields an equal graph.
    #[must_use]
    pub fn remove_node(&self, label: &str) -> Self {
        let nodes = self
            .nodes
            .iter()
            .filter(|node| node.label != label)
            .cloned()
            .collect();
        let edges = self
            .edges
            .iter()
            .filter(|edge| !edge.touches(label))
            .cloned()
            .collect();
        Self::from_parts(nodes, edges)
    }

    /// Add an edge between two existing nodes.
    ///
    /// Graph-type policy (direction, cycles) is not checked here; run
    /// [`crate::validate::validate_edge_add`] first.
    ///
    /// # Errors
    ///
    /// * `GraphError::NodeNotFound` if either endpoint is missing
    /// * `GraphError::EdgeAlreadyExists` if the exact `(source, target)` key exists
    pub fn add_edge(&self, edge: Edge) -> GraphResult<Self> {
        if !self.contains_node(&edge.source) {
            return Err(GraphError::node_not_found(edge.source));
        }
        if !self.contains_node(&edge.target) {
            return Err(GraphError::node_not_found(edge.target));
        }
        if self.contains_edge(&edge.source, &edge.target) {
            return Err(GraphError::edge_already_exists(edge.source, edge.target));
        }

        let mut edges = self.edges.clone();
        edges.push_back(edge);
        Ok(Self::from_parts(self.nodes.clone(), edges))
    }

    /// Remove the edge with key `(source, target)`, if present.
    #[must_use]
    pub fn remove_edge(&self, source: &str, target: &str) -> Self {
        let edges = self
            .edges
            .iter()
            .filter(|edge| !(edge.source == source && edge.target == target))
            .cloned()
            .collect();
        Self::from_parts(self.nodes.clone(), edges)
    }

    /// Replace a node's property map.
    ///
    /// # Errors
    ///
    /// Returns `GraphError::NodeNotFound` if no node has this label.
    pub fn update_node_props(&self, label: &str, props: Props) -> GraphResult<Self> {
        self.map_node(label, |node| node.with_props(props))
    }

    /// Change or clear a node's type.
    ///
    /// # Errors
    ///
    /// Returns `GraphError::NodeNotFound` if no node has this label.
    pub fn set_node_type(&self, label: &str, node_type: Option<String>) -> GraphResult<Self> {
        self.map_node(label, |node| Node { node_type, ..node })
    }

    /// Replace an edge's property map.
    ///
    /// # Errors
    ///
    /// Returns `GraphError::EdgeNotFound` if no edge has this key.
    pub fn update_edge_props(&self, source: &str, target: &str, props: Props) -> GraphResult<Self> {
        let index = self
            .edges
            .iter()
            .position(|edge| edge.source == source && edge.target == target)
            .ok_or_else(|| GraphError::edge_not_found(source, target))?;

        let edges = self
            .edges
            .get(index)
            .map(|edge| Edge {
                props,
                ..edge.clone()
            })
            .map(|updated| self.edges.update(index, updated))
            .ok_or_else(|| GraphError::edge_not_found(source, target))?;

        Ok(Self::from_parts(self.nodes.clone(), edges))
    }

    /// The subgraph of every node that can reach `root_label`, `root_label`
    /// included, with only the edges whose endpoints were both visited.
    ///
    /// An unknown root yields an empty graph.
    ///
    /// # Examples
    ///
    /// ```
    /// use plexus_graph::{Edge, Graph, Node};
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let graph = Graph::new()
    ///     .add_node(Node::new("a"))?
    ///     .add_node(Node::new("b"))?
    ///     .add_node(Node::new("c"))?
    ///     .add_edge(Edge::new("a", "b"))?
    ///     .add_edge(Edge::new("b", "c"))?;
    ///
    /// let branch = graph.ancestor_subgraph("b");
    /// assert_eq!(branch.labels().collect::<Vec<_>>(), vec!["a", "b"]);
    /// assert_eq!(branch.edge_count(), 1);
    /// # Ok(())
    /// # }
    /// ```
    #[must_use]
    pub fn ancestor_subgraph(&self, root_label: &str) -> Self {
        Adjacency::new(self)
            .ancestors_of([root_label])
            .pipe(|visited| self.induced_subgraph(&visited))
    }

    /// Keep only the listed labels and the edges between them.
    #[must_use]
    pub fn induced_subgraph(&self, labels: &HashSet<&str>) -> Self {
        let nodes: Vector<Node> = self
            .nodes
            .iter()
            .filter(|node| labels.contains(node.label.as_str()))
            .cloned()
            .collect();
        let edges: Vector<Edge> = self
            .edges
            .iter()
            .filter(|edge| {
                labels.contains(edge.source.as_str()) && labels.contains(edge.target.as_str())
            })
            .cloned()
            .collect();
        Self::from_parts(nodes, edges)
    }

    fn map_node<F>(&self, label: &str, f: F) -> GraphResult<Self>
    where
        F: FnOnce(Node) -> Node,
    {
        let index = self
            .nodes
            .iter()
            .position(|node| node.label == label)
            .ok_or_else(|| GraphError::node_not_found(label))?;

        let nodes = self
            .nodes
            .get(index)
            .cloned()
            .map(f)
            .map(|updated| self.nodes.update(index, updated))
            .ok_or_else(|| GraphError::node_not_found(label))?;

        Ok(Self::from_parts(nodes, self.edges.clone()))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]
    #![allow(clippy::panic)]

    use super::*;

    fn diamond() -> Graph {
        // a -> b -> d, a -> c -> d
        ["a", "b", "c", "d"]
            .into_iter()
            .try_fold(Graph::new(), |g, label| g.add_node(Node::new(label)))
            .and_then(|g| g.add_edge(Edge::new("a", "b")))
            .and_then(|g| g.add_edge(Edge::new("a", "c")))
            .and_then(|g| g.add_edge(Edge::new("b", "d")))
            .and_then(|g| g.add_edge(Edge::new("c", "d")))
            .unwrap()
    }

    #[test]
    fn test_add_node_rejects_empty_and_duplicate_labels() {
        let graph = Graph::new().add_node(Node::new("a")).unwrap();
        assert_eq!(graph.add_node(Node::new("")), Err(GraphError::EmptyLabel));
        assert_eq!(
            graph.add_node(Node::new("a")),
            Err(GraphError::NodeAlreadyExists("a".into()))
        );
    }

    #[test]
    fn test_mutators_leave_original_untouched() {
        let original = diamond();
        let snapshot = original.clone();

        let _ = original.remove_node("b");
        let _ = original.remove_edge("a", "c");
        let _ = original.update_node_props("a", Props::unit("k".into(), "v".into()));

        assert_eq!(original, snapshot);
    }

    #[test]
    fn test_add_node_rejects_separator_in_label() {
        assert_eq!(
            Graph::new().add_node(Node::new("a→b")),
            Err(GraphError::ReservedLabel("a→b".into()))
        );
    }

    #[test]
    fn test_remove_node_drops_touching_edges() {
        let graph = diamond().remove_node("b");
        assert!(!graph.contains_node("b"));
        assert_eq!(graph.edge_count(), 2);
        assert!(graph.edges().iter().all(|edge| !edge.touches("b")));
    }

    #[test]
    fn test_remove_unknown_node_is_noop() {
        let graph = diamond();
        assert_eq!(graph.remove_node("zzz"), graph);
    }

    #[test]
    fn test_add_edge_rejects_dangling_and_duplicate() {
        let graph = diamond();
        assert_eq!(
            graph.add_edge(Edge::new("a", "ghost")),
            Err(GraphError::NodeNotFound("ghost".into()))
        );
        assert!(matches!(
            graph.add_edge(Edge::new("a", "b")),
            Err(GraphError::EdgeAlreadyExists(_))
        ));
        // The reverse key is a different identity at the store level.
        assert!(graph.add_edge(Edge::new("b", "a")).is_ok());
    }

    #[test]
    fn test_update_props_replaces_whole_map() {
        let graph = diamond()
            .update_node_props("a", Props::unit("x".into(), "1".into()))
            .and_then(|g| g.update_node_props("a", Props::unit("y".into(), "2".into())))
            .unwrap();
        let node = graph.node("a").unwrap();
        assert_eq!(node.props.get("x"), None);
        assert_eq!(node.props.get("y").map(String::as_str), Some("2"));
    }

    #[test]
    fn test_update_edge_props_and_missing_edge() {
        let graph = diamond()
            .update_edge_props("a", "b", Props::unit("w".into(), "3".into()))
            .unwrap();
        assert_eq!(
            graph.edge("a", "b").and_then(|e| e.props.get("w")).map(String::as_str),
            Some("3")
        );
        assert!(matches!(
            graph.update_edge_props("d", "a", Props::new()),
            Err(GraphError::EdgeNotFound(_))
        ));
    }

    #[test]
    fn test_set_node_type() {
        let graph = diamond().set_node_type("d", Some("reporter".into())).unwrap();
        assert_eq!(graph.node("d").and_then(|n| n.node_type.as_deref()), Some("reporter"));
        assert!(graph.set_node_type("nope", None).is_err());
    }

    #[test]
    fn test_ancestor_subgraph_of_sink_is_whole_diamond() {
        let graph = diamond();
        assert_eq!(graph.ancestor_subgraph("d"), graph);
    }

    #[test]
    fn test_ancestor_subgraph_excludes_siblings() {
        let branch = diamond().ancestor_subgraph("c");
        assert_eq!(branch.labels().collect::<Vec<_>>(), vec!["a", "c"]);
        assert_eq!(branch.edge_count(), 1);
        assert!(branch.contains_edge("a", "c"));
    }

    #[test]
    fn test_ancestor_subgraph_unknown_root_is_empty() {
        assert!(diamond().ancestor_subgraph("nope").is_empty());
    }
}
