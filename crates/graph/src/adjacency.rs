//! Borrowed adjacency index over a [`Graph`].
//!
//! Built once per algorithm call. Edges whose endpoints are missing from the
//! node set are left out, so every traversal skips dangling edges instead of
//! failing on them.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::model::{Edge, Graph, Node};

pub(crate) struct Adjacency<'g> {
    nodes: HashMap<&'g str, &'g Node>,
    edges: Vec<&'g Edge>,
    outgoing: HashMap<&'g str, Vec<&'g Edge>>,
    incoming: HashMap<&'g str, Vec<&'g Edge>>,
}

impl<'g> Adjacency<'g> {
    pub(crate) fn new(graph: &'g Graph) -> Self {
        let nodes: HashMap<&'g str, &'g Node> = graph
            .nodes()
            .iter()
            .map(|node| (node.label.as_str(), node))
            .collect();

        let edges: Vec<&'g Edge> = graph
            .edges()
            .iter()
            .filter(|edge| {
                nodes.contains_key(edge.source.as_str()) && nodes.contains_key(edge.target.as_str())
            })
            .collect();

        let mut outgoing: HashMap<&'g str, Vec<&'g Edge>> = HashMap::new();
        let mut incoming: HashMap<&'g str, Vec<&'g Edge>> = HashMap::new();
        for edge in &edges {
            outgoing.entry(edge.source.as_str()).or_default().push(edge);
            incoming.entry(edge.target.as_str()).or_default().push(edge);
        }

        Self {
            nodes,
            edges,
            outgoing,
            incoming,
        }
    }

    /// Resolve a label to the graph-owned string, if the node exists.
    pub(crate) fn resolve(&self, label: &str) -> Option<&'g str> {
        self.nodes.get_key_value(label).map(|(key, _)| *key)
    }

    pub(crate) fn node(&self, label: &str) -> Option<&'g Node> {
        self.nodes.get(label).copied()
    }

    /// Non-dangling edges in graph order.
    pub(crate) fn edges(&self) -> impl Iterator<Item = &'g Edge> + '_ {
        self.edges.iter().copied()
    }

    pub(crate) fn outgoing(&self, label: &str) -> &[&'g Edge] {
        self.outgoing.get(label).map_or(&[], Vec::as_slice)
    }

    pub(crate) fn incoming(&self, label: &str) -> &[&'g Edge] {
        self.incoming.get(label).map_or(&[], Vec::as_slice)
    }

    /// Neighbours reached by treating every edge as bidirectional.
    pub(crate) fn neighbors(&self, label: &str) -> impl Iterator<Item = &'g str> + '_ {
        let forward = self.outgoing(label).iter().map(|edge| edge.target.as_str());
        let backward = self.incoming(label).iter().map(|edge| edge.source.as_str());
        forward.chain(backward)
    }

    /// Backward BFS: every label that can reach one of `seeds`, seeds included.
    ///
    /// Seeds that are not nodes of the graph are ignored.
    pub(crate) fn ancestors_of<'s>(
        &self,
        seeds: impl IntoIterator<Item = &'s str>,
    ) -> HashSet<&'g str> {
        let mut visited: HashSet<&'g str> = HashSet::new();
        let mut queue: VecDeque<&'g str> = seeds
            .into_iter()
            .filter_map(|seed| self.resolve(seed))
            .collect();

        while let Some(current) = queue.pop_front() {
            if visited.insert(current) {
                queue.extend(
                    self.incoming(current)
                        .iter()
                        .map(|edge| edge.source.as_str())
                        .filter(|source| !visited.contains(source)),
                );
            }
        }

        visited
    }

    /// Forward BFS from `from`; true if `goal` is reachable along edge direction.
    pub(crate) fn reaches_forward(&self, from: &str, goal: &str) -> bool {
        self.search(from, goal, |label| {
            self.outgoing(label)
                .iter()
                .map(|edge| edge.target.as_str())
                .collect()
        })
    }

    /// BFS ignoring direction; true if `from` and `goal` are already connected.
    pub(crate) fn reaches_undirected(&self, from: &str, goal: &str) -> bool {
        self.search(from, goal, |label| self.neighbors(label).collect())
    }

    /// Every label reachable from `start` ignoring direction, `start` included.
    pub(crate) fn component_of(&self, start: &'g str) -> HashSet<&'g str> {
        let mut visited: HashSet<&'g str> = HashSet::new();
        let mut queue: VecDeque<&'g str> = VecDeque::from([start]);

        while let Some(current) = queue.pop_front() {
            if visited.insert(current) {
                queue.extend(self.neighbors(current).filter(|n| !visited.contains(n)));
            }
        }

        visited
    }

    fn search<F>(&self, from: &str, goal: &str, next: F) -> bool
    where
        F: Fn(&'g str) -> Vec<&'g str>,
    {
        let Some(start) = self.resolve(from) else {
            return false;
        };

        let mut visited: HashSet<&'g str> = HashSet::new();
        let mut queue: VecDeque<&'g str> = VecDeque::from([start]);

        while let Some(current) = queue.pop_front() {
            if current == goal {
                return true;
            }
            if visited.insert(current) {
                queue.extend(next(current).into_iter().filter(|n| !visited.contains(n)));
            }
        }

        false
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]
    #![allow(clippy::panic)]

    use super::*;
    use crate::model::Edge;

    fn chain() -> Graph {
        Graph::new()
            .add_node(Node::new("a"))
            .and_then(|g| g.add_node(Node::new("b")))
            .and_then(|g| g.add_node(Node::new("c")))
            .and_then(|g| g.add_edge(Edge::new("a", "b")))
            .and_then(|g| g.add_edge(Edge::new("b", "c")))
            .unwrap()
    }

    #[test]
    fn test_dangling_edges_are_skipped() {
        let mut graph = chain();
        graph.edges.push_back(Edge::new("c", "ghost"));
        let adjacency = Adjacency::new(&graph);

        assert_eq!(adjacency.edges().count(), 2);
        assert!(adjacency.outgoing("c").is_empty());
    }

    #[test]
    fn test_ancestors_include_seed() {
        let graph = chain();
        let adjacency = Adjacency::new(&graph);
        let ancestors = adjacency.ancestors_of(["b"]);

        assert_eq!(ancestors, HashSet::from(["a", "b"]));
        assert!(adjacency.ancestors_of(["missing"]).is_empty());
    }

    #[test]
    fn test_forward_vs_undirected_reachability() {
        let graph = chain();
        let adjacency = Adjacency::new(&graph);

        assert!(adjacency.reaches_forward("a", "c"));
        assert!(!adjacency.reaches_forward("c", "a"));
        assert!(adjacency.reaches_undirected("c", "a"));
    }
}
