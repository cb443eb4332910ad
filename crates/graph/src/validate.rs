//! # Constraint validation
//!
//! Graph-type-aware structural rules:
//! - self-loop and duplicate rejection
//! - cycle prevention on edge insertion (direction-specific)
//! - whole-graph cycle detection (DFS for directed, union-find for undirected)
//! - connectivity checks used to warn before destructive edits
//!
//! Rejections are returned as [`ConstraintViolation`] values whose `Display`
//! is the reason shown to the user.

use std::collections::{HashMap, HashSet};

use petgraph::unionfind::UnionFind;
use thiserror::Error;

use crate::adjacency::Adjacency;
use crate::graph_type::GraphConstraints;
use crate::model::Graph;

/// Why an edit or a graph breaks its graph type's rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConstraintViolation {
    #[error("Node '{0}' does not exist")]
    UnknownNode(String),

    #[error("Self-loops are not allowed ('{0}')")]
    SelfLoop(String),

    #[error("An edge between '{from}' and '{to}' already exists")]
    DuplicateEdge { from: String, to: String },

    #[error("Adding '{from}' → '{to}' would create a cycle")]
    WouldCreateCycle { from: String, to: String },

    #[error("Graph contains a cycle")]
    CycleDetected,

    #[error("Graph is not connected")]
    NotConnected,
}

/// Result of validating a single edit
pub type ValidationResult = std::result::Result<(), ConstraintViolation>;

/// Check whether `source → target` may be added under `constraints`.
///
/// Checks run in order: endpoints exist, no self-loop, no duplicate (either
/// direction when undirected, exact key when directed), and, for acyclic
/// types, no cycle would be closed.
///
/// # Errors
///
/// Returns the first [`ConstraintViolation`] encountered.
///
/// # Examples
///
/// ```
/// use plexus_graph::{Edge, Graph, GraphType, Node, validate::validate_edge_add};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let graph = Graph::new()
///     .add_node(Node::new("a"))?
///     .add_node(Node::new("b"))?
///     .add_edge(Edge::new("a", "b"))?;
///
/// let dag = GraphType::Dag.constraints();
/// assert!(validate_edge_add(&graph, "b", "a", dag).is_err());
/// assert!(validate_edge_add(&graph, "a", "a", dag).is_err());
/// assert!(validate_edge_add(&graph, "b", "a", GraphType::Dg.constraints()).is_ok());
/// # Ok(())
/// # }
/// ```
pub fn validate_edge_add(
    graph: &Graph,
    source: &str,
    target: &str,
    constraints: GraphConstraints,
) -> ValidationResult {
    if source == target {
        return Err(ConstraintViolation::SelfLoop(source.to_string()));
    }

    for label in [source, target] {
        if !graph.contains_node(label) {
            return Err(ConstraintViolation::UnknownNode(label.to_string()));
        }
    }

    let duplicate = if constraints.directed {
        graph.contains_edge(source, target)
    } else {
        graph.edges().iter().any(|edge| edge.joins(source, target))
    };
    if duplicate {
        return Err(ConstraintViolation::DuplicateEdge {
            from: source.to_string(),
            to: target.to_string(),
        });
    }

    if constraints.acyclic && would_create_cycle(graph, source, target, constraints.directed) {
        return Err(ConstraintViolation::WouldCreateCycle {
            from: source.to_string(),
            to: target.to_string(),
        });
    }

    Ok(())
}

/// Would adding `source → target` close a cycle?
///
/// Directed: `source` is reachable from `target`. Undirected: the endpoints
/// are already connected.
#[must_use]
pub fn would_create_cycle(graph: &Graph, source: &str, target: &str, directed: bool) -> bool {
    let adjacency = Adjacency::new(graph);
    if directed {
        adjacency.reaches_forward(target, source)
    } else {
        adjacency.reaches_undirected(source, target)
    }
}

/// Does the graph contain a cycle?
#[must_use]
pub fn has_cycle(graph: &Graph, directed: bool) -> bool {
    if directed {
        has_directed_cycle(graph)
    } else {
        has_undirected_cycle(graph)
    }
}

fn has_directed_cycle(graph: &Graph) -> bool {
    let adjacency = Adjacency::new(graph);
    let mut visited: HashSet<&str> = HashSet::new();

    graph
        .labels()
        .any(|label| reaches_back_edge(&adjacency, label, &mut visited))
}

/// Depth-first search from `root` with an explicit stack of
/// `(node, next outgoing edge index)` frames, so path length never grows the
/// call stack.
fn reaches_back_edge<'g>(
    adjacency: &Adjacency<'g>,
    root: &'g str,
    visited: &mut HashSet<&'g str>,
) -> bool {
    if !visited.insert(root) {
        return false;
    }

    let mut on_stack: HashSet<&'g str> = HashSet::from([root]);
    let mut frames: Vec<(&'g str, usize)> = vec![(root, 0)];

    while let Some((label, next)) = frames.last_mut() {
        let Some(edge) = adjacency.outgoing(label).get(*next) else {
            on_stack.remove(*label);
            frames.pop();
            continue;
        };
        *next += 1;

        let target = edge.target.as_str();
        if on_stack.contains(target) {
            return true;
        }
        if visited.insert(target) {
            on_stack.insert(target);
            frames.push((target, 0));
        }
    }

    false
}

fn has_undirected_cycle(graph: &Graph) -> bool {
    let index: HashMap<&str, usize> = graph
        .labels()
        .enumerate()
        .map(|(i, label)| (label, i))
        .collect();
    let mut sets = UnionFind::<usize>::new(index.len());

    graph
        .edges()
        .iter()
        .filter_map(|edge| {
            Some((
                *index.get(edge.source.as_str())?,
                *index.get(edge.target.as_str())?,
            ))
        })
        .any(|(a, b)| !sets.union(a, b))
}

/// Is every node reachable from every other, ignoring direction?
///
/// The empty graph counts as connected.
#[must_use]
pub fn is_connected(graph: &Graph) -> bool {
    let adjacency = Adjacency::new(graph);
    let Some(start) = graph.labels().next() else {
        return true;
    };

    adjacency.component_of(start).len() == graph.node_count()
}

/// Would removing `label` leave the graph disconnected?
#[must_use]
pub fn would_disconnect_on_node_remove(graph: &Graph, label: &str) -> bool {
    !is_connected(&graph.remove_node(label))
}

/// Would removing the edge `source → target` leave the graph disconnected?
#[must_use]
pub fn would_disconnect_on_edge_remove(graph: &Graph, source: &str, target: &str) -> bool {
    !is_connected(&graph.remove_edge(source, target))
}

/// Check a whole graph against its constraints, e.g. after a merge or import.
///
/// Returns every violation found; an empty list means the graph conforms.
#[must_use]
pub fn validate_graph(graph: &Graph, constraints: GraphConstraints) -> Vec<ConstraintViolation> {
    let mut violations: Vec<ConstraintViolation> = graph
        .edges()
        .iter()
        .filter(|edge| edge.source == edge.target)
        .map(|edge| ConstraintViolation::SelfLoop(edge.source.clone()))
        .collect();

    if !constraints.directed {
        let mut seen: HashSet<(&str, &str)> = HashSet::new();
        violations.extend(
            graph
                .edges()
                .iter()
                .filter(|edge| edge.source != edge.target)
                .filter_map(|edge| {
                    let pair = if edge.source <= edge.target {
                        (edge.source.as_str(), edge.target.as_str())
                    } else {
                        (edge.target.as_str(), edge.source.as_str())
                    };
                    (!seen.insert(pair)).then(|| ConstraintViolation::DuplicateEdge {
                        from: edge.source.clone(),
                        to: edge.target.clone(),
                    })
                }),
        );
    }

    if constraints.acyclic && has_cycle(graph, constraints.directed) {
        violations.push(ConstraintViolation::CycleDetected);
    }

    if constraints.must_be_connected && !is_connected(graph) {
        violations.push(ConstraintViolation::NotConnected);
    }

    violations
}
