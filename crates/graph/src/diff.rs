//! # Diff engine
//!
//! Set-difference between a baseline graph and a current graph. Nodes are
//! keyed by label and edges by their `source→target` key; an element present
//! in both is reported as modified only when its property maps differ.
//!
//! The edge key is directional even when the graph type is undirected, so an
//! undirected edge re-recorded in the opposite direction shows up as one
//! removal plus one addition.

use std::collections::HashMap;
use std::fmt;

use im::Vector;
use serde::Serialize;

use crate::model::{Graph, Keyed, Props};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffKind {
    Node,
    Edge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffAction {
    Added,
    Modified,
    Removed,
}

impl fmt::Display for DiffAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Added => write!(f, "added"),
            Self::Modified => write!(f, "modified"),
            Self::Removed => write!(f, "removed"),
        }
    }
}

/// One changed node or edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffEntry {
    pub kind: DiffKind,
    pub action: DiffAction,
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_props: Option<Props>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_props: Option<Props>,
}

impl DiffEntry {
    #[must_use]
    pub fn is_node(&self) -> bool {
        self.kind == DiffKind::Node
    }

    #[must_use]
    pub fn is_edge(&self) -> bool {
        self.kind == DiffKind::Edge
    }
}

/// Compute what changed from `base` to `current`.
///
/// Entries come nodes first, then edges; within each kind they are grouped
/// as added, modified, removed. Callers needing a stable order sort by key.
///
/// # Examples
///
/// ```
/// use plexus_graph::{Graph, Node, diff::{compute_diff, DiffAction}};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let base = Graph::new().add_node(Node::new("a"))?;
/// let current = base.add_node(Node::new("b"))?;
///
/// let entries = compute_diff(&base, &current);
/// assert_eq!(entries.len(), 1);
/// assert_eq!(entries[0].action, DiffAction::Added);
/// assert_eq!(entries[0].key, "b");
/// assert!(compute_diff(&current, &current).is_empty());
/// # Ok(())
/// # }
/// ```
#[must_use]
pub fn compute_diff(base: &Graph, current: &Graph) -> Vec<DiffEntry> {
    let mut entries = diff_elements(DiffKind::Node, base.nodes(), current.nodes());
    entries.extend(diff_elements(DiffKind::Edge, base.edges(), current.edges()));
    entries
}

fn diff_elements<T>(kind: DiffKind, base: &Vector<T>, current: &Vector<T>) -> Vec<DiffEntry>
where
    T: Keyed,
    T::Key: fmt::Display,
{
    let base_props: HashMap<T::Key, &Props> =
        base.iter().map(|el| (el.identity(), el.props())).collect();
    let current_keys: HashMap<T::Key, &Props> =
        current.iter().map(|el| (el.identity(), el.props())).collect();

    let entry = |action, key: &T::Key, old: Option<&Props>, new: Option<&Props>| DiffEntry {
        kind,
        action,
        key: key.to_string(),
        old_props: old.cloned(),
        new_props: new.cloned(),
    };

    let added = current
        .iter()
        .map(Keyed::identity)
        .filter(|key| !base_props.contains_key(key))
        .map(|key| entry(DiffAction::Added, &key, None, current_keys.get(&key).copied()));

    let modified = current.iter().filter_map(|el| {
        let key = el.identity();
        let old = base_props.get(&key).copied()?;
        (old != el.props()).then(|| entry(DiffAction::Modified, &key, Some(old), Some(el.props())))
    });

    let removed = base
        .iter()
        .filter(|el| !current_keys.contains_key(&el.identity()))
        .map(|el| entry(DiffAction::Removed, &el.identity(), Some(el.props()), None));

    added.chain(modified).chain(removed).collect()
}

/// Counts per kind and action, for reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffSummary {
    pub nodes_added: usize,
    pub nodes_modified: usize,
    pub nodes_removed: usize,
    pub edges_added: usize,
    pub edges_modified: usize,
    pub edges_removed: usize,
}

impl DiffSummary {
    #[must_use]
    pub fn from_entries(entries: &[DiffEntry]) -> Self {
        entries.iter().fold(Self::default(), |mut summary, entry| {
            let slot = match (entry.kind, entry.action) {
                (DiffKind::Node, DiffAction::Added) => &mut summary.nodes_added,
                (DiffKind::Node, DiffAction::Modified) => &mut summary.nodes_modified,
                (DiffKind::Node, DiffAction::Removed) => &mut summary.nodes_removed,
                (DiffKind::Edge, DiffAction::Added) => &mut summary.edges_added,
                (DiffKind::Edge, DiffAction::Modified) => &mut summary.edges_modified,
                (DiffKind::Edge, DiffAction::Removed) => &mut summary.edges_removed,
            };
            *slot += 1;
            summary
        })
    }

    #[must_use]
    pub const fn total(&self) -> usize {
        self.nodes_added
            + self.nodes_modified
            + self.nodes_removed
            + self.edges_added
            + self.edges_modified
            + self.edges_removed
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.total() == 0
    }
}
