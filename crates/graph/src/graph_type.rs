//! Topological policies a graph can be edited under.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GraphError;

/// The fixed set of graph types a template can select.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GraphType {
    /// Undirected, cycles allowed, may be disconnected.
    #[serde(rename = "UCG")]
    Ucg,
    /// Undirected tree: acyclic and connected.
    #[serde(rename = "UTree")]
    UTree,
    /// Directed acyclic graph.
    #[serde(rename = "DAG")]
    Dag,
    /// Directed graph, cycles allowed.
    #[serde(rename = "DG")]
    Dg,
    /// Undirected, acyclic, may be disconnected.
    #[serde(rename = "Forest")]
    Forest,
}

impl GraphType {
    pub const ALL: [Self; 5] = [Self::Ucg, Self::UTree, Self::Dag, Self::Dg, Self::Forest];

    #[must_use]
    pub const fn constraints(self) -> GraphConstraints {
        match self {
            Self::Ucg => GraphConstraints::new(false, false, false),
            Self::UTree => GraphConstraints::new(false, true, true),
            Self::Dag => GraphConstraints::new(true, true, false),
            Self::Dg => GraphConstraints::new(true, false, false),
            Self::Forest => GraphConstraints::new(false, true, false),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ucg => "UCG",
            Self::UTree => "UTree",
            Self::Dag => "DAG",
            Self::Dg => "DG",
            Self::Forest => "Forest",
        }
    }
}

impl fmt::Display for GraphType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GraphType {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|graph_type| graph_type.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| GraphError::UnknownGraphType(s.to_string()))
    }
}

/// Structural rules derived from a [`GraphType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphConstraints {
    pub directed: bool,
    pub acyclic: bool,
    pub must_be_connected: bool,
}

impl GraphConstraints {
    #[must_use]
    pub const fn new(directed: bool, acyclic: bool, must_be_connected: bool) -> Self {
        Self {
            directed,
            acyclic,
            must_be_connected,
        }
    }
}

impl From<GraphType> for GraphConstraints {
    fn from(graph_type: GraphType) -> Self {
        graph_type.constraints()
    }
}
