//! Graph-store error types

use thiserror::Error;

use crate::model::EdgeKey;

/// Errors raised by structural graph operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    #[error("Node already exists: {0}")]
    NodeAlreadyExists(String),

    #[error("Edge not found: {0}")]
    EdgeNotFound(EdgeKey),

    #[error("Edge already exists: {0}")]
    EdgeAlreadyExists(EdgeKey),

    #[error("Node label cannot be empty")]
    EmptyLabel,

    #[error("Node label '{0}' contains the reserved edge key separator '→'")]
    ReservedLabel(String),

    #[error("Invalid edge key '{0}' (expected 'source→target')")]
    InvalidEdgeKey(String),

    #[error("Unknown graph type '{0}' (expected one of UCG, UTree, DAG, DG, Forest)")]
    UnknownGraphType(String),
}

impl GraphError {
    pub fn node_not_found(label: impl Into<String>) -> Self {
        Self::NodeNotFound(label.into())
    }

    pub fn node_already_exists(label: impl Into<String>) -> Self {
        Self::NodeAlreadyExists(label.into())
    }

    pub fn edge_not_found(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self::EdgeNotFound(EdgeKey::new(source, target))
    }

    pub fn edge_already_exists(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self::EdgeAlreadyExists(EdgeKey::new(source, target))
    }
}

/// Result type for graph-store operations
pub type GraphResult<T> = std::result::Result<T, GraphError>;
