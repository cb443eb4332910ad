//! # Graph JSON interchange
//!
//! ```json
//! { "nodes": [ { "label": "a", "type": null, "props": {} } ],
//!   "edges": [ { "source": "a", "target": "b", "type": null, "props": {} } ] }
//! ```
//!
//! Import validates the whole payload before building a [`Graph`]; the
//! `Deserialize` impl goes through the same checks, so a `Graph` read from
//! any serde format upholds the store's invariants.

use std::collections::HashSet;
use std::path::Path;

use im::Vector;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use crate::model::{EDGE_KEY_SEPARATOR, Edge, EdgeKey, Graph, Node, Props};

/// Why a graph payload was rejected. `Display` is the user-facing message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImportError {
    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    #[error("Graph must be a JSON object")]
    NotAnObject,

    #[error("Graph must have a '{0}' array")]
    MissingArray(&'static str),

    #[error("{kind} at index {index} must be an object")]
    NotAnElement { kind: &'static str, index: usize },

    #[error("Node at index {index} must have a non-empty string label")]
    MissingLabel { index: usize },

    #[error("Node at index {index} has label '{label}' containing the reserved '→' separator")]
    ReservedLabel { index: usize, label: String },

    #[error("Duplicate node label '{0}'")]
    DuplicateLabel(String),

    #[error("Edge at index {index} must have a string '{field}'")]
    MissingEndpoint { index: usize, field: &'static str },

    #[error("Edge at index {index} references unknown node '{label}'")]
    UnknownEndpoint { index: usize, label: String },

    #[error("Duplicate edge '{0}'")]
    DuplicateEdge(EdgeKey),

    #[error("{kind} at index {index} has a 'type' that is neither a string nor null")]
    InvalidType { kind: &'static str, index: usize },

    #[error("{kind} at index {index} must have 'props' as an object of strings")]
    InvalidProps { kind: &'static str, index: usize },
}

pub type ImportResult<T> = std::result::Result<T, ImportError>;

/// Parse and validate a graph from JSON text.
///
/// # Errors
///
/// Returns the first [`ImportError`] found in the payload.
///
/// # Examples
///
/// ```
/// use plexus_graph::io::parse_graph;
///
/// let graph = parse_graph(r#"{"nodes":[{"label":"a"}],"edges":[]}"#).unwrap();
/// assert!(graph.contains_node("a"));
///
/// let err = parse_graph(r#"{"nodes":[{"label":"a"}],"edges":[{"source":"a","target":"b"}]}"#);
/// assert_eq!(
///     err.map_err(|e| e.to_string()),
///     Err("Edge at index 0 references unknown node 'b'".to_string())
/// );
/// ```
pub fn parse_graph(text: &str) -> ImportResult<Graph> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| ImportError::InvalidJson(e.to_string()))?;
    graph_from_value(&value)
}

/// Validate an already-parsed JSON value as a graph.
///
/// # Errors
///
/// Returns the first [`ImportError`] found in the payload.
pub fn graph_from_value(value: &Value) -> ImportResult<Graph> {
    let object = value.as_object().ok_or(ImportError::NotAnObject)?;
    let raw_nodes = array_field(object, "nodes")?;
    let raw_edges = array_field(object, "edges")?;

    let mut labels: HashSet<&str> = HashSet::with_capacity(raw_nodes.len());
    let mut nodes: Vector<Node> = Vector::new();
    for (index, raw) in raw_nodes.iter().enumerate() {
        let fields = raw
            .as_object()
            .ok_or(ImportError::NotAnElement { kind: "Node", index })?;
        let label = fields
            .get("label")
            .and_then(Value::as_str)
            .filter(|label| !label.is_empty())
            .ok_or(ImportError::MissingLabel { index })?;
        if label.contains(EDGE_KEY_SEPARATOR) {
            return Err(ImportError::ReservedLabel {
                index,
                label: label.to_string(),
            });
        }
        if !labels.insert(label) {
            return Err(ImportError::DuplicateLabel(label.to_string()));
        }
        nodes.push_back(Node {
            label: label.to_string(),
            node_type: element_type(fields, "Node", index)?,
            props: element_props(fields, "Node", index)?,
        });
    }

    let mut keys: HashSet<EdgeKey> = HashSet::with_capacity(raw_edges.len());
    let mut edges: Vector<Edge> = Vector::new();
    for (index, raw) in raw_edges.iter().enumerate() {
        let fields = raw
            .as_object()
            .ok_or(ImportError::NotAnElement { kind: "Edge", index })?;
        let source = endpoint(fields, "source", index, &labels)?;
        let target = endpoint(fields, "target", index, &labels)?;
        let key = EdgeKey::new(source, target);
        if keys.contains(&key) {
            return Err(ImportError::DuplicateEdge(key));
        }
        keys.insert(key);
        edges.push_back(Edge {
            source: source.to_string(),
            target: target.to_string(),
            edge_type: element_type(fields, "Edge", index)?,
            props: element_props(fields, "Edge", index)?,
        });
    }

    debug!(nodes = nodes.len(), edges = edges.len(), "Imported graph");
    Ok(Graph::from_parts(nodes, edges))
}

/// Load a graph file. JSON and TOML are both accepted.
///
/// # Errors
///
/// Returns a `plexus_core::Error` if the file cannot be read or the payload
/// is not a valid graph.
pub fn load_graph(path: &Path) -> plexus_core::Result<Graph> {
    plexus_core::load_document(path)
}

/// # Errors
///
/// Serialization of a graph cannot fail in practice; the `Result` mirrors
/// `serde_json`.
pub fn to_json_string(graph: &Graph) -> serde_json::Result<String> {
    serde_json::to_string(graph)
}

/// # Errors
///
/// See [`to_json_string`].
pub fn to_json_pretty(graph: &Graph) -> serde_json::Result<String> {
    serde_json::to_string_pretty(graph)
}

impl<'de> Deserialize<'de> for Graph {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        graph_from_value(&value).map_err(serde::de::Error::custom)
    }
}

fn array_field<'v>(object: &'v Map<String, Value>, field: &'static str) -> ImportResult<&'v Vec<Value>> {
    object
        .get(field)
        .and_then(Value::as_array)
        .ok_or(ImportError::MissingArray(field))
}

fn endpoint<'v>(
    fields: &'v Map<String, Value>,
    field: &'static str,
    index: usize,
    labels: &HashSet<&str>,
) -> ImportResult<&'v str> {
    let label = fields
        .get(field)
        .and_then(Value::as_str)
        .ok_or(ImportError::MissingEndpoint { index, field })?;
    if labels.contains(label) {
        Ok(label)
    } else {
        Err(ImportError::UnknownEndpoint {
            index,
            label: label.to_string(),
        })
    }
}

fn element_type(
    fields: &Map<String, Value>,
    kind: &'static str,
    index: usize,
) -> ImportResult<Option<String>> {
    match fields.get("type") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(element_type)) => Ok(Some(element_type.clone())),
        Some(_) => Err(ImportError::InvalidType { kind, index }),
    }
}

fn element_props(fields: &Map<String, Value>, kind: &'static str, index: usize) -> ImportResult<Props> {
    match fields.get("props") {
        None => Ok(Props::new()),
        Some(Value::Object(props)) => props
            .iter()
            .map(|(key, value)| {
                value
                    .as_str()
                    .map(|value| (key.clone(), value.to_string()))
                    .ok_or(ImportError::InvalidProps { kind, index })
            })
            .collect(),
        Some(_) => Err(ImportError::InvalidProps { kind, index }),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]
    #![allow(clippy::panic)]

    use super::*;
    use serde_json::json;

    fn err(value: &Value) -> String {
        graph_from_value(value).unwrap_err().to_string()
    }

    #[test]
    fn test_missing_fields_normalize() {
        let graph = graph_from_value(&json!({
            "nodes": [{"label": "a"}, {"label": "b", "type": "reporter", "props": {"k": "v"}}],
            "edges": [{"source": "a", "target": "b"}]
        }))
        .unwrap();

        let a = graph.node("a").unwrap();
        assert_eq!(a.node_type, None);
        assert!(a.props.is_empty());
        assert_eq!(graph.node("b").and_then(|b| b.node_type.clone()), Some("reporter".into()));
        assert!(graph.edge("a", "b").unwrap().props.is_empty());
    }

    #[test]
    fn test_export_shape() {
        let graph = graph_from_value(&json!({
            "nodes": [{"label": "a"}, {"label": "b"}],
            "edges": [{"source": "a", "target": "b", "props": {"w": "1"}}]
        }))
        .unwrap();

        let exported: Value = serde_json::from_str(&to_json_string(&graph).unwrap()).unwrap();
        assert_eq!(
            exported,
            json!({
                "nodes": [
                    {"label": "a", "type": null, "props": {}},
                    {"label": "b", "type": null, "props": {}}
                ],
                "edges": [{"source": "a", "target": "b", "type": null, "props": {"w": "1"}}]
            })
        );
    }

    #[test]
    fn test_exported_text_imports_to_equal_graph() {
        let graph = parse_graph(
            r#"{"nodes":[{"label":"x","type":"t","props":{"a":"1"}},{"label":"y"}],
                "edges":[{"source":"y","target":"x","type":"link"}]}"#,
        )
        .unwrap();
        let text = to_json_pretty(&graph).unwrap();
        assert_eq!(parse_graph(&text).unwrap(), graph);
    }

    #[test]
    fn test_structural_rejections() {
        assert_eq!(err(&json!([])), "Graph must be a JSON object");
        assert_eq!(err(&json!({"nodes": []})), "Graph must have a 'edges' array");
        assert_eq!(err(&json!({"nodes": {}, "edges": []})), "Graph must have a 'nodes' array");
        assert_eq!(err(&json!({"nodes": [1], "edges": []})), "Node at index 0 must be an object");
    }

    #[test]
    fn test_label_rejections() {
        assert_eq!(
            err(&json!({"nodes": [{"label": ""}], "edges": []})),
            "Node at index 0 must have a non-empty string label"
        );
        assert_eq!(
            err(&json!({"nodes": [{"label": "a"}, {"label": 7}], "edges": []})),
            "Node at index 1 must have a non-empty string label"
        );
        assert_eq!(
            err(&json!({"nodes": [{"label": "a"}, {"label": "a"}], "edges": []})),
            "Duplicate node label 'a'"
        );
        assert_eq!(
            err(&json!({"nodes": [{"label": "a→b"}, {"label": "c"}], "edges": []})),
            "Node at index 0 has label 'a→b' containing the reserved '→' separator"
        );
    }

    #[test]
    fn test_edge_rejections() {
        let nodes = json!([{"label": "a"}, {"label": "b"}]);
        assert_eq!(
            err(&json!({"nodes": nodes.clone(), "edges": [{"target": "b"}]})),
            "Edge at index 0 must have a string 'source'"
        );
        assert_eq!(
            err(&json!({"nodes": nodes.clone(), "edges": [{"source": "a", "target": "zz"}]})),
            "Edge at index 0 references unknown node 'zz'"
        );
        assert_eq!(
            err(&json!({"nodes": nodes.clone(), "edges": [{"source": "a", "target": "b"}, {"source": "a", "target": "b"}]})),
            "Duplicate edge 'a→b'"
        );
    }

    #[test]
    fn test_type_and_props_rejections() {
        assert_eq!(
            err(&json!({"nodes": [{"label": "a", "type": 3}], "edges": []})),
            "Node at index 0 has a 'type' that is neither a string nor null"
        );
        assert_eq!(
            err(&json!({"nodes": [{"label": "a", "props": []}], "edges": []})),
            "Node at index 0 must have 'props' as an object of strings"
        );
        assert_eq!(
            err(&json!({"nodes": [{"label": "a", "props": {"n": 1}}], "edges": []})),
            "Node at index 0 must have 'props' as an object of strings"
        );
    }

    #[test]
    fn test_invalid_json_text() {
        assert!(matches!(parse_graph("{nodes"), Err(ImportError::InvalidJson(_))));
    }

    #[test]
    fn test_deserialize_runs_validation() {
        let bad: Result<Graph, _> =
            serde_json::from_str(r#"{"nodes":[],"edges":[{"source":"a","target":"b"}]}"#);
        assert!(bad.unwrap_err().to_string().contains("unknown node 'a'"));
    }

    #[test]
    fn test_load_graph_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.json");
        std::fs::write(&path, r#"{"nodes":[{"label":"a"}],"edges":[]}"#).unwrap();

        let graph = load_graph(&path).unwrap();
        assert_eq!(graph.node_count(), 1);
    }
}
