//! Template configuration consumed by the validator and the path tracker.
//!
//! Only `graphType` and `specialTypes` affect the engine; node and edge type
//! metadata is cosmetic and carried through untouched.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use plexus_core::{Error, Result, load_document};
use serde::{Deserialize, Serialize};

use crate::graph_type::{GraphConstraints, GraphType};

/// Cosmetic description of a node or edge type (colour, shape, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeMeta {
    pub id: String,
    #[serde(flatten)]
    pub display: BTreeMap<String, serde_json::Value>,
}

/// Editor template: a graph type plus the ordered special type ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub graph_type: GraphType,

    /// Node-type ids acting as path anchors, in canonical order.
    #[serde(default)]
    pub special_types: Vec<String>,

    #[serde(default)]
    pub node_types: Vec<TypeMeta>,

    #[serde(default)]
    pub edge_types: Vec<TypeMeta>,
}

impl Template {
    #[must_use]
    pub const fn new(graph_type: GraphType) -> Self {
        Self {
            graph_type,
            special_types: Vec::new(),
            node_types: Vec::new(),
            edge_types: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_special_types<I, S>(mut self, special_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.special_types = special_types.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub const fn constraints(&self) -> GraphConstraints {
        self.graph_type.constraints()
    }

    /// Path tracking is meaningful only for DAGs with at least one anchor type.
    #[must_use]
    pub fn path_tracking_enabled(&self) -> bool {
        self.graph_type == GraphType::Dag && !self.special_types.is_empty()
    }

    /// Validate the template.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidRecord` if a special type id is empty or repeated.
    pub fn validate(&self) -> Result<()> {
        if self.special_types.iter().any(String::is_empty) {
            return Err(Error::invalid_record("special type ids must be non-empty"));
        }

        let mut seen = HashSet::new();
        if let Some(duplicate) = self.special_types.iter().find(|id| !seen.insert(id.as_str())) {
            return Err(Error::invalid_record(format!(
                "special type '{duplicate}' is listed more than once"
            )));
        }

        Ok(())
    }

    /// Load a template from a `.json` or `.toml` file and validate it.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if
    /// [`Template::validate`] fails.
    pub fn load(path: &Path) -> Result<Self> {
        let template: Self = load_document(path)?;
        template.validate()?;
        tracing::debug!(
            graph_type = %template.graph_type,
            special_types = template.special_types.len(),
            "Template loaded"
        );
        Ok(template)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]
    #![allow(clippy::panic)]

    use super::*;
    use plexus_core::{DocumentFormat, parse_document};

    #[test]
    fn test_parse_json_template_with_cosmetics() {
        let json = r##"{
            "graphType": "DAG",
            "specialTypes": ["reporter", "category"],
            "nodeTypes": [{"id": "reporter", "color": "#f00"}]
        }"##;
        let template: Template = parse_document(json, DocumentFormat::Json).unwrap();

        assert_eq!(template.graph_type, GraphType::Dag);
        assert_eq!(template.special_types, vec!["reporter", "category"]);
        assert_eq!(template.node_types.len(), 1);
        assert!(template.edge_types.is_empty());
        assert!(template.path_tracking_enabled());
    }

    #[test]
    fn test_parse_toml_template() {
        let toml = "graphType = \"UTree\"\n";
        let template: Template = parse_document(toml, DocumentFormat::Toml).unwrap();

        assert_eq!(template.graph_type, GraphType::UTree);
        assert!(template.special_types.is_empty());
        assert!(!template.path_tracking_enabled());
        assert!(template.constraints().must_be_connected);
    }

    #[test]
    fn test_validate_rejects_duplicate_special_types() {
        let template = Template::new(GraphType::Dag).with_special_types(["a", "b", "a"]);
        assert!(matches!(template.validate(), Err(Error::InvalidRecord { .. })));
    }

    #[test]
    fn test_validate_rejects_empty_special_type() {
        let template = Template::new(GraphType::Dag).with_special_types([""]);
        assert!(template.validate().is_err());
    }

    #[test]
    fn test_path_tracking_requires_dag() {
        let template = Template::new(GraphType::Dg).with_special_types(["reporter"]);
        assert!(!template.path_tracking_enabled());
    }

    #[test]
    fn test_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("template.json");
        std::fs::write(&path, r#"{"graphType":"Forest","specialTypes":["x"]}"#).unwrap();

        let template = Template::load(&path).unwrap();
        assert_eq!(template.graph_type, GraphType::Forest);
    }
}
