//! Graph files on disk: import validation, export shape and whole-graph checks.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

use plexus_graph::io::{load_graph, parse_graph, to_json_pretty};
use plexus_graph::validate::{ConstraintViolation, validate_graph};
use plexus_graph::{GraphType, Template};

type TestResult = Result<(), Box<dyn std::error::Error>>;

const TREE: &str = r#"{
  "nodes": [
    {"label": "root", "type": "category"},
    {"label": "left", "props": {"weight": "2"}},
    {"label": "right", "type": null}
  ],
  "edges": [
    {"source": "root", "target": "left"},
    {"source": "root", "target": "right", "type": "owns"}
  ]
}"#;

#[test]
fn test_file_round_trip() -> TestResult {
    // GIVEN: a graph written to disk
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("tree.json");
    std::fs::write(&path, TREE)?;

    // WHEN: loading it and writing it back out
    let graph = load_graph(&path)?;
    let out = dir.path().join("out.json");
    std::fs::write(&out, to_json_pretty(&graph)?)?;

    // THEN: the re-read graph is identical
    assert_eq!(load_graph(&out)?, graph);
    assert_eq!(graph.edge("root", "right").and_then(|e| e.edge_type.clone()), Some("owns".into()));
    Ok(())
}

#[test]
fn test_invalid_file_reports_the_import_message() -> TestResult {
    // GIVEN: a graph file with a dangling edge
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("broken.json");
    std::fs::write(&path, r#"{"nodes":[{"label":"a"}],"edges":[{"source":"a","target":"ghost"}]}"#)?;

    // WHEN: loading it
    let result = load_graph(&path);

    // THEN: the error carries the import reason
    let message = result.err().map(|e| e.to_string()).unwrap_or_default();
    assert!(message.contains("references unknown node 'ghost'"), "{message}");
    Ok(())
}

#[test]
fn test_imported_graph_checked_against_each_type() -> TestResult {
    // GIVEN: a three node tree
    let graph = parse_graph(TREE)?;

    // THEN: it satisfies every type's constraints
    for graph_type in GraphType::ALL {
        assert!(validate_graph(&graph, graph_type.constraints()).is_empty(), "{graph_type}");
    }

    // WHEN: a back edge is imported
    let cyclic = parse_graph(
        r#"{"nodes":[{"label":"a"},{"label":"b"}],
            "edges":[{"source":"a","target":"b"},{"source":"b","target":"a"}]}"#,
    )?;

    // THEN: acyclic directed types reject it, cyclic ones accept it
    assert!(validate_graph(&cyclic, GraphType::Dag.constraints()).contains(&ConstraintViolation::CycleDetected));
    assert!(validate_graph(&cyclic, GraphType::Dg.constraints()).is_empty());
    Ok(())
}

#[test]
fn test_template_from_toml_drives_validation() -> TestResult {
    // GIVEN: a TOML template for an undirected tree
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("template.toml");
    std::fs::write(&path, "graphType = \"UTree\"\nspecialTypes = []\n")?;

    // WHEN: loading it and checking a forest of two trees
    let template = Template::load(&path)?;
    let forest = parse_graph(r#"{"nodes":[{"label":"a"},{"label":"b"}],"edges":[]}"#)?;

    // THEN: the tree must be connected
    assert_eq!(template.graph_type, GraphType::UTree);
    assert_eq!(validate_graph(&forest, template.constraints()), vec![ConstraintViolation::NotConnected]);
    Ok(())
}
