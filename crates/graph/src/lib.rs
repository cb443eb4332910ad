//! # plexus-graph
//!
//! Immutable graph engine: a persistent graph value with store operations,
//! graph-type constraint validation, diff against a baseline, three-way merge
//! with deletion propagation, and DAG path-tag tracking with upstream
//! exclusion propagation.
//!
//! Every operation takes values and returns new values. Nothing here touches
//! the filesystem except [`io::load_graph`] and [`Template::load`].
//!
//! ```
//! use plexus_graph::{Edge, Graph, GraphType, Node};
//! use plexus_graph::validate::{ConstraintViolation, validate_edge_add};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let graph = Graph::new()
//!     .add_node(Node::new("a"))?
//!     .add_node(Node::new("b"))?
//!     .add_edge(Edge::new("a", "b"))?;
//!
//! let verdict = validate_edge_add(&graph, "b", "a", GraphType::Dag.constraints());
//! assert_eq!(verdict, Err(ConstraintViolation::WouldCreateCycle { from: "b".into(), to: "a".into() }));
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

mod adjacency;
pub mod diff;
pub mod error;
pub mod exclusions;
pub mod graph_type;
pub mod io;
pub mod merge;
pub mod model;
pub mod path_tags;
mod store;
pub mod template;
pub mod tracking;
pub mod validate;

pub use error::{GraphError, GraphResult};
pub use graph_type::{GraphConstraints, GraphType};
pub use model::{EDGE_KEY_SEPARATOR, Edge, EdgeKey, Graph, Node, Props};
pub use template::{Template, TypeMeta};
