//! Graph module for dependency relationship modeling.
//!
//! Provides the [`DependencyGraph`] built from a normalized lock tree:
//! `(name, version)`-keyed nodes, deduplicated directed edges, and
//! deterministic first-appearance ordering for rendering.
//!
//! # Example
//!
//! ```
//! use lockscope::graph::DependencyGraph;
//! use lockscope::parser::parse_str;
//!
//! let tree = parse_str(
//!     r#"{"name": "app", "version": "1.0.0", "dependencies": {"a": {"version": "1.0.0"}}}"#,
//! ).unwrap();
//! let graph = DependencyGraph::from_tree(&tree).unwrap();
//! assert_eq!(graph.node_count(), 2); // the project + a
//! ```

mod dependency_graph;

pub use dependency_graph::{BuildError, DependencyEdge, DependencyGraph, PackageNode};
