//! Shared types for lock-tree ingestion.
//!
//! This module defines the normalized intermediate form produced by the
//! ingest pass: a flat sequence of parent/child dependency tuples with
//! source-line provenance, ready for graph construction.

use std::fmt;

use serde::Deserialize;

/// The top level of an `npm ls --json` dump.
///
/// Mirrors only the fields this tool reads; npm emits plenty more
/// (`resolved`, `overridden`, problem annotations) which deserialization
/// ignores. Nested entries stay as raw JSON values because their shape is
/// validated entry by entry during the walk, with path-aware errors.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NpmTree {
    /// The project's own name.
    pub name: Option<String>,
    /// The project's own version.
    pub version: Option<String>,
    /// Direct dependencies, in file order.
    #[serde(default)]
    pub dependencies: serde_json::Map<String, serde_json::Value>,
}

/// A `(name, version)` package identity as it appears in the lock tree.
///
/// Two occurrences of the same name and version refer to the same package
/// and later collapse to a single graph node.
///
/// # Example
///
/// ```
/// use lockscope::parser::PackageRef;
///
/// let p = PackageRef::new("react", "18.2.0");
/// assert_eq!(p.to_string(), "react@18.2.0");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackageRef {
    /// Package name (e.g., "react", "@scope/pkg").
    pub name: String,
    /// Resolved version (e.g., "18.2.0"). Always concrete in `npm ls`
    /// output, never a range.
    pub version: String,
}

impl PackageRef {
    /// Creates a new package reference.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

impl fmt::Display for PackageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}

/// One normalized "parent depends on child" relation from the lock tree.
///
/// Tuples appear in depth-first walk order, which matches the textual
/// order of the input file. This ordering is preserved all the way to the
/// renderers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyTuple {
    /// The dependent package.
    pub parent: PackageRef,
    /// The dependency.
    pub child: PackageRef,
    /// Line number (1-based) of the child's first occurrence in the raw
    /// input. 0 when the position could not be recovered.
    pub child_line: usize,
    /// Depth of the child in the source tree. Depth 1 entries are the
    /// project's direct dependencies.
    pub depth: usize,
}

/// The normalized output of the ingest pass.
///
/// Holds the project's own identity (when the input names one) and the
/// flattened dependency tuples in first-appearance order.
#[derive(Debug, Clone)]
pub struct NormalizedTree {
    /// The project at the root of the tree. `None` when the input's top
    /// level carries no `name`; such dumps describe only the package set.
    pub root: Option<PackageRef>,
    /// Source line of the root entry (normally 1).
    pub root_line: usize,
    /// All dependency relations, depth-first, parents before children.
    pub tuples: Vec<DependencyTuple>,
}

impl NormalizedTree {
    /// Returns true if the tree declares no dependencies at all.
    pub fn is_empty(&self) -> bool {
        self.tuples.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_ref_display() {
        let p = PackageRef::new("lodash", "4.17.21");
        assert_eq!(format!("{}", p), "lodash@4.17.21");
    }

    #[test]
    fn test_package_ref_identity() {
        let a = PackageRef::new("a", "1.0.0");
        let b = PackageRef::new("a", "1.0.0");
        let c = PackageRef::new("a", "2.0.0");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_npm_tree_ignores_extra_fields() {
        let json = r#"{
            "name": "my-app",
            "version": "1.0.0",
            "resolved": "file:..",
            "problems": ["extraneous: x"],
            "dependencies": {"a": {"version": "1.0.0"}}
        }"#;
        let tree: NpmTree = serde_json::from_str(json).unwrap();
        assert_eq!(tree.name.as_deref(), Some("my-app"));
        assert_eq!(tree.dependencies.len(), 1);
    }

    #[test]
    fn test_npm_tree_missing_dependencies_defaults_empty() {
        let tree: NpmTree = serde_json::from_str("{}").unwrap();
        assert!(tree.dependencies.is_empty());
    }

    #[test]
    fn test_normalized_tree_is_empty() {
        let tree = NormalizedTree {
            root: Some(PackageRef::new("app", "1.0.0")),
            root_line: 1,
            tuples: Vec::new(),
        };
        assert!(tree.is_empty());
    }
}
