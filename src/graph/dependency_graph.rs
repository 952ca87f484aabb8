//! Dependency graph implementation using petgraph.
//!
//! Builds a directed graph from the normalized lock tree: nodes are
//! `(name, version)` package identities, edges point from a dependent to
//! its dependency. Repeated occurrences of the same identity collapse to
//! one node, so a deduplicated npm tree becomes the DAG-like graph it
//! really describes.

use std::collections::{HashMap, HashSet};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use tracing::debug;

use crate::parser::NormalizedTree;

/// Errors that can occur while building the graph.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// A tuple carried an empty version or a blank name. The whole build
    /// aborts; downstream metrics assume a structurally valid graph.
    #[error("malformed entry: `{name}@{version}`")]
    MalformedEntry {
        /// The offending package name.
        name: String,
        /// The offending version string.
        version: String,
    },
}

/// A node in the dependency graph: one package identity plus its computed
/// annotations.
#[derive(Debug, Clone)]
pub struct PackageNode {
    /// Package name.
    pub name: String,
    /// Resolved version.
    pub version: String,
    /// First-occurrence line in the source file (1-based, 0 = unknown).
    pub line: usize,
    /// True for the project's own top-level dependencies (depth 1).
    pub direct: bool,
    /// In-degree, filled by the metrics engine.
    pub dependent_count: Option<usize>,
    /// Out-degree, filled by the metrics engine.
    pub dependency_count: Option<usize>,
    /// PageRank-style influence score, filled by the metrics engine.
    pub influence: Option<f64>,
}

impl PackageNode {
    fn new(name: &str, version: &str, line: usize, direct: bool) -> Self {
        Self {
            name: name.to_string(),
            version: version.to_string(),
            line,
            direct,
            dependent_count: None,
            dependency_count: None,
            influence: None,
        }
    }

    /// The `name@version` identity string.
    pub fn id(&self) -> String {
        format!("{}@{}", self.name, self.version)
    }
}

/// An edge in the dependency graph. Endpoints carry all the information;
/// the weight exists so petgraph edge storage stays explicit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DependencyEdge;

/// A directed graph of package dependencies.
///
/// Nodes are keyed by `(name, version)`; two occurrences of the same
/// identity are one node. Duplicate edges between the same ordered pair
/// are dropped. First-appearance order of nodes and insertion order of
/// edges are kept in side lists so rendering is deterministic regardless
/// of the adjacency representation.
///
/// # Example
///
/// ```
/// use lockscope::graph::DependencyGraph;
/// use lockscope::parser::parse_str;
///
/// let tree = parse_str(
///     r#"{"dependencies": {"a": {"version": "1.0.0", "dependencies": {"b": {"version": "2.0.0"}}}}}"#,
/// ).unwrap();
/// let graph = DependencyGraph::from_tree(&tree).unwrap();
///
/// // a and b; the input names no project, so none is added.
/// assert_eq!(graph.node_count(), 2);
/// assert_eq!(graph.edge_count(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    /// The underlying directed graph.
    graph: DiGraph<PackageNode, DependencyEdge>,
    /// Maps (name, version) identities to node indices for O(1) lookup.
    node_indices: HashMap<(String, String), NodeIndex>,
    /// Node indices in first-appearance order.
    order: Vec<NodeIndex>,
    /// Edges in insertion order, already deduplicated.
    edge_order: Vec<(NodeIndex, NodeIndex)>,
    /// The project's own node, if the tree had any dependencies.
    root: Option<NodeIndex>,
}

impl DependencyGraph {
    /// Builds a graph from a normalized lock tree.
    ///
    /// When the input names the project, it becomes the first node
    /// (in-degree 0) with edges to its direct dependencies. Unnamed
    /// inputs yield only the package nodes; depth-1 tuples then
    /// contribute their child (flagged direct) and no edge. An empty
    /// tree produces an empty graph, so vacuous input is detectable
    /// downstream.
    pub fn from_tree(tree: &NormalizedTree) -> Result<Self, BuildError> {
        let mut g = Self {
            graph: DiGraph::new(),
            node_indices: HashMap::new(),
            order: Vec::new(),
            edge_order: Vec::new(),
            root: None,
        };

        if tree.is_empty() {
            return Ok(g);
        }

        if let Some(root) = &tree.root {
            validate_entry(&root.name, &root.version)?;
            let root_idx = g.ensure_node(&root.name, &root.version, tree.root_line, false);
            g.root = Some(root_idx);
        }

        let mut edge_set: HashSet<(NodeIndex, NodeIndex)> = HashSet::new();
        for tuple in &tree.tuples {
            validate_entry(&tuple.child.name, &tuple.child.version)?;
            let child = g.ensure_node(
                &tuple.child.name,
                &tuple.child.version,
                tuple.child_line,
                tuple.depth == 1,
            );

            // Depth-1 parents are the project itself; without a named
            // project there is no node to hang the edge on.
            let parent = if tuple.depth == 1 {
                match g.root {
                    Some(idx) => idx,
                    None => continue,
                }
            } else {
                validate_entry(&tuple.parent.name, &tuple.parent.version)?;
                g.ensure_node(&tuple.parent.name, &tuple.parent.version, 0, false)
            };

            if edge_set.insert((parent, child)) {
                g.graph.add_edge(parent, child, DependencyEdge);
                g.edge_order.push((parent, child));
            }
        }

        debug!(
            nodes = g.node_count(),
            edges = g.edge_count(),
            "built dependency graph"
        );
        Ok(g)
    }

    /// Returns the existing node for this identity or creates one.
    ///
    /// The line and direct flag stick from the first creation; later
    /// occurrences of the same identity do not overwrite provenance,
    /// except that any occurrence at depth 1 marks the package direct.
    fn ensure_node(&mut self, name: &str, version: &str, line: usize, direct: bool) -> NodeIndex {
        let key = (name.to_string(), version.to_string());
        if let Some(&idx) = self.node_indices.get(&key) {
            if direct {
                self.graph[idx].direct = true;
            }
            return idx;
        }

        let idx = self.graph.add_node(PackageNode::new(name, version, line, direct));
        self.node_indices.insert(key, idx);
        self.order.push(idx);
        idx
    }

    /// Number of nodes in the graph.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of edges in the graph.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// True if the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// The project's own node index, if present.
    pub fn root(&self) -> Option<NodeIndex> {
        self.root
    }

    /// Node indices in first-appearance order.
    pub fn order(&self) -> &[NodeIndex] {
        &self.order
    }

    /// Edges in insertion order.
    pub fn edges(&self) -> &[(NodeIndex, NodeIndex)] {
        &self.edge_order
    }

    /// Borrow a node by index.
    pub fn node(&self, idx: NodeIndex) -> &PackageNode {
        &self.graph[idx]
    }

    /// Mutably borrow a node by index (used by the metrics engine).
    pub fn node_mut(&mut self, idx: NodeIndex) -> &mut PackageNode {
        &mut self.graph[idx]
    }

    /// Looks up a node by name and version.
    pub fn get(&self, name: &str, version: &str) -> Option<&PackageNode> {
        self.node_indices
            .get(&(name.to_string(), version.to_string()))
            .map(|&idx| &self.graph[idx])
    }

    /// Number of direct dependencies of the project (depth-1 packages).
    pub fn direct_count(&self) -> usize {
        self.order
            .iter()
            .filter(|&&idx| self.graph[idx].direct)
            .count()
    }

    /// True if the graph contains the directed edge `from -> to`.
    pub fn has_edge(&self, from: NodeIndex, to: NodeIndex) -> bool {
        self.graph.contains_edge(from, to)
    }

    /// In-degree of a node: how many packages depend on it directly.
    pub fn in_degree(&self, idx: NodeIndex) -> usize {
        self.graph
            .neighbors_directed(idx, Direction::Incoming)
            .count()
    }

    /// Out-degree of a node: how many packages it depends on directly.
    pub fn out_degree(&self, idx: NodeIndex) -> usize {
        self.graph
            .neighbors_directed(idx, Direction::Outgoing)
            .count()
    }

    /// Outgoing neighbors of a node.
    pub fn dependencies_of(&self, idx: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.neighbors_directed(idx, Direction::Outgoing)
    }

    /// Incoming neighbors of a node.
    pub fn dependents_of(&self, idx: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.neighbors_directed(idx, Direction::Incoming)
    }

    /// Detects cycles via strongly connected components.
    ///
    /// npm normally prevents true cycles by deduplication, but the model
    /// does not assume acyclicity. Each returned cycle lists the package
    /// identities involved.
    pub fn cycles(&self) -> Vec<Vec<String>> {
        use petgraph::algo::tarjan_scc;

        let mut cycles = Vec::new();
        for scc in tarjan_scc(&self.graph) {
            if scc.len() > 1 {
                cycles.push(scc.iter().map(|&idx| self.graph[idx].id()).collect());
            } else if scc.len() == 1 {
                // Self-loop counts as a cycle.
                let idx = scc[0];
                if self.graph.contains_edge(idx, idx) {
                    cycles.push(vec![self.graph[idx].id()]);
                }
            }
        }
        cycles
    }

    /// Number of package names present at more than one version.
    pub fn multi_version_count(&self) -> usize {
        let mut versions: HashMap<&str, usize> = HashMap::new();
        for &idx in &self.order {
            *versions.entry(self.graph[idx].name.as_str()).or_default() += 1;
        }
        versions.values().filter(|&&n| n > 1).count()
    }
}

fn validate_entry(name: &str, version: &str) -> Result<(), BuildError> {
    if name.trim().is_empty() || version.is_empty() {
        return Err(BuildError::MalformedEntry {
            name: name.to_string(),
            version: version.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{parse_str, DependencyTuple, NormalizedTree, PackageRef};

    fn tree_from(tuples: Vec<DependencyTuple>) -> NormalizedTree {
        NormalizedTree {
            root: Some(PackageRef::new("app", "1.0.0")),
            root_line: 1,
            tuples,
        }
    }

    fn tuple(parent: (&str, &str), child: (&str, &str), depth: usize) -> DependencyTuple {
        DependencyTuple {
            parent: PackageRef::new(parent.0, parent.1),
            child: PackageRef::new(child.0, child.1),
            child_line: 0,
            depth,
        }
    }

    #[test]
    fn test_diamond_collapses_to_one_node() {
        // app -> b -> d, app -> c -> d: d must be a single node with
        // in-degree 2.
        let tree = tree_from(vec![
            tuple(("app", "1.0.0"), ("b", "1.0.0"), 1),
            tuple(("b", "1.0.0"), ("d", "3.0.0"), 2),
            tuple(("app", "1.0.0"), ("c", "2.0.0"), 1),
            tuple(("c", "2.0.0"), ("d", "3.0.0"), 2),
        ]);
        let graph = DependencyGraph::from_tree(&tree).unwrap();

        assert_eq!(graph.node_count(), 4);
        let d = graph.get("d", "3.0.0").expect("d present");
        assert_eq!(d.name, "d");

        let d_idx = graph
            .order()
            .iter()
            .copied()
            .find(|&i| graph.node(i).name == "d")
            .unwrap();
        assert_eq!(graph.in_degree(d_idx), 2);
    }

    #[test]
    fn test_same_name_different_versions_are_distinct() {
        let tree = tree_from(vec![
            tuple(("app", "1.0.0"), ("x", "1.0.0"), 1),
            tuple(("app", "1.0.0"), ("y", "1.0.0"), 1),
            tuple(("y", "1.0.0"), ("x", "2.0.0"), 2),
        ]);
        let graph = DependencyGraph::from_tree(&tree).unwrap();

        assert!(graph.get("x", "1.0.0").is_some());
        assert!(graph.get("x", "2.0.0").is_some());
        assert_eq!(graph.multi_version_count(), 1);
    }

    #[test]
    fn test_duplicate_edges_dropped() {
        let tree = tree_from(vec![
            tuple(("app", "1.0.0"), ("a", "1.0.0"), 1),
            tuple(("app", "1.0.0"), ("a", "1.0.0"), 1),
        ]);
        let graph = DependencyGraph::from_tree(&tree).unwrap();
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.edges().len(), 1);
    }

    #[test]
    fn test_referential_closure() {
        let tree = parse_str(
            r#"{"dependencies": {"a": {"version": "1.0.0", "dependencies": {"b": {"version": "2.0.0"}}}}}"#,
        )
        .unwrap();
        let graph = DependencyGraph::from_tree(&tree).unwrap();

        for &(from, to) in graph.edges() {
            assert!(graph.order().contains(&from));
            assert!(graph.order().contains(&to));
        }
    }

    #[test]
    fn test_root_has_in_degree_zero() {
        let tree = tree_from(vec![tuple(("app", "1.0.0"), ("a", "1.0.0"), 1)]);
        let graph = DependencyGraph::from_tree(&tree).unwrap();
        let root = graph.root().unwrap();
        assert_eq!(graph.in_degree(root), 0);
        assert_eq!(graph.node(root).name, "app");
    }

    #[test]
    fn test_direct_flag() {
        let tree = tree_from(vec![
            tuple(("app", "1.0.0"), ("a", "1.0.0"), 1),
            tuple(("a", "1.0.0"), ("b", "2.0.0"), 2),
        ]);
        let graph = DependencyGraph::from_tree(&tree).unwrap();
        assert!(graph.get("a", "1.0.0").unwrap().direct);
        assert!(!graph.get("b", "2.0.0").unwrap().direct);
    }

    #[test]
    fn test_empty_version_aborts_build() {
        let tree = tree_from(vec![tuple(("app", "1.0.0"), ("a", ""), 1)]);
        assert!(matches!(
            DependencyGraph::from_tree(&tree),
            Err(BuildError::MalformedEntry { .. })
        ));
    }

    #[test]
    fn test_blank_name_aborts_build() {
        let tree = tree_from(vec![tuple(("app", "1.0.0"), ("   ", "1.0.0"), 1)]);
        assert!(DependencyGraph::from_tree(&tree).is_err());
    }

    #[test]
    fn test_unnamed_project_adds_no_root_node() {
        let tree = parse_str(
            r#"{"dependencies": {"a": {"version": "1.0.0", "dependencies": {"b": {"version": "2.0.0"}}}}}"#,
        )
        .unwrap();
        let graph = DependencyGraph::from_tree(&tree).unwrap();

        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
        assert!(graph.root().is_none());
        assert!(graph.get("a", "1.0.0").unwrap().direct);
        assert_eq!(graph.direct_count(), 1);
    }

    #[test]
    fn test_empty_tree_builds_empty_graph() {
        let tree = tree_from(Vec::new());
        let graph = DependencyGraph::from_tree(&tree).unwrap();
        assert!(graph.is_empty());
        assert!(graph.root().is_none());
    }

    #[test]
    fn test_first_appearance_order() {
        let tree = parse_str(
            r#"{"name": "app", "version": "1.0.0", "dependencies": {
                "zeta": {"version": "1.0.0"},
                "alpha": {"version": "1.0.0"}
            }}"#,
        )
        .unwrap();
        let graph = DependencyGraph::from_tree(&tree).unwrap();
        let names: Vec<&str> = graph
            .order()
            .iter()
            .map(|&i| graph.node(i).name.as_str())
            .collect();
        // Input order, not alphabetical.
        assert_eq!(names, vec!["app", "zeta", "alpha"]);
    }

    #[test]
    fn test_cycle_detection() {
        let tree = tree_from(vec![
            tuple(("app", "1.0.0"), ("a", "1.0.0"), 1),
            tuple(("a", "1.0.0"), ("b", "1.0.0"), 2),
            tuple(("b", "1.0.0"), ("a", "1.0.0"), 3),
        ]);
        let graph = DependencyGraph::from_tree(&tree).unwrap();
        let cycles = graph.cycles();
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].len(), 2);
    }

    #[test]
    fn test_acyclic_graph_has_no_cycles() {
        let tree = tree_from(vec![
            tuple(("app", "1.0.0"), ("a", "1.0.0"), 1),
            tuple(("a", "1.0.0"), ("b", "1.0.0"), 2),
        ]);
        let graph = DependencyGraph::from_tree(&tree).unwrap();
        assert!(graph.cycles().is_empty());
    }
}
