//! Structural metrics over the dependency graph.
//!
//! [`annotate`] fills every node's dependent count (in-degree), dependency
//! count (out-degree), and influence score (PageRank), after which the
//! graph is read-only for rendering. The module also provides closeness
//! and betweenness centrality, the shared ranking order, summary
//! statistics, and Gini inequality coefficients.

pub mod centrality;
pub mod pagerank;

use std::cmp::Ordering;

use petgraph::graph::NodeIndex;
use tracing::debug;

use crate::graph::DependencyGraph;

pub use centrality::{betweenness, closeness, EdgeView};
pub use pagerank::{influence_scores, PageRankConfig, PageRankOutcome};

/// Errors that can occur during metric computation.
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    /// The graph has no nodes. Recoverable: callers may render empty
    /// output instead of failing the run.
    #[error("dependency graph contains no packages")]
    EmptyGraph,
}

/// Annotates every node with its degree counts and influence score.
///
/// # Example
///
/// ```
/// use lockscope::graph::DependencyGraph;
/// use lockscope::metrics::annotate;
/// use lockscope::parser::parse_str;
///
/// let tree = parse_str(
///     r#"{"name": "app", "version": "1.0.0", "dependencies": {"a": {"version": "1.0.0"}}}"#,
/// ).unwrap();
/// let mut graph = DependencyGraph::from_tree(&tree).unwrap();
/// annotate(&mut graph).unwrap();
///
/// let a = graph.get("a", "1.0.0").unwrap();
/// assert_eq!(a.dependent_count, Some(1));
/// assert!(a.influence.is_some());
/// ```
pub fn annotate(graph: &mut DependencyGraph) -> Result<(), MetricsError> {
    annotate_with(graph, &PageRankConfig::default())
}

/// [`annotate`] with an explicit PageRank configuration.
pub fn annotate_with(
    graph: &mut DependencyGraph,
    config: &PageRankConfig,
) -> Result<(), MetricsError> {
    if graph.is_empty() {
        return Err(MetricsError::EmptyGraph);
    }

    let outcome = influence_scores(graph, config);

    let order: Vec<NodeIndex> = graph.order().to_vec();
    for idx in order {
        let dependents = graph.in_degree(idx);
        let dependencies = graph.out_degree(idx);
        let influence = outcome.scores[idx.index()];
        let node = graph.node_mut(idx);
        node.dependent_count = Some(dependents);
        node.dependency_count = Some(dependencies);
        node.influence = Some(influence);
    }

    debug!(
        nodes = graph.node_count(),
        iterations = outcome.iterations,
        converged = outcome.converged,
        "annotated graph"
    );
    Ok(())
}

/// Node indices sorted by the report order: influence descending, then
/// dependent count descending, then name, then version.
///
/// Ties break deterministically so rendering the same graph twice yields
/// byte-identical output.
pub fn ranking(graph: &DependencyGraph) -> Vec<NodeIndex> {
    let mut indices: Vec<NodeIndex> = graph.order().to_vec();
    indices.sort_by(|&a, &b| compare_nodes(graph, a, b));
    indices
}

fn compare_nodes(graph: &DependencyGraph, a: NodeIndex, b: NodeIndex) -> Ordering {
    let na = graph.node(a);
    let nb = graph.node(b);
    nb.influence
        .unwrap_or(0.0)
        .total_cmp(&na.influence.unwrap_or(0.0))
        .then_with(|| nb.dependent_count.cmp(&na.dependent_count))
        .then_with(|| na.name.cmp(&nb.name))
        .then_with(|| na.version.cmp(&nb.version))
}

/// Summary statistics about the dependency network.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryStats {
    /// Number of packages (nodes).
    pub nodes: usize,
    /// Number of dependency relations (edges).
    pub edges: usize,
    /// Direct dependencies of the project.
    pub direct_dependencies: usize,
    /// Package names present at more than one version.
    pub multi_version_packages: usize,
    /// Number of dependency cycles.
    pub cycles: usize,
    /// Edge count over possible ordered pairs.
    pub density: f64,
    /// Mean finite directed path length over ordered node pairs.
    pub avg_path_length: f64,
    /// Longest finite directed path length.
    pub max_path_length: usize,
    /// Average clustering coefficient of the undirected view.
    pub clustering: f64,
}

/// Computes summary statistics for the graph.
pub fn summary(graph: &DependencyGraph) -> SummaryStats {
    let (avg_path_length, max_path_length) = path_length_stats(graph);
    SummaryStats {
        nodes: graph.node_count(),
        edges: graph.edge_count(),
        direct_dependencies: graph.direct_count(),
        multi_version_packages: graph.multi_version_count(),
        cycles: graph.cycles().len(),
        density: density(graph),
        avg_path_length,
        max_path_length,
        clustering: average_clustering(graph),
    }
}

/// Directed graph density: edges over `n * (n - 1)` possible pairs.
pub fn density(graph: &DependencyGraph) -> f64 {
    let n = graph.node_count();
    if n < 2 {
        return 0.0;
    }
    graph.edge_count() as f64 / (n * (n - 1)) as f64
}

/// (average, maximum) finite directed shortest-path length over all
/// ordered node pairs. `(0.0, 0)` when no pair is connected.
pub fn path_length_stats(graph: &DependencyGraph) -> (f64, usize) {
    let mut total = 0usize;
    let mut count = 0usize;
    let mut max = 0usize;

    for &node in graph.order() {
        for d in centrality::bfs_distances(graph, node, EdgeView::Outgoing)
            .iter()
            .flatten()
        {
            if *d > 0 {
                total += d;
                count += 1;
                max = max.max(*d);
            }
        }
    }

    if count == 0 {
        (0.0, 0)
    } else {
        (total as f64 / count as f64, max)
    }
}

/// Average clustering coefficient over the undirected view of the graph.
///
/// Nodes with fewer than two neighbors contribute 0, matching the usual
/// network-analysis convention.
pub fn average_clustering(graph: &DependencyGraph) -> f64 {
    let n = graph.node_count();
    if n == 0 {
        return 0.0;
    }

    let mut total = 0.0;
    for &node in graph.order() {
        let neigh = centrality::neighbors(graph, EdgeView::Undirected, node);
        let k = neigh.len();
        if k < 2 {
            continue;
        }
        let mut links = 0usize;
        for (i, &a) in neigh.iter().enumerate() {
            for &b in &neigh[i + 1..] {
                if graph.has_edge(a, b) || graph.has_edge(b, a) {
                    links += 1;
                }
            }
        }
        total += 2.0 * links as f64 / (k * (k - 1)) as f64;
    }
    total / n as f64
}

/// Gini coefficient of a distribution: 0 is perfect equality, values
/// toward 1 mean a few packages carry most of the weight.
pub fn gini(values: &[f64]) -> f64 {
    let n = values.len();
    if n <= 1 {
        return 0.0;
    }
    let mean: f64 = values.iter().sum::<f64>() / n as f64;
    if mean == 0.0 {
        return 0.0;
    }

    let mut diffsum = 0.0;
    for (i, &xi) in values.iter().enumerate() {
        for &xj in &values[i + 1..] {
            diffsum += (xi - xj).abs();
        }
    }
    diffsum / ((n * n) as f64 * mean)
}

/// Gini coefficients for the graph's headline distributions, as
/// (measure label, coefficient) pairs in report order.
pub fn gini_report(graph: &DependencyGraph) -> Vec<(&'static str, f64)> {
    let influence: Vec<f64> = graph
        .order()
        .iter()
        .map(|&i| graph.node(i).influence.unwrap_or(0.0))
        .collect();
    let out_degrees: Vec<f64> = graph
        .order()
        .iter()
        .map(|&i| graph.out_degree(i) as f64)
        .collect();

    let closeness_in = closeness(graph, EdgeView::Incoming);

    vec![
        ("Influence (PageRank)", gini(&influence)),
        ("Closeness centrality", gini(&closeness_in)),
        ("Degree of connectivity (dependencies)", gini(&out_degrees)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{parse_str, NormalizedTree, PackageRef};

    fn build(json: &str) -> DependencyGraph {
        DependencyGraph::from_tree(&parse_str(json).unwrap()).unwrap()
    }

    #[test]
    fn test_annotate_degrees() {
        let mut graph = build(
            r#"{"name": "app", "version": "1.0.0", "dependencies": {
                "a": {"version": "1.0.0", "dependencies": {"c": {"version": "1.0.0"}}},
                "b": {"version": "1.0.0", "dependencies": {"c": {"version": "1.0.0", "deduped": true}}}
            }}"#,
        );
        annotate(&mut graph).unwrap();

        let c = graph.get("c", "1.0.0").unwrap();
        assert_eq!(c.dependent_count, Some(2));
        assert_eq!(c.dependency_count, Some(0));

        let root = graph.node(graph.root().unwrap());
        assert_eq!(root.dependent_count, Some(0));
        assert_eq!(root.dependency_count, Some(2));
    }

    #[test]
    fn test_annotate_empty_graph_is_error() {
        let tree = NormalizedTree {
            root: Some(PackageRef::new("app", "1.0.0")),
            root_line: 1,
            tuples: Vec::new(),
        };
        let mut graph = DependencyGraph::from_tree(&tree).unwrap();
        assert!(matches!(
            annotate(&mut graph),
            Err(MetricsError::EmptyGraph)
        ));
    }

    #[test]
    fn test_ranking_most_influential_first() {
        let mut graph = build(
            r#"{"name": "app", "version": "1.0.0", "dependencies": {
                "a": {"version": "1.0.0", "dependencies": {"shared": {"version": "1.0.0"}}},
                "b": {"version": "1.0.0", "dependencies": {"shared": {"version": "1.0.0", "deduped": true}}}
            }}"#,
        );
        annotate(&mut graph).unwrap();

        let ranked = ranking(&graph);
        assert_eq!(graph.node(ranked[0]).name, "shared");
    }

    #[test]
    fn test_ranking_tie_breaks_lexicographically() {
        // a and b are symmetric leaves; name decides.
        let mut graph = build(
            r#"{"name": "app", "version": "1.0.0", "dependencies": {
                "b": {"version": "1.0.0"},
                "a": {"version": "1.0.0"}
            }}"#,
        );
        annotate(&mut graph).unwrap();

        let ranked = ranking(&graph);
        let names: Vec<&str> = ranked
            .iter()
            .map(|&i| graph.node(i).name.as_str())
            .collect();
        let a_pos = names.iter().position(|&n| n == "a").unwrap();
        let b_pos = names.iter().position(|&n| n == "b").unwrap();
        assert!(a_pos < b_pos);
    }

    #[test]
    fn test_summary_stats() {
        let graph = build(
            r#"{"name": "app", "version": "1.0.0", "dependencies": {
                "a": {"version": "1.0.0", "dependencies": {"x": {"version": "2.0.0"}}},
                "x": {"version": "1.0.0"}
            }}"#,
        );
        let stats = summary(&graph);
        assert_eq!(stats.nodes, 4);
        assert_eq!(stats.edges, 3);
        assert_eq!(stats.direct_dependencies, 2);
        assert_eq!(stats.multi_version_packages, 1);
        assert_eq!(stats.cycles, 0);
        // 3 edges over 4 * 3 ordered pairs.
        assert!((stats.density - 0.25).abs() < 1e-9);
        assert_eq!(stats.max_path_length, 2);
    }

    #[test]
    fn test_path_length_stats_chain() {
        // app -> a -> b: paths 1, 1, 2.
        let graph = build(
            r#"{"name": "app", "version": "1.0.0", "dependencies": {
                "a": {"version": "1.0.0", "dependencies": {"b": {"version": "1.0.0"}}}
            }}"#,
        );
        let (avg, max) = path_length_stats(&graph);
        assert!((avg - 4.0 / 3.0).abs() < 1e-9);
        assert_eq!(max, 2);
    }

    #[test]
    fn test_path_length_stats_no_edges() {
        let graph = build(r#"{"dependencies": {"a": {"version": "1.0.0"}}}"#);
        assert_eq!(path_length_stats(&graph), (0.0, 0));
    }

    #[test]
    fn test_clustering_triangle() {
        // app -> a -> b plus app -> b: every undirected pair is linked.
        let graph = build(
            r#"{"name": "app", "version": "1.0.0", "dependencies": {
                "a": {"version": "1.0.0", "dependencies": {"b": {"version": "1.0.0"}}},
                "b": {"version": "1.0.0", "deduped": true}
            }}"#,
        );
        assert!((average_clustering(&graph) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_clustering_chain_is_zero() {
        let graph = build(
            r#"{"name": "app", "version": "1.0.0", "dependencies": {
                "a": {"version": "1.0.0", "dependencies": {"b": {"version": "1.0.0"}}}
            }}"#,
        );
        assert_eq!(average_clustering(&graph), 0.0);
    }

    #[test]
    fn test_gini_uniform_is_zero() {
        assert_eq!(gini(&[0.25, 0.25, 0.25, 0.25]), 0.0);
    }

    #[test]
    fn test_gini_concentrated_is_high() {
        let g = gini(&[1.0, 0.0, 0.0, 0.0]);
        assert!(g > 0.7, "concentrated distribution should be unequal, got {g}");
    }

    #[test]
    fn test_gini_degenerate_inputs() {
        assert_eq!(gini(&[]), 0.0);
        assert_eq!(gini(&[1.0]), 0.0);
        assert_eq!(gini(&[0.0, 0.0]), 0.0);
    }

    #[test]
    fn test_gini_report_labels() {
        let mut graph = build(r#"{"dependencies": {"a": {"version": "1.0.0"}}}"#);
        annotate(&mut graph).unwrap();
        let report = gini_report(&graph);
        assert_eq!(report.len(), 3);
        assert_eq!(report[0].0, "Influence (PageRank)");
        assert_eq!(report[1].0, "Closeness centrality");
    }
}
