//! Closeness and betweenness centrality.
//!
//! Both are unweighted shortest-path measures over the same graph the
//! influence score ranks. Closeness reads how near a package sits to the
//! rest of the network; betweenness reads how often it lies on the
//! shortest chains between other packages, which flags the brokers a
//! supply-chain problem would travel through.

use std::collections::VecDeque;

use petgraph::graph::NodeIndex;

use crate::graph::DependencyGraph;

/// Which edges a traversal follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeView {
    /// Dependent to dependency, the stored direction.
    Outgoing,
    /// Dependency to dependent.
    Incoming,
    /// Both directions.
    Undirected,
}

pub(crate) fn neighbors(
    graph: &DependencyGraph,
    view: EdgeView,
    idx: NodeIndex,
) -> Vec<NodeIndex> {
    match view {
        EdgeView::Outgoing => graph.dependencies_of(idx).collect(),
        EdgeView::Incoming => graph.dependents_of(idx).collect(),
        EdgeView::Undirected => {
            let mut all: Vec<NodeIndex> = graph.dependencies_of(idx).collect();
            for n in graph.dependents_of(idx) {
                if !all.contains(&n) {
                    all.push(n);
                }
            }
            all
        }
    }
}

/// Unweighted shortest-path distances from `start`, indexed by
/// `NodeIndex::index()`; `None` for unreachable nodes.
pub(crate) fn bfs_distances(
    graph: &DependencyGraph,
    start: NodeIndex,
    view: EdgeView,
) -> Vec<Option<usize>> {
    let mut dist = vec![None; graph.node_count()];
    dist[start.index()] = Some(0);
    let mut queue = VecDeque::from([start]);

    while let Some(u) = queue.pop_front() {
        let du = match dist[u.index()] {
            Some(d) => d,
            None => continue,
        };
        for v in neighbors(graph, view, u) {
            if dist[v.index()].is_none() {
                dist[v.index()] = Some(du + 1);
                queue.push_back(v);
            }
        }
    }
    dist
}

/// Closeness centrality for every node, indexed by `NodeIndex::index()`.
///
/// `Incoming` measures distance from the packages that (transitively)
/// depend on a node; `Outgoing` measures distance to what it depends on.
/// Scores use the Wasserman-Faust scaling so they stay comparable across
/// disconnected components. Nodes reaching nothing score 0.
pub fn closeness(graph: &DependencyGraph, view: EdgeView) -> Vec<f64> {
    let n = graph.node_count();
    let mut scores = vec![0.0; n];
    if n < 2 {
        return scores;
    }

    for &node in graph.order() {
        let mut total = 0usize;
        let mut reached = 0usize;
        for d in bfs_distances(graph, node, view).iter().flatten() {
            total += d;
            reached += 1;
        }
        // `reached` includes the node itself at distance 0.
        if reached > 1 && total > 0 {
            let r = (reached - 1) as f64;
            scores[node.index()] = r / total as f64 * (r / (n - 1) as f64);
        }
    }
    scores
}

/// Betweenness centrality for every node via Brandes' algorithm,
/// normalized to `[0, 1]`, indexed by `NodeIndex::index()`.
///
/// The undirected view counts every unordered pair twice, which cancels
/// against its doubled normalization constant, so one scale factor
/// serves both views.
pub fn betweenness(graph: &DependencyGraph, view: EdgeView) -> Vec<f64> {
    let n = graph.node_count();
    let mut scores = vec![0.0; n];
    if n < 3 {
        return scores;
    }

    for &source in graph.order() {
        let mut stack: Vec<NodeIndex> = Vec::new();
        let mut preds: Vec<Vec<NodeIndex>> = vec![Vec::new(); n];
        let mut sigma = vec![0.0_f64; n];
        let mut dist: Vec<Option<usize>> = vec![None; n];
        sigma[source.index()] = 1.0;
        dist[source.index()] = Some(0);

        let mut queue = VecDeque::from([source]);
        while let Some(u) = queue.pop_front() {
            stack.push(u);
            let du = match dist[u.index()] {
                Some(d) => d,
                None => continue,
            };
            for v in neighbors(graph, view, u) {
                if dist[v.index()].is_none() {
                    dist[v.index()] = Some(du + 1);
                    queue.push_back(v);
                }
                if dist[v.index()] == Some(du + 1) {
                    sigma[v.index()] += sigma[u.index()];
                    preds[v.index()].push(u);
                }
            }
        }

        let mut delta = vec![0.0_f64; n];
        while let Some(w) = stack.pop() {
            for &u in &preds[w.index()] {
                delta[u.index()] +=
                    sigma[u.index()] / sigma[w.index()] * (1.0 + delta[w.index()]);
            }
            if w != source {
                scores[w.index()] += delta[w.index()];
            }
        }
    }

    let pairs = ((n - 1) * (n - 2)) as f64;
    for s in &mut scores {
        *s /= pairs;
    }
    scores
}
