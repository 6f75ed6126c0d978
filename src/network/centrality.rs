//! Centrality measures and degree assortativity.
//!
//! All functions work on unweighted adjacency; edge weights (correlations)
//! only annotate the graph.

use super::graph::ThresholdGraph;
use super::GraphError;
use crate::symbol::Symbol;
use ordered_float::OrderedFloat;
use std::collections::{BTreeMap, VecDeque};
use tracing::{debug, info};

/// Per-symbol score, ordered by symbol.
pub type Scores = BTreeMap<Symbol, f64>;

/// Degree centrality: degree / (N - 1).
///
/// Every node scores 1.0 when the graph has at most one node.
pub fn degree_centrality(graph: &ThresholdGraph) -> Scores {
    let n = graph.node_count();
    graph
        .degrees()
        .into_iter()
        .map(|(symbol, degree)| {
            let score = if n <= 1 {
                1.0
            } else {
                degree as f64 / (n - 1) as f64
            };
            (symbol, score)
        })
        .collect()
}

/// Normalized betweenness centrality (Brandes).
///
/// Shortest paths are counted over ordered source/target pairs and scaled by
/// 1 / ((N - 1)(N - 2)), the undirected normalization. Graphs with at most
/// two nodes score 0 everywhere.
pub fn betweenness_centrality(graph: &ThresholdGraph) -> Scores {
    let adjacency = graph.adjacency();
    let n = adjacency.len();
    let mut betweenness = vec![0.0; n];

    let mut stack = Vec::with_capacity(n);
    let mut queue = VecDeque::with_capacity(n);
    let mut predecessors: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut sigma = vec![0.0_f64; n];
    let mut distance = vec![usize::MAX; n];
    let mut delta = vec![0.0_f64; n];

    for source in 0..n {
        stack.clear();
        predecessors.iter_mut().for_each(Vec::clear);
        sigma.fill(0.0);
        distance.fill(usize::MAX);
        delta.fill(0.0);

        sigma[source] = 1.0;
        distance[source] = 0;
        queue.push_back(source);

        while let Some(v) = queue.pop_front() {
            stack.push(v);
            for &w in &adjacency[v] {
                if distance[w] == usize::MAX {
                    distance[w] = distance[v] + 1;
                    queue.push_back(w);
                }
                if distance[w] == distance[v] + 1 {
                    sigma[w] += sigma[v];
                    predecessors[w].push(v);
                }
            }
        }

        while let Some(w) = stack.pop() {
            for &v in &predecessors[w] {
                delta[v] += sigma[v] / sigma[w] * (1.0 + delta[w]);
            }
            if w != source {
                betweenness[w] += delta[w];
            }
        }
    }

    if n > 2 {
        let scale = 1.0 / ((n - 1) * (n - 2)) as f64;
        betweenness.iter_mut().for_each(|b| *b *= scale);
    }

    betweenness
        .into_iter()
        .enumerate()
        .map(|(i, b)| (graph.symbol_at(i).clone(), b))
        .collect()
}

/// Power-iteration settings for eigenvector centrality.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EigenvectorConfig {
    /// Maximum number of iterations (default: 1000)
    pub max_iter: usize,
    /// Per-node convergence tolerance (default: 1e-8)
    pub tolerance: f64,
}

impl Default for EigenvectorConfig {
    fn default() -> Self {
        EigenvectorConfig {
            max_iter: 1000,
            tolerance: 1.0e-8,
        }
    }
}

/// Eigenvector centrality by power iteration on A + I.
///
/// Starts from the uniform vector, normalizes by the Euclidean norm each
/// step and stops once the L1 change falls below N × tolerance. The shift by
/// the identity keeps bipartite components from oscillating.
///
/// # Errors
/// - `EmptyGraph` if the graph has no nodes
/// - `EigenvectorNotConverged` if `max_iter` is exhausted
pub fn eigenvector_centrality(
    graph: &ThresholdGraph,
    config: EigenvectorConfig,
) -> Result<Scores, GraphError> {
    let adjacency = graph.adjacency();
    let n = adjacency.len();
    if n == 0 {
        return Err(GraphError::EmptyGraph);
    }

    let mut x = vec![1.0 / n as f64; n];
    for iteration in 1..=config.max_iter {
        let previous = x.clone();
        for (v, neighbors) in adjacency.iter().enumerate() {
            for &w in neighbors {
                x[w] += previous[v];
            }
        }

        let norm = x.iter().map(|value| value * value).sum::<f64>().sqrt();
        if norm > 0.0 {
            x.iter_mut().for_each(|value| *value /= norm);
        }

        let change: f64 = x.iter().zip(&previous).map(|(a, b)| (a - b).abs()).sum();
        if change < n as f64 * config.tolerance {
            debug!(iteration, "eigenvector centrality converged");
            return Ok(x
                .into_iter()
                .enumerate()
                .map(|(i, value)| (graph.symbol_at(i).clone(), value))
                .collect());
        }
    }

    Err(GraphError::EigenvectorNotConverged {
        iterations: config.max_iter,
    })
}

/// Eigenvector centrality on the largest connected component only.
///
/// The measure is not well defined on disconnected graphs, so nodes outside
/// the LCC get no score.
pub fn eigenvector_centrality_lcc(
    graph: &ThresholdGraph,
    config: EigenvectorConfig,
) -> Result<Scores, GraphError> {
    let component = graph.largest_component();
    if component.is_empty() {
        return Err(GraphError::EmptyGraph);
    }
    info!(
        nodes = component.len(),
        share = component.len() as f64 / graph.node_count() as f64,
        "computing eigenvector centrality on largest component"
    );
    eigenvector_centrality(&graph.subgraph(&component), config)
}

/// Degree assortativity coefficient r.
///
/// Pearson correlation between the degrees at either end of every edge,
/// each edge counted in both orientations. `None` when the graph has no
/// edges or all edge endpoints share one degree (r undefined).
pub fn degree_assortativity(graph: &ThresholdGraph) -> Option<f64> {
    let adjacency = graph.adjacency();
    let degrees: Vec<f64> = adjacency.iter().map(|n| n.len() as f64).collect();

    let ends: Vec<(f64, f64)> = adjacency
        .iter()
        .enumerate()
        .flat_map(|(v, neighbors)| neighbors.iter().map(move |&w| (v, w)))
        .map(|(v, w)| (degrees[v], degrees[w]))
        .collect();
    if ends.is_empty() {
        return None;
    }

    let m = ends.len() as f64;
    // Both orientations are present, so source and target share mean and variance.
    let mean = ends.iter().map(|(j, _)| j).sum::<f64>() / m;
    let variance = ends.iter().map(|(j, _)| (j - mean).powi(2)).sum::<f64>() / m;
    if variance <= f64::EPSILON {
        return None;
    }
    let covariance = ends
        .iter()
        .map(|(j, k)| (j - mean) * (k - mean))
        .sum::<f64>()
        / m;

    Some(covariance / variance)
}

/// The `n` highest scores, descending; ties broken by symbol.
pub fn top_n(scores: &Scores, n: usize) -> Vec<(Symbol, f64)> {
    let mut ranked: Vec<(&Symbol, f64)> = scores.iter().map(|(s, &v)| (s, v)).collect();
    ranked.sort_by_key(|&(symbol, value)| (std::cmp::Reverse(OrderedFloat(value)), symbol));
    ranked
        .into_iter()
        .take(n)
        .map(|(symbol, value)| (symbol.clone(), value))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::correlation::CorrelationMatrix;

    fn s(i: usize) -> Symbol {
        Symbol::new(format!("S{:02}", i)).unwrap()
    }

    fn graph_from_edges(n: usize, edges: &[(usize, usize)]) -> ThresholdGraph {
        let mut values = vec![0.0; n * n];
        for i in 0..n {
            values[i * n + i] = 1.0;
        }
        for &(a, b) in edges {
            values[a * n + b] = 0.8;
            values[b * n + a] = 0.8;
        }
        let corr = CorrelationMatrix::from_values((0..n).map(s).collect(), values).unwrap();
        ThresholdGraph::from_correlation(&corr, 0.5)
    }

    #[test]
    fn test_degree_centrality() {
        let graph = graph_from_edges(3, &[(0, 1), (1, 2)]);
        let scores = degree_centrality(&graph);
        assert!((scores[&s(0)] - 0.5).abs() < 1e-12);
        assert!((scores[&s(1)] - 1.0).abs() < 1e-12);

        let single = graph_from_edges(1, &[]);
        assert_eq!(degree_centrality(&single)[&s(0)], 1.0);
    }

    #[test]
    fn test_betweenness_on_path() {
        // Path 0-1-2-3: node 1 lies on paths (0,2) and (0,3) -> 2 pairs.
        let graph = graph_from_edges(4, &[(0, 1), (1, 2), (2, 3)]);
        let scores = betweenness_centrality(&graph);
        // 2 pairs * 2 orientations / ((4-1)(4-2)) = 4/6
        assert!((scores[&s(1)] - 2.0 / 3.0).abs() < 1e-12);
        assert!((scores[&s(2)] - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(scores[&s(0)], 0.0);
    }

    #[test]
    fn test_betweenness_star_center_is_one() {
        let graph = graph_from_edges(5, &[(0, 1), (0, 2), (0, 3), (0, 4)]);
        let scores = betweenness_centrality(&graph);
        assert!((scores[&s(0)] - 1.0).abs() < 1e-12);
        assert!(scores[&s(3)].abs() < 1e-12);
    }

    #[test]
    fn test_betweenness_splits_equal_paths() {
        // Square 0-1-2-3-0: each pair of opposite corners has two shortest paths.
        let graph = graph_from_edges(4, &[(0, 1), (1, 2), (2, 3), (3, 0)]);
        let scores = betweenness_centrality(&graph);
        for i in 0..4 {
            // Node lies on half of one opposite pair's paths: 0.5 * 2 / 6
            assert!((scores[&s(i)] - 1.0 / 6.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_eigenvector_star() {
        let graph = graph_from_edges(4, &[(0, 1), (0, 2), (0, 3)]);
        let scores = eigenvector_centrality(&graph, EigenvectorConfig::default()).unwrap();
        // Leading eigenvector of a star K1,3: center / leaf = sqrt(3)
        let ratio = scores[&s(0)] / scores[&s(1)];
        assert!((ratio - 3.0_f64.sqrt()).abs() < 1e-5);
        let norm: f64 = scores.values().map(|v| v * v).sum();
        assert!((norm - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_eigenvector_empty_and_nonconvergence() {
        let empty = graph_from_edges(0, &[]);
        assert_eq!(
            eigenvector_centrality(&empty, EigenvectorConfig::default()),
            Err(GraphError::EmptyGraph)
        );

        let graph = graph_from_edges(4, &[(0, 1), (0, 2), (0, 3)]);
        let config = EigenvectorConfig {
            max_iter: 1,
            tolerance: 1e-12,
        };
        assert_eq!(
            eigenvector_centrality(&graph, config),
            Err(GraphError::EigenvectorNotConverged { iterations: 1 })
        );
    }

    #[test]
    fn test_eigenvector_lcc_excludes_other_components() {
        let graph = graph_from_edges(5, &[(0, 1), (1, 2), (3, 4)]);
        let scores = eigenvector_centrality_lcc(&graph, EigenvectorConfig::default()).unwrap();
        assert_eq!(scores.len(), 3);
        assert!(!scores.contains_key(&s(3)));
        assert!(scores[&s(1)] > scores[&s(0)]);
    }

    #[test]
    fn test_assortativity_star_is_disassortative() {
        let graph = graph_from_edges(5, &[(0, 1), (0, 2), (0, 3), (0, 4)]);
        let r = degree_assortativity(&graph).unwrap();
        assert!((r + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_assortativity_two_stars_joined_by_hubs() {
        // Hubs 0 and 1 linked, each with two leaves.
        let graph = graph_from_edges(6, &[(0, 1), (0, 2), (0, 3), (1, 4), (1, 5)]);
        let r = degree_assortativity(&graph).unwrap();
        // Ends: hub-hub (3,3) x2, hub-leaf (3,1)/(1,3) x8 -> mean 2.2
        let mean = 2.2_f64;
        let var = (2.0 * (3.0 - mean).powi(2) + 4.0 * (3.0 - mean).powi(2) + 4.0 * (1.0 - mean).powi(2)) / 10.0;
        let cov = (2.0 * (3.0 - mean).powi(2) + 8.0 * (3.0 - mean) * (1.0 - mean)) / 10.0;
        assert!((r - cov / var).abs() < 1e-12);
        assert!(r < 0.0);
    }

    #[test]
    fn test_assortativity_undefined_cases() {
        assert_eq!(degree_assortativity(&graph_from_edges(3, &[])), None);
        // Every endpoint has degree 2.
        let cycle = graph_from_edges(3, &[(0, 1), (1, 2), (0, 2)]);
        assert_eq!(degree_assortativity(&cycle), None);
    }

    #[test]
    fn test_top_n_orders_and_breaks_ties() {
        let scores: Scores = [(s(2), 0.5), (s(1), 0.9), (s(0), 0.5), (s(3), 0.1)]
            .into_iter()
            .collect();
        let top = top_n(&scores, 3);
        assert_eq!(top, vec![(s(1), 0.9), (s(0), 0.5), (s(2), 0.5)]);
        assert_eq!(top_n(&scores, 10).len(), 4);
    }
}
