//! Aggregate structural metrics of a threshold graph.

use super::centrality::Scores;
use super::graph::ThresholdGraph;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Summary metrics of one threshold graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphSummary {
    pub theta: f64,
    pub node_count: usize,
    pub edge_count: usize,
    /// 2|E| / N, 0 for an empty graph
    pub mean_degree: f64,
    /// |E| / (N(N-1)/2), 0 below two nodes
    pub density: f64,
    /// Global clustering: 3 × triangles / connected triples
    pub transitivity: f64,
    /// Mean of the local clustering coefficients (isolated nodes count as 0)
    pub average_clustering: f64,
    pub largest_component_size: usize,
    /// |LCC| / N, 0 for an empty graph
    pub largest_component_fraction: f64,
}

impl GraphSummary {
    pub fn of(graph: &ThresholdGraph) -> Self {
        let adjacency = graph.adjacency();
        let triangles = triangles_per_node(&adjacency);
        let largest_component_size = graph.largest_component().len();
        let node_count = graph.node_count();

        GraphSummary {
            theta: graph.theta(),
            node_count,
            edge_count: graph.edge_count(),
            mean_degree: mean_degree(graph),
            density: density(graph),
            transitivity: transitivity_from(&adjacency, &triangles),
            average_clustering: mean(&local_clustering_from(&adjacency, &triangles)),
            largest_component_size,
            largest_component_fraction: fraction(largest_component_size, node_count),
        }
    }
}

/// Mean degree 2|E| / N (0 when the graph has no nodes).
pub fn mean_degree(graph: &ThresholdGraph) -> f64 {
    fraction(2 * graph.edge_count(), graph.node_count())
}

/// Edge density |E| / (N(N-1)/2) (0 below two nodes).
pub fn density(graph: &ThresholdGraph) -> f64 {
    let n = graph.node_count();
    if n < 2 {
        return 0.0;
    }
    graph.edge_count() as f64 / (n * (n - 1) / 2) as f64
}

/// Size of the largest connected component as a fraction of all nodes.
pub fn largest_component_fraction(graph: &ThresholdGraph) -> f64 {
    fraction(graph.largest_component().len(), graph.node_count())
}

/// Global clustering coefficient (transitivity).
///
/// 0 when the graph has no connected triples.
pub fn transitivity(graph: &ThresholdGraph) -> f64 {
    let adjacency = graph.adjacency();
    let triangles = triangles_per_node(&adjacency);
    transitivity_from(&adjacency, &triangles)
}

/// Local clustering coefficient of every node.
///
/// Nodes with fewer than two neighbours have coefficient 0.
pub fn local_clustering(graph: &ThresholdGraph) -> Scores {
    let adjacency = graph.adjacency();
    let triangles = triangles_per_node(&adjacency);
    local_clustering_from(&adjacency, &triangles)
        .into_iter()
        .enumerate()
        .map(|(i, c)| (graph.symbol_at(i).clone(), c))
        .collect()
}

/// Mean local clustering over all nodes (0 for an empty graph).
pub fn average_clustering(graph: &ThresholdGraph) -> f64 {
    let adjacency = graph.adjacency();
    let triangles = triangles_per_node(&adjacency);
    mean(&local_clustering_from(&adjacency, &triangles))
}

/// Number of triangles each node belongs to.
pub(crate) fn triangles_per_node(adjacency: &[Vec<usize>]) -> Vec<usize> {
    let mut marked = vec![false; adjacency.len()];
    adjacency
        .iter()
        .map(|neighbors| {
            for &u in neighbors {
                marked[u] = true;
            }
            // Every link between two neighbours is seen from both ends.
            let links: usize = neighbors
                .iter()
                .map(|&u| adjacency[u].iter().filter(|&&w| marked[w]).count())
                .sum();
            for &u in neighbors {
                marked[u] = false;
            }
            links / 2
        })
        .collect()
}

fn transitivity_from(adjacency: &[Vec<usize>], triangles: &[usize]) -> f64 {
    let triples: usize = adjacency
        .iter()
        .map(|neighbors| pairs(neighbors.len()))
        .sum();
    if triples == 0 {
        return 0.0;
    }
    // Summing per-node counts sees each triangle three times.
    triangles.iter().sum::<usize>() as f64 / triples as f64
}

fn local_clustering_from(adjacency: &[Vec<usize>], triangles: &[usize]) -> Vec<f64> {
    adjacency
        .iter()
        .zip(triangles)
        .map(|(neighbors, &t)| match pairs(neighbors.len()) {
            0 => 0.0,
            possible => t as f64 / possible as f64,
        })
        .collect()
}

fn pairs(k: usize) -> usize {
    k * k.saturating_sub(1) / 2
}

fn fraction(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// One bar of the degree distribution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DegreeBin {
    pub degree: usize,
    pub count: usize,
    /// count / N
    pub probability: f64,
}

/// Degree distribution P(k), sorted by degree.
pub fn degree_distribution(graph: &ThresholdGraph) -> Vec<DegreeBin> {
    let n = graph.node_count();
    let mut counts: BTreeMap<usize, usize> = BTreeMap::new();
    for (_, degree) in graph.degrees() {
        *counts.entry(degree).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .map(|(degree, count)| DegreeBin {
            degree,
            count,
            probability: fraction(count, n),
        })
        .collect()
}

/// Clustering of the graph against an Erdős–Rényi G(n, p) graph with the same
/// number of nodes and edges.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RandomGraphComparison {
    /// Mean local clustering of the observed graph
    pub observed_clustering: f64,
    /// p = |E| / (N(N-1)/2), also the expected clustering of G(n, p)
    pub edge_probability: f64,
    /// observed / p, `None` when p is 0
    pub ratio: Option<f64>,
}

pub fn compare_with_random(graph: &ThresholdGraph) -> RandomGraphComparison {
    let observed_clustering = average_clustering(graph);
    let edge_probability = density(graph);
    RandomGraphComparison {
        observed_clustering,
        edge_probability,
        ratio: (edge_probability > 0.0).then(|| observed_clustering / edge_probability),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::correlation::CorrelationMatrix;
    use crate::symbol::Symbol;

    fn graph_from_edges(n: usize, edges: &[(usize, usize)]) -> ThresholdGraph {
        let symbols: Vec<Symbol> = (0..n).map(|i| Symbol::new(format!("S{:02}", i)).unwrap()).collect();
        let mut values = vec![0.0; n * n];
        for i in 0..n {
            values[i * n + i] = 1.0;
        }
        for &(a, b) in edges {
            values[a * n + b] = 0.9;
            values[b * n + a] = 0.9;
        }
        let corr = CorrelationMatrix::from_values(symbols, values).unwrap();
        ThresholdGraph::from_correlation(&corr, 0.5)
    }

    #[test]
    fn test_three_symbol_mean_degree() {
        let graph = graph_from_edges(3, &[(0, 1), (1, 2)]);
        let summary = GraphSummary::of(&graph);
        assert!((summary.mean_degree - 4.0 / 3.0).abs() < 1e-12);
        assert_eq!(summary.edge_count, 2);
        assert!((summary.largest_component_fraction - 1.0).abs() < 1e-12);
        assert_eq!(summary.transitivity, 0.0);
    }

    #[test]
    fn test_triangle_is_fully_clustered() {
        let graph = graph_from_edges(3, &[(0, 1), (1, 2), (0, 2)]);
        let summary = GraphSummary::of(&graph);
        assert!((summary.transitivity - 1.0).abs() < 1e-12);
        assert!((summary.average_clustering - 1.0).abs() < 1e-12);
        assert!((summary.density - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_triangle_with_pendant() {
        // Triangle 0-1-2 plus pendant 3 attached to 2.
        let graph = graph_from_edges(4, &[(0, 1), (1, 2), (0, 2), (2, 3)]);
        // Triples: deg 2,2,3,1 -> 1 + 1 + 3 + 0 = 5; 3 * 1 triangle / 5
        assert!((transitivity(&graph) - 0.6).abs() < 1e-12);

        let local = local_clustering(&graph);
        let s = |i: usize| Symbol::new(format!("S{:02}", i)).unwrap();
        assert!((local[&s(0)] - 1.0).abs() < 1e-12);
        assert!((local[&s(2)] - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(local[&s(3)], 0.0);
        assert!((average_clustering(&graph) - (1.0 + 1.0 + 1.0 / 3.0) / 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_largest_component_fraction_with_isolates() {
        let graph = graph_from_edges(5, &[(0, 1), (1, 2)]);
        assert!((largest_component_fraction(&graph) - 0.6).abs() < 1e-12);

        let no_edges = graph_from_edges(4, &[]);
        assert!((largest_component_fraction(&no_edges) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_empty_graph_metrics_are_zero() {
        let graph = graph_from_edges(0, &[]);
        let summary = GraphSummary::of(&graph);
        assert_eq!(summary.mean_degree, 0.0);
        assert_eq!(summary.density, 0.0);
        assert_eq!(summary.largest_component_fraction, 0.0);
        assert_eq!(summary.average_clustering, 0.0);
        assert!(degree_distribution(&graph).is_empty());
    }

    #[test]
    fn test_degree_distribution() {
        let graph = graph_from_edges(4, &[(0, 1), (1, 2)]);
        let distribution = degree_distribution(&graph);
        assert_eq!(
            distribution,
            vec![
                DegreeBin { degree: 0, count: 1, probability: 0.25 },
                DegreeBin { degree: 1, count: 2, probability: 0.5 },
                DegreeBin { degree: 2, count: 1, probability: 0.25 },
            ]
        );
    }

    #[test]
    fn test_compare_with_random() {
        let graph = graph_from_edges(4, &[(0, 1), (1, 2), (0, 2)]);
        let comparison = compare_with_random(&graph);
        assert!((comparison.edge_probability - 0.5).abs() < 1e-12);
        assert!((comparison.observed_clustering - 0.75).abs() < 1e-12);
        assert!((comparison.ratio.unwrap() - 1.5).abs() < 1e-12);

        let sparse = graph_from_edges(3, &[]);
        assert_eq!(compare_with_random(&sparse).ratio, None);
    }
}
