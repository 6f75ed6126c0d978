use super::GraphError;
use crate::correlation::CorrelationMatrix;
use crate::symbol::Symbol;
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::unionfind::UnionFind;
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// Undirected edge annotated with the correlation that created it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub source: Symbol,
    pub target: Symbol,
    pub weight: f64,
}

/// Correlation threshold graph.
///
/// Nodes are all symbols of the correlation matrix (in matrix order), edges
/// are the unordered pairs whose correlation is at least `theta`. The graph
/// has no self-loops and no parallel edges.
#[derive(Debug, Clone)]
pub struct ThresholdGraph {
    theta: f64,
    graph: UnGraph<Symbol, f64>,
    index: HashMap<Symbol, NodeIndex>,
}

impl ThresholdGraph {
    /// Builds the graph of all pairs with `correlation >= theta`.
    ///
    /// Each unordered pair is visited once. NaN correlations never pass the
    /// comparison, so symbols with undefined correlations stay isolated.
    pub fn from_correlation(corr: &CorrelationMatrix, theta: f64) -> Self {
        let n = corr.len();
        let mut graph = UnGraph::with_capacity(n, 0);
        let mut index = HashMap::with_capacity(n);
        let nodes: Vec<NodeIndex> = corr
            .symbols()
            .iter()
            .map(|symbol| {
                let node = graph.add_node(symbol.clone());
                index.insert(symbol.clone(), node);
                node
            })
            .collect();

        for i in 0..n {
            for j in (i + 1)..n {
                let correlation = corr.get(i, j);
                if correlation >= theta {
                    graph.add_edge(nodes[i], nodes[j], correlation);
                }
            }
        }

        debug!(
            theta,
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "threshold graph built"
        );
        ThresholdGraph {
            theta,
            graph,
            index,
        }
    }

    /// Rebuilds a graph from explicit nodes and edges.
    ///
    /// # Errors
    /// Returns `InvalidEdge` for self-loops, duplicate edges or edges that
    /// reference a symbol missing from `nodes`.
    pub fn from_parts(theta: f64, nodes: Vec<Symbol>, edges: Vec<Edge>) -> Result<Self, GraphError> {
        let mut graph = UnGraph::with_capacity(nodes.len(), edges.len());
        let mut index = HashMap::with_capacity(nodes.len());
        for symbol in nodes {
            if index.contains_key(&symbol) {
                return Err(GraphError::InvalidEdge(format!("duplicate node {}", symbol)));
            }
            let node = graph.add_node(symbol.clone());
            index.insert(symbol, node);
        }

        let mut seen = BTreeSet::new();
        for edge in edges {
            let (a, b) = match (index.get(&edge.source), index.get(&edge.target)) {
                (Some(&a), Some(&b)) => (a, b),
                _ => {
                    return Err(GraphError::InvalidEdge(format!(
                        "{} - {} references an unknown node",
                        edge.source, edge.target
                    )))
                }
            };
            if a == b {
                return Err(GraphError::InvalidEdge(format!("self-loop on {}", edge.source)));
            }
            if !seen.insert((a.min(b), a.max(b))) {
                return Err(GraphError::InvalidEdge(format!(
                    "duplicate edge {} - {}",
                    edge.source, edge.target
                )));
            }
            graph.add_edge(a, b, edge.weight);
        }

        Ok(ThresholdGraph {
            theta,
            graph,
            index,
        })
    }

    /// Threshold the graph was built with.
    pub fn theta(&self) -> f64 {
        self.theta
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Symbols in node order.
    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.graph.node_weights()
    }

    pub fn contains(&self, symbol: &Symbol) -> bool {
        self.index.contains_key(symbol)
    }

    /// Degree of `symbol`, `None` if it is not a node.
    pub fn degree(&self, symbol: &Symbol) -> Option<usize> {
        let node = *self.index.get(symbol)?;
        Some(self.graph.neighbors(node).count())
    }

    /// Degree of every node, in node order.
    pub fn degrees(&self) -> Vec<(Symbol, usize)> {
        self.graph
            .node_indices()
            .map(|node| (self.graph[node].clone(), self.graph.neighbors(node).count()))
            .collect()
    }

    /// Neighbours of `symbol`, sorted.
    pub fn neighbors(&self, symbol: &Symbol) -> Vec<Symbol> {
        let mut neighbors: Vec<Symbol> = match self.index.get(symbol) {
            Some(&node) => self
                .graph
                .neighbors(node)
                .map(|n| self.graph[n].clone())
                .collect(),
            None => Vec::new(),
        };
        neighbors.sort();
        neighbors
    }

    pub fn has_edge(&self, a: &Symbol, b: &Symbol) -> bool {
        self.edge_weight(a, b).is_some()
    }

    /// Correlation stored on the edge between `a` and `b`.
    pub fn edge_weight(&self, a: &Symbol, b: &Symbol) -> Option<f64> {
        let a = *self.index.get(a)?;
        let b = *self.index.get(b)?;
        let edge = self.graph.find_edge(a, b)?;
        self.graph.edge_weight(edge).copied()
    }

    /// All edges with their weights, in insertion order.
    pub fn edges(&self) -> Vec<Edge> {
        self.graph
            .edge_references()
            .map(|edge| Edge {
                source: self.graph[edge.source()].clone(),
                target: self.graph[edge.target()].clone(),
                weight: *edge.weight(),
            })
            .collect()
    }

    /// Edge set as ordered symbol pairs (smaller symbol first).
    pub fn edge_set(&self) -> BTreeSet<(Symbol, Symbol)> {
        self.graph
            .edge_references()
            .map(|edge| {
                let a = self.graph[edge.source()].clone();
                let b = self.graph[edge.target()].clone();
                if a <= b {
                    (a, b)
                } else {
                    (b, a)
                }
            })
            .collect()
    }

    /// Adjacency lists by node position.
    pub(crate) fn adjacency(&self) -> Vec<Vec<usize>> {
        self.graph
            .node_indices()
            .map(|node| {
                let mut neighbors: Vec<usize> =
                    self.graph.neighbors(node).map(NodeIndex::index).collect();
                neighbors.sort_unstable();
                neighbors
            })
            .collect()
    }

    /// Symbol at node position `position`.
    pub(crate) fn symbol_at(&self, position: usize) -> &Symbol {
        &self.graph[NodeIndex::new(position)]
    }

    /// Connected components, largest first.
    ///
    /// Isolated nodes form singleton components. Components of equal size
    /// keep node order.
    pub fn connected_components(&self) -> Vec<Vec<Symbol>> {
        let n = self.node_count();
        let mut sets = UnionFind::new(n);
        for edge in self.graph.edge_references() {
            sets.union(edge.source().index(), edge.target().index());
        }

        let mut groups: Vec<Vec<usize>> = Vec::new();
        let mut group_of_root: HashMap<usize, usize> = HashMap::new();
        for node in 0..n {
            let root = sets.find(node);
            let group = *group_of_root.entry(root).or_insert_with(|| {
                groups.push(Vec::new());
                groups.len() - 1
            });
            groups[group].push(node);
        }

        // Stable sort keeps first-seen order among equal sizes.
        groups.sort_by(|a, b| b.len().cmp(&a.len()));
        groups
            .into_iter()
            .map(|group| group.into_iter().map(|i| self.symbol_at(i).clone()).collect())
            .collect()
    }

    /// Nodes of the largest connected component (empty for an empty graph).
    pub fn largest_component(&self) -> Vec<Symbol> {
        self.connected_components()
            .into_iter()
            .next()
            .unwrap_or_default()
    }

    /// Induced subgraph on `symbols`; unknown symbols are ignored.
    pub fn subgraph(&self, symbols: &[Symbol]) -> ThresholdGraph {
        let keep: BTreeSet<&Symbol> = symbols.iter().filter(|s| self.contains(s)).collect();
        let nodes: Vec<Symbol> = self
            .symbols()
            .filter(|symbol| keep.contains(symbol))
            .cloned()
            .collect();
        let edges: Vec<Edge> = self
            .edges()
            .into_iter()
            .filter(|edge| keep.contains(&edge.source) && keep.contains(&edge.target))
            .collect();

        let mut graph = UnGraph::with_capacity(nodes.len(), 0);
        let mut index = HashMap::with_capacity(nodes.len());
        for symbol in nodes {
            let node = graph.add_node(symbol.clone());
            index.insert(symbol, node);
        }
        for Edge {
            source,
            target,
            weight,
        } in edges
        {
            graph.add_edge(index[&source], index[&target], weight);
        }

        ThresholdGraph {
            theta: self.theta,
            graph,
            index,
        }
    }

    /// Underlying petgraph graph.
    pub fn inner(&self) -> &UnGraph<Symbol, f64> {
        &self.graph
    }
}
