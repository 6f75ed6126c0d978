//! Core/periphery split of the largest connected component.

use super::graph::ThresholdGraph;
use crate::symbol::Symbol;
use serde::Serialize;

/// Hubs of the largest component and everything else in it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorePeriphery {
    /// Highest-degree nodes with their degrees, descending
    pub core: Vec<(Symbol, usize)>,
    /// Remaining LCC nodes, in node order
    pub periphery: Vec<Symbol>,
    pub min_degree: usize,
    pub max_degree: usize,
}

/// Splits the LCC into the `hubs` highest-degree nodes and the periphery.
///
/// Degree ties are broken by symbol. Returns `None` for an empty graph.
pub fn core_periphery(graph: &ThresholdGraph, hubs: usize) -> Option<CorePeriphery> {
    let lcc = graph.subgraph(&graph.largest_component());
    let mut degrees = lcc.degrees();
    if degrees.is_empty() {
        return None;
    }

    let min_degree = degrees.iter().map(|(_, d)| *d).min().unwrap_or(0);
    let max_degree = degrees.iter().map(|(_, d)| *d).max().unwrap_or(0);

    let node_order: Vec<Symbol> = degrees.iter().map(|(s, _)| s.clone()).collect();
    degrees.sort_by(|(a, da), (b, db)| db.cmp(da).then_with(|| a.cmp(b)));
    degrees.truncate(hubs);

    let periphery = node_order
        .into_iter()
        .filter(|symbol| !degrees.iter().any(|(hub, _)| hub == symbol))
        .collect();

    Some(CorePeriphery {
        core: degrees,
        periphery,
        min_degree,
        max_degree,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::correlation::CorrelationMatrix;

    fn s(i: usize) -> Symbol {
        Symbol::new(format!("S{}", i)).unwrap()
    }

    #[test]
    fn test_core_periphery_on_lcc() {
        // Star on 0..=3 plus edge 1-2, and a separate pair 4-5.
        let n = 6;
        let mut values = vec![0.0; n * n];
        for i in 0..n {
            values[i * n + i] = 1.0;
        }
        for (a, b) in [(0, 1), (0, 2), (0, 3), (1, 2), (4, 5)] {
            values[a * n + b] = 0.7;
            values[b * n + a] = 0.7;
        }
        let corr = CorrelationMatrix::from_values((0..n).map(s).collect(), values).unwrap();
        let graph = ThresholdGraph::from_correlation(&corr, 0.5);

        let split = core_periphery(&graph, 2).unwrap();
        assert_eq!(split.core, vec![(s(0), 3), (s(1), 2)]);
        assert_eq!(split.periphery, vec![s(2), s(3)]);
        assert_eq!(split.min_degree, 1);
        assert_eq!(split.max_degree, 3);
    }

    #[test]
    fn test_core_periphery_empty_graph() {
        let corr = CorrelationMatrix::from_values(Vec::new(), Vec::new()).unwrap();
        let graph = ThresholdGraph::from_correlation(&corr, 0.5);
        assert_eq!(core_periphery(&graph, 10), None);
    }
}
