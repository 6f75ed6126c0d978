//! Network Analysis Binary
//!
//! Degree distribution, clustering against G(n, p), centrality rankings,
//! assortativity and the core/periphery split of a saved graph.
//!
//! Run with: `cargo run --bin analyze-network`

use stocknet::network::{
    betweenness_centrality, compare_with_random, core_periphery, degree_assortativity,
    degree_centrality, degree_distribution, eigenvector_centrality_lcc, top_n,
    EigenvectorConfig, Scores,
};
use stocknet::{init_tracing, AnalysisConfig, GraphError, GraphSummary, ThresholdGraph};

/// |r| below this is reported as neutral mixing.
const ASSORTATIVITY_BAND: f64 = 0.05;

fn print_top(scores: &Scores, name: &str, n: usize) {
    println!();
    println!("--- Top {} Stocks by {} ---", n, name);
    let ranked = top_n(scores, n);
    if ranked.is_empty() {
        println!("No nodes to display.");
    }
    for (rank, (symbol, score)) in ranked.iter().enumerate() {
        println!("{:2}. {:<16} (Score: {:.4})", rank + 1, symbol.as_str(), score);
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let config = AnalysisConfig::from_env()?;

    let graph = ThresholdGraph::load(&config.graph_path)?;
    let summary = GraphSummary::of(&graph);
    println!(
        "Loaded '{}' (theta = {}): {} nodes, {} edges",
        config.graph_path.display(),
        graph.theta(),
        summary.node_count,
        summary.edge_count
    );

    println!();
    println!("--- Degree Distribution P(k) ---");
    let distribution = degree_distribution(&graph);
    if distribution.is_empty() {
        println!("Graph has no nodes or degrees to analyze.");
    } else {
        println!("{:>6} {:>6} {:>10}", "k", "count", "P(k)");
        for bin in &distribution {
            println!("{:>6} {:>6} {:>10.4}", bin.degree, bin.count, bin.probability);
        }
    }

    println!();
    println!("--- Clustering & G(n,p) Comparison ---");
    let comparison = compare_with_random(&graph);
    println!("Transitivity: {:.4}", summary.transitivity);
    println!(
        "Stock Network Average Clustering (C): {:.4}",
        comparison.observed_clustering
    );
    println!(
        "Equivalent G(n,p) Random Graph Clustering (C = p): {:.4}",
        comparison.edge_probability
    );
    match comparison.ratio {
        Some(ratio) => println!("Clustering is {:.1} times that of a random graph.", ratio),
        None => println!("Random graph has no clustering, comparison is not applicable."),
    }

    print_top(&degree_centrality(&graph), "Degree Centrality", config.top_n);
    print_top(
        &betweenness_centrality(&graph),
        "Betweenness Centrality",
        config.top_n,
    );

    match eigenvector_centrality_lcc(&graph, EigenvectorConfig::default()) {
        Ok(scores) => {
            println!();
            println!(
                "Largest component has {} nodes ({:.1}% of network).",
                summary.largest_component_size,
                summary.largest_component_fraction * 100.0
            );
            print_top(
                &scores,
                "Eigenvector Centrality (on Largest Component)",
                config.top_n,
            );
        }
        Err(GraphError::EmptyGraph) => {
            println!();
            println!("Graph is empty. Skipping Eigenvector Centrality.");
        }
        Err(err @ GraphError::EigenvectorNotConverged { .. }) => {
            println!();
            println!("{}", err);
        }
        Err(err) => return Err(err.into()),
    }

    println!();
    println!("--- Assortative Mixing ---");
    match degree_assortativity(&graph) {
        Some(r) => {
            println!("Degree Assortativity Coefficient (r): {:.4}", r);
            if r > ASSORTATIVITY_BAND {
                println!("The network is ASSORTATIVE: hubs correlate with other hubs.");
            } else if r < -ASSORTATIVITY_BAND {
                println!("The network is DISASSORTATIVE: hubs connect to peripheral stocks.");
            } else {
                println!("The network is neither assortative nor disassortative (r = 0).");
            }
        }
        None => println!("Assortativity is undefined for this graph."),
    }

    if let Some(split) = core_periphery(&graph, config.hubs) {
        println!();
        println!(
            "--- Core/Periphery of the Largest Component (degree {}..{}) ---",
            split.min_degree, split.max_degree
        );
        for (symbol, degree) in &split.core {
            println!("  hub {:<16} degree {}", symbol.as_str(), degree);
        }
        println!("  periphery: {} stocks", split.periphery.len());
    }

    Ok(())
}
