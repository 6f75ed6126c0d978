//! Network Construction Binary
//!
//! Builds the correlation threshold graph from the cleaned price table and
//! saves it as a JSON artifact.
//!
//! Run with: `cargo run --bin build-network`
//! Threshold: `STOCKNET_THETA=0.6 cargo run --bin build-network`

use std::time::Instant;
use stocknet::{
    init_tracing, AnalysisConfig, CorrelationMatrix, GraphSummary, PriceTable, ReturnMatrix,
    ThresholdGraph,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let config = AnalysisConfig::from_env()?;

    let prices = PriceTable::load_csv(&config.prices_path)?;
    println!("Loaded '{}'.", config.prices_path.display());
    println!(
        "Shape of price data: ({}, {})",
        prices.num_dates(),
        prices.num_symbols()
    );

    let returns = ReturnMatrix::from_prices(&prices);
    println!(
        "Log-returns calculated. Shape: ({}, {})",
        returns.num_observations(),
        returns.symbols().len()
    );

    let started = Instant::now();
    let corr = CorrelationMatrix::pearson(&returns)?;
    println!(
        "Correlation matrix ({0} x {0}) calculated in {1:.2} seconds.",
        corr.len(),
        started.elapsed().as_secs_f64()
    );
    if !corr.degenerate_symbols().is_empty() {
        println!(
            "Zero-variance symbols left isolated: {}",
            corr.degenerate_symbols()
                .iter()
                .map(|s| s.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    println!("Building graph with threshold theta = {}...", config.theta);
    let graph = ThresholdGraph::from_correlation(&corr, config.theta);
    let summary = GraphSummary::of(&graph);

    println!();
    println!("--- Network Created ---");
    println!("Number of nodes (stocks): {}", summary.node_count);
    println!(
        "Number of edges (correlations >= {}): {}",
        config.theta, summary.edge_count
    );
    println!("Average Degree <k>: {:.2}", summary.mean_degree);
    println!("Network Density: {:.4}", summary.density);
    println!(
        "Largest component: {} nodes ({:.1}% of network)",
        summary.largest_component_size,
        summary.largest_component_fraction * 100.0
    );

    graph.save(&config.graph_path)?;
    println!("Graph saved to '{}'", config.graph_path.display());

    Ok(())
}
