//! Threshold Sweep Binary
//!
//! Traces mean degree, clustering and the largest-component fraction across
//! correlation thresholds.
//!
//! Run with: `cargo run --bin sweep-thresholds`
//! Range: `STOCKNET_SWEEP=0.2:0.7:0.02 cargo run --bin sweep-thresholds`

use stocknet::{
    init_tracing, AnalysisConfig, CorrelationMatrix, PercolationSweep, PriceTable,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let config = AnalysisConfig::from_env()?;

    let prices = PriceTable::load_csv(&config.prices_path)?;
    let corr = CorrelationMatrix::from_prices(&prices)?;
    println!("Loaded and processed data for {} stocks.", corr.len());

    let sweep = PercolationSweep::over_range(&corr, &config.sweep);

    println!();
    println!(
        "{:>6} {:>8} {:>8} {:>8} {:>8}",
        "theta", "edges", "<k>", "C", "S"
    );
    for point in sweep.points() {
        println!(
            "{:>6.2} {:>8} {:>8.2} {:>8.4} {:>8.4}",
            point.theta,
            point.edge_count,
            point.mean_degree,
            point.average_clustering,
            point.largest_component_fraction
        );
    }

    if let Some(point) = sweep.closest_to(config.theta) {
        println!();
        println!(
            "At theta = {:.2}: S = {:.2}",
            point.theta, point.largest_component_fraction
        );
    }
    if let Some((before, after)) = sweep.sharpest_drop() {
        println!(
            "Sharpest percolation drop: theta {:.2} -> {:.2} (S {:.2} -> {:.2})",
            before.theta,
            after.theta,
            before.largest_component_fraction,
            after.largest_component_fraction
        );
    }

    sweep.write_csv(&config.sweep_report_path)?;
    println!("Sweep saved to '{}'", config.sweep_report_path.display());

    Ok(())
}
