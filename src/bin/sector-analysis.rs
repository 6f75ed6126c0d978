//! Sector Analysis Binary
//!
//! Averages degree, clustering and betweenness per industry and exports the
//! table as CSV and LaTeX.
//!
//! Run with: `cargo run --bin sector-analysis`
//! Local list: `STOCKNET_SECTORS=ind_nifty500list.csv cargo run --bin sector-analysis`

use stocknet::{
    init_tracing, AnalysisConfig, SectorMap, SectorReport, ThresholdGraph,
    YahooFinanceDownloader,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let config = AnalysisConfig::from_env()?;

    let sectors = if config.sectors_are_remote() {
        let downloader = YahooFinanceDownloader::with_config(config.downloader.clone())?;
        downloader
            .fetch_constituents(&config.sectors, &config.symbol_suffix)
            .await?
    } else {
        SectorMap::load_csv(&config.sectors, &config.symbol_suffix)?
    };
    println!("Sector mapping created for {} symbols.", sectors.len());

    let graph = ThresholdGraph::load(&config.graph_path)?;
    println!("Loaded graph from '{}'", config.graph_path.display());

    let report = SectorReport::compute(&graph, &sectors);
    if report.is_empty() {
        println!("No stock in the graph appears in the sector list.");
    }
    // Both exports fail on an empty report.
    report.write_csv(&config.sector_report_path)?;
    let latex = report.to_latex()?;

    println!();
    println!("--- Network Analysis by Sector (theta = {}) ---", report.theta());
    println!(
        "{:<40} {:>6} {:>10} {:>10} {:>12}",
        "Industry", "Stocks", "Degree", "Clustering", "Betweenness"
    );
    for row in report.rows() {
        println!(
            "{:<40} {:>6} {:>10.4} {:>10.4} {:>12.4}",
            row.industry, row.num_stocks, row.avg_degree, row.avg_clustering, row.avg_betweenness
        );
    }
    println!();
    println!("Results saved to '{}'", config.sector_report_path.display());

    println!();
    println!("--- LaTeX Code for Report Table ---");
    print!("{}", latex);

    Ok(())
}
