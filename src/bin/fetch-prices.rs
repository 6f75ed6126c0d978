//! Price Download Binary
//!
//! Downloads the constituent list and daily adjusted closes, stores them in
//! SQLite and writes the cleaned price table.
//!
//! Run with: `cargo run --bin fetch-prices`

use stocknet::{
    init_tracing, AnalysisConfig, PriceTable, SectorMap, SqlitePriceStore, Symbol,
    YahooFinanceDownloader,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let config = AnalysisConfig::from_env()?;
    let downloader = YahooFinanceDownloader::with_config(config.downloader.clone())?;

    let constituents = if config.sectors_are_remote() {
        downloader
            .fetch_constituents(&config.sectors, &config.symbol_suffix)
            .await?
    } else {
        SectorMap::load_csv(&config.sectors, &config.symbol_suffix)?
    };
    let symbols: Vec<Symbol> = constituents.symbols().cloned().collect();
    println!("Fetched {} stock symbols.", symbols.len());

    let mut store = SqlitePriceStore::new(&config.database_path)?;
    for (symbol, industry) in constituents.iter() {
        store.store_symbol(symbol, Some(industry))?;
    }

    println!(
        "Downloading historical data for {} stocks from {} to {}...",
        symbols.len(),
        config.date_range.start,
        config.date_range.end
    );
    let result = downloader.download_many(&symbols, &config.date_range).await;
    for (symbol, points) in &result.successful {
        store.insert_series(symbol, points)?;
    }

    if result.successful.is_empty() {
        return Err("no price data was downloaded".into());
    }

    let downloaded: Vec<Symbol> = result.successful.iter().map(|(s, _)| s.clone()).collect();
    let table = PriceTable::from_provider(&store, &downloaded, &config.date_range)?;
    table.write_csv(&config.prices_path)?;

    println!();
    println!("Symbols requested:                {}", symbols.len());
    println!("Downloaded:                       {}", result.successful.len());
    println!("Failed:                           {}", result.failed.len());
    for (symbol, err) in result.failed.iter().take(10) {
        println!("  {:<16} {}", symbol.as_str(), err);
    }
    if result.failed.len() > 10 {
        println!("  ... and {} more", result.failed.len() - 10);
    }
    println!("After cleaning (no missing data): {}", table.num_symbols());
    println!("Price table saved to '{}'", config.prices_path.display());
    println!("Price store: '{}'", config.database_path.display());

    Ok(())
}
