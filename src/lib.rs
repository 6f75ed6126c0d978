pub mod symbol;
pub mod prices;
pub mod returns;
pub mod correlation;
pub mod network;
pub mod sectors;
pub mod store;
pub mod fetch;
pub mod config;

pub use symbol::{Symbol, SymbolError};
pub use prices::{
    DataProvider, DataProviderError, DateRange, InMemoryDataProvider, PricePoint, PriceTable,
    PriceTableError,
};
pub use returns::{log_returns, ReturnMatrix};
pub use correlation::{CorrelationError, CorrelationMatrix};
pub use network::{
    GraphArtifact, GraphError, GraphSummary, PercolationSweep, SweepPoint, ThresholdGraph,
    ThresholdRange, DEFAULT_THETA,
};
pub use sectors::{SectorError, SectorMap, SectorReport, SectorRow, UNKNOWN_SECTOR};
pub use store::{SqlitePriceStore, StoreError};
pub use fetch::{DownloadResult, DownloaderConfig, FetchError, YahooFinanceDownloader};
pub use config::{init_tracing, AnalysisConfig, ConfigError};
