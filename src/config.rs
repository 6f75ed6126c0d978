//! Run configuration shared by the binaries.
//!
//! Every setting has a default and can be overridden by a `STOCKNET_*`
//! environment variable.

use crate::fetch::{DownloaderConfig, NIFTY500_LIST_URL};
use crate::network::{ThresholdRange, DEFAULT_THETA};
use crate::prices::DateRange;
use chrono::NaiveDate;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

pub const ENV_PRICES: &str = "STOCKNET_PRICES";
pub const ENV_GRAPH: &str = "STOCKNET_GRAPH";
pub const ENV_DATABASE: &str = "STOCKNET_DATABASE";
pub const ENV_SECTORS: &str = "STOCKNET_SECTORS";
pub const ENV_SECTOR_REPORT: &str = "STOCKNET_SECTOR_REPORT";
pub const ENV_SWEEP_REPORT: &str = "STOCKNET_SWEEP_REPORT";
pub const ENV_START: &str = "STOCKNET_START";
pub const ENV_END: &str = "STOCKNET_END";
pub const ENV_THETA: &str = "STOCKNET_THETA";
pub const ENV_SWEEP: &str = "STOCKNET_SWEEP";

/// Analysis configuration
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Cleaned price table CSV (default: "nifty500_adj_close_2023_2024.csv")
    pub prices_path: PathBuf,
    /// Graph artifact JSON (default: "nifty500_network.json")
    pub graph_path: PathBuf,
    /// SQLite price store (default: "nifty500_prices.db")
    pub database_path: PathBuf,
    /// Constituent/sector table: an http(s) URL or a local CSV path
    pub sectors: String,
    /// Sector report CSV (default: "sector_analysis.csv")
    pub sector_report_path: PathBuf,
    /// Threshold sweep CSV (default: "parameter_study.csv")
    pub sweep_report_path: PathBuf,
    /// Price history window, both ends inclusive (default: 2023-01-01 to
    /// 2024-12-30, i.e. up to but excluding 2024-12-31)
    pub date_range: DateRange,
    /// Correlation threshold (default: 0.5)
    pub theta: f64,
    /// Thresholds for the percolation sweep (default: 0.20..=0.70 step 0.02)
    pub sweep: ThresholdRange,
    /// Exchange suffix appended to listed tickers (default: ".NS")
    pub symbol_suffix: String,
    /// Entries shown in centrality rankings (default: 10)
    pub top_n: usize,
    /// Hubs in the core/periphery split (default: 10)
    pub hubs: usize,
    pub downloader: DownloaderConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            prices_path: PathBuf::from("nifty500_adj_close_2023_2024.csv"),
            graph_path: PathBuf::from("nifty500_network.json"),
            database_path: PathBuf::from("nifty500_prices.db"),
            sectors: NIFTY500_LIST_URL.to_string(),
            sector_report_path: PathBuf::from("sector_analysis.csv"),
            sweep_report_path: PathBuf::from("parameter_study.csv"),
            date_range: DateRange::new(
                NaiveDate::from_ymd_opt(2023, 1, 1).unwrap_or_default(),
                NaiveDate::from_ymd_opt(2024, 12, 30).unwrap_or_default(),
            ),
            theta: DEFAULT_THETA,
            sweep: ThresholdRange::default(),
            symbol_suffix: ".NS".to_string(),
            top_n: 10,
            hubs: 10,
            downloader: DownloaderConfig::default(),
        }
    }
}

impl AnalysisConfig {
    /// Defaults overridden by `STOCKNET_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable.
    ///
    /// # Errors
    /// Returns `InvalidValue` for an unparsable date, θ or sweep range, and
    /// for a start date after the end date.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = AnalysisConfig::default();

        if let Some(path) = lookup(ENV_PRICES) {
            config.prices_path = PathBuf::from(path);
        }
        if let Some(path) = lookup(ENV_GRAPH) {
            config.graph_path = PathBuf::from(path);
        }
        if let Some(path) = lookup(ENV_DATABASE) {
            config.database_path = PathBuf::from(path);
        }
        if let Some(source) = lookup(ENV_SECTORS) {
            config.sectors = source;
        }
        if let Some(path) = lookup(ENV_SECTOR_REPORT) {
            config.sector_report_path = PathBuf::from(path);
        }
        if let Some(path) = lookup(ENV_SWEEP_REPORT) {
            config.sweep_report_path = PathBuf::from(path);
        }
        if let Some(value) = lookup(ENV_START) {
            config.date_range.start = parse_date(ENV_START, &value)?;
        }
        if let Some(value) = lookup(ENV_END) {
            config.date_range.end = parse_date(ENV_END, &value)?;
        }
        if !config.date_range.is_valid() {
            return Err(ConfigError::InvalidValue {
                key: ENV_START,
                value: config.date_range.start.to_string(),
                reason: format!("start is after end {}", config.date_range.end),
            });
        }
        if let Some(value) = lookup(ENV_THETA) {
            config.theta = value
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|theta| theta.is_finite())
                .ok_or_else(|| ConfigError::InvalidValue {
                    key: ENV_THETA,
                    value: value.clone(),
                    reason: "expected a number".to_string(),
                })?;
        }
        if let Some(value) = lookup(ENV_SWEEP) {
            config.sweep = value.parse().map_err(|e| ConfigError::InvalidValue {
                key: ENV_SWEEP,
                value: value.clone(),
                reason: format!("{}", e),
            })?;
        }

        Ok(config)
    }

    /// True if the sector source should be downloaded rather than read from disk.
    pub fn sectors_are_remote(&self) -> bool {
        self.sectors.starts_with("http://") || self.sectors.starts_with("https://")
    }
}

fn parse_date(key: &'static str, value: &str) -> Result<NaiveDate, ConfigError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| ConfigError::InvalidValue {
        key,
        value: value.to_string(),
        reason: "expected YYYY-MM-DD".to_string(),
    })
}

/// Installs the global tracing subscriber.
///
/// The filter comes from `RUST_LOG` (default "info"), e.g.
/// `RUST_LOG=stocknet::network=debug cargo run --bin build-network`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

/// Errors that can occur while reading the configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidValue { key, value, reason } => {
                write!(f, "Invalid {}='{}': {}", key, value, reason)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
