use crate::prices::{DateRange, PricePoint};
use crate::sectors::{SectorError, SectorMap};
use crate::symbol::Symbol;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Constituents of the Nifty 500 index (`Symbol`, `Industry`, ... columns).
pub const NIFTY500_LIST_URL: &str =
    "https://nsearchives.nseindia.com/content/indices/ind_nifty500list.csv";

/// Yahoo Finance v8 chart endpoint.
pub const YAHOO_CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

/// NSE rejects requests without a browser-like User-Agent.
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/58.0.3029.110 Safari/537.36";

/// Configuration for the Yahoo Finance downloader
#[derive(Debug, Clone)]
pub struct DownloaderConfig {
    /// Maximum number of retry attempts per symbol (default: 3)
    pub max_retries: u32,
    /// Rate limit: requests per second (default: 1.0)
    pub requests_per_second: f64,
    /// Request timeout in seconds (default: 30)
    pub timeout_seconds: u64,
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        DownloaderConfig {
            max_retries: 3,
            requests_per_second: 1.0,
            timeout_seconds: 30,
        }
    }
}

impl DownloaderConfig {
    /// Minimum pause between two requests; zero when rate limiting is off.
    pub fn request_interval(&self) -> Duration {
        if self.requests_per_second > 0.0 && self.requests_per_second.is_finite() {
            Duration::from_secs_f64(1.0 / self.requests_per_second)
        } else {
            Duration::ZERO
        }
    }
}

/// Outcome of a multi-symbol download.
#[derive(Debug, Default)]
pub struct DownloadResult {
    /// Symbols with at least one price in range, in request order
    pub successful: Vec<(Symbol, Vec<PricePoint>)>,
    /// Symbols that could not be downloaded, with the last error
    pub failed: Vec<(Symbol, FetchError)>,
}

/// Downloads the index constituent list and daily price history.
#[derive(Debug)]
pub struct YahooFinanceDownloader {
    client: Client,
    config: DownloaderConfig,
    chart_url: String,
}

impl YahooFinanceDownloader {
    /// Creates a new downloader with default configuration.
    pub fn new() -> Result<Self, FetchError> {
        Self::with_config(DownloaderConfig::default())
    }

    /// Creates a new downloader with custom configuration.
    ///
    /// # Errors
    /// Returns `ClientCreation` if the HTTP client cannot be built.
    pub fn with_config(config: DownloaderConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(BROWSER_USER_AGENT)
            .build()
            .map_err(|e| FetchError::ClientCreation(e.to_string()))?;

        Ok(YahooFinanceDownloader {
            client,
            config,
            chart_url: YAHOO_CHART_URL.to_string(),
        })
    }

    /// Fetches the constituent list at `url` as a sector map, appending
    /// `suffix` to every ticker.
    ///
    /// # Errors
    /// Any failure is returned, including an empty list; the caller decides
    /// whether to continue.
    pub async fn fetch_constituents(&self, url: &str, suffix: &str) -> Result<SectorMap, FetchError> {
        info!(url, "downloading constituent list");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;
        check_status(response.status())?;

        let text = response
            .text()
            .await
            .map_err(|e| FetchError::Parse(e.to_string()))?;
        let constituents = SectorMap::read_csv(text.as_bytes(), suffix)?;
        if constituents.is_empty() {
            return Err(FetchError::EmptySymbolList);
        }

        info!(symbols = constituents.len(), "constituent list fetched");
        Ok(constituents)
    }

    /// Fetches the daily adjusted close of `symbol` over `range`, retrying
    /// transient failures with exponential backoff.
    pub async fn fetch_history(
        &self,
        symbol: &Symbol,
        range: &DateRange,
    ) -> Result<Vec<PricePoint>, FetchError> {
        let mut attempt = 0;
        loop {
            match self.request_history(symbol, range).await {
                Ok(points) => return Ok(points),
                Err(err) if err.is_retryable() && attempt < self.config.max_retries => {
                    attempt += 1;
                    let backoff = Duration::from_millis(500 * 2u64.pow(attempt));
                    warn!(%symbol, attempt, error = %err, "retrying after {:?}", backoff);
                    tokio::time::sleep(backoff).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Downloads every symbol in order under the configured rate limit.
    ///
    /// Failing symbols, including those without prices in range, are
    /// recorded in [`DownloadResult::failed`] and do not stop the download.
    pub async fn download_many(&self, symbols: &[Symbol], range: &DateRange) -> DownloadResult {
        let interval = self.config.request_interval();
        let mut result = DownloadResult::default();

        for (i, symbol) in symbols.iter().enumerate() {
            if i > 0 && !interval.is_zero() {
                tokio::time::sleep(interval).await;
            }

            match self.fetch_history(symbol, range).await {
                Ok(points) if points.is_empty() => {
                    warn!(%symbol, "no data returned");
                    result.failed.push((symbol.clone(), FetchError::NoData(symbol.to_string())));
                }
                Ok(points) => {
                    debug!(%symbol, prices = points.len(), "downloaded");
                    result.successful.push((symbol.clone(), points));
                }
                Err(err) => {
                    warn!(%symbol, error = %err, "download failed, skipping");
                    result.failed.push((symbol.clone(), err));
                }
            }

            if (i + 1) % 50 == 0 {
                info!(done = i + 1, total = symbols.len(), "download progress");
            }
        }

        info!(
            requested = symbols.len(),
            successful = result.successful.len(),
            failed = result.failed.len(),
            "download finished"
        );
        result
    }

    async fn request_history(
        &self,
        symbol: &Symbol,
        range: &DateRange,
    ) -> Result<Vec<PricePoint>, FetchError> {
        if !range.is_valid() {
            return Err(FetchError::InvalidDate(format!(
                "{} is after {}",
                range.start, range.end
            )));
        }
        let (period1, period2) = chart_period(range)?;

        let url = format!(
            "{}/{}?period1={}&period2={}&interval=1d&events=history",
            self.chart_url, symbol, period1, period2
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;
        check_status(response.status())?;

        let chart: ChartResponse = response
            .json()
            .await
            .map_err(|e| FetchError::Parse(e.to_string()))?;
        parse_chart(chart, range)
    }

    /// Returns a reference to the configuration.
    pub fn config(&self) -> &DownloaderConfig {
        &self.config
    }
}

/// `period1`/`period2` query values for an inclusive date range.
///
/// `period2` is exclusive on the Yahoo side, so it is the midnight after the
/// last requested day.
fn chart_period(range: &DateRange) -> Result<(i64, i64), FetchError> {
    let period1 = range
        .start
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| FetchError::InvalidDate(range.start.to_string()))?
        .and_utc()
        .timestamp();
    let period2 = range
        .end
        .succ_opt()
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .ok_or_else(|| FetchError::InvalidDate(range.end.to_string()))?
        .and_utc()
        .timestamp();
    Ok((period1, period2))
}

fn check_status(status: StatusCode) -> Result<(), FetchError> {
    if status.is_success() {
        Ok(())
    } else {
        Err(FetchError::Http {
            status: status.as_u16(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ChartErrorBody {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: Option<ChartMeta>,
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    /// Exchange offset from UTC in seconds
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<Quote>,
    adjclose: Option<Vec<AdjClose>>,
}

#[derive(Debug, Deserialize)]
struct Quote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct AdjClose {
    #[serde(default)]
    adjclose: Vec<Option<f64>>,
}

/// Extracts adjusted closes (plain closes when no adjusted series is
/// present) on exchange-local dates within `range`.
///
/// Null prices are skipped. When two bars fall on the same date the later
/// one wins.
fn parse_chart(response: ChartResponse, range: &DateRange) -> Result<Vec<PricePoint>, FetchError> {
    if let Some(error) = response.chart.error {
        return Err(FetchError::Api(format!("{} - {}", error.code, error.description)));
    }
    let result = response
        .chart
        .result
        .and_then(|results| results.into_iter().next())
        .ok_or_else(|| FetchError::Parse("empty chart result".to_string()))?;

    let Some(timestamps) = result.timestamp else {
        return Ok(Vec::new());
    };
    let offset = result.meta.map(|meta| meta.gmtoffset).unwrap_or(0);
    let prices = match result
        .indicators
        .adjclose
        .and_then(|series| series.into_iter().next())
    {
        Some(adjusted) => adjusted.adjclose,
        None => result
            .indicators
            .quote
            .into_iter()
            .next()
            .map(|quote| quote.close)
            .unwrap_or_default(),
    };

    let mut points: Vec<PricePoint> = timestamps
        .iter()
        .zip(prices)
        .filter_map(|(&ts, price)| {
            let date = DateTime::<Utc>::from_timestamp(ts + offset, 0)?.date_naive();
            let close = price.filter(|p| p.is_finite())?;
            range.contains(date).then(|| PricePoint::new(date, close))
        })
        .collect();

    points.reverse();
    points.sort_by_key(|point| point.date);
    points.dedup_by_key(|point| point.date);
    Ok(points)
}

/// Errors that can occur while downloading market data.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchError {
    /// HTTP client creation failed
    ClientCreation(String),
    /// Network error occurred
    Network(String),
    /// Server answered with a non-success status
    Http { status: u16 },
    /// API returned an error object
    Api(String),
    /// Failed to parse response data
    Parse(String),
    /// No prices in the requested range
    NoData(String),
    /// Invalid date range
    InvalidDate(String),
    /// Constituent list could not be read
    SymbolList(SectorError),
    /// Constituent list contained no symbols
    EmptySymbolList,
}

impl FetchError {
    /// Network failures, rate limiting and server errors are worth retrying.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Network(_) => true,
            FetchError::Http { status } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::ClientCreation(msg) => write!(f, "Client creation error: {}", msg),
            FetchError::Network(msg) => write!(f, "Network error: {}", msg),
            FetchError::Http { status } => write!(f, "HTTP error: status {}", status),
            FetchError::Api(msg) => write!(f, "API error: {}", msg),
            FetchError::Parse(msg) => write!(f, "Parse error: {}", msg),
            FetchError::NoData(symbol) => write!(f, "No data returned for {}", symbol),
            FetchError::InvalidDate(msg) => write!(f, "Invalid date: {}", msg),
            FetchError::SymbolList(err) => write!(f, "Invalid constituent list: {}", err),
            FetchError::EmptySymbolList => write!(f, "Constituent list is empty"),
        }
    }
}

impl std::error::Error for FetchError {}

impl From<SectorError> for FetchError {
    fn from(err: SectorError) -> Self {
        FetchError::SymbolList(err)
    }
}
