//! Price Table
//!
//! Daily close prices laid out as dates × symbols, plus the data source
//! abstraction used to assemble them. A cleaned table never contains gaps:
//! every symbol has a price on every date.

use crate::symbol::{Symbol, SymbolError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Name of the date index column in price CSV files.
pub const DATE_COLUMN: &str = "Date";

/// A single daily close price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    /// Trading date
    pub date: NaiveDate,
    /// Adjusted close price on that date
    pub close: f64,
}

impl PricePoint {
    /// Creates a new PricePoint.
    pub fn new(date: NaiveDate, close: f64) -> Self {
        PricePoint { date, close }
    }
}

/// Date range for querying price history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    /// Start date (inclusive)
    pub start: NaiveDate,
    /// End date (inclusive)
    pub end: NaiveDate,
}

impl DateRange {
    /// Creates a new DateRange.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        DateRange { start, end }
    }

    /// Returns true if `date` falls within the range (both ends inclusive).
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Returns true if start <= end.
    pub fn is_valid(&self) -> bool {
        self.start <= self.end
    }
}

/// Trait for price source abstraction.
///
/// Lets the table builder pull per-symbol history from memory, the SQLite
/// store, or any other backend without depending on it directly.
pub trait DataProvider {
    /// Retrieves the close-price history of `symbol` within `date_range`,
    /// sorted by date.
    ///
    /// # Errors
    /// Returns an error if the symbol is unknown, the date range is invalid,
    /// or the underlying source fails.
    fn get_price_series(
        &self,
        symbol: &Symbol,
        date_range: &DateRange,
    ) -> Result<Vec<PricePoint>, DataProviderError>;

    /// Lists every symbol the provider holds data for.
    fn symbols(&self) -> Result<Vec<Symbol>, DataProviderError>;
}

/// Errors that can occur when querying a data provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataProviderError {
    /// Symbol not found in the data source
    SymbolNotFound(String),
    /// Invalid date range (start > end)
    InvalidDateRange,
    /// Generic error message
    Other(String),
}

impl std::fmt::Display for DataProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataProviderError::SymbolNotFound(symbol) => write!(f, "Symbol not found: {}", symbol),
            DataProviderError::InvalidDateRange => write!(f, "Invalid date range"),
            DataProviderError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for DataProviderError {}

/// In-memory data provider, mostly for tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDataProvider {
    data: BTreeMap<Symbol, Vec<PricePoint>>,
}

impl InMemoryDataProvider {
    /// Creates a new empty in-memory data provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds price history for a symbol, replacing any existing history.
    pub fn add_data(&mut self, symbol: Symbol, mut points: Vec<PricePoint>) {
        points.sort_by_key(|point| point.date);
        self.data.insert(symbol, points);
    }
}

impl DataProvider for InMemoryDataProvider {
    fn get_price_series(
        &self,
        symbol: &Symbol,
        date_range: &DateRange,
    ) -> Result<Vec<PricePoint>, DataProviderError> {
        if !date_range.is_valid() {
            return Err(DataProviderError::InvalidDateRange);
        }

        let points = self
            .data
            .get(symbol)
            .ok_or_else(|| DataProviderError::SymbolNotFound(symbol.to_string()))?;

        Ok(points
            .iter()
            .filter(|point| date_range.contains(point.date))
            .copied()
            .collect())
    }

    fn symbols(&self) -> Result<Vec<Symbol>, DataProviderError> {
        Ok(self.data.keys().cloned().collect())
    }
}

/// Cleaned price table: strictly increasing dates × symbols, no gaps.
///
/// Prices are stored column-major, one column per symbol, since every
/// downstream computation works on whole symbol series.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceTable {
    dates: Vec<NaiveDate>,
    symbols: Vec<Symbol>,
    columns: Vec<Vec<f64>>,
}

impl PriceTable {
    /// Creates a price table from complete columns.
    ///
    /// # Errors
    /// Returns an error if dates are not strictly increasing, a column length
    /// differs from the number of dates, a symbol repeats, or any price is NaN.
    pub fn new(
        dates: Vec<NaiveDate>,
        symbols: Vec<Symbol>,
        columns: Vec<Vec<f64>>,
    ) -> Result<Self, PriceTableError> {
        if symbols.len() != columns.len() {
            return Err(PriceTableError::Shape(format!(
                "{} symbols but {} columns",
                symbols.len(),
                columns.len()
            )));
        }

        if let Some(pair) = dates.windows(2).find(|pair| pair[0] >= pair[1]) {
            return Err(PriceTableError::UnsortedDates(pair[1]));
        }

        let mut seen = BTreeSet::new();
        for (symbol, column) in symbols.iter().zip(&columns) {
            if !seen.insert(symbol) {
                return Err(PriceTableError::DuplicateSymbol(symbol.to_string()));
            }
            if column.len() != dates.len() {
                return Err(PriceTableError::Shape(format!(
                    "column {} has {} prices for {} dates",
                    symbol,
                    column.len(),
                    dates.len()
                )));
            }
            if column.iter().any(|price| price.is_nan()) {
                return Err(PriceTableError::MissingValues(symbol.to_string()));
            }
        }

        Ok(PriceTable {
            dates,
            symbols,
            columns,
        })
    }

    /// Builds a table from per-symbol series.
    ///
    /// Series are outer-joined on date; any symbol without a price on every
    /// date of the union is dropped.
    pub fn from_series(series: Vec<(Symbol, Vec<PricePoint>)>) -> Result<Self, PriceTableError> {
        let dates: Vec<NaiveDate> = series
            .iter()
            .flat_map(|(_, points)| points.iter().map(|point| point.date))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let raw = series
            .into_iter()
            .map(|(symbol, points)| {
                let by_date: HashMap<NaiveDate, f64> = points
                    .into_iter()
                    .filter(|point| !point.close.is_nan())
                    .map(|point| (point.date, point.close))
                    .collect();
                let column = dates.iter().map(|date| by_date.get(date).copied()).collect();
                (symbol, column)
            })
            .collect();

        Self::drop_incomplete(dates, raw)
    }

    /// Assembles a table from a data provider over `date_range`.
    ///
    /// Symbols the provider does not know are skipped with a warning.
    pub fn from_provider(
        provider: &dyn DataProvider,
        symbols: &[Symbol],
        date_range: &DateRange,
    ) -> Result<Self, PriceTableError> {
        let mut series = Vec::with_capacity(symbols.len());
        for symbol in symbols {
            match provider.get_price_series(symbol, date_range) {
                Ok(points) if points.is_empty() => {
                    warn!(%symbol, "no prices in range, skipping");
                }
                Ok(points) => series.push((symbol.clone(), points)),
                Err(DataProviderError::SymbolNotFound(_)) => {
                    warn!(%symbol, "symbol not found in provider, skipping");
                }
                Err(err) => return Err(err.into()),
            }
        }
        Self::from_series(series)
    }

    fn drop_incomplete(
        dates: Vec<NaiveDate>,
        raw: Vec<(Symbol, Vec<Option<f64>>)>,
    ) -> Result<Self, PriceTableError> {
        let total = raw.len();
        let (symbols, columns): (Vec<Symbol>, Vec<Vec<f64>>) = raw
            .into_iter()
            .filter_map(|(symbol, column)| {
                let complete: Option<Vec<f64>> = column.into_iter().collect();
                if complete.is_none() {
                    debug!(%symbol, "dropping symbol with missing prices");
                }
                complete.map(|column| (symbol, column))
            })
            .unzip();

        if symbols.len() < total {
            info!(
                kept = symbols.len(),
                dropped = total - symbols.len(),
                "dropped symbols with missing prices"
            );
        }

        Self::new(dates, symbols, columns)
    }

    /// Loads a price table from CSV (first column dates, one column per symbol).
    ///
    /// Empty cells count as missing; columns with any missing price are dropped.
    ///
    /// # Errors
    /// Returns `MissingFile` if the file does not exist, so callers can halt
    /// before any processing.
    pub fn load_csv<P: AsRef<Path>>(path: P) -> Result<Self, PriceTableError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(PriceTableError::MissingFile(path.to_path_buf()));
        }
        let file = File::open(path).map_err(|e| PriceTableError::Io(e.to_string()))?;
        let table = Self::read_csv(file)?;
        info!(
            path = %path.display(),
            dates = table.dates.len(),
            symbols = table.symbols.len(),
            "loaded price table"
        );
        Ok(table)
    }

    /// Reads a price table from any CSV reader.
    pub fn read_csv<R: std::io::Read>(reader: R) -> Result<Self, PriceTableError> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let headers = csv_reader.headers()?.clone();

        let symbols = headers
            .iter()
            .skip(1)
            .map(|name| Symbol::new(name.trim()))
            .collect::<Result<Vec<_>, _>>()?;

        let mut dates = Vec::new();
        let mut columns: Vec<Vec<Option<f64>>> = vec![Vec::new(); symbols.len()];

        for (row_idx, record) in csv_reader.records().enumerate() {
            let record = record?;
            let raw_date = record.get(0).unwrap_or_default();
            dates.push(parse_date(raw_date).ok_or_else(|| PriceTableError::InvalidDate {
                row: row_idx + 1,
                value: raw_date.to_string(),
            })?);

            for (col_idx, column) in columns.iter_mut().enumerate() {
                let cell = record.get(col_idx + 1).unwrap_or_default().trim();
                let price = if cell.is_empty() {
                    None
                } else {
                    let value = cell.parse::<f64>().map_err(|_| PriceTableError::InvalidPrice {
                        row: row_idx + 1,
                        symbol: symbols[col_idx].to_string(),
                        value: cell.to_string(),
                    })?;
                    Some(value).filter(|v| !v.is_nan())
                };
                column.push(price);
            }
        }

        Self::drop_incomplete(dates, symbols.into_iter().zip(columns).collect())
    }

    /// Writes the table as CSV with a `Date` index column.
    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<(), PriceTableError> {
        let file = File::create(path.as_ref()).map_err(|e| PriceTableError::Io(e.to_string()))?;
        let mut writer = csv::Writer::from_writer(file);

        let mut header = vec![DATE_COLUMN.to_string()];
        header.extend(self.symbols.iter().map(Symbol::to_string));
        writer.write_record(&header)?;

        for (row, date) in self.dates.iter().enumerate() {
            let mut record = vec![date.format("%Y-%m-%d").to_string()];
            record.extend(self.columns.iter().map(|column| column[row].to_string()));
            writer.write_record(&record)?;
        }

        writer.flush().map_err(|e| PriceTableError::Io(e.to_string()))?;
        Ok(())
    }

    /// Trading dates, strictly increasing.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Symbols in column order.
    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    /// Price column of the symbol at `index`.
    pub fn column(&self, index: usize) -> Option<&[f64]> {
        self.columns.get(index).map(Vec::as_slice)
    }

    /// Price column of `symbol`.
    pub fn series(&self, symbol: &Symbol) -> Option<&[f64]> {
        let index = self.symbols.iter().position(|s| s == symbol)?;
        self.column(index)
    }

    /// Iterates `(symbol, prices)` pairs in column order.
    pub fn iter_columns(&self) -> impl Iterator<Item = (&Symbol, &[f64])> {
        self.symbols
            .iter()
            .zip(self.columns.iter().map(Vec::as_slice))
    }

    /// Number of dates (rows).
    pub fn num_dates(&self) -> usize {
        self.dates.len()
    }

    /// Number of symbols (columns).
    pub fn num_symbols(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty() || self.dates.is_empty()
    }
}

/// Parses a date cell. Accepts "YYYY-MM-DD" optionally followed by a time part.
fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    let date_part = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

/// Errors that can occur when building, loading or saving a price table.
#[derive(Debug, Clone, PartialEq)]
pub enum PriceTableError {
    /// Input file does not exist
    MissingFile(PathBuf),
    /// I/O failure
    Io(String),
    /// Malformed CSV
    Csv(String),
    /// Date cell could not be parsed
    InvalidDate { row: usize, value: String },
    /// Price cell could not be parsed
    InvalidPrice { row: usize, symbol: String, value: String },
    /// Dates are not strictly increasing
    UnsortedDates(NaiveDate),
    /// Same symbol appears twice
    DuplicateSymbol(String),
    /// A column contains missing prices
    MissingValues(String),
    /// Column/date count mismatch
    Shape(String),
    /// Invalid symbol in a header
    Symbol(SymbolError),
    /// Data provider failure
    DataProvider(DataProviderError),
}

impl std::fmt::Display for PriceTableError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PriceTableError::MissingFile(path) => {
                write!(f, "Price file '{}' not found", path.display())
            }
            PriceTableError::Io(msg) => write!(f, "I/O error: {}", msg),
            PriceTableError::Csv(msg) => write!(f, "CSV error: {}", msg),
            PriceTableError::InvalidDate { row, value } => {
                write!(f, "Invalid date '{}' on row {}", value, row)
            }
            PriceTableError::InvalidPrice { row, symbol, value } => {
                write!(f, "Invalid price '{}' for {} on row {}", value, symbol, row)
            }
            PriceTableError::UnsortedDates(date) => {
                write!(f, "Dates are not strictly increasing at {}", date)
            }
            PriceTableError::DuplicateSymbol(symbol) => write!(f, "Duplicate symbol: {}", symbol),
            PriceTableError::MissingValues(symbol) => {
                write!(f, "Column {} contains missing prices", symbol)
            }
            PriceTableError::Shape(msg) => write!(f, "Malformed price table: {}", msg),
            PriceTableError::Symbol(err) => write!(f, "{}", err),
            PriceTableError::DataProvider(err) => write!(f, "Data provider error: {}", err),
        }
    }
}

impl std::error::Error for PriceTableError {}

impl From<csv::Error> for PriceTableError {
    fn from(err: csv::Error) -> Self {
        PriceTableError::Csv(err.to_string())
    }
}

impl From<SymbolError> for PriceTableError {
    fn from(err: SymbolError) -> Self {
        PriceTableError::Symbol(err)
    }
}

impl From<DataProviderError> for PriceTableError {
    fn from(err: DataProviderError) -> Self {
        PriceTableError::DataProvider(err)
    }
}
