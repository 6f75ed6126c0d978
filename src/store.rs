use crate::prices::{DataProvider, DataProviderError, DateRange, PricePoint};
use crate::symbol::Symbol;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult};
use std::path::Path;
use tracing::debug;

/// SQLite-backed price store.
///
/// Holds downloaded close prices and the industry of each symbol. The schema
/// is created automatically on first use, so a store can be opened on a fresh
/// file or in memory.
#[derive(Debug)]
pub struct SqlitePriceStore {
    conn: Connection,
}

impl SqlitePriceStore {
    /// Opens (or creates) a file-based store.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or the schema cannot
    /// be created.
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(db_path)?;
        let store = SqlitePriceStore { conn };
        store.ensure_schema()?;
        Ok(store)
    }

    /// Opens an in-memory store. Useful for testing.
    pub fn new_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let store = SqlitePriceStore { conn };
        store.ensure_schema()?;
        Ok(store)
    }

    fn ensure_schema(&self) -> SqliteResult<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS symbols (
                symbol TEXT PRIMARY KEY,
                industry TEXT
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS prices (
                symbol TEXT NOT NULL,
                date TEXT NOT NULL,
                close REAL NOT NULL,
                PRIMARY KEY (symbol, date)
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_prices_date ON prices(date)",
            [],
        )?;

        Ok(())
    }

    /// Registers a symbol, updating its industry if it is already known.
    pub fn store_symbol(&self, symbol: &Symbol, industry: Option<&str>) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO symbols (symbol, industry) VALUES (?1, ?2)
             ON CONFLICT(symbol) DO UPDATE SET industry = COALESCE(excluded.industry, industry)",
            params![symbol.as_str(), industry],
        )?;
        Ok(())
    }

    /// Industry recorded for `symbol`, if any.
    pub fn industry(&self, symbol: &Symbol) -> Result<Option<String>, StoreError> {
        let industry = self
            .conn
            .query_row(
                "SELECT industry FROM symbols WHERE symbol = ?1",
                [symbol.as_str()],
                |row| row.get::<_, Option<String>>(0),
            )
            .optional()?;
        Ok(industry.flatten())
    }

    /// Inserts (or replaces) the price history of `symbol` in one transaction.
    ///
    /// The symbol is registered if it is not already known. Returns the
    /// number of rows written.
    pub fn insert_series(&mut self, symbol: &Symbol, points: &[PricePoint]) -> Result<usize, StoreError> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT OR IGNORE INTO symbols (symbol, industry) VALUES (?1, NULL)",
            [symbol.as_str()],
        )?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR REPLACE INTO prices (symbol, date, close) VALUES (?1, ?2, ?3)",
            )?;
            for point in points {
                stmt.execute(params![symbol.as_str(), point.date, point.close])?;
            }
        }
        tx.commit()?;
        debug!(%symbol, rows = points.len(), "stored price series");
        Ok(points.len())
    }

    /// Number of stored price rows for `symbol`.
    pub fn price_count(&self, symbol: &Symbol) -> Result<usize, StoreError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM prices WHERE symbol = ?1",
            [symbol.as_str()],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    fn symbol_exists(&self, symbol: &Symbol) -> SqliteResult<bool> {
        let mut stmt = self
            .conn
            .prepare("SELECT 1 FROM symbols WHERE symbol = ?1 LIMIT 1")?;
        let exists = stmt.exists([symbol.as_str()])?;
        Ok(exists)
    }

    /// Returns a reference to the underlying SQLite connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl DataProvider for SqlitePriceStore {
    fn get_price_series(
        &self,
        symbol: &Symbol,
        date_range: &DateRange,
    ) -> Result<Vec<PricePoint>, DataProviderError> {
        if !date_range.is_valid() {
            return Err(DataProviderError::InvalidDateRange);
        }

        let mut stmt = self
            .conn
            .prepare(
                "SELECT date, close FROM prices
                 WHERE symbol = ?1 AND date >= ?2 AND date <= ?3
                 ORDER BY date",
            )
            .map_err(sql_error)?;

        let points = stmt
            .query_map(
                params![symbol.as_str(), date_range.start, date_range.end],
                |row| Ok(PricePoint::new(row.get(0)?, row.get(1)?)),
            )
            .map_err(sql_error)?
            .collect::<SqliteResult<Vec<PricePoint>>>()
            .map_err(sql_error)?;

        if points.is_empty() && !self.symbol_exists(symbol).map_err(sql_error)? {
            return Err(DataProviderError::SymbolNotFound(symbol.to_string()));
        }

        Ok(points)
    }

    fn symbols(&self) -> Result<Vec<Symbol>, DataProviderError> {
        let mut stmt = self
            .conn
            .prepare("SELECT symbol FROM symbols ORDER BY symbol")
            .map_err(sql_error)?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(sql_error)?
            .collect::<SqliteResult<Vec<String>>>()
            .map_err(sql_error)?;

        names
            .into_iter()
            .map(|name| Symbol::new(name).map_err(|e| DataProviderError::Other(e.to_string())))
            .collect()
    }
}

fn sql_error(err: rusqlite::Error) -> DataProviderError {
    DataProviderError::Other(format!("SQL error: {}", err))
}

/// Errors raised by the price store.
#[derive(Debug)]
pub enum StoreError {
    Sqlite(rusqlite::Error),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Sqlite(err) => write!(f, "Database error: {}", err),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Sqlite(err) => Some(err),
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Sqlite(err)
    }
}
