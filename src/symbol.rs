use serde::{Deserialize, Serialize};
use std::fmt;

/// Ticker symbol identifying one stock (one node of the network).
///
/// Symbols are compared and hashed by their string value. Exchange
/// suffixes are part of the symbol (e.g. "RELIANCE.NS").
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol(String);

impl Symbol {
    /// Creates a new symbol from a ticker string.
    ///
    /// # Errors
    /// Returns an error if the ticker is empty or contains invalid characters.
    pub fn new(ticker: impl Into<String>) -> Result<Self, SymbolError> {
        let ticker = ticker.into();
        Self::validate(&ticker)?;
        Ok(Symbol(ticker))
    }

    /// Creates a symbol with an exchange suffix appended (e.g. "TCS" + ".NS").
    ///
    /// The suffix is not appended twice if the ticker already carries it.
    pub fn with_suffix(ticker: &str, suffix: &str) -> Result<Self, SymbolError> {
        let ticker = ticker.trim();
        if suffix.is_empty() || ticker.ends_with(suffix) {
            Self::new(ticker)
        } else {
            Self::new(format!("{}{}", ticker, suffix))
        }
    }

    /// Validates a ticker.
    ///
    /// Allows alphanumerics, dots, hyphens, underscores and ampersands
    /// (NSE lists tickers such as "M&M").
    fn validate(ticker: &str) -> Result<(), SymbolError> {
        if ticker.is_empty() {
            return Err(SymbolError::EmptySymbol);
        }

        if !ticker
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '.' | '-' | '_' | '&'))
        {
            return Err(SymbolError::InvalidCharacters(ticker.to_string()));
        }

        Ok(())
    }

    /// Returns the ticker as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Symbol {
    type Error = SymbolError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Symbol::new(value)
    }
}

impl From<Symbol> for String {
    fn from(symbol: Symbol) -> Self {
        symbol.0
    }
}

/// Errors that can occur when creating a symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolError {
    /// The symbol is empty
    EmptySymbol,
    /// The symbol contains invalid characters
    InvalidCharacters(String),
}

impl fmt::Display for SymbolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SymbolError::EmptySymbol => write!(f, "Symbol cannot be empty"),
            SymbolError::InvalidCharacters(ticker) => {
                write!(f, "Symbol '{}' contains invalid characters", ticker)
            }
        }
    }
}

impl std::error::Error for SymbolError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_creation_valid() {
        let symbol = Symbol::new("RELIANCE.NS").unwrap();
        assert_eq!(symbol.as_str(), "RELIANCE.NS");
    }

    #[test]
    fn test_symbol_allows_ampersand() {
        assert!(Symbol::new("M&M.NS").is_ok());
    }

    #[test]
    fn test_symbol_creation_empty_string() {
        assert_eq!(Symbol::new("").unwrap_err(), SymbolError::EmptySymbol);
    }

    #[test]
    fn test_symbol_invalid_characters() {
        let result = Symbol::new("TCS@NS");
        assert!(matches!(result, Err(SymbolError::InvalidCharacters(_))));
    }

    #[test]
    fn test_with_suffix_appends_once() {
        let symbol = Symbol::with_suffix("TCS", ".NS").unwrap();
        assert_eq!(symbol.as_str(), "TCS.NS");

        let again = Symbol::with_suffix("TCS.NS", ".NS").unwrap();
        assert_eq!(again, symbol);
    }

    #[test]
    fn test_with_empty_suffix() {
        let symbol = Symbol::with_suffix(" INFY ", "").unwrap();
        assert_eq!(symbol.as_str(), "INFY");
    }

    #[test]
    fn test_symbol_ordering_is_lexicographic() {
        let mut symbols = vec![
            Symbol::new("WIPRO").unwrap(),
            Symbol::new("HDFCBANK").unwrap(),
            Symbol::new("INFY").unwrap(),
        ];
        symbols.sort();
        let names: Vec<&str> = symbols.iter().map(Symbol::as_str).collect();
        assert_eq!(names, vec!["HDFCBANK", "INFY", "WIPRO"]);
    }

    #[test]
    fn test_symbol_serde_rejects_invalid() {
        let ok: Symbol = serde_json::from_str("\"INFY.NS\"").unwrap();
        assert_eq!(ok.as_str(), "INFY.NS");
        assert!(serde_json::from_str::<Symbol>("\"bad symbol\"").is_err());
    }
}
