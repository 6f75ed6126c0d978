//! Pearson correlation matrix over log returns.
//!
//! The matrix is symmetric with 1.0 on the diagonal. A symbol whose return
//! series has zero variance has no defined correlation: its whole row and
//! column (diagonal included) are NaN and it is listed in
//! [`CorrelationMatrix::degenerate_symbols`]. NaN entries never satisfy a
//! threshold comparison, so degenerate symbols end up isolated in every
//! threshold graph.

use crate::prices::PriceTable;
use crate::returns::ReturnMatrix;
use crate::symbol::Symbol;
use std::collections::HashMap;
use tracing::{info, warn};

/// Symmetric symbol × symbol correlation matrix, immutable once built.
#[derive(Debug, Clone)]
pub struct CorrelationMatrix {
    symbols: Vec<Symbol>,
    index: HashMap<Symbol, usize>,
    /// Row-major n × n values
    values: Vec<f64>,
    degenerate: Vec<Symbol>,
}

impl CorrelationMatrix {
    /// Computes pairwise Pearson correlations of the return columns.
    ///
    /// # Errors
    /// - `InsufficientData` when fewer than two observations are available
    /// - `NonFiniteReturns` when a return series contains NaN or infinity
    pub fn pearson(returns: &ReturnMatrix) -> Result<Self, CorrelationError> {
        let observations = returns.num_observations();
        if observations < 2 {
            return Err(CorrelationError::InsufficientData { observations });
        }

        let symbols = returns.symbols().to_vec();
        for (symbol, column) in symbols.iter().zip(returns.columns()) {
            if column.iter().any(|r| !r.is_finite()) {
                return Err(CorrelationError::NonFiniteReturns(symbol.to_string()));
            }
        }

        // Center each column once; the correlation is then a normalized dot product.
        let means: Vec<f64> = returns
            .columns()
            .iter()
            .map(|column| column.iter().sum::<f64>() / column.len() as f64)
            .collect();
        let centered: Vec<Vec<f64>> = returns
            .columns()
            .iter()
            .zip(&means)
            .map(|(column, mean)| column.iter().map(|r| r - mean).collect())
            .collect();
        let norms: Vec<f64> = centered
            .iter()
            .map(|column| column.iter().map(|r| r * r).sum::<f64>().sqrt())
            .collect();
        let flat: Vec<bool> = norms
            .iter()
            .zip(&means)
            .map(|(&norm, &mean)| is_zero_variance(norm, mean, observations))
            .collect();

        let n = symbols.len();
        let mut values = vec![f64::NAN; n * n];
        for i in 0..n {
            if flat[i] {
                continue;
            }
            values[i * n + i] = 1.0;
            for j in (i + 1)..n {
                if flat[j] {
                    continue;
                }
                let dot: f64 = centered[i]
                    .iter()
                    .zip(&centered[j])
                    .map(|(a, b)| a * b)
                    .sum();
                let r = (dot / (norms[i] * norms[j])).clamp(-1.0, 1.0);
                values[i * n + j] = r;
                values[j * n + i] = r;
            }
        }

        let degenerate: Vec<Symbol> = symbols
            .iter()
            .zip(&flat)
            .filter(|(_, flat)| **flat)
            .map(|(symbol, _)| symbol.clone())
            .collect();
        if !degenerate.is_empty() {
            warn!(
                count = degenerate.len(),
                symbols = ?degenerate.iter().map(Symbol::as_str).collect::<Vec<_>>(),
                "zero-variance return series, correlations undefined"
            );
        }

        info!(symbols = n, observations, "correlation matrix computed");
        Ok(Self::assemble(symbols, values, degenerate))
    }

    /// Log returns followed by Pearson correlation.
    pub fn from_prices(table: &PriceTable) -> Result<Self, CorrelationError> {
        Self::pearson(&ReturnMatrix::from_prices(table))
    }

    /// Builds a matrix from explicit row-major values.
    ///
    /// # Errors
    /// Returns `Shape` if `values` is not `n × n`, and `Asymmetric` if the
    /// entries are not symmetric. NaN pairs are accepted.
    pub fn from_values(symbols: Vec<Symbol>, values: Vec<f64>) -> Result<Self, CorrelationError> {
        let n = symbols.len();
        if values.len() != n * n {
            return Err(CorrelationError::Shape {
                symbols: n,
                values: values.len(),
            });
        }
        for i in 0..n {
            for j in (i + 1)..n {
                let (a, b) = (values[i * n + j], values[j * n + i]);
                let both_nan = a.is_nan() && b.is_nan();
                if !both_nan && (a - b).abs() > 1e-12 {
                    return Err(CorrelationError::Asymmetric {
                        row: symbols[i].to_string(),
                        column: symbols[j].to_string(),
                    });
                }
            }
        }

        let degenerate = (0..n)
            .filter(|&i| values[i * n + i].is_nan())
            .map(|i| symbols[i].clone())
            .collect();
        Ok(Self::assemble(symbols, values, degenerate))
    }

    fn assemble(symbols: Vec<Symbol>, values: Vec<f64>, degenerate: Vec<Symbol>) -> Self {
        let index = symbols
            .iter()
            .enumerate()
            .map(|(i, symbol)| (symbol.clone(), i))
            .collect();
        CorrelationMatrix {
            symbols,
            index,
            values,
            degenerate,
        }
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    /// Number of symbols.
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Correlation between the symbols at positions `i` and `j`.
    ///
    /// # Panics
    /// Panics if either index is out of bounds.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        let n = self.len();
        assert!(i < n && j < n, "correlation index ({}, {}) out of bounds", i, j);
        self.values[i * n + j]
    }

    /// Correlation between two symbols, `None` if either is unknown.
    pub fn get_by_symbol(&self, a: &Symbol, b: &Symbol) -> Option<f64> {
        let i = *self.index.get(a)?;
        let j = *self.index.get(b)?;
        Some(self.get(i, j))
    }

    /// Position of `symbol` in the matrix.
    pub fn position(&self, symbol: &Symbol) -> Option<usize> {
        self.index.get(symbol).copied()
    }

    /// Symbols with zero-variance returns (undefined correlations).
    pub fn degenerate_symbols(&self) -> &[Symbol] {
        &self.degenerate
    }

    /// Returns true if the matrix is symmetric within `tolerance` and every
    /// non-degenerate diagonal entry is 1.
    pub fn is_symmetric(&self, tolerance: f64) -> bool {
        let n = self.len();
        (0..n).all(|i| {
            let diag = self.get(i, i);
            (diag.is_nan() || (diag - 1.0).abs() <= tolerance)
                && ((i + 1)..n).all(|j| {
                    let (a, b) = (self.get(i, j), self.get(j, i));
                    (a.is_nan() && b.is_nan()) || (a - b).abs() <= tolerance
                })
        })
    }
}

/// Errors that can occur when computing a correlation matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorrelationError {
    /// Fewer than two return observations
    InsufficientData { observations: usize },
    /// A return series contains NaN or infinite values
    NonFiniteReturns(String),
    /// Value count does not match the symbol count
    Shape { symbols: usize, values: usize },
    /// Explicit values are not symmetric
    Asymmetric { row: String, column: String },
}

impl std::fmt::Display for CorrelationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CorrelationError::InsufficientData { observations } => write!(
                f,
                "Correlation needs at least 2 return observations, got {}",
                observations
            ),
            CorrelationError::NonFiniteReturns(symbol) => {
                write!(f, "Return series for {} contains non-finite values", symbol)
            }
            CorrelationError::Shape { symbols, values } => write!(
                f,
                "Expected {} correlation values for {} symbols, got {}",
                symbols * symbols,
                symbols,
                values
            ),
            CorrelationError::Asymmetric { row, column } => {
                write!(f, "Correlation matrix is not symmetric at ({}, {})", row, column)
            }
        }
    }
}

impl std::error::Error for CorrelationError {}

/// A centered column whose norm is rounding noise relative to its mean,
/// e.g. a price growing by the same factor every day.
fn is_zero_variance(norm: f64, mean: f64, observations: usize) -> bool {
    norm <= 1e-12 * mean.abs().max(1.0) * (observations as f64).sqrt()
}
