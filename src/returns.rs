//! Log-Return Matrix
//!
//! Converts a cleaned price table into per-symbol log-return series. The
//! first date has no predecessor and is dropped, so every series is one
//! observation shorter than the price table.

use crate::prices::PriceTable;
use crate::symbol::Symbol;
use chrono::NaiveDate;

/// Calculates log returns from a price series.
///
/// Uses the formula: ln(P_t / P_{t-1})
///
/// # Behavior
/// - Output has `prices.len() - 1` values (no leading NaN row)
/// - Non-positive or NaN prices produce NaN, so bad data cannot masquerade
///   as a flat day
/// - Fewer than two prices returns an empty vector
///
/// # Examples
/// ```
/// use stocknet::returns::log_returns;
///
/// let returns = log_returns(&[100.0, 105.0, 103.0]);
/// assert_eq!(returns.len(), 2);
/// assert!((returns[0] - (105.0_f64 / 100.0).ln()).abs() < 1e-12);
/// ```
pub fn log_returns(prices: &[f64]) -> Vec<f64> {
    prices
        .windows(2)
        .map(|pair| {
            let (prev, curr) = (pair[0], pair[1]);
            if prev <= 0.0 || curr <= 0.0 || prev.is_nan() || curr.is_nan() {
                f64::NAN
            } else {
                (curr / prev).ln()
            }
        })
        .collect()
}

/// Log returns for every symbol of a price table, sharing one date axis.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnMatrix {
    dates: Vec<NaiveDate>,
    symbols: Vec<Symbol>,
    columns: Vec<Vec<f64>>,
}

impl ReturnMatrix {
    /// Computes log returns for every column of `table`.
    pub fn from_prices(table: &PriceTable) -> Self {
        let dates = table.dates().iter().skip(1).copied().collect();
        let (symbols, columns) = table
            .iter_columns()
            .map(|(symbol, prices)| (symbol.clone(), log_returns(prices)))
            .unzip();

        ReturnMatrix {
            dates,
            symbols,
            columns,
        }
    }

    /// Dates of the return observations (the price dates minus the first).
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    /// Return series of the symbol at `index`.
    pub fn column(&self, index: usize) -> Option<&[f64]> {
        self.columns.get(index).map(Vec::as_slice)
    }

    pub fn columns(&self) -> &[Vec<f64>] {
        &self.columns
    }

    /// Number of return observations per symbol.
    pub fn num_observations(&self) -> usize {
        self.dates.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_returns_basic() {
        let returns = log_returns(&[100.0, 110.0, 99.0]);
        assert_eq!(returns.len(), 2);
        assert!((returns[0] - (1.1_f64).ln()).abs() < 1e-12);
        assert!((returns[1] - (99.0_f64 / 110.0).ln()).abs() < 1e-12);
    }

    #[test]
    fn test_log_returns_short_input() {
        assert!(log_returns(&[]).is_empty());
        assert!(log_returns(&[100.0]).is_empty());
    }

    #[test]
    fn test_log_returns_invalid_prices_are_nan() {
        let returns = log_returns(&[100.0, 0.0, 50.0]);
        assert!(returns[0].is_nan());
        assert!(returns[1].is_nan());
    }

    #[test]
    fn test_return_matrix_drops_first_date() {
        let dates: Vec<NaiveDate> = (1..=3)
            .map(|day| NaiveDate::from_ymd_opt(2024, 1, day).unwrap())
            .collect();
        let table = PriceTable::new(
            dates.clone(),
            vec![Symbol::new("A").unwrap(), Symbol::new("B").unwrap()],
            vec![vec![1.0, 2.0, 4.0], vec![10.0, 10.0, 10.0]],
        )
        .unwrap();

        let matrix = ReturnMatrix::from_prices(&table);
        assert_eq!(matrix.dates(), &dates[1..]);
        assert_eq!(matrix.num_observations(), 2);

        let a = matrix.column(0).unwrap();
        assert!((a[0] - 2.0_f64.ln()).abs() < 1e-12);
        assert!((a[1] - 2.0_f64.ln()).abs() < 1e-12);
        assert_eq!(matrix.column(1).unwrap(), &[0.0, 0.0]);
    }
}
