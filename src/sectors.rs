//! Sector Aggregation
//!
//! Maps symbols to industries and summarises node-level network metrics per
//! industry.

use crate::network::metrics::local_clustering;
use crate::network::{betweenness_centrality, ThresholdGraph};
use crate::symbol::Symbol;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Industry assigned to symbols missing from the sector map.
pub const UNKNOWN_SECTOR: &str = "Unknown";

const SYMBOL_COLUMN: &str = "Symbol";
const INDUSTRY_COLUMN: &str = "Industry";

/// Symbol → industry mapping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SectorMap {
    industries: BTreeMap<Symbol, String>,
}

impl SectorMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a sector map from a CSV file with `Symbol` and `Industry` columns.
    ///
    /// `suffix` (e.g. ".NS") is appended to every ticker that lacks it.
    ///
    /// # Errors
    /// Returns `MissingFile` if the file does not exist.
    pub fn load_csv<P: AsRef<Path>>(path: P, suffix: &str) -> Result<Self, SectorError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SectorError::MissingFile(path.to_path_buf()));
        }
        let file = File::open(path).map_err(|e| SectorError::Io(e.to_string()))?;
        let map = Self::read_csv(file, suffix)?;
        info!(path = %path.display(), symbols = map.len(), "sector map loaded");
        Ok(map)
    }

    /// Reads a sector map from any CSV source. Extra columns are ignored;
    /// rows with an empty or invalid ticker are skipped.
    pub fn read_csv<R: Read>(reader: R, suffix: &str) -> Result<Self, SectorError> {
        let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let headers = reader.headers()?.clone();
        let column = |name: &'static str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or(SectorError::MissingColumn(name))
        };
        let symbol_col = column(SYMBOL_COLUMN)?;
        let industry_col = column(INDUSTRY_COLUMN)?;

        let mut map = SectorMap::new();
        for record in reader.records() {
            let record = record?;
            let ticker = record.get(symbol_col).unwrap_or_default();
            if ticker.is_empty() {
                continue;
            }
            let industry = match record.get(industry_col) {
                Some(industry) if !industry.is_empty() => industry,
                _ => UNKNOWN_SECTOR,
            };
            match Symbol::with_suffix(ticker, suffix) {
                Ok(symbol) => map.insert(symbol, industry),
                Err(e) => warn!(ticker, error = %e, "skipping invalid ticker in sector table"),
            }
        }
        Ok(map)
    }

    pub fn insert(&mut self, symbol: Symbol, industry: impl Into<String>) {
        self.industries.insert(symbol, industry.into());
    }

    /// Industry of `symbol`, or [`UNKNOWN_SECTOR`].
    pub fn industry_of(&self, symbol: &Symbol) -> &str {
        self.industries
            .get(symbol)
            .map(String::as_str)
            .unwrap_or(UNKNOWN_SECTOR)
    }

    /// Mapped symbols, sorted.
    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.industries.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Symbol, &str)> {
        self.industries.iter().map(|(s, i)| (s, i.as_str()))
    }

    pub fn len(&self) -> usize {
        self.industries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.industries.is_empty()
    }
}

/// Network metrics of one industry, averaged over its nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorRow {
    #[serde(rename = "Industry")]
    pub industry: String,
    #[serde(rename = "Num Stocks")]
    pub num_stocks: usize,
    #[serde(rename = "Avg. Degree")]
    pub avg_degree: f64,
    #[serde(rename = "Avg. Clustering")]
    pub avg_clustering: f64,
    #[serde(rename = "Avg. Betweenness")]
    pub avg_betweenness: f64,
}

/// Per-industry summary, sorted by average degree (descending).
#[derive(Debug, Clone, PartialEq)]
pub struct SectorReport {
    theta: f64,
    rows: Vec<SectorRow>,
}

impl SectorReport {
    /// Aggregates degree, local clustering and betweenness per industry.
    ///
    /// Nodes without a known industry are left out. Industries are visited
    /// in name order; equal average degrees keep that order.
    pub fn compute(graph: &ThresholdGraph, sectors: &SectorMap) -> Self {
        let clustering = local_clustering(graph);
        let betweenness = betweenness_centrality(graph);

        let mut groups: BTreeMap<&str, Vec<(usize, f64, f64)>> = BTreeMap::new();
        let mut unknown = 0usize;
        for (symbol, degree) in graph.degrees() {
            let industry = sectors.industry_of(&symbol);
            if industry == UNKNOWN_SECTOR {
                unknown += 1;
                continue;
            }
            let c = clustering.get(&symbol).copied().unwrap_or(0.0);
            let b = betweenness.get(&symbol).copied().unwrap_or(0.0);
            groups.entry(industry).or_default().push((degree, c, b));
        }
        if unknown > 0 {
            debug!(nodes = unknown, "nodes without a known industry skipped");
        }

        let mut rows: Vec<SectorRow> = groups
            .into_iter()
            .map(|(industry, members)| {
                let n = members.len() as f64;
                SectorRow {
                    industry: industry.to_string(),
                    num_stocks: members.len(),
                    avg_degree: members.iter().map(|m| m.0 as f64).sum::<f64>() / n,
                    avg_clustering: members.iter().map(|m| m.1).sum::<f64>() / n,
                    avg_betweenness: members.iter().map(|m| m.2).sum::<f64>() / n,
                }
            })
            .collect();
        rows.sort_by(|a, b| b.avg_degree.total_cmp(&a.avg_degree));

        if rows.is_empty() {
            warn!("no graph node has a known industry");
        }
        SectorReport {
            theta: graph.theta(),
            rows,
        }
    }

    pub fn theta(&self) -> f64 {
        self.theta
    }

    pub fn rows(&self) -> &[SectorRow] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Writes the report as CSV.
    ///
    /// # Errors
    /// Returns `EmptyReport` when no industry matched a graph node.
    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<(), SectorError> {
        self.ensure_not_empty()?;
        let file = File::create(path.as_ref()).map_err(|e| SectorError::Io(e.to_string()))?;
        let mut writer = csv::Writer::from_writer(file);
        for row in &self.rows {
            writer.serialize(row)?;
        }
        writer.flush().map_err(|e| SectorError::Io(e.to_string()))?;
        Ok(())
    }

    /// Renders the report as a LaTeX `tabular` with four-decimal floats.
    ///
    /// # Errors
    /// Returns `EmptyReport` when no industry matched a graph node.
    pub fn to_latex(&self) -> Result<String, SectorError> {
        self.ensure_not_empty()?;
        let mut out = String::new();
        out.push_str("\\begin{tabular}{lrrrr}\n\\toprule\n");
        out.push_str("Industry & Num Stocks & Avg. Degree & Avg. Clustering & Avg. Betweenness \\\\\n");
        out.push_str("\\midrule\n");
        for row in &self.rows {
            // Writing to a String cannot fail.
            let _ = writeln!(
                out,
                "{} & {} & {:.4} & {:.4} & {:.4} \\\\",
                escape_latex(&row.industry),
                row.num_stocks,
                row.avg_degree,
                row.avg_clustering,
                row.avg_betweenness
            );
        }
        out.push_str("\\bottomrule\n\\end{tabular}\n");
        Ok(out)
    }

    fn ensure_not_empty(&self) -> Result<(), SectorError> {
        if self.rows.is_empty() {
            Err(SectorError::EmptyReport)
        } else {
            Ok(())
        }
    }
}

fn escape_latex(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' | '%' | '$' | '#' | '_' | '{' | '}' => {
                escaped.push('\\');
                escaped.push(c);
            }
            '~' => escaped.push_str("\\textasciitilde{}"),
            '^' => escaped.push_str("\\textasciicircum{}"),
            '\\' => escaped.push_str("\\textbackslash{}"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Errors that can occur when loading sector data or exporting reports.
#[derive(Debug, Clone, PartialEq)]
pub enum SectorError {
    /// Sector file does not exist
    MissingFile(PathBuf),
    /// I/O failure
    Io(String),
    /// Malformed CSV
    Csv(String),
    /// Required column is absent from the header
    MissingColumn(&'static str),
    /// No graph node has a known industry
    EmptyReport,
}

impl std::fmt::Display for SectorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SectorError::MissingFile(path) => {
                write!(f, "Sector file '{}' not found", path.display())
            }
            SectorError::Io(msg) => write!(f, "I/O error: {}", msg),
            SectorError::Csv(msg) => write!(f, "CSV error: {}", msg),
            SectorError::MissingColumn(name) => write!(f, "Sector table has no '{}' column", name),
            SectorError::EmptyReport => write!(
                f,
                "Sector report is empty: no graph node appears in the sector map"
            ),
        }
    }
}

impl std::error::Error for SectorError {}

impl From<csv::Error> for SectorError {
    fn from(err: csv::Error) -> Self {
        SectorError::Csv(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::correlation::CorrelationMatrix;

    const NIFTY_LIST: &str = "\
Company Name,Industry,Symbol,Series,ISIN Code
Tata Consultancy Services Ltd.,Information Technology,TCS,EQ,INE467B01029
Infosys Ltd.,Information Technology,INFY,EQ,INE009A01021
HDFC Bank Ltd.,Financial Services,HDFCBANK,EQ,INE040A01034
Mahindra & Mahindra Ltd.,Automobile and Auto Components,M&M,EQ,INE101A01026
";

    fn sym(s: &str) -> Symbol {
        Symbol::new(s).unwrap()
    }

    /// TCS-INFY-HDFCBANK triangle, M&M pendant on HDFCBANK, UNLISTED isolated.
    fn graph() -> ThresholdGraph {
        let symbols: Vec<Symbol> = ["TCS.NS", "INFY.NS", "HDFCBANK.NS", "M&M.NS", "UNLISTED.NS"]
            .iter()
            .map(|s| sym(s))
            .collect();
        let n = symbols.len();
        let mut values = vec![0.1; n * n];
        for i in 0..n {
            values[i * n + i] = 1.0;
        }
        for (a, b) in [(0, 1), (0, 2), (1, 2), (2, 3)] {
            values[a * n + b] = 0.8;
            values[b * n + a] = 0.8;
        }
        let corr = CorrelationMatrix::from_values(symbols, values).unwrap();
        ThresholdGraph::from_correlation(&corr, 0.5)
    }

    #[test]
    fn test_read_nifty_list_with_suffix() {
        let map = SectorMap::read_csv(NIFTY_LIST.as_bytes(), ".NS").unwrap();
        assert_eq!(map.len(), 4);
        assert_eq!(map.industry_of(&sym("TCS.NS")), "Information Technology");
        assert_eq!(map.industry_of(&sym("M&M.NS")), "Automobile and Auto Components");
        assert_eq!(map.industry_of(&sym("TCS")), UNKNOWN_SECTOR);
    }

    #[test]
    fn test_missing_column_and_file() {
        let result = SectorMap::read_csv("Symbol,Sector\nTCS,IT\n".as_bytes(), "");
        assert_eq!(result, Err(SectorError::MissingColumn("Industry")));

        let result = SectorMap::load_csv("/no/such/sectors.csv", ".NS");
        assert!(matches!(result, Err(SectorError::MissingFile(_))));
    }

    #[test]
    fn test_report_aggregates_by_industry() {
        let map = SectorMap::read_csv(NIFTY_LIST.as_bytes(), ".NS").unwrap();
        let report = SectorReport::compute(&graph(), &map);
        let rows = report.rows();

        assert_eq!(rows.len(), 3);
        // Financial Services: HDFCBANK degree 3
        assert_eq!(rows[0].industry, "Financial Services");
        assert_eq!(rows[0].num_stocks, 1);
        assert!((rows[0].avg_degree - 3.0).abs() < 1e-12);
        assert!((rows[0].avg_clustering - 1.0 / 3.0).abs() < 1e-12);
        // HDFCBANK lies on the M&M-TCS and M&M-INFY paths: 4 ordered pairs
        // scaled by 1 / (4 * 3).
        assert!((rows[0].avg_betweenness - 1.0 / 3.0).abs() < 1e-12);

        assert_eq!(rows[1].industry, "Information Technology");
        assert_eq!(rows[1].num_stocks, 2);
        assert!((rows[1].avg_degree - 2.0).abs() < 1e-12);
        assert!((rows[1].avg_clustering - 1.0).abs() < 1e-12);
        assert_eq!(rows[1].avg_betweenness, 0.0);

        assert_eq!(rows[2].industry, "Automobile and Auto Components");
        assert!((rows[2].avg_degree - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_report_is_an_error() {
        let report = SectorReport::compute(&graph(), &SectorMap::new());
        assert!(report.is_empty());
        assert_eq!(report.to_latex(), Err(SectorError::EmptyReport));

        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            report.write_csv(dir.path().join("sectors.csv")),
            Err(SectorError::EmptyReport)
        );
    }

    #[test]
    fn test_csv_and_latex_export() {
        let map = SectorMap::read_csv(NIFTY_LIST.as_bytes(), ".NS").unwrap();
        let report = SectorReport::compute(&graph(), &map);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sector_analysis.csv");
        report.write_csv(&path).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with(
            "Industry,Num Stocks,Avg. Degree,Avg. Clustering,Avg. Betweenness\n"
        ));
        assert_eq!(contents.lines().count(), 4);

        let latex = report.to_latex().unwrap();
        assert!(latex.starts_with("\\begin{tabular}{lrrrr}"));
        assert!(latex.contains("Financial Services & 1 & 3.0000 & 0.3333 & 0.3333 \\\\"));
        assert!(latex.trim_end().ends_with("\\end{tabular}"));
    }

    #[test]
    fn test_escape_latex() {
        assert_eq!(escape_latex("Oil, Gas & Fuels"), "Oil, Gas \\& Fuels");
        assert_eq!(escape_latex("100%"), "100\\%");
        assert_eq!(escape_latex("{Core}"), "\\{Core\\}");
        assert_eq!(
            escape_latex("a~b^c\\d"),
            "a\\textasciitilde{}b\\textasciicircum{}c\\textbackslash{}d"
        );
    }

    #[test]
    fn test_invalid_ticker_row_is_skipped() {
        let csv = "Industry,Symbol\nInformation Technology,TCS\nIndex Funds,DUMMY HOLD\nFinancial Services,SBIN\n";
        let map = SectorMap::read_csv(csv.as_bytes(), ".NS").unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map.industry_of(&sym("SBIN.NS")), "Financial Services");
    }
}
