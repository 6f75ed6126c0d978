//! Threshold correlation networks
//!
//! A [`ThresholdGraph`] connects two symbols iff their return correlation is
//! at least θ. This module builds those graphs, computes their structural
//! metrics and centralities, sweeps θ to trace the percolation curve, and
//! persists graphs as JSON artifacts.

pub mod centrality;
mod graph;
pub mod metrics;
mod persist;
pub mod shells;
pub mod sweep;

pub use centrality::{
    betweenness_centrality, degree_assortativity, degree_centrality, eigenvector_centrality,
    eigenvector_centrality_lcc, top_n, EigenvectorConfig, Scores,
};
pub use graph::{Edge, ThresholdGraph};
pub use metrics::{
    compare_with_random, degree_distribution, DegreeBin, GraphSummary, RandomGraphComparison,
};
pub use persist::GraphArtifact;
pub use shells::{core_periphery, CorePeriphery};
pub use sweep::{PercolationSweep, SweepPoint, ThresholdRange, MAX_THRESHOLDS};

use std::path::PathBuf;

/// Default correlation threshold.
pub const DEFAULT_THETA: f64 = 0.5;

/// Errors that can occur when building, analysing or persisting graphs.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphError {
    /// Graph file does not exist
    MissingFile(PathBuf),
    /// I/O failure
    Io(String),
    /// Malformed graph artifact
    Json(String),
    /// CSV export failure
    Csv(String),
    /// Operation undefined on a graph without nodes
    EmptyGraph,
    /// Power iteration did not converge
    EigenvectorNotConverged { iterations: usize },
    /// Edge references an unknown node, is a self-loop, or is duplicated
    InvalidEdge(String),
    /// Threshold range is malformed
    InvalidThresholdRange(String),
}

impl std::fmt::Display for GraphError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GraphError::MissingFile(path) => {
                write!(f, "Graph file '{}' not found", path.display())
            }
            GraphError::Io(msg) => write!(f, "I/O error: {}", msg),
            GraphError::Json(msg) => write!(f, "Invalid graph artifact: {}", msg),
            GraphError::Csv(msg) => write!(f, "CSV error: {}", msg),
            GraphError::EmptyGraph => write!(f, "Graph has no nodes"),
            GraphError::EigenvectorNotConverged { iterations } => write!(
                f,
                "Eigenvector centrality did not converge in {} iterations",
                iterations
            ),
            GraphError::InvalidEdge(msg) => write!(f, "Invalid edge: {}", msg),
            GraphError::InvalidThresholdRange(msg) => {
                write!(f, "Invalid threshold range: {}", msg)
            }
        }
    }
}

impl std::error::Error for GraphError {}

impl From<serde_json::Error> for GraphError {
    fn from(err: serde_json::Error) -> Self {
        GraphError::Json(err.to_string())
    }
}

impl From<csv::Error> for GraphError {
    fn from(err: csv::Error) -> Self {
        GraphError::Csv(err.to_string())
    }
}
