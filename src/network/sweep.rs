//! Percolation sweep over correlation thresholds.
//!
//! Each θ yields an independent threshold graph built from the shared,
//! read-only correlation matrix, so thresholds are evaluated in parallel.
//! Results always come back in threshold order.

use super::graph::ThresholdGraph;
use super::metrics::GraphSummary;
use super::GraphError;
use crate::correlation::CorrelationMatrix;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;
use std::str::FromStr;
use tracing::info;

/// Upper bound on the number of thresholds in one range.
pub const MAX_THRESHOLDS: usize = 100_000;

/// Inclusive, evenly spaced range of thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdRange {
    pub start: f64,
    pub end: f64,
    pub step: f64,
}

impl Default for ThresholdRange {
    fn default() -> Self {
        ThresholdRange {
            start: 0.20,
            end: 0.70,
            step: 0.02,
        }
    }
}

impl ThresholdRange {
    /// # Errors
    /// Returns `InvalidThresholdRange` if a bound is not finite, the step is
    /// not positive, `end < start`, or the range holds more than
    /// [`MAX_THRESHOLDS`] values.
    pub fn new(start: f64, end: f64, step: f64) -> Result<Self, GraphError> {
        if !(start.is_finite() && end.is_finite() && step.is_finite()) {
            return Err(GraphError::InvalidThresholdRange(
                "bounds and step must be finite".to_string(),
            ));
        }
        if step <= 0.0 {
            return Err(GraphError::InvalidThresholdRange(format!(
                "step must be positive, got {}",
                step
            )));
        }
        if end < start {
            return Err(GraphError::InvalidThresholdRange(format!(
                "end {} is below start {}",
                end, start
            )));
        }
        let steps = ((end - start) / step + 1e-9).floor();
        if steps >= MAX_THRESHOLDS as f64 {
            return Err(GraphError::InvalidThresholdRange(format!(
                "step {} gives more than {} thresholds",
                step, MAX_THRESHOLDS
            )));
        }
        Ok(ThresholdRange { start, end, step })
    }

    fn len(&self) -> usize {
        // Deserialized ranges skip `new`, so clamp here as well.
        let steps = ((self.end - self.start) / self.step + 1e-9).floor();
        steps.clamp(0.0, (MAX_THRESHOLDS - 1) as f64) as usize + 1
    }

    /// Thresholds start, start + step, ... up to and including `end`.
    ///
    /// Values are computed by multiplication and rounded to 10 decimals, so
    /// 0.20 + 15 × 0.02 is exactly 0.5.
    pub fn values(&self) -> Vec<f64> {
        (0..self.len())
            .map(|i| ((self.start + i as f64 * self.step) * 1e10).round() / 1e10)
            .collect()
    }
}

impl FromStr for ThresholdRange {
    type Err = GraphError;

    /// Parses "start:end:step", e.g. "0.2:0.7:0.02".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').map(str::trim).collect();
        let [start, end, step] = parts.as_slice() else {
            return Err(GraphError::InvalidThresholdRange(format!(
                "expected start:end:step, got '{}'",
                s
            )));
        };
        let parse = |value: &str| {
            value.parse::<f64>().map_err(|_| {
                GraphError::InvalidThresholdRange(format!("'{}' is not a number", value))
            })
        };
        ThresholdRange::new(parse(*start)?, parse(*end)?, parse(*step)?)
    }
}

/// Metrics of the threshold graph at one θ.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SweepPoint {
    pub theta: f64,
    pub edge_count: usize,
    pub mean_degree: f64,
    pub transitivity: f64,
    pub average_clustering: f64,
    pub largest_component_fraction: f64,
}

impl From<&GraphSummary> for SweepPoint {
    fn from(summary: &GraphSummary) -> Self {
        SweepPoint {
            theta: summary.theta,
            edge_count: summary.edge_count,
            mean_degree: summary.mean_degree,
            transitivity: summary.transitivity,
            average_clustering: summary.average_clustering,
            largest_component_fraction: summary.largest_component_fraction,
        }
    }
}

/// Threshold graph metrics across an ordered list of thresholds.
#[derive(Debug, Clone, PartialEq)]
pub struct PercolationSweep {
    points: Vec<SweepPoint>,
}

impl PercolationSweep {
    /// Evaluates every threshold in `thresholds`, keeping their order.
    pub fn run(corr: &CorrelationMatrix, thresholds: &[f64]) -> Self {
        let points: Vec<SweepPoint> = thresholds
            .par_iter()
            .map(|&theta| {
                let graph = ThresholdGraph::from_correlation(corr, theta);
                SweepPoint::from(&GraphSummary::of(&graph))
            })
            .collect();

        info!(
            thresholds = points.len(),
            symbols = corr.len(),
            "percolation sweep finished"
        );
        PercolationSweep { points }
    }

    /// Runs the sweep over every value of `range`.
    pub fn over_range(corr: &CorrelationMatrix, range: &ThresholdRange) -> Self {
        Self::run(corr, &range.values())
    }

    pub fn points(&self) -> &[SweepPoint] {
        &self.points
    }

    /// Point whose θ is nearest to `theta` (first one on ties).
    pub fn closest_to(&self, theta: f64) -> Option<&SweepPoint> {
        self.points.iter().reduce(|best, point| {
            if (point.theta - theta).abs() < (best.theta - theta).abs() {
                point
            } else {
                best
            }
        })
    }

    /// Adjacent pair of points with the largest fall in the largest-component
    /// fraction: the steepest part of the percolation transition.
    ///
    /// `None` when fewer than two points exist or S never decreases.
    pub fn sharpest_drop(&self) -> Option<(&SweepPoint, &SweepPoint)> {
        // Earliest pair wins on equal drops.
        self.points
            .windows(2)
            .map(|pair| {
                let drop = pair[0].largest_component_fraction - pair[1].largest_component_fraction;
                (drop, pair)
            })
            .filter(|(drop, _)| *drop > 0.0)
            .reduce(|best, candidate| if candidate.0 > best.0 { candidate } else { best })
            .map(|(_, pair)| (&pair[0], &pair[1]))
    }

    /// Writes one CSV row per threshold.
    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<(), GraphError> {
        let file = File::create(path.as_ref()).map_err(|e| GraphError::Io(e.to_string()))?;
        let mut writer = csv::Writer::from_writer(file);
        for point in &self.points {
            writer.serialize(point)?;
        }
        writer.flush().map_err(|e| GraphError::Io(e.to_string()))?;
        Ok(())
    }
}
