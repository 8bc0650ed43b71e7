//! Result types produced by sweep and comparison runs.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::artifact::format_epsilon;
use crate::types::Mode;

/// Timing extracted from one sweep cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    /// Algorithm that was run.
    pub mode: Mode,
    /// Input dataset file as configured.
    pub input_file: String,
    /// Minimum similarity.
    pub epsilon: f64,
    /// Neighbour count.
    pub k: u32,
    /// Similarity search time exactly as printed by the tool.
    pub elapsed_time: String,
    /// Total time as printed by the tool, if present.
    pub total_time: Option<String>,
    /// Artifact the tool was asked to write.
    pub output_file: String,
    /// Wall-clock seconds of the child process, measured by the harness.
    pub wall_secs: f64,
}

impl RunResult {
    /// Report fields: `displayName, inputFile, epsilon, k, elapsed`.
    pub fn csv_record(&self) -> [String; 5] {
        [
            self.mode.display_name().to_string(),
            self.input_file.clone(),
            format_epsilon(self.epsilon),
            self.k.to_string(),
            self.elapsed_time.clone(),
        ]
    }
}

/// Outcome of one equality check between the `ij` and `iidx` artifacts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    /// Dataset stem.
    pub dataset: String,
    /// Minimum similarity.
    pub epsilon: f64,
    /// Neighbour count.
    pub k: u32,
    /// Index-join artifact.
    pub file1: String,
    /// Inverted-index artifact.
    pub file2: String,
    /// Text following the `Differences:` marker.
    pub difference_summary: String,
    /// Number of differences, when the tool reported a total.
    pub difference_count: Option<u64>,
}

/// A cell or comparison that failed while continuing past failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellFailure {
    /// Human-readable description of the cell.
    pub cell: String,
    /// Error message.
    pub error: String,
}

/// Everything a sweep produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SweepReport {
    /// Successful cells in grid order.
    pub results: Vec<RunResult>,
    /// Skipped cells (only with continue-on-failure).
    pub failures: Vec<CellFailure>,
    /// Timing report location, when one was written.
    pub report_path: Option<PathBuf>,
}

/// Everything a comparison pass produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompareReport {
    /// Comparisons in dataset, epsilon, k order.
    pub comparisons: Vec<ComparisonResult>,
    /// Skipped comparisons (only with continue-on-failure).
    pub failures: Vec<CellFailure>,
}

/// Combined output of a full run, as exported to JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Sweep phase, absent when only comparisons were run.
    pub sweep: Option<SweepReport>,
    /// Comparison phase, absent when only the sweep was run.
    pub compare: Option<CompareReport>,
    /// Wall-clock seconds for the whole run.
    pub runtime_secs: f64,
}

impl RunSummary {
    /// Total number of skipped cells and comparisons.
    pub fn failure_count(&self) -> usize {
        self.sweep.as_ref().map_or(0, |s| s.failures.len())
            + self.compare.as_ref().map_or(0, |c| c.failures.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_record() {
        let result = RunResult {
            mode: Mode::IndexedJoin,
            input_file: "wiki1.csr".to_string(),
            epsilon: 0.3,
            k: 10,
            elapsed_time: "5.0".to_string(),
            total_time: None,
            output_file: "wiki1.ij.0.3.10.csr".to_string(),
            wall_secs: 0.01,
        };
        assert_eq!(
            result.csv_record(),
            ["IdxJoin", "wiki1.csr", "0.3", "10", "5.0"]
        );
    }

    #[test]
    fn test_failure_count() {
        let failure = CellFailure {
            cell: "FindSim wiki1.csr eps=0.3 k=10".to_string(),
            error: "boom".to_string(),
        };
        let summary = RunSummary {
            sweep: Some(SweepReport {
                failures: vec![failure.clone(), failure.clone()],
                ..Default::default()
            }),
            compare: Some(CompareReport {
                failures: vec![failure],
                ..Default::default()
            }),
            runtime_secs: 1.0,
        };
        assert_eq!(summary.failure_count(), 3);
        assert_eq!(RunSummary::default().failure_count(), 0);
    }
}
