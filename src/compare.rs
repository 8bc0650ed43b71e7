//! Comparator: equality checks between the `ij` and `iidx` artifacts.

use std::path::PathBuf;

use tracing::{info, warn};

use crate::error::{HarnessError, Result};
use crate::parse::parse_compare_output;
use crate::result::{CellFailure, CompareReport, ComparisonResult};
use crate::tool::Tool;
use crate::types::{compare_tasks, validate_thresholds, CompareTask};

/// Knobs for a comparison pass.
#[derive(Debug, Clone, Default)]
pub struct CompareOptions {
    /// Record failing comparisons and keep going instead of aborting.
    pub continue_on_failure: bool,
    /// Float tolerance forwarded to the tool as `-fldelta`.
    pub fldelta: Option<f64>,
    /// When set, warn about artifacts missing from this directory before
    /// invoking the tool.
    pub artifact_dir: Option<PathBuf>,
}

/// Compare the two algorithms' artifacts for every (dataset, epsilon, k).
///
/// `datasets` are stems (`wiki1`) or dataset files (`wiki1.csr`); both map to
/// the same artifact names. The artifacts are assumed to exist from an
/// earlier sweep.
pub fn run_comparisons(
    tool: &dyn Tool,
    datasets: &[String],
    epsilons: &[f64],
    ks: &[u32],
    options: &CompareOptions,
) -> Result<CompareReport> {
    if datasets.is_empty() {
        return Err(HarnessError::Config("no datasets to compare".to_string()));
    }
    validate_thresholds(epsilons, ks)?;

    let tasks = compare_tasks(datasets, epsilons, ks);
    info!(comparisons = tasks.len(), "starting comparisons");

    let mut report = CompareReport::default();
    for task in &tasks {
        if let Some(dir) = &options.artifact_dir {
            for file in [task.file1(), task.file2()] {
                if !dir.join(&file).exists() {
                    warn!(%file, "artifact not found, was the sweep run?");
                }
            }
        }

        match compare_one(tool, task, options.fldelta) {
            Ok(comparison) => {
                info!(
                    dataset = %comparison.dataset,
                    eps = comparison.epsilon,
                    k = comparison.k,
                    differences = ?comparison.difference_count,
                    "comparison complete"
                );
                report.comparisons.push(comparison);
            }
            Err(err) if options.continue_on_failure && err.is_cell_failure() => {
                warn!(task = %task, error = %err, "comparison failed, continuing");
                report.failures.push(CellFailure {
                    cell: task.to_string(),
                    error: err.to_string(),
                });
            }
            Err(err) => return Err(err),
        }
    }

    Ok(report)
}

/// Run a single equality check.
pub fn compare_one(
    tool: &dyn Tool,
    task: &CompareTask,
    fldelta: Option<f64>,
) -> Result<ComparisonResult> {
    let args = task.args(fldelta);
    let output = tool.run(&args)?;
    let differences =
        parse_compare_output(&output.stdout).map_err(|missing| HarnessError::MalformedOutput {
            marker: missing.marker,
            command: tool.render(&args),
        })?;

    Ok(ComparisonResult {
        dataset: task.dataset.clone(),
        epsilon: task.epsilon,
        k: task.k,
        file1: task.file1(),
        file2: task.file2(),
        difference_summary: differences.summary,
        difference_count: differences.count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::DIFFERENCES_MARKER;
    use crate::sweep::tests::{tool_failure, FakeTool};

    fn stems() -> Vec<String> {
        vec!["wiki1".to_string(), "wiki2".to_string()]
    }

    const EPS: [f64; 5] = [0.3, 0.4, 0.5, 0.7, 0.9];
    const KS: [u32; 3] = [10, 50, 100];

    fn clean_output() -> Result<String> {
        Ok("Differences: \nOverall, 0 differences were encountered between A and B.\n".to_string())
    }

    #[test]
    fn test_one_comparison_per_triple() {
        let tool = FakeTool::new(|_, _| clean_output());
        let report =
            run_comparisons(&tool, &stems(), &EPS, &KS, &CompareOptions::default()).unwrap();

        assert_eq!(report.comparisons.len(), 30);
        assert!(report.comparisons.iter().all(|c| c.difference_count == Some(0)));

        let calls = tool.calls();
        assert_eq!(
            calls[0],
            ["-mode", "eq", "wiki1.ij.0.3.10.csr", "wiki1.iidx.0.3.10.csr"]
        );
        assert_eq!(
            calls[29],
            ["-mode", "eq", "wiki2.ij.0.9.100.csr", "wiki2.iidx.0.9.100.csr"]
        );
    }

    #[test]
    fn test_dataset_files_and_stems_agree() {
        let tool = FakeTool::new(|_, _| clean_output());
        let files = vec!["wiki1.csr".to_string()];
        let report =
            run_comparisons(&tool, &files, &[0.3], &[10], &CompareOptions::default()).unwrap();
        assert_eq!(report.comparisons[0].file1, "wiki1.ij.0.3.10.csr");
        assert_eq!(report.comparisons[0].file2, "wiki1.iidx.0.3.10.csr");
    }

    #[test]
    fn test_fldelta_forwarded() {
        let tool = FakeTool::new(|_, _| clean_output());
        let options = CompareOptions {
            fldelta: Some(0.01),
            ..Default::default()
        };
        run_comparisons(&tool, &stems(), &[0.5], &[10], &options).unwrap();
        assert!(tool
            .calls()
            .iter()
            .all(|args| args[4..] == ["-fldelta", "0.01"]));
    }

    #[test]
    fn test_summary_captured() {
        let tool = FakeTool::new(|_, _| {
            Ok("Differences: \n[2 1 0.700000 0.690000]\n\
                Overall, 1 differences were encountered between A and B.\n"
                .to_string())
        });
        let report =
            run_comparisons(&tool, &stems(), &[0.3], &[10], &CompareOptions::default()).unwrap();
        let first = &report.comparisons[0];
        assert_eq!(first.difference_count, Some(1));
        assert!(first.difference_summary.starts_with("[2 1 0.700000 0.690000]"));
    }

    #[test]
    fn test_missing_marker_is_malformed() {
        let tool = FakeTool::new(|_, _| Ok("Matrix stats differ".to_string()));
        let err = run_comparisons(&tool, &stems(), &EPS, &KS, &CompareOptions::default())
            .unwrap_err();
        assert!(matches!(
            err,
            HarnessError::MalformedOutput {
                marker: DIFFERENCES_MARKER,
                ..
            }
        ));
        assert_eq!(tool.calls().len(), 1);
    }

    #[test]
    fn test_continue_on_failure() {
        let tool = FakeTool::new(|_, args| {
            if args[2].starts_with("wiki2") {
                Err(tool_failure(1))
            } else {
                clean_output()
            }
        });
        let options = CompareOptions {
            continue_on_failure: true,
            ..Default::default()
        };
        let report = run_comparisons(&tool, &stems(), &EPS, &KS, &options).unwrap();
        assert_eq!(report.comparisons.len(), 15);
        assert_eq!(report.failures.len(), 15);
        assert_eq!(report.failures[0].cell, "wiki2 eps=0.3 k=10");
    }

    #[test]
    fn test_empty_datasets_rejected() {
        let tool = FakeTool::new(|_, _| clean_output());
        let err = run_comparisons(&tool, &[], &EPS, &KS, &CompareOptions::default()).unwrap_err();
        assert!(matches!(err, HarnessError::Config(_)));
    }
}
