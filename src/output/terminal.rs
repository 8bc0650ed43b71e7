//! Terminal output formatting with colors.

use colored::Colorize;

use crate::artifact::format_epsilon;
use crate::result::{CellFailure, CompareReport, ComparisonResult, RunSummary, SweepReport};
use crate::types::Mode;

fn separator() -> String {
    "\u{2500}".repeat(62)
}

/// Format sweep timings grouped by algorithm and dataset.
pub fn format_sweep(report: &SweepReport) -> String {
    let mut output = String::new();
    let mut current: Option<(Mode, &str)> = None;

    for result in &report.results {
        if current.map(|(mode, _)| mode) != Some(result.mode) {
            output.push_str(&format!(
                "\n==== Algorithm: {} ====\n",
                result.mode.display_name().bold()
            ));
            current = None;
        }
        if current.map(|(_, input)| input) != Some(result.input_file.as_str()) {
            output.push_str(&format!("\nData Set: {}\n", result.input_file));
        }
        current = Some((result.mode, result.input_file.as_str()));

        output.push_str(&format!(
            "  eps: {:<5} k: {:<5} Time: {}\n",
            format_epsilon(result.epsilon),
            result.k,
            result.elapsed_time.cyan()
        ));
    }

    output.push('\n');
    output.push_str(&separator());
    output.push('\n');
    output.push_str(&format!("  {} cells completed\n", report.results.len()));
    if let Some(path) = &report.report_path {
        output.push_str(&format!(
            "  {}\n",
            format!("\u{2713} Execution times written to {}", path.display()).green()
        ));
    }
    push_failures(&mut output, "cells", &report.failures);
    output
}

/// Format one comparison the way it is shown during a compare pass.
pub fn format_comparison(comparison: &ComparisonResult) -> String {
    let differences = match comparison.difference_count {
        Some(0) => "0 differences".green().to_string(),
        Some(n) => format!("{n} differences").yellow().to_string(),
        None => "difference count not reported".normal().to_string(),
    };
    format!(
        "\n{} output file: {}\n{} output file: {}\n  {}\nDifferences: {}\n",
        Mode::IndexedJoin.display_name(),
        comparison.file1,
        Mode::FindSim.display_name(),
        comparison.file2,
        differences,
        comparison.difference_summary
    )
}

/// Format every comparison plus a totals line.
pub fn format_compare(report: &CompareReport) -> String {
    let mut output = format!(
        "\n===== Comparing the output files from {} and {} Algorithms ====\n",
        Mode::IndexedJoin.display_name(),
        Mode::FindSim.display_name()
    );
    for comparison in &report.comparisons {
        output.push_str(&format_comparison(comparison));
    }

    let mismatched = report
        .comparisons
        .iter()
        .filter(|c| c.difference_count.is_some_and(|n| n > 0))
        .count();

    output.push('\n');
    output.push_str(&separator());
    output.push('\n');
    let line = format!(
        "  {} comparisons, {} with differences",
        report.comparisons.len(),
        mismatched
    );
    if mismatched == 0 {
        output.push_str(&format!("{}\n", line.green()));
    } else {
        output.push_str(&format!("{}\n", line.yellow()));
    }
    push_failures(&mut output, "comparisons", &report.failures);
    output
}

/// Format a full run.
pub fn format_summary(summary: &RunSummary) -> String {
    let mut output = String::new();
    if let Some(sweep) = &summary.sweep {
        output.push_str(&format_sweep(sweep));
    }
    if let Some(compare) = &summary.compare {
        output.push_str(&format_compare(compare));
    }
    output.push_str(&format!("  Runtime: {:.2}s\n", summary.runtime_secs));
    output
}

fn push_failures(output: &mut String, what: &str, failures: &[CellFailure]) {
    if failures.is_empty() {
        return;
    }
    output.push_str(&format!(
        "  {}\n",
        format!("\u{26A0} {} {what} failed:", failures.len())
            .red()
            .bold()
    ));
    for failure in failures {
        output.push_str(&format!("    {}: {}\n", failure.cell, failure.error));
    }
}
