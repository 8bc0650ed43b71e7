//! Sweep runner: one tool invocation per grid cell.

use tracing::{info, warn};

use crate::error::{HarnessError, Result};
use crate::output::ResultSink;
use crate::parse::parse_search_output;
use crate::result::{CellFailure, RunResult, SweepReport};
use crate::thread_pool::WorkerPool;
use crate::tool::Tool;
use crate::types::{Grid, SweepCell};

/// Knobs for a sweep that are not part of the grid itself.
#[derive(Debug, Clone, Default)]
pub struct SweepOptions {
    /// Record failing cells and keep going instead of aborting.
    pub continue_on_failure: bool,
    /// Number of cells run concurrently (0 or 1 means sequential).
    pub jobs: usize,
}

/// Run every cell of `grid` and feed successful results to `sink` in grid
/// order.
///
/// Without `continue_on_failure`, the first failing cell aborts the sweep:
/// nothing is recorded for it and no later cell is started. With parallel
/// jobs, cells already in flight alongside the failing one are discarded.
pub fn run_sweep<S: ResultSink>(
    tool: &dyn Tool,
    grid: &Grid,
    options: &SweepOptions,
    sink: &mut S,
) -> Result<SweepReport> {
    grid.validate()?;
    let cells = grid.cells();
    let pool = WorkerPool::new(options.jobs)?;
    info!(
        cells = cells.len(),
        jobs = pool.jobs(),
        tool = tool.name(),
        "starting sweep"
    );

    let mut report = SweepReport::default();
    for batch in cells.chunks(pool.jobs()) {
        let outcomes = pool.map(batch, |cell| run_cell(tool, cell));
        for (cell, outcome) in batch.iter().zip(outcomes) {
            match outcome {
                Ok(result) => {
                    sink.record(&result)?;
                    info!(
                        mode = result.mode.display_name(),
                        input = %result.input_file,
                        eps = result.epsilon,
                        k = result.k,
                        time = %result.elapsed_time,
                        "cell complete"
                    );
                    report.results.push(result);
                }
                Err(err) if options.continue_on_failure && err.is_cell_failure() => {
                    warn!(cell = %cell, error = %err, "cell failed, continuing");
                    report.failures.push(CellFailure {
                        cell: cell.to_string(),
                        error: err.to_string(),
                    });
                }
                Err(err) => return Err(err),
            }
        }
    }

    info!(
        completed = report.results.len(),
        failed = report.failures.len(),
        "sweep finished"
    );
    Ok(report)
}

/// Run a single cell and parse its timing.
pub fn run_cell(tool: &dyn Tool, cell: &SweepCell) -> Result<RunResult> {
    let args = cell.args();
    let output = tool.run(&args)?;
    let timings = parse_search_output(&output.stdout).map_err(|missing| {
        HarnessError::MalformedOutput {
            marker: missing.marker,
            command: tool.render(&args),
        }
    })?;

    Ok(RunResult {
        mode: cell.mode,
        input_file: cell.input.clone(),
        epsilon: cell.epsilon,
        k: cell.k,
        elapsed_time: timings.search,
        total_time: timings.total,
        output_file: cell.output_file(),
        wall_secs: output.elapsed.as_secs_f64(),
    })
}
