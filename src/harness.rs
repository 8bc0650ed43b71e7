//! Main `Harness` entry point and builder.

use std::path::PathBuf;
use std::time::Instant;

use tracing::info;

use crate::compare::{run_comparisons, CompareOptions};
use crate::config::Config;
use crate::error::Result;
use crate::output::json::write_json;
use crate::output::CsvReport;
use crate::result::{CompareReport, RunSummary, SweepReport};
use crate::sweep::{run_sweep, SweepOptions};
use crate::tool::{render_command, ExternalTool, Tool};
use crate::types::{compare_tasks, Mode};

/// Drives a sweep followed by a comparison pass.
///
/// # Example
///
/// ```no_run
/// use findsim_sweep::Harness;
///
/// let harness = Harness::new()
///     .workdir("/srv/findsim/data")
///     .epsilons(vec![0.3, 0.5])
///     .ks(vec![10]);
///
/// let tool = harness.external_tool()?;
/// let summary = harness.run(&tool)?;
/// println!("{} cells", summary.sweep.map_or(0, |s| s.results.len()));
/// # Ok::<(), findsim_sweep::HarnessError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Harness {
    config: Config,
}

impl Harness {
    /// Create with the default grid.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create from an existing configuration.
    pub fn with_config(config: Config) -> Self {
        Self { config }
    }

    /// Current configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Set the working directory.
    pub fn workdir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.workdir = path.into();
        self
    }

    /// Set the findsim binary.
    pub fn tool(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.tool = path.into();
        self
    }

    /// Set the CSV report path.
    pub fn report(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.report = path.into();
        self
    }

    /// Enable the JSON export.
    pub fn json_report(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.json_report = Some(path.into());
        self
    }

    /// Set the algorithm modes.
    pub fn modes(mut self, modes: Vec<Mode>) -> Self {
        self.config.modes = modes;
        self
    }

    /// Set the input datasets.
    pub fn datasets(mut self, datasets: Vec<String>) -> Self {
        self.config.datasets = datasets;
        self
    }

    /// Set the epsilon values.
    pub fn epsilons(mut self, epsilons: Vec<f64>) -> Self {
        self.config.epsilons = epsilons;
        self
    }

    /// Set the k values.
    pub fn ks(mut self, ks: Vec<u32>) -> Self {
        self.config.ks = ks;
        self
    }

    /// Run up to `jobs` sweep cells at once.
    pub fn jobs(mut self, jobs: usize) -> Self {
        self.config.jobs = jobs;
        self
    }

    /// Kill tool invocations after `secs` seconds.
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.timeout_secs = Some(secs);
        self
    }

    /// Skip failing cells instead of aborting.
    pub fn continue_on_failure(mut self, yes: bool) -> Self {
        self.config.continue_on_failure = yes;
        self
    }

    /// Build the subprocess adapter for the configured binary.
    pub fn external_tool(&self) -> Result<ExternalTool> {
        Ok(ExternalTool::new(&self.config.tool, &self.config.workdir)?
            .with_timeout(self.config.timeout()))
    }

    /// Run the sweep, writing `times.csv` as cells complete.
    pub fn sweep(&self, tool: &dyn Tool) -> Result<SweepReport> {
        self.config.validate()?;
        let mut csv = CsvReport::create(self.config.report_path())?;
        let options = SweepOptions {
            continue_on_failure: self.config.continue_on_failure,
            jobs: self.config.jobs,
        };

        let mut report = run_sweep(tool, &self.config.grid(), &options, &mut csv)?;
        let path = csv.path().to_path_buf();
        csv.finish()?;
        info!(path = %path.display(), "execution times written");
        report.report_path = Some(path);
        Ok(report)
    }

    /// Compare the `ij` and `iidx` artifacts of an earlier sweep.
    pub fn compare(&self, tool: &dyn Tool) -> Result<CompareReport> {
        self.config.validate()?;
        let options = CompareOptions {
            continue_on_failure: self.config.continue_on_failure,
            fldelta: self.config.fldelta,
            artifact_dir: Some(self.config.workdir.clone()),
        };
        run_comparisons(
            tool,
            &self.config.compare_datasets(),
            &self.config.epsilons,
            &self.config.ks,
            &options,
        )
    }

    /// Sweep, then compare, then write the JSON export if configured.
    pub fn run(&self, tool: &dyn Tool) -> Result<RunSummary> {
        let start = Instant::now();
        let sweep = self.sweep(tool)?;
        let compare = self.compare(tool)?;
        let summary = RunSummary {
            sweep: Some(sweep),
            compare: Some(compare),
            runtime_secs: start.elapsed().as_secs_f64(),
        };
        self.export(&summary)?;
        Ok(summary)
    }

    /// Write `summary` to the JSON export path, if one is configured.
    pub fn export(&self, summary: &RunSummary) -> Result<()> {
        if let Some(path) = self.config.json_path() {
            write_json(&path, summary)?;
            info!(path = %path.display(), "run summary written");
        }
        Ok(())
    }

    /// Command lines a full run would execute, in order.
    pub fn plan(&self) -> Result<Vec<String>> {
        self.config.validate()?;
        let program = self.config.tool.display().to_string();
        let sweep = self
            .config
            .grid()
            .cells()
            .into_iter()
            .map(|cell| render_command(&program, &cell.args()));
        let compare = compare_tasks(
            &self.config.compare_datasets(),
            &self.config.epsilons,
            &self.config.ks,
        )
        .into_iter()
        .map(|task| render_command(&program, &task.args(self.config.fldelta)));
        Ok(sweep.chain(compare).collect())
    }
}
