//! `findsim-sweep` command-line entry point.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use findsim_sweep::output::terminal;
use findsim_sweep::{Config, ExternalTool, Harness, Mode, RunSummary};

/// Exit status when the run finished but some cells were skipped.
const EXIT_PARTIAL: u8 = 2;

#[derive(Parser)]
#[command(name = "findsim-sweep")]
#[command(about = "Run findsim over a parameter grid and compare algorithm outputs")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    opts: GlobalOpts,
}

#[derive(Subcommand, Clone, Copy)]
enum Command {
    /// Sweep the grid, then compare outputs (default)
    Run,
    /// Only sweep the grid and write the timing report
    Sweep,
    /// Only compare outputs of an earlier sweep
    Compare,
    /// Print the command lines a full run would execute
    Plan,
}

#[derive(Args)]
struct GlobalOpts {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Working directory for datasets, artifacts and reports
    #[arg(short = 'C', long, global = true)]
    workdir: Option<PathBuf>,

    /// Path to the findsim binary
    #[arg(long, global = true)]
    tool: Option<PathBuf>,

    /// Algorithm modes (ij, iidx)
    #[arg(long = "mode", value_delimiter = ',', global = true)]
    modes: Vec<Mode>,

    /// Input dataset files
    #[arg(long = "dataset", value_delimiter = ',', global = true)]
    datasets: Vec<String>,

    /// Epsilon values
    #[arg(long = "eps", value_delimiter = ',', global = true)]
    epsilons: Vec<f64>,

    /// k values
    #[arg(short = 'k', long = "k", value_delimiter = ',', global = true)]
    ks: Vec<u32>,

    /// Dataset stems to compare (default: derived from --dataset)
    #[arg(long = "compare-dataset", value_delimiter = ',', global = true)]
    compare_datasets: Vec<String>,

    /// CSV timing report
    #[arg(long, global = true)]
    report: Option<PathBuf>,

    /// Also write a JSON summary of the run
    #[arg(long, global = true)]
    json: Option<PathBuf>,

    /// Sweep cells to run concurrently
    #[arg(short = 'j', long, global = true)]
    jobs: Option<usize>,

    /// Kill a tool invocation after this many seconds
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    /// Float tolerance for equality checks
    #[arg(long, global = true)]
    fldelta: Option<f64>,

    /// Skip failing cells and report them at the end
    #[arg(long, global = true)]
    continue_on_failure: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

impl GlobalOpts {
    fn load_config(&self) -> Result<Config> {
        let config = match &self.config {
            Some(path) => Config::load(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => Config::default(),
        };
        Ok(self.apply(config.merge_env()))
    }

    fn apply(&self, mut config: Config) -> Config {
        if let Some(workdir) = &self.workdir {
            config.workdir = workdir.clone();
        }
        if let Some(tool) = &self.tool {
            config.tool = tool.clone();
        }
        if !self.modes.is_empty() {
            config.modes = self.modes.clone();
        }
        if !self.datasets.is_empty() {
            config.datasets = self.datasets.clone();
        }
        if !self.epsilons.is_empty() {
            config.epsilons = self.epsilons.clone();
        }
        if !self.ks.is_empty() {
            config.ks = self.ks.clone();
        }
        if !self.compare_datasets.is_empty() {
            config.compare_datasets = Some(self.compare_datasets.clone());
        }
        if let Some(report) = &self.report {
            config.report = report.clone();
        }
        if let Some(json) = &self.json {
            config.json_report = Some(json.clone());
        }
        if let Some(jobs) = self.jobs {
            config.jobs = jobs;
        }
        if let Some(secs) = self.timeout_secs {
            config.timeout_secs = Some(secs);
        }
        if let Some(delta) = self.fldelta {
            config.fldelta = Some(delta);
        }
        if self.continue_on_failure {
            config.continue_on_failure = true;
        }
        config
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn external_tool(harness: &Harness) -> Result<ExternalTool> {
    harness
        .external_tool()
        .context("Failed to set up the findsim tool")
}

fn run(cli: Cli) -> Result<ExitCode> {
    let config = cli.opts.load_config()?;
    let harness = Harness::with_config(config);
    let command = cli.command.unwrap_or(Command::Run);

    let summary = match command {
        Command::Plan => {
            for line in harness.plan()? {
                println!("{line}");
            }
            return Ok(ExitCode::SUCCESS);
        }
        Command::Run => {
            let tool = external_tool(&harness)?;
            harness.run(&tool).context("Run failed")?
        }
        Command::Sweep => {
            let tool = external_tool(&harness)?;
            let start = Instant::now();
            let sweep = harness.sweep(&tool).context("Sweep failed")?;
            let summary = RunSummary {
                sweep: Some(sweep),
                compare: None,
                runtime_secs: start.elapsed().as_secs_f64(),
            };
            harness.export(&summary)?;
            summary
        }
        Command::Compare => {
            let tool = external_tool(&harness)?;
            let start = Instant::now();
            let compare = harness.compare(&tool).context("Comparison failed")?;
            let summary = RunSummary {
                sweep: None,
                compare: Some(compare),
                runtime_secs: start.elapsed().as_secs_f64(),
            };
            harness.export(&summary)?;
            summary
        }
    };

    print!("{}", terminal::format_summary(&summary));

    if summary.failure_count() > 0 {
        return Ok(ExitCode::from(EXIT_PARTIAL));
    }
    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.opts.verbose);

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{} {:#}", "error:".red().bold(), err);
            ExitCode::FAILURE
        }
    }
}
