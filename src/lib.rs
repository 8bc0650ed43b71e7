//! # findsim-sweep
//!
//! Parameter-sweep benchmark harness for the `findsim` k-nearest-neighbour
//! graph tool.
//!
//! A run has two phases:
//! - **Sweep**: invoke `findsim -m <mode> -eps <eps> -k <k> <input> <output>`
//!   for every cell of the grid mode × dataset × epsilon × k, extract the
//!   `Similarity search` time from stdout and append it to `times.csv`.
//! - **Compare**: invoke `findsim -mode eq <ij artifact> <iidx artifact>` for
//!   every dataset × epsilon × k and collect the reported differences.
//!
//! The tool itself is an external binary; this crate never reads the sparse
//! matrices it produces.
//!
//! ## Quick Start
//!
//! ```no_run
//! use findsim_sweep::{Harness, Mode};
//!
//! let harness = Harness::new()
//!     .workdir("data")
//!     .modes(vec![Mode::IndexedJoin, Mode::FindSim])
//!     .datasets(vec!["wiki1.csr".to_string()]);
//!
//! let tool = harness.external_tool()?;
//! let report = harness.sweep(&tool)?;
//! for result in &report.results {
//!     println!("{} {}: {}", result.mode, result.input_file, result.elapsed_time);
//! }
//! # Ok::<(), findsim_sweep::HarnessError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// Core modules
mod config;
mod error;
mod harness;
mod result;
mod types;

// Functional modules
pub mod artifact;
pub mod compare;
pub mod output;
pub mod parse;
pub mod sweep;
pub mod thread_pool;
pub mod tool;

// Re-exports for public API
pub use artifact::{dataset_stem, derive_filename, format_epsilon};
pub use compare::{run_comparisons, CompareOptions};
pub use config::Config;
pub use error::{HarnessError, Result};
pub use harness::Harness;
pub use result::{
    CellFailure, CompareReport, ComparisonResult, RunResult, RunSummary, SweepReport,
};
pub use sweep::{run_sweep, SweepOptions};
pub use tool::{ExternalTool, Tool, ToolOutput};
pub use types::{compare_tasks, CompareTask, Grid, Mode, ParseModeError, SweepCell};
