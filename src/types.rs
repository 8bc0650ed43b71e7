//! Sweep grid, algorithm modes and the per-cell work items derived from them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::artifact::{dataset_stem, derive_filename, format_epsilon, format_epsilon_arg};
use crate::error::{HarnessError, Result};

/// Algorithm run by the external tool.
///
/// Serialized as its tag; deserialized through [`FromStr`], so config files
/// accept the same spellings as the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum Mode {
    /// Full sparse dot-product join (`ij`).
    IndexedJoin,
    /// Inverted-index based search (`iidx`).
    FindSim,
}

impl Mode {
    /// Tag passed to the tool and embedded in artifact names.
    pub fn tag(self) -> &'static str {
        match self {
            Mode::IndexedJoin => "ij",
            Mode::FindSim => "iidx",
        }
    }

    /// Name written to the first column of the timing report.
    pub fn display_name(self) -> &'static str {
        match self {
            Mode::IndexedJoin => "IdxJoin",
            Mode::FindSim => "FindSim",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Unknown algorithm mode name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown mode {0:?} (expected one of: ij, idxjoin, iidx, invertedidx)")]
pub struct ParseModeError(pub String);

impl FromStr for Mode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ij" | "idxjoin" => Ok(Mode::IndexedJoin),
            "iidx" | "invertedidx" => Ok(Mode::FindSim),
            _ => Err(ParseModeError(s.to_string())),
        }
    }
}

impl TryFrom<String> for Mode {
    type Error = ParseModeError;

    fn try_from(s: String) -> std::result::Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Mode> for &'static str {
    fn from(mode: Mode) -> Self {
        mode.tag()
    }
}

/// The four value sets whose cartesian product forms a sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    /// Algorithm modes, outermost loop.
    pub modes: Vec<Mode>,
    /// Input dataset files, relative to the working directory.
    pub datasets: Vec<String>,
    /// Minimum similarity thresholds.
    pub epsilons: Vec<f64>,
    /// Neighbour counts, innermost loop.
    pub ks: Vec<u32>,
}

impl Grid {
    /// Number of cells in the cartesian product.
    pub fn len(&self) -> usize {
        self.modes.len() * self.datasets.len() * self.epsilons.len() * self.ks.len()
    }

    /// Whether any dimension is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reject empty dimensions and out-of-range parameters.
    pub fn validate(&self) -> Result<()> {
        if self.modes.is_empty() {
            return Err(HarnessError::Config("no algorithm modes given".to_string()));
        }
        if self.datasets.is_empty() {
            return Err(HarnessError::Config("no input datasets given".to_string()));
        }
        if let Some(empty) = self.datasets.iter().find(|d| d.trim().is_empty()) {
            return Err(HarnessError::Config(format!("invalid dataset name {empty:?}")));
        }
        validate_thresholds(&self.epsilons, &self.ks)
    }

    /// All cells in iteration order: mode, dataset, epsilon, k.
    pub fn cells(&self) -> Vec<SweepCell> {
        let mut cells = Vec::with_capacity(self.len());
        for &mode in &self.modes {
            for input in &self.datasets {
                for &epsilon in &self.epsilons {
                    for &k in &self.ks {
                        cells.push(SweepCell {
                            mode,
                            input: input.clone(),
                            epsilon,
                            k,
                        });
                    }
                }
            }
        }
        cells
    }

    /// Dataset stems in first-seen order, without duplicates.
    pub fn dataset_stems(&self) -> Vec<String> {
        let mut stems: Vec<String> = Vec::with_capacity(self.datasets.len());
        for dataset in &self.datasets {
            let stem = dataset_stem(dataset);
            if !stems.iter().any(|s| s == stem) {
                stems.push(stem.to_string());
            }
        }
        stems
    }
}

pub(crate) fn validate_thresholds(epsilons: &[f64], ks: &[u32]) -> Result<()> {
    if epsilons.is_empty() {
        return Err(HarnessError::Config("no epsilon values given".to_string()));
    }
    if let Some(bad) = epsilons.iter().find(|e| !e.is_finite() || **e < 0.0) {
        return Err(HarnessError::Config(format!(
            "epsilon must be a non-negative number, got {bad}"
        )));
    }
    if ks.is_empty() {
        return Err(HarnessError::Config("no k values given".to_string()));
    }
    if ks.contains(&0) {
        return Err(HarnessError::Config("k must be at least 1".to_string()));
    }
    Ok(())
}

/// One point of the sweep grid.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepCell {
    /// Algorithm to run.
    pub mode: Mode,
    /// Input dataset file.
    pub input: String,
    /// Minimum similarity.
    pub epsilon: f64,
    /// Neighbour count.
    pub k: u32,
}

impl SweepCell {
    /// Artifact the tool writes for this cell.
    pub fn output_file(&self) -> String {
        derive_filename(&self.input, self.mode.tag(), self.epsilon, self.k)
    }

    /// Argument vector: `-m <mode> -eps <eps> -k <k> <input> <output>`.
    pub fn args(&self) -> Vec<String> {
        vec![
            "-m".to_string(),
            self.mode.tag().to_string(),
            "-eps".to_string(),
            format_epsilon_arg(self.epsilon),
            "-k".to_string(),
            self.k.to_string(),
            self.input.clone(),
            self.output_file(),
        ]
    }
}

impl fmt::Display for SweepCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} eps={} k={}",
            self.mode.display_name(),
            self.input,
            format_epsilon(self.epsilon),
            self.k
        )
    }
}

/// One equality check between the `ij` and `iidx` artifacts of a dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct CompareTask {
    /// Dataset stem, e.g. `wiki1`.
    pub dataset: String,
    /// Minimum similarity used by both runs.
    pub epsilon: f64,
    /// Neighbour count used by both runs.
    pub k: u32,
}

impl CompareTask {
    /// Artifact produced by the index-join run.
    pub fn file1(&self) -> String {
        derive_filename(&self.dataset, Mode::IndexedJoin.tag(), self.epsilon, self.k)
    }

    /// Artifact produced by the inverted-index run.
    pub fn file2(&self) -> String {
        derive_filename(&self.dataset, Mode::FindSim.tag(), self.epsilon, self.k)
    }

    /// Argument vector: `-mode eq <file1> <file2> [-fldelta <delta>]`.
    pub fn args(&self, fldelta: Option<f64>) -> Vec<String> {
        let mut args = vec![
            "-mode".to_string(),
            "eq".to_string(),
            self.file1(),
            self.file2(),
        ];
        if let Some(delta) = fldelta {
            args.push("-fldelta".to_string());
            args.push(delta.to_string());
        }
        args
    }
}

impl fmt::Display for CompareTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} eps={} k={}",
            self.dataset,
            format_epsilon(self.epsilon),
            self.k
        )
    }
}

/// Comparison tasks in iteration order: dataset, epsilon, k.
pub fn compare_tasks(datasets: &[String], epsilons: &[f64], ks: &[u32]) -> Vec<CompareTask> {
    let mut tasks = Vec::with_capacity(datasets.len() * epsilons.len() * ks.len());
    for dataset in datasets {
        for &epsilon in epsilons {
            for &k in ks {
                tasks.push(CompareTask {
                    dataset: dataset.clone(),
                    epsilon,
                    k,
                });
            }
        }
    }
    tasks
}
