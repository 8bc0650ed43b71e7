//! Configuration for sweep and comparison runs.
//!
//! Values are layered: built-in defaults, then an optional TOML file, then
//! `FINDSIM_*` environment variables, then command-line flags.

use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{HarnessError, Result};
use crate::types::{Grid, Mode};

/// Configuration options for [`Harness`](crate::Harness).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Directory every relative path is resolved against (default: `.`).
    pub workdir: PathBuf,

    /// The findsim binary (default: `../build/findsim`).
    ///
    /// Paths with a separator are relative to `workdir`; a bare name is
    /// looked up on `PATH`.
    pub tool: PathBuf,

    /// CSV timing report (default: `times.csv`).
    pub report: PathBuf,

    /// Optional JSON export of the whole run.
    pub json_report: Option<PathBuf>,

    /// Algorithm modes, outermost sweep loop (default: `iidx`, `ij`).
    pub modes: Vec<Mode>,

    /// Input datasets (default: `wiki1.csr`, `wiki2.csr`).
    pub datasets: Vec<String>,

    /// Epsilon values (default: 0.3, 0.4, 0.5, 0.7, 0.9).
    pub epsilons: Vec<f64>,

    /// k values (default: 10, 50, 100).
    pub ks: Vec<u32>,

    /// Dataset stems to compare; derived from `datasets` when unset.
    pub compare_datasets: Option<Vec<String>>,

    /// Float tolerance for equality checks, forwarded as `-fldelta`.
    pub fldelta: Option<f64>,

    /// Sweep cells run concurrently (default: 1).
    pub jobs: usize,

    /// Per-invocation timeout in seconds.
    pub timeout_secs: Option<u64>,

    /// Skip and report failing cells instead of aborting (default: false).
    pub continue_on_failure: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workdir: PathBuf::from("."),
            tool: PathBuf::from("../build/findsim"),
            report: PathBuf::from("times.csv"),
            json_report: None,
            modes: vec![Mode::FindSim, Mode::IndexedJoin],
            datasets: vec!["wiki1.csr".to_string(), "wiki2.csr".to_string()],
            epsilons: vec![0.3, 0.4, 0.5, 0.7, 0.9],
            ks: vec![10, 50, 100],
            compare_datasets: None,
            fldelta: None,
            jobs: 1,
            timeout_secs: None,
            continue_on_failure: false,
        }
    }
}

impl Config {
    /// Parse a TOML document; missing keys keep their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load a TOML configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| HarnessError::io(path, e))?;
        Self::from_toml_str(&text)
    }

    /// Merge configuration from environment variables.
    ///
    /// Unparsable values are ignored with a warning.
    pub fn merge_env(mut self) -> Self {
        if let Some(path) = parse_path_env("FINDSIM_WORKDIR") {
            self.workdir = path;
        }
        if let Some(path) = parse_path_env("FINDSIM_TOOL") {
            self.tool = path;
        }
        if let Some(path) = parse_path_env("FINDSIM_REPORT") {
            self.report = path;
        }
        if let Some(path) = parse_path_env("FINDSIM_JSON") {
            self.json_report = Some(path);
        }
        if let Some(modes) = parse_list_env("FINDSIM_MODES") {
            self.modes = modes;
        }
        if let Some(datasets) = parse_list_env("FINDSIM_DATASETS") {
            self.datasets = datasets;
        }
        if let Some(epsilons) = parse_list_env("FINDSIM_EPSILONS") {
            self.epsilons = epsilons;
        }
        if let Some(ks) = parse_list_env("FINDSIM_KS") {
            self.ks = ks;
        }
        if let Some(delta) = parse_env("FINDSIM_FLDELTA") {
            self.fldelta = Some(delta);
        }
        if let Some(jobs) = parse_env("FINDSIM_JOBS") {
            self.jobs = jobs;
        }
        if let Some(secs) = parse_env("FINDSIM_TIMEOUT_SECS") {
            self.timeout_secs = Some(secs);
        }
        if let Some(yes) = parse_bool_env("FINDSIM_CONTINUE_ON_FAILURE") {
            self.continue_on_failure = yes;
        }
        self
    }

    /// Check everything a run depends on.
    pub fn validate(&self) -> Result<()> {
        self.grid().validate()?;
        if self.compare_datasets.as_ref().is_some_and(Vec::is_empty) {
            return Err(HarnessError::Config(
                "compare_datasets must not be empty".to_string(),
            ));
        }
        if let Some(delta) = self.fldelta {
            if !delta.is_finite() || delta < 0.0 {
                return Err(HarnessError::Config(format!(
                    "fldelta must be a non-negative number, got {delta}"
                )));
            }
        }
        if self.timeout_secs == Some(0) {
            return Err(HarnessError::Config("timeout must be at least 1s".to_string()));
        }
        Ok(())
    }

    /// The sweep grid described by this configuration.
    pub fn grid(&self) -> Grid {
        Grid {
            modes: self.modes.clone(),
            datasets: self.datasets.clone(),
            epsilons: self.epsilons.clone(),
            ks: self.ks.clone(),
        }
    }

    /// Dataset stems to compare.
    pub fn compare_datasets(&self) -> Vec<String> {
        match &self.compare_datasets {
            Some(datasets) => datasets.clone(),
            None => self.grid().dataset_stems(),
        }
    }

    /// Resolve `path` against the working directory.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.workdir.join(path)
        }
    }

    /// Location of the CSV timing report.
    pub fn report_path(&self) -> PathBuf {
        self.resolve(&self.report)
    }

    /// Location of the JSON export, if enabled.
    pub fn json_path(&self) -> Option<PathBuf> {
        self.json_report.as_deref().map(|p| self.resolve(p))
    }

    /// Per-invocation timeout.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

fn parse_env<T: FromStr>(key: &str) -> Option<T> {
    let raw = env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = %raw, "ignoring unparsable environment variable");
            None
        }
    }
}

fn parse_bool_env(key: &str) -> Option<bool> {
    let raw = env::var(key).ok()?;
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" => Some(true),
        "0" | "false" => Some(false),
        _ => {
            warn!(key, value = %raw, "ignoring unparsable environment variable");
            None
        }
    }
}

fn parse_list_env<T: FromStr>(key: &str) -> Option<Vec<T>> {
    let raw = env::var(key).ok()?;
    let parsed: std::result::Result<Vec<T>, _> = raw
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::parse)
        .collect();
    match parsed {
        Ok(values) => Some(values),
        Err(_) => {
            warn!(key, value = %raw, "ignoring unparsable environment variable");
            None
        }
    }
}

fn parse_path_env(key: &str) -> Option<PathBuf> {
    env::var_os(key)
        .filter(|val| !val.is_empty())
        .map(PathBuf::from)
}
