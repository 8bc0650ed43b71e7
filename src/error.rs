//! Error taxonomy for sweep and comparison runs.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while running the harness.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// The external tool exited with a non-zero status or was killed by a signal.
    #[error("external tool failed ({}): {command}{}", describe_status(.code), describe_stderr(.stderr))]
    ExternalToolFailure {
        /// Rendered command line.
        command: String,
        /// Exit code, `None` when terminated by a signal.
        code: Option<i32>,
        /// Captured standard error, trimmed.
        stderr: String,
    },

    /// The expected marker text was absent from the tool's standard output.
    #[error("malformed tool output: marker {marker:?} not found in output of `{command}`")]
    MalformedOutput {
        /// Marker that was searched for.
        marker: &'static str,
        /// Rendered command line.
        command: String,
    },

    /// The tool process could not be started.
    #[error("failed to start {}: {source}", .program.display())]
    Spawn {
        /// Program that was resolved for execution.
        program: PathBuf,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },

    /// The tool ran longer than the configured timeout and was killed.
    #[error("external tool timed out after {secs}s: {command}")]
    Timeout {
        /// Rendered command line.
        command: String,
        /// Timeout that was exceeded.
        secs: u64,
    },

    /// Reading or writing a report file failed.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        /// File being accessed.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },

    /// Invalid configuration value.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Configuration file was not valid TOML.
    #[error("invalid configuration file: {0}")]
    Toml(#[from] toml::de::Error),

    /// A timing report record could not be encoded.
    #[error("failed to encode CSV record: {0}")]
    Csv(#[from] csv::Error),

    /// JSON export failed.
    #[error("failed to serialize results: {0}")]
    Json(#[from] serde_json::Error),

    /// The worker pool for parallel sweeps could not be created.
    #[error("failed to build worker pool: {0}")]
    WorkerPool(String),
}

impl HarnessError {
    /// Whether this error belongs to a single sweep cell (as opposed to the
    /// run as a whole), and may therefore be skipped when continuing past
    /// failures.
    pub fn is_cell_failure(&self) -> bool {
        matches!(
            self,
            HarnessError::ExternalToolFailure { .. }
                | HarnessError::MalformedOutput { .. }
                | HarnessError::Timeout { .. }
        )
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        HarnessError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, HarnessError>;

fn describe_status(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "terminated by signal".to_string(),
    }
}

fn describe_stderr(stderr: &str) -> String {
    if stderr.is_empty() {
        String::new()
    } else {
        format!("\n{stderr}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_failure_message() {
        let err = HarnessError::ExternalToolFailure {
            command: "findsim -m ij".to_string(),
            code: Some(1),
            stderr: String::new(),
        };
        assert_eq!(err.to_string(), "external tool failed (exit code 1): findsim -m ij");

        let err = HarnessError::ExternalToolFailure {
            command: "findsim".to_string(),
            code: None,
            stderr: "Segmentation fault".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("terminated by signal"));
        assert!(msg.ends_with("\nSegmentation fault"));
    }

    #[test]
    fn test_cell_failure_classification() {
        let malformed = HarnessError::MalformedOutput {
            marker: "Differences: ",
            command: "findsim -mode eq a b".to_string(),
        };
        assert!(malformed.is_cell_failure());
        assert!(!HarnessError::Config("k".to_string()).is_cell_failure());
        assert!(!HarnessError::io("times.csv", io::Error::other("disk full")).is_cell_failure());
    }
}
