//! JSON serialization for run summaries.

use std::path::Path;

use crate::error::{HarnessError, Result};
use crate::result::RunSummary;

/// Serialize a RunSummary to a pretty-printed JSON string.
pub fn to_json_pretty(summary: &RunSummary) -> Result<String> {
    Ok(serde_json::to_string_pretty(summary)?)
}

/// Write a pretty-printed summary to `path`, creating parent directories.
pub fn write_json(path: &Path, summary: &RunSummary) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| HarnessError::io(parent, e))?;
    }
    let json = to_json_pretty(summary)?;
    std::fs::write(path, json).map_err(|e| HarnessError::io(path, e))
}
