//! Parser for findsim stdout.
//!
//! Extracts the search timings from a graph-construction run and the
//! difference summary from an equality check.

use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

/// Marker preceding the search wall time (note the two spaces).
pub const SEARCH_TIME_MARKER: &str = "Similarity search:  ";

/// Marker preceding the overall wall time.
pub const TOTAL_TIME_MARKER: &str = "Total time:  ";

/// Marker preceding the equality-check summary.
pub const DIFFERENCES_MARKER: &str = "Differences: ";

/// A required marker was not present in the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("marker {marker:?} not found in tool output")]
pub struct MissingMarker {
    /// The marker that was searched for.
    pub marker: &'static str,
}

/// Timings reported by a graph-construction run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTimings {
    /// Token following [`SEARCH_TIME_MARKER`], e.g. `12.3456`.
    pub search: String,
    /// Token following [`TOTAL_TIME_MARKER`], when the tool printed it.
    pub total: Option<String>,
}

/// Summary printed by an equality check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DifferenceReport {
    /// Everything after [`DIFFERENCES_MARKER`], trimmed.
    pub summary: String,
    /// Count from the `Overall, N differences were encountered` line.
    pub count: Option<u64>,
}

fn search_time_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| token_after(SEARCH_TIME_MARKER))
}

fn total_time_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| token_after(TOTAL_TIME_MARKER))
}

fn differences_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!("(?s){}(.*)", regex::escape(DIFFERENCES_MARKER)))
            .expect("differences pattern is valid")
    })
}

fn difference_count_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"Overall,\s+(\d+)\s+differences?\s+were\s+encountered")
            .expect("difference count pattern is valid")
    })
}

// The value is the first whitespace-delimited token right after the marker.
fn token_after(marker: &str) -> Regex {
    Regex::new(&format!(r"{}(\S+)", regex::escape(marker))).expect("marker pattern is valid")
}

/// Parse the output of `findsim -m <mode> ...`.
///
/// Expected format (from findsim with verbosity on):
/// ```text
/// TIMES:
///      Similarity search:  12.3456 (12.35s)
///      Total time:  13.0021 (13.00s)
/// ```
///
/// The first occurrence of the search marker wins.
pub fn parse_search_output(stdout: &str) -> Result<SearchTimings, MissingMarker> {
    let search = search_time_re()
        .captures(stdout)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or(MissingMarker {
            marker: SEARCH_TIME_MARKER,
        })?;

    let total = total_time_re()
        .captures(stdout)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string());

    Ok(SearchTimings { search, total })
}

/// Parse the output of `findsim -mode eq <a> <b>`.
///
/// Expected format:
/// ```text
/// Differences:
/// [1 3 0.510000 0.490000]
/// Overall, 1 differences were encountered between A and B.
/// ```
pub fn parse_compare_output(stdout: &str) -> Result<DifferenceReport, MissingMarker> {
    let summary = differences_re()
        .captures(stdout)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .ok_or(MissingMarker {
            marker: DIFFERENCES_MARKER,
        })?;

    let count = difference_count_re()
        .captures(&summary)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok());

    Ok(DifferenceReport { summary, count })
}
