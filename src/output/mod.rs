//! Report writers: CSV timings, JSON export and terminal summaries.

pub mod csv;
pub mod json;
pub mod terminal;

pub use self::csv::{CsvReport, NullSink, ResultSink};
