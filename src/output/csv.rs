//! Incremental writer for the `times.csv` timing report.
//!
//! Records are encoded with the `csv` crate (no header, fields quoted only
//! when needed) and joined by `\n`, with no newline after the last line. The
//! separator is written before every line except the first, so a sweep that
//! dies half-way leaves a valid prefix of the final file on disk.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use ::csv::{Terminator, WriterBuilder};

use crate::error::{HarnessError, Result};
use crate::result::RunResult;

/// Receives each successful sweep result as soon as it is available.
pub trait ResultSink {
    /// Record one result. Errors abort the sweep.
    fn record(&mut self, result: &RunResult) -> Result<()>;
}

/// Discards results.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ResultSink for NullSink {
    fn record(&mut self, _result: &RunResult) -> Result<()> {
        Ok(())
    }
}

/// CSV timing report backed by any writer.
///
/// The writer is flushed after every line and released when the report is
/// dropped, on success and on failure alike.
#[derive(Debug)]
pub struct CsvReport<W: Write> {
    writer: W,
    path: PathBuf,
    lines: usize,
}

impl CsvReport<BufWriter<File>> {
    /// Create (truncate) the report file at `path`.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| HarnessError::io(parent, e))?;
        }
        let file = File::create(path).map_err(|e| HarnessError::io(path, e))?;
        Ok(Self {
            writer: BufWriter::new(file),
            path: path.to_path_buf(),
            lines: 0,
        })
    }
}

impl<W: Write> CsvReport<W> {
    /// Wrap an arbitrary writer; `label` names it in error messages.
    pub fn from_writer(writer: W, label: impl Into<PathBuf>) -> Self {
        Self {
            writer,
            path: label.into(),
            lines: 0,
        }
    }

    /// Append one line.
    pub fn append(&mut self, result: &RunResult) -> Result<()> {
        let line = encode_record(result)?;
        self.write_line(&line)
            .map_err(|e| HarnessError::io(&self.path, e))?;
        self.lines += 1;
        Ok(())
    }

    fn write_line(&mut self, line: &[u8]) -> std::io::Result<()> {
        if self.lines > 0 {
            self.writer.write_all(b"\n")?;
        }
        self.writer.write_all(line)?;
        self.writer.flush()
    }

    /// Number of lines written so far.
    pub fn lines(&self) -> usize {
        self.lines
    }

    /// Report location.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flush and hand back the underlying writer.
    pub fn finish(mut self) -> Result<W> {
        self.writer
            .flush()
            .map_err(|e| HarnessError::io(&self.path, e))?;
        Ok(self.writer)
    }
}

impl<W: Write> ResultSink for CsvReport<W> {
    fn record(&mut self, result: &RunResult) -> Result<()> {
        self.append(result)
    }
}

// One record without its line terminator.
fn encode_record(result: &RunResult) -> Result<Vec<u8>> {
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    writer.write_record(result.csv_record())?;
    let mut line = writer
        .into_inner()
        .map_err(|e| HarnessError::Csv(e.into_error().into()))?;
    if line.last() == Some(&b'\n') {
        line.pop();
    }
    Ok(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Mode;

    fn result(mode: Mode, input: &str, epsilon: f64, k: u32, time: &str) -> RunResult {
        RunResult {
            mode,
            input_file: input.to_string(),
            epsilon,
            k,
            elapsed_time: time.to_string(),
            total_time: None,
            output_file: String::new(),
            wall_secs: 0.0,
        }
    }

    #[test]
    fn test_no_trailing_newline() {
        let mut report = CsvReport::from_writer(Vec::new(), "<memory>");
        report
            .append(&result(Mode::FindSim, "wiki1.csr", 0.3, 10, "1.5"))
            .unwrap();
        report
            .append(&result(Mode::IndexedJoin, "wiki2.csr", 0.9, 100, "2.25"))
            .unwrap();
        assert_eq!(report.lines(), 2);

        let bytes = report.finish().unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            "FindSim,wiki1.csr,0.3,10,1.5\nIdxJoin,wiki2.csr,0.9,100,2.25"
        );
    }

    #[test]
    fn test_fields_with_commas_are_quoted() {
        let mut report = CsvReport::from_writer(Vec::new(), "<memory>");
        report
            .record(&result(Mode::IndexedJoin, "runs,v2/wiki1.csr", 0.3, 10, "5.0"))
            .unwrap();
        report
            .record(&result(Mode::FindSim, "wiki1.csr", 0.5, 50, "1.0"))
            .unwrap();
        let bytes = report.finish().unwrap();
        assert_eq!(
            String::from_utf8(bytes.clone()).unwrap(),
            "IdxJoin,\"runs,v2/wiki1.csr\",0.3,10,5.0\nFindSim,wiki1.csr,0.5,50,1.0"
        );

        let mut reader = ::csv::ReaderBuilder::new()
            .has_headers(false)
            .from_reader(bytes.as_slice());
        let rows: Vec<::csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].len(), 5);
        assert_eq!(&rows[0][1], "runs,v2/wiki1.csr");
    }

    #[test]
    fn test_empty_report() {
        let report = CsvReport::from_writer(Vec::new(), "<memory>");
        assert_eq!(report.path(), Path::new("<memory>"));
        assert!(report.finish().unwrap().is_empty());
    }

    #[test]
    fn test_create_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("times.csv");

        let mut report = CsvReport::create(&path).unwrap();
        report
            .append(&result(Mode::IndexedJoin, "wiki1.csr", 0.3, 10, "5.0"))
            .unwrap();
        drop(report);

        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "IdxJoin,wiki1.csr,0.3,10,5.0"
        );
    }
}
