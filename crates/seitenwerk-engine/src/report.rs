// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Batch failure log. Records accumulate in failure order and are flushed
// to a timestamped CSV in the batch output directory.

use std::path::{Path, PathBuf};

use chrono::Local;
use seitenwerk_core::error::{Result, SeitenwerkError};
use seitenwerk_core::types::FailureRecord;
use tracing::{info, instrument};

/// In-memory failure list for one batch run.
#[derive(Debug, Default)]
pub struct FailureLog {
    records: Vec<FailureRecord>,
}

impl FailureLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a failure for `source`.
    pub fn record(&mut self, source: impl Into<String>, error: impl Into<String>) {
        self.records.push(FailureRecord::new(source, error));
    }

    pub fn push(&mut self, record: FailureRecord) {
        self.records.push(record);
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn records(&self) -> &[FailureRecord] {
        &self.records
    }

    /// Write `batch_failures_<timestamp>.csv` into `dir` with one row per
    /// failure, in the order the failures happened. Returns the log path.
    #[instrument(skip(self), fields(dir = %dir.display(), failures = self.records.len()))]
    pub fn write_csv(&self, dir: &Path) -> Result<PathBuf> {
        let stamp = Local::now().format("%Y%m%d_%H%M%S");
        let path = dir.join(format!("batch_failures_{stamp}.csv"));

        let mut writer = csv::Writer::from_path(&path).map_err(csv_err)?;
        writer.write_record(["source", "error"]).map_err(csv_err)?;
        for record in &self.records {
            writer
                .write_record([record.source.as_str(), record.error.as_str()])
                .map_err(csv_err)?;
        }
        writer.flush()?;

        info!(path = %path.display(), "failure log written");
        Ok(path)
    }
}

fn csv_err(err: csv::Error) -> SeitenwerkError {
    SeitenwerkError::Io(std::io::Error::other(err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_contains_exactly_the_failures_in_order() {
        let dir = tempfile::tempdir().expect("tempdir");

        let mut log = FailureLog::new();
        log.record("b.pdf", "bad password");
        log.record("a.pdf", "unreadable file");
        log.record("c.pdf", "disk full");

        let path = log.write_csv(dir.path()).expect("write");
        assert!(
            path.file_name()
                .expect("name")
                .to_string_lossy()
                .starts_with("batch_failures_")
        );

        let mut reader = csv::Reader::from_path(&path).expect("reopen");
        assert_eq!(
            reader.headers().expect("headers"),
            &csv::StringRecord::from(vec!["source", "error"])
        );

        let rows: Vec<Vec<String>> = reader
            .records()
            .map(|row| row.expect("row").iter().map(str::to_owned).collect())
            .collect();
        assert_eq!(
            rows,
            vec![
                vec!["b.pdf".to_string(), "bad password".to_string()],
                vec!["a.pdf".to_string(), "unreadable file".to_string()],
                vec!["c.pdf".to_string(), "disk full".to_string()],
            ]
        );
    }

    #[test]
    fn messages_with_commas_and_quotes_survive() {
        let dir = tempfile::tempdir().expect("tempdir");

        let mut log = FailureLog::new();
        log.record("odd, name.pdf", r#"failed: "quoted", detail"#);
        let path = log.write_csv(dir.path()).expect("write");

        let mut reader = csv::Reader::from_path(&path).expect("reopen");
        let row = reader.records().next().expect("one row").expect("row");
        assert_eq!(&row[0], "odd, name.pdf");
        assert_eq!(&row[1], r#"failed: "quoted", detail"#);
    }

    #[test]
    fn empty_log_reports_empty() {
        let log = FailureLog::new();
        assert!(log.is_empty());
        assert_eq!(log.len(), 0);
    }
}
