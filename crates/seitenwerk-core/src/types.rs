// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Seitenwerk conversion engine.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, SeitenwerkError};

/// Unique identifier for a conversion job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(pub Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Output formats a PDF can be converted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetFormat {
    /// Slide deck with one full-bleed page image per slide.
    Pptx,
    /// Word document carrying the extracted text of each page.
    Docx,
    /// One PNG file per page.
    Png,
    /// One JPEG file per page (honours the configured quality).
    Jpeg,
}

impl TargetFormat {
    /// File extension for outputs of this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Pptx => "pptx",
            Self::Docx => "docx",
            Self::Png => "png",
            Self::Jpeg => "jpg",
        }
    }

    /// Whether this format produces a directory of per-page images rather
    /// than a single output file.
    pub fn is_raster(&self) -> bool {
        matches!(self, Self::Png | Self::Jpeg)
    }

    /// Parse a user-facing format name ("PPTX", "jpg", ...).
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "pptx" => Some(Self::Pptx),
            "docx" => Some(Self::Docx),
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            _ => None,
        }
    }
}

impl std::fmt::Display for TargetFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// Rule for resolving an output path that already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionPolicy {
    /// Replace the existing file or directory contents in place.
    Overwrite,
    /// Leave the existing output untouched and skip the write.
    Skip,
    /// Append ` (N)` before the extension until a free name is found.
    AutoRename,
}

/// Per-job option set. Immutable once a job starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionSettings {
    /// Rasterisation resolution in dots per inch.
    pub render_dpi: u32,
    /// JPEG encoder quality, 1-100. Ignored for PNG output.
    pub jpeg_quality: u8,
    /// Page range expression, e.g. `1-3,5,8-10`. Empty selects all pages.
    pub page_range: String,
    /// Password for opening protected input PDFs.
    pub input_password: Option<String>,
    /// Password applied to merged/split PDF outputs.
    pub output_password: Option<String>,
    /// What to do when an output path already exists.
    pub collision: CollisionPolicy,
    /// Whether batch runs write a CSV failure log on completion.
    pub write_failure_log: bool,
}

impl Default for ConversionSettings {
    fn default() -> Self {
        Self {
            render_dpi: 144,
            jpeg_quality: 90,
            page_range: String::new(),
            input_password: None,
            output_password: None,
            collision: CollisionPolicy::Overwrite,
            write_failure_log: true,
        }
    }
}

impl ConversionSettings {
    /// Validate numeric options before a job starts.
    pub fn validate(&self) -> Result<()> {
        if self.render_dpi == 0 {
            return Err(SeitenwerkError::InvalidOption(
                "render DPI must be greater than 0".into(),
            ));
        }
        if self.jpeg_quality == 0 || self.jpeg_quality > 100 {
            return Err(SeitenwerkError::InvalidOption(format!(
                "JPEG quality must be between 1 and 100, got {}",
                self.jpeg_quality
            )));
        }
        Ok(())
    }

    /// Input password as the `Option<&str>` the document layer wants.
    pub fn input_password(&self) -> Option<&str> {
        self.input_password.as_deref().filter(|p| !p.is_empty())
    }

    /// Output password, if one was supplied.
    pub fn output_password(&self) -> Option<&str> {
        self.output_password.as_deref().filter(|p| !p.is_empty())
    }
}

/// What a job asks the engine to do.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Operation {
    /// Convert one PDF. For `Pptx`/`Docx` the output is the target file
    /// path; for raster formats it is the directory receiving per-page
    /// image files.
    Convert {
        input: PathBuf,
        output: PathBuf,
        format: TargetFormat,
    },
    /// Merge two or more PDFs into one.
    Merge {
        inputs: Vec<PathBuf>,
        output: PathBuf,
    },
    /// Split selected pages into one-page PDF files in a directory.
    Split {
        input: PathBuf,
        output_dir: PathBuf,
    },
    /// Convert every `*.pdf` in a folder to the target format.
    Batch {
        input_dir: PathBuf,
        output_dir: PathBuf,
        format: TargetFormat,
    },
}

impl Operation {
    /// Short human-readable label for status displays.
    pub fn label(&self) -> String {
        match self {
            Self::Convert { input, format, .. } => {
                format!("{} -> {}", file_label(input), format.extension())
            }
            Self::Merge { inputs, .. } => format!("merge {} files", inputs.len()),
            Self::Split { input, .. } => format!("split {}", file_label(input)),
            Self::Batch { input_dir, format, .. } => {
                format!("batch {} -> {}", file_label(input_dir), format.extension())
            }
        }
    }
}

fn file_label(path: &std::path::Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Lifecycle states of a conversion job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    /// Waiting in the queue.
    Queued,
    /// Currently executing on the worker.
    Running,
    /// Finished successfully.
    Done,
    /// Finished with an error — see the job message.
    Failed,
    /// Discarded before running, or stopped cooperatively mid-run.
    Cancelled,
}

impl JobStatus {
    /// Whether the job has reached a final state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed | Self::Cancelled)
    }
}

/// A queued unit of work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionJob {
    pub id: JobId,
    pub operation: Operation,
    pub settings: ConversionSettings,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    /// Outcome message once the job is terminal.
    pub message: Option<String>,
}

impl ConversionJob {
    pub fn new(operation: Operation, settings: ConversionSettings) -> Self {
        Self {
            id: JobId::new(),
            operation,
            settings,
            status: JobStatus::Queued,
            created_at: Utc::now(),
            message: None,
        }
    }
}

/// One failed source, recorded in submission-failure order and flushed to
/// the CSV log at batch end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureRecord {
    pub source: String,
    pub error: String,
}

impl FailureRecord {
    pub fn new(source: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            error: error.into(),
        }
    }
}

/// Progress and completion notifications sent from the worker to the
/// interactive thread.
#[derive(Debug, Clone)]
pub struct JobEvent {
    pub job_id: JobId,
    pub kind: JobEventKind,
}

#[derive(Debug, Clone)]
pub enum JobEventKind {
    Started,
    /// Percent complete, clamped to 0-100.
    Progress(u8),
    Finished {
        status: JobStatus,
        message: String,
    },
}

/// Shared cancellation flag observed cooperatively by the worker and the
/// running operation. Cloning shares the underlying flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Clear the flag so the queue can accept new work after a cancel
    /// request has been honoured.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Bail out of the current operation if cancellation was requested.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(SeitenwerkError::Cancelled)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_defaults_are_valid() {
        let settings = ConversionSettings::default();
        settings.validate().expect("defaults validate");
        assert_eq!(settings.render_dpi, 144);
        assert_eq!(settings.jpeg_quality, 90);
        assert_eq!(settings.collision, CollisionPolicy::Overwrite);
    }

    #[test]
    fn settings_reject_zero_dpi() {
        let settings = ConversionSettings {
            render_dpi: 0,
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn settings_reject_out_of_range_quality() {
        for quality in [0u8, 101] {
            let settings = ConversionSettings {
                jpeg_quality: quality,
                ..Default::default()
            };
            assert!(settings.validate().is_err(), "quality {quality} accepted");
        }
    }

    #[test]
    fn empty_passwords_count_as_absent() {
        let settings = ConversionSettings {
            input_password: Some(String::new()),
            output_password: Some("secret".into()),
            ..Default::default()
        };
        assert_eq!(settings.input_password(), None);
        assert_eq!(settings.output_password(), Some("secret"));
    }

    #[test]
    fn target_format_parse_is_case_insensitive() {
        assert_eq!(TargetFormat::parse("PPTX"), Some(TargetFormat::Pptx));
        assert_eq!(TargetFormat::parse("jpeg"), Some(TargetFormat::Jpeg));
        assert_eq!(TargetFormat::parse("gif"), None);
    }

    #[test]
    fn cancel_token_round_trip() {
        let token = CancelToken::new();
        assert!(token.check().is_ok());

        let shared = token.clone();
        shared.cancel();
        assert!(token.is_cancelled());
        assert!(matches!(token.check(), Err(SeitenwerkError::Cancelled)));

        token.reset();
        assert!(token.check().is_ok());
    }

    #[test]
    fn job_starts_queued() {
        let job = ConversionJob::new(
            Operation::Split {
                input: "report.pdf".into(),
                output_dir: "out".into(),
            },
            ConversionSettings::default(),
        );
        assert_eq!(job.status, JobStatus::Queued);
        assert!(!job.status.is_terminal());
        assert_eq!(job.operation.label(), "split report.pdf");
    }
}
