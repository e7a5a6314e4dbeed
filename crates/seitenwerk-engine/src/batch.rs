// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Folder batch conversion: every `*.pdf` in the input folder (sorted,
// non-recursive) is converted to the target format. Per-file failures are
// collected and do not abort the run; the failure log is flushed to CSV at
// batch end, including when the run is cancelled part-way.

use std::fs;
use std::path::{Path, PathBuf};

use seitenwerk_core::error::{Result, SeitenwerkError};
use seitenwerk_core::types::{CancelToken, ConversionSettings, TargetFormat};
use seitenwerk_document::PageRasterizer;
use tracing::{info, instrument, warn};

use crate::convert::{self, file_stem};
use crate::dispatch::{OpReport, percent};
use crate::output::{self, ResolvedOutput};
use crate::report::FailureLog;

/// Convert every PDF in `input_dir` to `format`, writing results (and the
/// failure log, when enabled) into `output_dir`.
#[instrument(skip_all, fields(input = %input_dir.display(), output = %output_dir.display(), %format))]
pub fn convert_folder(
    rasterizer: &PageRasterizer,
    input_dir: &Path,
    output_dir: &Path,
    format: TargetFormat,
    settings: &ConversionSettings,
    cancel: &CancelToken,
    progress: &mut dyn FnMut(u8),
) -> Result<OpReport> {
    if !input_dir.is_dir() {
        return Err(SeitenwerkError::InvalidOption(format!(
            "input folder does not exist: {}",
            input_dir.display()
        )));
    }
    fs::create_dir_all(output_dir)?;

    let files = pdf_files(input_dir)?;
    if files.is_empty() {
        return Err(SeitenwerkError::InvalidOption(format!(
            "no PDF files found in {}",
            input_dir.display()
        )));
    }

    let total = files.len();
    let mut failures = FailureLog::new();
    let mut converted = 0usize;
    let mut skipped = 0usize;
    let mut cancelled = false;

    for (index, file) in files.iter().enumerate() {
        if cancel.is_cancelled() {
            cancelled = true;
            break;
        }

        let mut child = |page_percent: u8| {
            progress(overall_percent(index, page_percent, total));
        };

        match convert_one(rasterizer, file, output_dir, format, settings, cancel, &mut child) {
            Ok(report) if report.skipped => skipped += 1,
            Ok(_) => converted += 1,
            Err(SeitenwerkError::Cancelled) => {
                cancelled = true;
                break;
            }
            Err(err) => {
                warn!(file = %file.display(), error = %err, "batch entry failed");
                failures.record(file.display().to_string(), err.to_string());
            }
        }

        progress(percent(index + 1, total));
    }

    let mut log_note = String::new();
    if settings.write_failure_log && !failures.is_empty() {
        match failures.write_csv(output_dir) {
            Ok(path) => log_note = format!(" Failure log: {}", path.display()),
            Err(err) => warn!(error = %err, "failed to write failure log"),
        }
    }

    if cancelled {
        return Err(SeitenwerkError::Cancelled);
    }

    let failed = failures.len();
    info!(converted, failed, skipped, total, "batch complete");

    let message = if failed > 0 {
        format!(
            "Completed with errors. Converted {converted}/{total}, failed {failed}, skipped {skipped}.{log_note}"
        )
    } else if skipped > 0 {
        format!("Completed with skips. Converted {converted}/{total}, skipped {skipped}.")
    } else {
        format!("Batch conversion successful! Converted {converted} files.")
    };
    Ok(OpReport::new(message))
}

/// Route one batch entry to the matching conversion. Raster targets get a
/// per-file sub-folder, resolved against the collision policy.
fn convert_one(
    rasterizer: &PageRasterizer,
    file: &Path,
    output_dir: &Path,
    format: TargetFormat,
    settings: &ConversionSettings,
    cancel: &CancelToken,
    progress: &mut dyn FnMut(u8),
) -> Result<OpReport> {
    let stem = file_stem(file);

    match format {
        TargetFormat::Pptx | TargetFormat::Docx => {
            let target = output_dir.join(format!("{stem}.{}", format.extension()));
            match format {
                TargetFormat::Pptx => {
                    convert::convert_to_pptx(rasterizer, file, &target, settings, cancel, progress)
                }
                _ => convert::convert_to_docx(rasterizer, file, &target, settings, cancel, progress),
            }
        }
        _ => {
            let subdir = output_dir.join(&stem);
            match output::resolve_dir(&subdir, settings.collision)? {
                ResolvedOutput::Skip => Ok(OpReport::skipped(format!(
                    "Skipped existing output directory: {}",
                    subdir.display()
                ))),
                ResolvedOutput::Write(dir) => convert::convert_to_images(
                    rasterizer, file, &dir, format, settings, cancel, progress,
                ),
            }
        }
    }
}

/// The `*.pdf` files directly inside `dir`, sorted by name.
fn pdf_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
        })
        .collect();
    files.sort();
    Ok(files)
}

/// Fold a file's own progress into the whole-batch percentage.
fn overall_percent(file_index: usize, page_percent: u8, total_files: usize) -> u8 {
    let scaled = file_index * 100 + page_percent.min(100) as usize;
    (scaled / total_files.max(1)).min(100) as u8
}
