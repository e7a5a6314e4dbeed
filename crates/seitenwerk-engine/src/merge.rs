// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Merge two or more PDFs into one, preserving input order.

use std::fs;
use std::path::{Path, PathBuf};

use seitenwerk_core::error::{Result, SeitenwerkError};
use seitenwerk_core::types::{CancelToken, ConversionSettings};
use seitenwerk_document::PdfReader;
use seitenwerk_document::pdf::reader::blank_document;
use seitenwerk_document::pdf::security::save_with_password;
use tracing::{info, instrument};

use crate::dispatch::{OpReport, percent};
use crate::output::{self, ResolvedOutput};

/// Merge `inputs` into a single PDF at `output`. Pages appear in input
/// order; an output password, when set, is applied to the result.
#[instrument(skip_all, fields(inputs = inputs.len(), output = %output.display()))]
pub fn merge_pdfs(
    inputs: &[PathBuf],
    output: &Path,
    settings: &ConversionSettings,
    cancel: &CancelToken,
    progress: &mut dyn FnMut(u8),
) -> Result<OpReport> {
    if inputs.len() < 2 {
        return Err(SeitenwerkError::InvalidOption(
            "select at least two PDF files to merge".into(),
        ));
    }
    cancel.check()?;

    let target = match output::resolve_file(output, settings.collision) {
        ResolvedOutput::Write(path) => path,
        ResolvedOutput::Skip => {
            return Ok(OpReport::skipped(format!(
                "Skipped existing file: {}",
                output.display()
            )));
        }
    };

    let mut merged = blank_document();
    for (index, input) in inputs.iter().enumerate() {
        cancel.check()?;
        let reader = PdfReader::open(input, settings.input_password())?;
        reader.append_pages_into(&mut merged, None)?;
        progress(percent(index + 1, inputs.len()));
    }

    cancel.check()?;
    if let Some(parent) = target.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    save_with_password(&mut merged, &target, settings.output_password())?;

    info!(files = inputs.len(), path = %target.display(), "merge written");
    Ok(OpReport::new(format!(
        "Merge successful!{}",
        output::output_note(output, &target)
    )))
}
