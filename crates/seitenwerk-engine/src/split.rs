// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Split selected pages into one-page PDF files.

use std::fs;
use std::path::Path;

use seitenwerk_core::error::{Result, SeitenwerkError};
use seitenwerk_core::pages::parse_page_range;
use seitenwerk_core::types::{CancelToken, ConversionSettings};
use seitenwerk_document::PdfReader;
use seitenwerk_document::pdf::security::save_with_password;
use tracing::{info, instrument};

use crate::convert::file_stem;
use crate::dispatch::{OpReport, percent};
use crate::output::{self, ResolvedOutput};

/// Write each selected page of `input` as `<stem>_p<NNN>.pdf` into
/// `output_dir`, applying the collision policy per file and the output
/// password (when set) to every produced document.
#[instrument(skip_all, fields(input = %input.display(), dir = %output_dir.display()))]
pub fn split_pdf(
    input: &Path,
    output_dir: &Path,
    settings: &ConversionSettings,
    cancel: &CancelToken,
    progress: &mut dyn FnMut(u8),
) -> Result<OpReport> {
    cancel.check()?;
    fs::create_dir_all(output_dir)?;

    let reader = PdfReader::open(input, settings.input_password())?;
    let total_pages = reader.page_count();
    if total_pages == 0 {
        return Err(SeitenwerkError::Pdf(format!(
            "{} has no pages",
            input.display()
        )));
    }
    let pages = parse_page_range(&settings.page_range, total_pages)?;
    let stem = file_stem(input);

    let mut created = 0usize;
    let mut skipped = 0usize;

    for (index, &page) in pages.iter().enumerate() {
        cancel.check()?;

        let name = format!("{stem}_p{page:03}.pdf");
        match output::resolve_file(&output_dir.join(name), settings.collision) {
            ResolvedOutput::Skip => skipped += 1,
            ResolvedOutput::Write(path) => {
                let mut single = reader.extract_pages(&[page])?;
                save_with_password(&mut single, &path, settings.output_password())?;
                created += 1;
            }
        }

        progress(percent(index + 1, pages.len()));
    }

    info!(created, skipped, dir = %output_dir.display(), "split complete");
    Ok(split_run_report(created, skipped))
}

fn split_run_report(created: usize, skipped: usize) -> OpReport {
    if created == 0 && skipped > 0 {
        OpReport::skipped("All split files were skipped because output files already exist.")
    } else if skipped > 0 {
        OpReport::new(format!(
            "Created {created} split files. Skipped {skipped} existing files."
        ))
    } else {
        OpReport::new(format!("Created {created} split PDF files."))
    }
}
