// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Single-file conversion operations: PDF → PPTX, PDF → DOCX, PDF → page
// images. Each observes the cancel token at page boundaries and reports
// per-page progress.

use std::fs;
use std::path::{Path, PathBuf};

use seitenwerk_core::error::{Result, SeitenwerkError};
use seitenwerk_core::pages::parse_page_range;
use seitenwerk_core::types::{CancelToken, ConversionSettings, TargetFormat};
use seitenwerk_document::raster;
use seitenwerk_document::{DocxBuilder, PageRasterizer, PptxBuilder};
use tracing::{info, instrument};

use crate::dispatch::{OpReport, percent};
use crate::output::{self, ResolvedOutput};

/// Convert selected pages into a slide deck, one page image per slide.
#[instrument(skip_all, fields(input = %input.display(), output = %output.display()))]
pub fn convert_to_pptx(
    rasterizer: &PageRasterizer,
    input: &Path,
    output: &Path,
    settings: &ConversionSettings,
    cancel: &CancelToken,
    progress: &mut dyn FnMut(u8),
) -> Result<OpReport> {
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

    let pages = selected_pages(rasterizer, input, settings)?;

    let mut deck: Option<PptxBuilder> = None;
    let mut done = 0usize;
    rasterizer.render_pages(
        input,
        settings.input_password(),
        &pages,
        settings.render_dpi,
        |_, image| {
            cancel.check()?;
            // Slide size locks to the first rendered page.
            let builder = deck.get_or_insert_with(|| {
                PptxBuilder::new(image.width(), image.height(), settings.render_dpi)
            });
            builder.add_page_image(raster::encode_png(&image)?);
            done += 1;
            progress(percent(done, pages.len()));
            Ok(())
        },
    )?;

    cancel.check()?;
    let deck = deck.ok_or_else(|| SeitenwerkError::Pdf("no pages rendered".into()))?;
    write_output(&target, &deck.finish()?)?;

    info!(slides = done, path = %target.display(), "PPTX written");
    Ok(OpReport::new(format!(
        "Conversion successful!{}",
        output::output_note(output, &target)
    )))
}

/// Convert selected pages into a word document carrying their text.
#[instrument(skip_all, fields(input = %input.display(), output = %output.display()))]
pub fn convert_to_docx(
    rasterizer: &PageRasterizer,
    input: &Path,
    output: &Path,
    settings: &ConversionSettings,
    cancel: &CancelToken,
    progress: &mut dyn FnMut(u8),
) -> Result<OpReport> {
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

    let pages = selected_pages(rasterizer, input, settings)?;

    let mut builder = DocxBuilder::new();
    let mut done = 0usize;
    rasterizer.page_texts(input, settings.input_password(), &pages, |_, text| {
        cancel.check()?;
        builder.add_page_text(text);
        done += 1;
        progress(percent(done, pages.len()));
        Ok(())
    })?;

    cancel.check()?;
    write_output(&target, &builder.finish()?)?;

    info!(pages = done, path = %target.display(), "DOCX written");
    Ok(OpReport::new(format!(
        "Conversion successful!{}",
        output::output_note(output, &target)
    )))
}

/// Convert selected pages into per-page image files named
/// `<stem>_p<NNN>.<ext>` inside `output_dir`.
#[instrument(skip_all, fields(input = %input.display(), dir = %output_dir.display(), %format))]
pub fn convert_to_images(
    rasterizer: &PageRasterizer,
    input: &Path,
    output_dir: &Path,
    format: TargetFormat,
    settings: &ConversionSettings,
    cancel: &CancelToken,
    progress: &mut dyn FnMut(u8),
) -> Result<OpReport> {
    if !format.is_raster() {
        return Err(SeitenwerkError::UnsupportedFormat(format!(
            "{format} is not an image format"
        )));
    }
    cancel.check()?;

    fs::create_dir_all(output_dir)?;
    let stem = file_stem(input);
    let extension = format.extension();

    let pages = selected_pages(rasterizer, input, settings)?;

    // Apply the collision policy per page file before rendering anything,
    // so skipped pages cost no work.
    let mut planned: Vec<(u32, PathBuf)> = Vec::new();
    let mut skipped = 0usize;
    for &page in &pages {
        let name = format!("{stem}_p{page:03}.{extension}");
        match output::resolve_file(&output_dir.join(name), settings.collision) {
            ResolvedOutput::Write(path) => planned.push((page, path)),
            ResolvedOutput::Skip => skipped += 1,
        }
    }

    let render_list: Vec<u32> = planned.iter().map(|(page, _)| *page).collect();
    let mut targets = planned.iter();
    let mut created = 0usize;

    rasterizer.render_pages(
        input,
        settings.input_password(),
        &render_list,
        settings.render_dpi,
        |page_number, image| {
            cancel.check()?;
            let (planned_page, path) = targets
                .next()
                .ok_or_else(|| SeitenwerkError::Render("render plan exhausted".into()))?;
            debug_assert_eq!(*planned_page, page_number);
            raster::write_page_image(&image, path, format, settings.jpeg_quality)?;
            created += 1;
            progress(percent(created + skipped, pages.len()));
            Ok(())
        },
    )?;

    info!(created, skipped, dir = %output_dir.display(), "page images written");
    Ok(image_run_report(created, skipped))
}

fn image_run_report(created: usize, skipped: usize) -> OpReport {
    if created == 0 && skipped > 0 {
        OpReport::skipped("All images were skipped because output files already exist.")
    } else if skipped > 0 {
        OpReport::new(format!(
            "Saved {created} images. Skipped {skipped} existing files."
        ))
    } else {
        OpReport::new(format!("Saved {created} image files."))
    }
}

/// Page count + range parse shared by the three conversions.
fn selected_pages(
    rasterizer: &PageRasterizer,
    input: &Path,
    settings: &ConversionSettings,
) -> Result<Vec<u32>> {
    let total_pages = rasterizer.page_count(input, settings.input_password())?;
    if total_pages == 0 {
        return Err(SeitenwerkError::Pdf(format!(
            "{} has no pages",
            input.display()
        )));
    }
    parse_page_range(&settings.page_range, total_pages)
}

pub(crate) fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "page".into())
}

fn write_output(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, bytes)?;
    Ok(())
}
