// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page rasterisation and text extraction via the PDFium engine.
//
// PDFium keeps global C++ state and must not be driven from more than one
// thread, so the rasteriser is created once and lives on the worker thread
// that executes conversion jobs. All page numbers at this boundary are the
// 1-based indices produced by the range parser.

use std::path::Path;

use image::DynamicImage;
use pdfium_render::prelude::*;
use seitenwerk_core::error::{Result, SeitenwerkError};
use tracing::{debug, info, instrument};

/// Renders PDF pages to in-memory images and extracts their text.
pub struct PageRasterizer {
    pdfium: Pdfium,
}

impl PageRasterizer {
    /// Bind to the PDFium library. Looks for a bundled library next to the
    /// executable first, then falls back to the system-installed one.
    pub fn new() -> Result<Self> {
        let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library())
            .map_err(|err| {
                SeitenwerkError::Render(format!("PDFium library unavailable: {err:?}"))
            })?;

        info!("PDFium bound");
        Ok(Self {
            pdfium: Pdfium::new(bindings),
        })
    }

    /// Number of pages in the document at `path`.
    #[instrument(skip(self, password), fields(path = %path.as_ref().display()))]
    pub fn page_count(&self, path: impl AsRef<Path>, password: Option<&str>) -> Result<u32> {
        let document = self.load(path.as_ref(), password)?;
        Ok(document.pages().len() as u32)
    }

    /// Render the given pages at `dpi`, invoking `on_page` with each page
    /// number and its bitmap in page order. Rendering stops at the first
    /// callback error, which is propagated (this is how cancellation
    /// unwinds out of a long render).
    #[instrument(skip(self, password, on_page), fields(path = %path.as_ref().display(), pages = pages.len(), dpi))]
    pub fn render_pages(
        &self,
        path: impl AsRef<Path>,
        password: Option<&str>,
        pages: &[u32],
        dpi: u32,
        mut on_page: impl FnMut(u32, DynamicImage) -> Result<()>,
    ) -> Result<()> {
        let document = self.load(path.as_ref(), password)?;
        let config = PdfRenderConfig::new().scale_page_by_factor(dpi as f32 / 72.0);

        for &page_number in pages {
            let index = page_index(page_number, document.pages().len())?;
            let page = document
                .pages()
                .get(index)
                .map_err(|err| page_error(page_number, err))?;
            let bitmap = page.render_with_config(&config).map_err(|err| {
                SeitenwerkError::Render(format!("rendering page {page_number}: {err:?}"))
            })?;
            debug!(page_number, "page rendered");
            on_page(page_number, bitmap.as_image())?;
        }

        Ok(())
    }

    /// Extract the text of the given pages, invoking `on_text` with each
    /// page number and its text content in page order.
    #[instrument(skip(self, password, on_text), fields(path = %path.as_ref().display(), pages = pages.len()))]
    pub fn page_texts(
        &self,
        path: impl AsRef<Path>,
        password: Option<&str>,
        pages: &[u32],
        mut on_text: impl FnMut(u32, String) -> Result<()>,
    ) -> Result<()> {
        let document = self.load(path.as_ref(), password)?;

        for &page_number in pages {
            let index = page_index(page_number, document.pages().len())?;
            let page = document
                .pages()
                .get(index)
                .map_err(|err| page_error(page_number, err))?;
            let text = page.text().map_err(|err| {
                SeitenwerkError::Render(format!("extracting text of page {page_number}: {err:?}"))
            })?;
            on_text(page_number, text.all())?;
        }

        Ok(())
    }

    // -- Helpers --------------------------------------------------------------

    fn load<'a>(&'a self, path: &Path, password: Option<&'a str>) -> Result<PdfDocument<'a>> {
        self.pdfium
            .load_pdf_from_file(path, password)
            .map_err(|err| open_error(path, err))
    }
}

/// Translate a 1-based page number into PDFium's 0-based index, bounds
/// checked against the document.
fn page_index(page_number: u32, total: u16) -> Result<u16> {
    if page_number == 0 || page_number > total as u32 {
        return Err(SeitenwerkError::Render(format!(
            "page {page_number} out of range ({total} pages)"
        )));
    }
    Ok((page_number - 1) as u16)
}

fn page_error(page_number: u32, err: PdfiumError) -> SeitenwerkError {
    SeitenwerkError::Render(format!("loading page {page_number}: {err:?}"))
}

/// Map a PDFium load failure, surfacing wrong/missing passwords as their
/// own error so job messages stay actionable.
fn open_error(path: &Path, err: PdfiumError) -> SeitenwerkError {
    let detail = format!("{err:?}");
    if detail.contains("Password") {
        SeitenwerkError::Password(path.display().to_string())
    } else {
        SeitenwerkError::Render(format!("failed to open {}: {detail}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_index_is_one_based_and_bounds_checked() {
        assert_eq!(page_index(1, 3).expect("first page"), 0);
        assert_eq!(page_index(3, 3).expect("last page"), 2);
        assert!(page_index(0, 3).is_err());
        assert!(page_index(4, 3).is_err());
        assert!(page_index(1, 0).is_err());
    }
}
