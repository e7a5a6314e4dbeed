// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// DOCX builder: the extracted text of each PDF page becomes a run of
// paragraphs, with an explicit page break between pages.

use quick_xml::events::{BytesStart, Event};
use seitenwerk_core::error::{Result, SeitenwerkError};
use tracing::{debug, instrument};

use super::{
    Package, REL_OFFICE_DOCUMENT, Relationship, default_type, empty_with, end, ooxml_err,
    override_type, relationships_xml, start, text, xml_writer,
};

const NS_WORDPROCESSING: &str =
    "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

/// Builds a word document from per-page text.
#[derive(Default)]
pub struct DocxBuilder {
    pages: Vec<String>,
}

impl DocxBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one page's text. Empty text still produces a (blank) page.
    pub fn add_page_text(&mut self, text: impl Into<String>) {
        self.pages.push(text.into());
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Assemble the document. Fails if no pages were added.
    #[instrument(skip(self), fields(pages = self.pages.len()))]
    pub fn finish(self) -> Result<Vec<u8>> {
        if self.pages.is_empty() {
            return Err(SeitenwerkError::Ooxml("document has no pages".into()));
        }

        let mut package = Package::new();

        package.add_part("[Content_Types].xml", &content_types_xml()?)?;
        package.add_part(
            "_rels/.rels",
            &relationships_xml(&[Relationship::new(
                "rId1",
                REL_OFFICE_DOCUMENT,
                "word/document.xml",
            )])?,
        )?;
        package.add_part("word/document.xml", &self.document_xml()?)?;

        let bytes = package.finish()?;
        debug!(bytes = bytes.len(), "document assembled");
        Ok(bytes)
    }

    fn document_xml(&self) -> Result<Vec<u8>> {
        let mut writer = xml_writer();

        let mut root = BytesStart::new("w:document");
        root.push_attribute(("xmlns:w", NS_WORDPROCESSING));
        writer.write_event(Event::Start(root)).map_err(ooxml_err)?;

        start(&mut writer, "w:body")?;

        for (index, page) in self.pages.iter().enumerate() {
            if index > 0 {
                // Page boundary from the source PDF.
                start(&mut writer, "w:p")?;
                start(&mut writer, "w:r")?;
                empty_with(&mut writer, "w:br", &[("w:type", "page")])?;
                end(&mut writer, "w:r")?;
                end(&mut writer, "w:p")?;
            }
            write_page(&mut writer, page)?;
        }

        // A single default section closes the body.
        start(&mut writer, "w:sectPr")?;
        empty_with(&mut writer, "w:pgSz", &[("w:w", "11906"), ("w:h", "16838")])?;
        end(&mut writer, "w:sectPr")?;

        end(&mut writer, "w:body")?;
        end(&mut writer, "w:document")?;
        Ok(writer.into_inner())
    }
}

/// Emit one paragraph per line of the page text. A page with no
/// extractable text becomes one empty paragraph so the page break
/// structure survives.
fn write_page(writer: &mut quick_xml::Writer<Vec<u8>>, page: &str) -> Result<()> {
    let mut wrote_any = false;

    for line in page.lines() {
        start(writer, "w:p")?;
        if !line.is_empty() {
            start(writer, "w:r")?;
            start_text(writer)?;
            text(writer, line)?;
            end(writer, "w:t")?;
            end(writer, "w:r")?;
        }
        end(writer, "w:p")?;
        wrote_any = true;
    }

    if !wrote_any {
        start(writer, "w:p")?;
        end(writer, "w:p")?;
    }

    Ok(())
}

fn start_text(writer: &mut quick_xml::Writer<Vec<u8>>) -> Result<()> {
    let mut element = BytesStart::new("w:t");
    // Leading/trailing whitespace in extracted lines is significant.
    element.push_attribute(("xml:space", "preserve"));
    writer.write_event(Event::Start(element)).map_err(ooxml_err)
}

fn content_types_xml() -> Result<Vec<u8>> {
    let mut writer = xml_writer();

    let mut root = BytesStart::new("Types");
    root.push_attribute((
        "xmlns",
        "http://schemas.openxmlformats.org/package/2006/content-types",
    ));
    writer.write_event(Event::Start(root)).map_err(ooxml_err)?;

    default_type(
        &mut writer,
        "rels",
        "application/vnd.openxmlformats-package.relationships+xml",
    )?;
    default_type(&mut writer, "xml", "application/xml")?;
    override_type(
        &mut writer,
        "/word/document.xml",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml",
    )?;

    end(&mut writer, "Types")?;
    Ok(writer.into_inner())
}
