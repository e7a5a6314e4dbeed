// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Minimal OOXML package output.
//
// PPTX and DOCX files are ZIP containers of XML parts wired together by
// relationship files. The builders here emit only the parts the target
// applications require; they make no attempt to cover the wider OOXML
// surface.

pub mod docx;
pub mod pptx;

use std::io::{Cursor, Write};

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesStart, Event};
use seitenwerk_core::error::{Result, SeitenwerkError};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

// Relationship type URIs shared by both package kinds.
pub(crate) const REL_OFFICE_DOCUMENT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
pub(crate) const REL_SLIDE_MASTER: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster";
pub(crate) const REL_SLIDE_LAYOUT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout";
pub(crate) const REL_SLIDE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";
pub(crate) const REL_THEME: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme";
pub(crate) const REL_IMAGE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";

/// Map any zip/xml failure into the crate error.
pub(crate) fn ooxml_err(err: impl std::fmt::Display) -> SeitenwerkError {
    SeitenwerkError::Ooxml(err.to_string())
}

/// In-memory ZIP container the builders append parts to.
pub(crate) struct Package {
    zip: ZipWriter<Cursor<Vec<u8>>>,
}

impl Package {
    pub(crate) fn new() -> Self {
        Self {
            zip: ZipWriter::new(Cursor::new(Vec::new())),
        }
    }

    /// Add a part at the given package path.
    pub(crate) fn add_part(&mut self, name: &str, bytes: &[u8]) -> Result<()> {
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        self.zip.start_file(name, options).map_err(ooxml_err)?;
        self.zip.write_all(bytes).map_err(ooxml_err)?;
        Ok(())
    }

    pub(crate) fn finish(self) -> Result<Vec<u8>> {
        let cursor = self.zip.finish().map_err(ooxml_err)?;
        Ok(cursor.into_inner())
    }
}

/// One entry of a `.rels` part.
pub(crate) struct Relationship {
    pub id: String,
    pub rel_type: &'static str,
    pub target: String,
}

impl Relationship {
    pub(crate) fn new(id: impl Into<String>, rel_type: &'static str, target: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            rel_type,
            target: target.into(),
        }
    }
}

/// Serialise a relationships part.
pub(crate) fn relationships_xml(entries: &[Relationship]) -> Result<Vec<u8>> {
    let mut writer = xml_writer();

    let mut root = BytesStart::new("Relationships");
    root.push_attribute((
        "xmlns",
        "http://schemas.openxmlformats.org/package/2006/relationships",
    ));
    writer.write_event(Event::Start(root)).map_err(ooxml_err)?;

    for entry in entries {
        let mut rel = BytesStart::new("Relationship");
        rel.push_attribute(("Id", entry.id.as_str()));
        rel.push_attribute(("Type", entry.rel_type));
        rel.push_attribute(("Target", entry.target.as_str()));
        writer.write_event(Event::Empty(rel)).map_err(ooxml_err)?;
    }

    writer
        .write_event(Event::End(quick_xml::events::BytesEnd::new("Relationships")))
        .map_err(ooxml_err)?;

    Ok(writer.into_inner())
}

/// Start an XML part with the standard declaration.
pub(crate) fn xml_writer() -> Writer<Vec<u8>> {
    let mut writer = Writer::new(Vec::new());
    // The declaration write only fails on an out-of-memory Vec; treat it as
    // infallible like the rest of the in-memory writes.
    let _ = writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))));
    writer
}

// -- Event shorthands shared by the builders ----------------------------------

pub(crate) fn start(writer: &mut Writer<Vec<u8>>, name: &str) -> Result<()> {
    writer
        .write_event(Event::Start(BytesStart::new(name)))
        .map_err(ooxml_err)
}

pub(crate) fn start_with(
    writer: &mut Writer<Vec<u8>>,
    name: &str,
    attrs: &[(&str, &str)],
) -> Result<()> {
    let mut element = BytesStart::new(name);
    for attr in attrs {
        element.push_attribute(*attr);
    }
    writer.write_event(Event::Start(element)).map_err(ooxml_err)
}

pub(crate) fn end(writer: &mut Writer<Vec<u8>>, name: &str) -> Result<()> {
    writer
        .write_event(Event::End(quick_xml::events::BytesEnd::new(name)))
        .map_err(ooxml_err)
}

pub(crate) fn empty(writer: &mut Writer<Vec<u8>>, name: &str) -> Result<()> {
    writer
        .write_event(Event::Empty(BytesStart::new(name)))
        .map_err(ooxml_err)
}

pub(crate) fn empty_with(
    writer: &mut Writer<Vec<u8>>,
    name: &str,
    attrs: &[(&str, &str)],
) -> Result<()> {
    let mut element = BytesStart::new(name);
    for attr in attrs {
        element.push_attribute(*attr);
    }
    writer.write_event(Event::Empty(element)).map_err(ooxml_err)
}

pub(crate) fn text(writer: &mut Writer<Vec<u8>>, content: &str) -> Result<()> {
    writer
        .write_event(Event::Text(quick_xml::events::BytesText::new(content)))
        .map_err(ooxml_err)
}

/// `<Default Extension=... ContentType=...>` entry of `[Content_Types].xml`.
pub(crate) fn default_type(
    writer: &mut Writer<Vec<u8>>,
    extension: &str,
    content_type: &str,
) -> Result<()> {
    empty_with(
        writer,
        "Default",
        &[("Extension", extension), ("ContentType", content_type)],
    )
}

/// `<Override PartName=... ContentType=...>` entry of `[Content_Types].xml`.
pub(crate) fn override_type(
    writer: &mut Writer<Vec<u8>>,
    part: &str,
    content_type: &str,
) -> Result<()> {
    empty_with(
        writer,
        "Override",
        &[("PartName", part), ("ContentType", content_type)],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn package_round_trips_through_zip() {
        let mut package = Package::new();
        package.add_part("word/document.xml", b"<doc/>").expect("add");
        let bytes = package.finish().expect("finish");

        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).expect("reopen");
        let mut part = archive.by_name("word/document.xml").expect("part");
        let mut content = String::new();
        part.read_to_string(&mut content).expect("read");
        assert_eq!(content, "<doc/>");
    }

    #[test]
    fn relationships_part_lists_all_entries() {
        let xml = relationships_xml(&[
            Relationship::new("rId1", REL_OFFICE_DOCUMENT, "ppt/presentation.xml"),
            Relationship::new("rId2", REL_IMAGE, "../media/image1.png"),
        ])
        .expect("serialise");

        let text = String::from_utf8(xml).expect("utf8");
        assert!(text.contains(r#"Id="rId1""#));
        assert!(text.contains("ppt/presentation.xml"));
        assert!(text.contains(r#"Id="rId2""#));
        assert!(text.contains("../media/image1.png"));
    }
}
