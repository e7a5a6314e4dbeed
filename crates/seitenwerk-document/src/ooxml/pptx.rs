// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PPTX deck builder: one full-bleed page image per slide.
//
// The package carries the smallest part set PowerPoint accepts: content
// types, the package rels, presentation + rels, one blank slide master /
// layout / theme, and per slide the slide XML, its rels, and the PNG
// payload. Slide dimensions are fixed by the first page added.

use quick_xml::events::{BytesEnd, BytesStart, Event};
use seitenwerk_core::error::{Result, SeitenwerkError};
use tracing::{debug, instrument};

use super::{
    Package, REL_IMAGE, REL_OFFICE_DOCUMENT, REL_SLIDE, REL_SLIDE_LAYOUT, REL_SLIDE_MASTER,
    REL_THEME, Relationship, default_type, empty, empty_with, end, ooxml_err, override_type,
    relationships_xml, start, start_with, xml_writer,
};

const NS_DRAWING: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const NS_RELATIONSHIPS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_PRESENTATION: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";

/// English Metric Units per inch.
const EMU_PER_INCH: i64 = 914_400;

/// Builds a slide deck from rendered page images.
pub struct PptxBuilder {
    slide_cx: i64,
    slide_cy: i64,
    slides: Vec<Vec<u8>>,
}

impl PptxBuilder {
    /// Create a builder whose slide size matches a page rendered at
    /// `width_px` x `height_px` pixels at `dpi`.
    pub fn new(width_px: u32, height_px: u32, dpi: u32) -> Self {
        Self {
            slide_cx: px_to_emu(width_px, dpi),
            slide_cy: px_to_emu(height_px, dpi),
            slides: Vec::new(),
        }
    }

    /// Append a slide carrying the given PNG-encoded page image, stretched
    /// to cover the whole slide.
    pub fn add_page_image(&mut self, png: Vec<u8>) {
        self.slides.push(png);
    }

    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }

    /// Assemble the deck. Fails if no slides were added.
    #[instrument(skip(self), fields(slides = self.slides.len()))]
    pub fn finish(self) -> Result<Vec<u8>> {
        if self.slides.is_empty() {
            return Err(SeitenwerkError::Ooxml("deck has no slides".into()));
        }

        let mut package = Package::new();

        package.add_part("[Content_Types].xml", &self.content_types_xml()?)?;
        package.add_part(
            "_rels/.rels",
            &relationships_xml(&[Relationship::new(
                "rId1",
                REL_OFFICE_DOCUMENT,
                "ppt/presentation.xml",
            )])?,
        )?;

        package.add_part("ppt/presentation.xml", &self.presentation_xml()?)?;
        package.add_part("ppt/_rels/presentation.xml.rels", &self.presentation_rels()?)?;

        package.add_part("ppt/slideMasters/slideMaster1.xml", SLIDE_MASTER_XML.as_bytes())?;
        package.add_part(
            "ppt/slideMasters/_rels/slideMaster1.xml.rels",
            &relationships_xml(&[
                Relationship::new("rId1", REL_SLIDE_LAYOUT, "../slideLayouts/slideLayout1.xml"),
                Relationship::new("rId2", REL_THEME, "../theme/theme1.xml"),
            ])?,
        )?;
        package.add_part("ppt/slideLayouts/slideLayout1.xml", SLIDE_LAYOUT_XML.as_bytes())?;
        package.add_part(
            "ppt/slideLayouts/_rels/slideLayout1.xml.rels",
            &relationships_xml(&[Relationship::new(
                "rId1",
                REL_SLIDE_MASTER,
                "../slideMasters/slideMaster1.xml",
            )])?,
        )?;
        package.add_part("ppt/theme/theme1.xml", THEME_XML.as_bytes())?;

        for (index, png) in self.slides.iter().enumerate() {
            let number = index + 1;
            package.add_part(
                &format!("ppt/slides/slide{number}.xml"),
                &self.slide_xml(number)?,
            )?;
            package.add_part(
                &format!("ppt/slides/_rels/slide{number}.xml.rels"),
                &relationships_xml(&[
                    Relationship::new("rId1", REL_IMAGE, format!("../media/image{number}.png")),
                    Relationship::new("rId2", REL_SLIDE_LAYOUT, "../slideLayouts/slideLayout1.xml"),
                ])?,
            )?;
            package.add_part(&format!("ppt/media/image{number}.png"), png)?;
        }

        let bytes = package.finish()?;
        debug!(bytes = bytes.len(), "deck assembled");
        Ok(bytes)
    }

    // -- Dynamic parts --------------------------------------------------------

    fn content_types_xml(&self) -> Result<Vec<u8>> {
        let mut writer = xml_writer();

        let mut root = BytesStart::new("Types");
        root.push_attribute((
            "xmlns",
            "http://schemas.openxmlformats.org/package/2006/content-types",
        ));
        writer.write_event(Event::Start(root)).map_err(ooxml_err)?;

        default_type(&mut writer, "rels", "application/vnd.openxmlformats-package.relationships+xml")?;
        default_type(&mut writer, "xml", "application/xml")?;
        default_type(&mut writer, "png", "image/png")?;

        override_type(
            &mut writer,
            "/ppt/presentation.xml",
            "application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml",
        )?;
        override_type(
            &mut writer,
            "/ppt/slideMasters/slideMaster1.xml",
            "application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml",
        )?;
        override_type(
            &mut writer,
            "/ppt/slideLayouts/slideLayout1.xml",
            "application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml",
        )?;
        override_type(
            &mut writer,
            "/ppt/theme/theme1.xml",
            "application/vnd.openxmlformats-officedocument.theme+xml",
        )?;
        for number in 1..=self.slides.len() {
            override_type(
                &mut writer,
                &format!("/ppt/slides/slide{number}.xml"),
                "application/vnd.openxmlformats-officedocument.presentationml.slide+xml",
            )?;
        }

        writer
            .write_event(Event::End(BytesEnd::new("Types")))
            .map_err(ooxml_err)?;
        Ok(writer.into_inner())
    }

    fn presentation_xml(&self) -> Result<Vec<u8>> {
        let mut writer = xml_writer();

        let mut root = BytesStart::new("p:presentation");
        root.push_attribute(("xmlns:a", NS_DRAWING));
        root.push_attribute(("xmlns:r", NS_RELATIONSHIPS));
        root.push_attribute(("xmlns:p", NS_PRESENTATION));
        writer.write_event(Event::Start(root)).map_err(ooxml_err)?;

        start(&mut writer, "p:sldMasterIdLst")?;
        empty_with(
            &mut writer,
            "p:sldMasterId",
            &[("id", "2147483648"), ("r:id", "rId1")],
        )?;
        end(&mut writer, "p:sldMasterIdLst")?;

        start(&mut writer, "p:sldIdLst")?;
        for index in 0..self.slides.len() {
            // Slide ids start at 256 by convention; rId1 is the master.
            let id = (256 + index).to_string();
            let rid = format!("rId{}", index + 2);
            empty_with(&mut writer, "p:sldId", &[("id", &id), ("r:id", &rid)])?;
        }
        end(&mut writer, "p:sldIdLst")?;

        empty_with(
            &mut writer,
            "p:sldSz",
            &[
                ("cx", &self.slide_cx.to_string()),
                ("cy", &self.slide_cy.to_string()),
            ],
        )?;
        empty_with(
            &mut writer,
            "p:notesSz",
            &[("cx", "6858000"), ("cy", "9144000")],
        )?;

        end(&mut writer, "p:presentation")?;
        Ok(writer.into_inner())
    }

    fn presentation_rels(&self) -> Result<Vec<u8>> {
        let mut entries = vec![Relationship::new(
            "rId1",
            REL_SLIDE_MASTER,
            "slideMasters/slideMaster1.xml",
        )];
        for number in 1..=self.slides.len() {
            entries.push(Relationship::new(
                format!("rId{}", number + 1),
                REL_SLIDE,
                format!("slides/slide{number}.xml"),
            ));
        }
        relationships_xml(&entries)
    }

    fn slide_xml(&self, number: usize) -> Result<Vec<u8>> {
        let mut writer = xml_writer();

        let mut root = BytesStart::new("p:sld");
        root.push_attribute(("xmlns:a", NS_DRAWING));
        root.push_attribute(("xmlns:r", NS_RELATIONSHIPS));
        root.push_attribute(("xmlns:p", NS_PRESENTATION));
        writer.write_event(Event::Start(root)).map_err(ooxml_err)?;

        start(&mut writer, "p:cSld")?;
        start(&mut writer, "p:spTree")?;

        start(&mut writer, "p:nvGrpSpPr")?;
        empty_with(&mut writer, "p:cNvPr", &[("id", "1"), ("name", "")])?;
        empty(&mut writer, "p:cNvGrpSpPr")?;
        empty(&mut writer, "p:nvPr")?;
        end(&mut writer, "p:nvGrpSpPr")?;
        empty(&mut writer, "p:grpSpPr")?;

        // The page image, stretched across the whole slide.
        start(&mut writer, "p:pic")?;
        start(&mut writer, "p:nvPicPr")?;
        empty_with(
            &mut writer,
            "p:cNvPr",
            &[("id", "2"), ("name", &format!("Page {number}"))],
        )?;
        empty(&mut writer, "p:cNvPicPr")?;
        empty(&mut writer, "p:nvPr")?;
        end(&mut writer, "p:nvPicPr")?;

        start(&mut writer, "p:blipFill")?;
        empty_with(&mut writer, "a:blip", &[("r:embed", "rId1")])?;
        start(&mut writer, "a:stretch")?;
        empty(&mut writer, "a:fillRect")?;
        end(&mut writer, "a:stretch")?;
        end(&mut writer, "p:blipFill")?;

        start(&mut writer, "p:spPr")?;
        start(&mut writer, "a:xfrm")?;
        empty_with(&mut writer, "a:off", &[("x", "0"), ("y", "0")])?;
        empty_with(
            &mut writer,
            "a:ext",
            &[
                ("cx", &self.slide_cx.to_string()),
                ("cy", &self.slide_cy.to_string()),
            ],
        )?;
        end(&mut writer, "a:xfrm")?;
        start_with(&mut writer, "a:prstGeom", &[("prst", "rect")])?;
        empty(&mut writer, "a:avLst")?;
        end(&mut writer, "a:prstGeom")?;
        end(&mut writer, "p:spPr")?;
        end(&mut writer, "p:pic")?;

        end(&mut writer, "p:spTree")?;
        end(&mut writer, "p:cSld")?;

        start(&mut writer, "p:clrMapOvr")?;
        empty(&mut writer, "a:masterClrMapping")?;
        end(&mut writer, "p:clrMapOvr")?;

        end(&mut writer, "p:sld")?;
        Ok(writer.into_inner())
    }
}

/// Convert a pixel extent rendered at `dpi` into EMUs.
fn px_to_emu(px: u32, dpi: u32) -> i64 {
    (px as i64 * EMU_PER_INCH) / dpi.max(1) as i64
}

// -- Static parts -------------------------------------------------------------

const SLIDE_MASTER_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sldMaster xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/></p:spTree></p:cSld><p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" hlink="hlink" folHlink="folHlink"/><p:sldLayoutIdLst><p:sldLayoutId id="2147483649" r:id="rId1"/></p:sldLayoutIdLst></p:sldMaster>"#;

const SLIDE_LAYOUT_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sldLayout xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main" type="blank" preserve="1"><p:cSld name="Blank"><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/></p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sldLayout>"#;

const THEME_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<a:theme xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" name="Seitenwerk"><a:themeElements><a:clrScheme name="Seitenwerk"><a:dk1><a:sysClr val="windowText" lastClr="000000"/></a:dk1><a:lt1><a:sysClr val="window" lastClr="FFFFFF"/></a:lt1><a:dk2><a:srgbClr val="44546A"/></a:dk2><a:lt2><a:srgbClr val="E7E6E6"/></a:lt2><a:accent1><a:srgbClr val="4472C4"/></a:accent1><a:accent2><a:srgbClr val="ED7D31"/></a:accent2><a:accent3><a:srgbClr val="A5A5A5"/></a:accent3><a:accent4><a:srgbClr val="FFC000"/></a:accent4><a:accent5><a:srgbClr val="5B9BD5"/></a:accent5><a:accent6><a:srgbClr val="70AD47"/></a:accent6><a:hlink><a:srgbClr val="0563C1"/></a:hlink><a:folHlink><a:srgbClr val="954F72"/></a:folHlink></a:clrScheme><a:fontScheme name="Seitenwerk"><a:majorFont><a:latin typeface="Calibri Light"/><a:ea typeface=""/><a:cs typeface=""/></a:majorFont><a:minorFont><a:latin typeface="Calibri"/><a:ea typeface=""/><a:cs typeface=""/></a:minorFont></a:fontScheme><a:fmtScheme name="Seitenwerk"><a:fillStyleLst><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:fillStyleLst><a:lnStyleLst><a:ln w="6350"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln><a:ln w="12700"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln><a:ln w="19050"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln></a:lnStyleLst><a:effectStyleLst><a:effectStyle><a:effectLst/></a:effectStyle><a:effectStyle><a:effectLst/></a:effectStyle><a:effectStyle><a:effectLst/></a:effectStyle></a:effectStyleLst><a:bgFillStyleLst><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:bgFillStyleLst></a:fmtScheme></a:themeElements></a:theme>"#;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Read};

    fn tiny_png() -> Vec<u8> {
        let image = image::DynamicImage::ImageRgba8(image::RgbaImage::from_pixel(
            4,
            4,
            image::Rgba([200, 200, 200, 255]),
        ));
        crate::raster::encode_png(&image).expect("encode png")
    }

    fn read_part(bytes: &[u8], name: &str) -> String {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes.to_vec())).expect("open zip");
        let mut part = archive.by_name(name).expect(name);
        let mut content = String::new();
        part.read_to_string(&mut content).expect("read part");
        content
    }

    #[test]
    fn empty_deck_is_rejected() {
        let builder = PptxBuilder::new(800, 600, 144);
        assert!(builder.finish().is_err());
    }

    #[test]
    fn deck_contains_required_parts() {
        let mut builder = PptxBuilder::new(800, 600, 144);
        builder.add_page_image(tiny_png());
        builder.add_page_image(tiny_png());
        let bytes = builder.finish().expect("finish");

        let mut archive = zip::ZipArchive::new(Cursor::new(bytes.clone())).expect("open zip");
        for name in [
            "[Content_Types].xml",
            "_rels/.rels",
            "ppt/presentation.xml",
            "ppt/_rels/presentation.xml.rels",
            "ppt/slideMasters/slideMaster1.xml",
            "ppt/slideLayouts/slideLayout1.xml",
            "ppt/theme/theme1.xml",
            "ppt/slides/slide1.xml",
            "ppt/slides/slide2.xml",
            "ppt/slides/_rels/slide1.xml.rels",
            "ppt/media/image1.png",
            "ppt/media/image2.png",
        ] {
            archive.by_name(name).unwrap_or_else(|_| panic!("missing part {name}"));
        }

        let presentation = read_part(&bytes, "ppt/presentation.xml");
        assert_eq!(presentation.matches("<p:sldId ").count(), 2);
    }

    #[test]
    fn slide_size_follows_page_pixels_and_dpi() {
        // 800 px at 144 dpi is 5.555… inches → 5080000 EMU.
        let mut builder = PptxBuilder::new(800, 600, 144);
        builder.add_page_image(tiny_png());
        let bytes = builder.finish().expect("finish");

        let presentation = read_part(&bytes, "ppt/presentation.xml");
        assert!(presentation.contains(r#"cx="5080000""#), "{presentation}");
        assert!(presentation.contains(r#"cy="3810000""#), "{presentation}");
    }

    #[test]
    fn slide_references_its_image() {
        let mut builder = PptxBuilder::new(400, 300, 72);
        builder.add_page_image(tiny_png());
        let bytes = builder.finish().expect("finish");

        let slide = read_part(&bytes, "ppt/slides/slide1.xml");
        assert!(slide.contains(r#"r:embed="rId1""#));

        let rels = read_part(&bytes, "ppt/slides/_rels/slide1.xml.rels");
        assert!(rels.contains("../media/image1.png"));
    }
}
