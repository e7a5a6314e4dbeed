// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// seitenwerk-document — Document primitives for the Seitenwerk engine.
//
// Provides PDF structure operations (open with password, page extraction,
// merge, output encryption) via lopdf, page rasterisation and text
// extraction via PDFium, raster encoding (PNG/JPEG), and the minimal OOXML
// builders used for PPTX and DOCX output.

pub mod ooxml;
pub mod pdf;
pub mod raster;
pub mod render;

// Re-export the primary types so callers can use `seitenwerk_document::PdfReader` etc.
pub use ooxml::docx::DocxBuilder;
pub use ooxml::pptx::PptxBuilder;
pub use pdf::reader::PdfReader;
pub use render::PageRasterizer;
