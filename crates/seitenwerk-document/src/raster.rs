// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Raster encoding for rendered pages. PNG is lossless and ignores the
// quality setting; JPEG honours it.

use std::io::Cursor;
use std::path::Path;

use image::DynamicImage;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use seitenwerk_core::error::{Result, SeitenwerkError};
use seitenwerk_core::types::TargetFormat;
use tracing::debug;

/// Encode a rendered page as PNG bytes.
pub fn encode_png(image: &DynamicImage) -> Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    image
        .write_with_encoder(PngEncoder::new(&mut buffer))
        .map_err(|err| SeitenwerkError::Image(format!("PNG encoding failed: {err}")))?;
    Ok(buffer.into_inner())
}

/// Encode a rendered page as JPEG bytes at the given quality (1-100).
pub fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<Vec<u8>> {
    // JPEG has no alpha channel; rendered pages arrive as RGBA.
    let rgb = image.to_rgb8();
    let mut buffer = Cursor::new(Vec::new());
    rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut buffer, quality))
        .map_err(|err| SeitenwerkError::Image(format!("JPEG encoding failed: {err}")))?;
    Ok(buffer.into_inner())
}

/// Encode a page for the given raster target and write it to `path`.
pub fn write_page_image(
    image: &DynamicImage,
    path: impl AsRef<Path>,
    format: TargetFormat,
    jpeg_quality: u8,
) -> Result<()> {
    let bytes = match format {
        TargetFormat::Png => encode_png(image)?,
        TargetFormat::Jpeg => encode_jpeg(image, jpeg_quality)?,
        other => {
            return Err(SeitenwerkError::UnsupportedFormat(format!(
                "{other} is not a raster format"
            )));
        }
    };

    std::fs::write(path.as_ref(), &bytes)?;
    debug!(path = %path.as_ref().display(), bytes = bytes.len(), "page image written");
    Ok(())
}
