// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Seitenwerk.

use thiserror::Error;

/// Top-level error type for all Seitenwerk operations.
#[derive(Debug, Error)]
pub enum SeitenwerkError {
    // -- Document errors --
    #[error("PDF operation failed: {0}")]
    Pdf(String),

    #[error("page rendering failed: {0}")]
    Render(String),

    #[error("image encoding failed: {0}")]
    Image(String),

    #[error("OOXML packaging failed: {0}")]
    Ooxml(String),

    // -- Option / input errors --
    #[error("invalid page range: {0}")]
    PageRange(String),

    #[error("password missing or incorrect: {0}")]
    Password(String),

    #[error("invalid option: {0}")]
    InvalidOption(String),

    #[error("unsupported target format: {0}")]
    UnsupportedFormat(String),

    // -- Job control --
    #[error("cancelled by user")]
    Cancelled,

    // -- Environment --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SeitenwerkError {
    /// Whether this error represents a user-initiated cancellation rather
    /// than a genuine failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, SeitenwerkError>;
