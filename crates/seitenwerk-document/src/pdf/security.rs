// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Output-side PDF password protection.
//
// Merged and split documents can carry an output password. We encrypt with
// the standard security handler at RC4-128 (revision 3), the broadest
// compatibility point across the viewers a desktop user actually has.

use std::path::Path;

use lopdf::Document;
use lopdf::encryption::{EncryptionState, EncryptionVersion, Permissions};
use seitenwerk_core::error::{Result, SeitenwerkError};
use tracing::{debug, instrument};

use super::reader::write_document;

/// Encrypt `document` in place with the given password (used as both the
/// owner and the user password, matching the desktop utility's single
/// password field).
#[instrument(skip_all)]
pub fn protect(document: &mut Document, password: &str) -> Result<()> {
    if password.is_empty() {
        return Err(SeitenwerkError::InvalidOption(
            "output password must not be empty".into(),
        ));
    }

    let state = EncryptionState::try_from(EncryptionVersion::V2 {
        document: &*document,
        owner_password: password,
        user_password: password,
        key_length: 128,
        permissions: Permissions::all(),
    })
    .map_err(|err| SeitenwerkError::Pdf(format!("building encryption state: {err}")))?;

    document
        .encrypt(&state)
        .map_err(|err| SeitenwerkError::Pdf(format!("encrypting document: {err}")))?;

    debug!("output document encrypted");
    Ok(())
}

/// Write a finished document to `path`, encrypting it first when an output
/// password is set.
pub fn save_with_password(
    document: &mut Document,
    path: impl AsRef<Path>,
    password: Option<&str>,
) -> Result<()> {
    if let Some(password) = password {
        protect(document, password)?;
    }
    write_document(document, path)
}
