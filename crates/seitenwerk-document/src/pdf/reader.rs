// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF reader — open (optionally password-protected) documents and copy
// selected pages between documents using the `lopdf` crate. This is the
// structural backend for merge and split; rendering lives in `render`.

use std::path::Path;

use lopdf::{Dictionary, Document, Object, ObjectId, dictionary};
use seitenwerk_core::error::{Result, SeitenwerkError};
use tracing::{debug, info, instrument, warn};

/// Reads an existing PDF and copies pages out of it.
///
/// Wraps `lopdf::Document`. Pages are addressed 1-based, matching the page
/// sets produced by the range parser.
pub struct PdfReader {
    document: Document,
    source: String,
}

impl PdfReader {
    // -- Construction ---------------------------------------------------------

    /// Open a PDF from the filesystem, decrypting it when a password is
    /// required. A protected file with a missing or wrong password fails
    /// with [`SeitenwerkError::Password`].
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>, password: Option<&str>) -> Result<Self> {
        let path_ref = path.as_ref();
        let source = path_ref.display().to_string();

        let mut document = Document::load(path_ref)
            .map_err(|err| SeitenwerkError::Pdf(format!("failed to open {source}: {err}")))?;

        if document.is_encrypted() {
            let password = password
                .ok_or_else(|| SeitenwerkError::Password(source.clone()))?;
            document
                .decrypt(password)
                .map_err(|_| SeitenwerkError::Password(source.clone()))?;
            debug!("encrypted PDF unlocked");
        }

        info!(pages = document.get_pages().len(), "PDF loaded");

        Ok(Self { document, source })
    }

    // -- Inspection -----------------------------------------------------------

    /// Number of pages in the document.
    pub fn page_count(&self) -> u32 {
        self.document.get_pages().len() as u32
    }

    /// The path this reader was opened from.
    pub fn source(&self) -> &str {
        &self.source
    }

    // -- Page copying ---------------------------------------------------------

    /// Build a new standalone document containing the given pages
    /// (1-based, in the given order).
    #[instrument(skip(self), fields(source = %self.source, count = pages.len()))]
    pub fn extract_pages(&self, pages: &[u32]) -> Result<Document> {
        let mut target = blank_document();
        self.append_pages_into(&mut target, Some(pages))?;
        debug!(pages = pages.len(), "pages extracted");
        Ok(target)
    }

    /// Copy pages from this document into `target`, appending them after
    /// any pages already there. `pages` selects 1-based page numbers;
    /// `None` copies every page in document order. `target` must carry a
    /// catalog with a /Pages tree (see [`blank_document`]).
    pub fn append_pages_into(&self, target: &mut Document, pages: Option<&[u32]>) -> Result<()> {
        let page_map = self.document.get_pages();

        let selected: Vec<u32> = match pages {
            Some(list) => list.to_vec(),
            None => page_map.keys().copied().collect(),
        };

        for page_number in selected {
            let page_id = *page_map.get(&page_number).ok_or_else(|| {
                SeitenwerkError::Pdf(format!(
                    "page {page_number} not found in {} ({} pages)",
                    self.source,
                    page_map.len()
                ))
            })?;
            import_page(&self.document, target, page_id)?;
        }

        Ok(())
    }
}

// -- Target document scaffolding ----------------------------------------------

/// Create an empty document with a catalog and /Pages tree, ready to
/// receive pages via [`PdfReader::append_pages_into`].
pub fn blank_document() -> Document {
    let mut document = Document::with_version("1.5");

    let pages_id = document.new_object_id();
    document.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Count" => 0,
            "Kids" => Object::Array(Vec::new()),
        }),
    );

    let catalog_id = document.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    document.trailer.set("Root", catalog_id);

    document
}

/// Serialise a finished document to a file.
pub fn write_document(document: &mut Document, path: impl AsRef<Path>) -> Result<()> {
    document.compress();
    document
        .save(path.as_ref())
        .map_err(|err| {
            SeitenwerkError::Pdf(format!(
                "failed to write {}: {err}",
                path.as_ref().display()
            ))
        })?;
    Ok(())
}

// -- Object-graph import ------------------------------------------------------

/// Copy a single page object (and the resources it references) from
/// `source` into `target`, appending it as the last page of the target's
/// /Pages tree.
fn import_page(source: &Document, target: &mut Document, page_id: ObjectId) -> Result<()> {
    let page_object = source
        .get_object(page_id)
        .map_err(|err| SeitenwerkError::Pdf(format!("cannot read page object {page_id:?}: {err}")))?;

    let imported = import_object(source, target, page_object)?;
    let imported_id = target.add_object(imported);

    let pages_id = pages_root(target)?;

    // Register the page under /Kids and bump /Count.
    if let Ok(Object::Dictionary(pages)) = target.get_object_mut(pages_id) {
        if let Ok(Object::Array(kids)) = pages.get_mut(b"Kids") {
            kids.push(Object::Reference(imported_id));
        }
        if let Ok(Object::Integer(count)) = pages.get_mut(b"Count") {
            *count += 1;
        }
    }

    // Re-point the imported page's /Parent at the target's page tree.
    if let Ok(Object::Dictionary(page)) = target.get_object_mut(imported_id) {
        page.set("Parent", Object::Reference(pages_id));
    }

    Ok(())
}

/// Locate the /Pages tree root of `target`.
fn pages_root(target: &Document) -> Result<ObjectId> {
    let catalog = target
        .catalog()
        .map_err(|err| SeitenwerkError::Pdf(format!("target document has no catalog: {err}")))?;

    match catalog.get(b"Pages") {
        Ok(Object::Reference(id)) => Ok(*id),
        Ok(_) => Err(SeitenwerkError::Pdf("/Pages is not a reference".into())),
        Err(err) => Err(SeitenwerkError::Pdf(format!("catalog has no /Pages: {err}"))),
    }
}

/// Recursively copy an object from `source` into `target`, following
/// references so streams, fonts, and images travel with the page. /Parent
/// is deliberately skipped to break the cycle back into the source page
/// tree; `import_page` patches it afterwards.
fn import_object(source: &Document, target: &mut Document, object: &Object) -> Result<Object> {
    match object {
        Object::Dictionary(dict) => Ok(Object::Dictionary(import_dictionary(source, target, dict)?)),
        Object::Array(items) => {
            let mut imported = Vec::with_capacity(items.len());
            for item in items {
                imported.push(import_object(source, target, item)?);
            }
            Ok(Object::Array(imported))
        }
        Object::Reference(ref_id) => match source.get_object(*ref_id) {
            Ok(referenced) => {
                let imported = import_object(source, target, referenced)?;
                let new_id = target.add_object(imported);
                Ok(Object::Reference(new_id))
            }
            Err(err) => {
                warn!(?ref_id, %err, "unresolvable reference replaced with Null");
                Ok(Object::Null)
            }
        },
        Object::Stream(stream) => {
            let dict = import_dictionary(source, target, &stream.dict)?;
            Ok(Object::Stream(lopdf::Stream::new(dict, stream.content.clone())))
        }
        // Booleans, numbers, strings, names, and Null copy verbatim.
        other => Ok(other.clone()),
    }
}

fn import_dictionary(
    source: &Document,
    target: &mut Document,
    dict: &Dictionary,
) -> Result<Dictionary> {
    let mut imported = Dictionary::new();
    for (key, value) in dict.iter() {
        if key == b"Parent" {
            continue;
        }
        imported.set(key.clone(), import_object(source, target, value)?);
    }
    Ok(imported)
}
