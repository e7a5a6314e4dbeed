// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// End-to-end merge and split over real (synthetic) PDF files. These
// operations run entirely on the structural backend, so they are exercised
// here without a rendering engine.

use std::path::{Path, PathBuf};

use lopdf::{Document, Object, Stream, dictionary};
use seitenwerk_core::types::{CancelToken, CollisionPolicy, ConversionSettings};
use seitenwerk_document::PdfReader;
use seitenwerk_engine::{merge, split};

/// Build a minimal n-page PDF on disk and return its path.
fn sample_pdf(dir: &Path, name: &str, pages: usize) -> PathBuf {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => Object::Reference(font_id) },
    });

    let mut kids = Vec::new();
    for index in 0..pages {
        let marker = format!("BT /F1 24 Tf (page {}) Tj ET", index + 1);
        let content_id = doc.add_object(Object::Stream(Stream::new(
            dictionary! {},
            marker.into_bytes(),
        )));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => Object::Reference(pages_id),
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => Object::Reference(content_id),
            "Resources" => Object::Reference(resources_id),
        });
        kids.push(Object::Reference(page_id));
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Count" => pages as i64,
            "Kids" => kids,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    doc.trailer.set("Root", catalog_id);

    let path = dir.join(name);
    doc.save(&path).expect("write sample pdf");
    path
}

fn no_progress() -> impl FnMut(u8) {
    |_percent| {}
}

#[test]
fn merge_concatenates_pages_in_input_order() {
    let dir = tempfile::tempdir().expect("tempdir");
    let first = sample_pdf(dir.path(), "a.pdf", 2);
    let second = sample_pdf(dir.path(), "b.pdf", 3);
    let output = dir.path().join("merged.pdf");

    let mut progress = no_progress();
    let report = merge::merge_pdfs(
        &[first, second],
        &output,
        &ConversionSettings::default(),
        &CancelToken::new(),
        &mut progress,
    )
    .expect("merge");

    assert!(report.message.contains("Merge successful"));
    let merged = PdfReader::open(&output, None).expect("reopen merged");
    assert_eq!(merged.page_count(), 5);
}

#[test]
fn merge_auto_renames_when_output_exists() {
    let dir = tempfile::tempdir().expect("tempdir");
    let first = sample_pdf(dir.path(), "a.pdf", 1);
    let second = sample_pdf(dir.path(), "b.pdf", 1);
    let output = dir.path().join("merged.pdf");
    std::fs::write(&output, b"already here").expect("seed");

    let settings = ConversionSettings {
        collision: CollisionPolicy::AutoRename,
        ..Default::default()
    };
    let mut progress = no_progress();
    let report = merge::merge_pdfs(
        &[first, second],
        &output,
        &settings,
        &CancelToken::new(),
        &mut progress,
    )
    .expect("merge");

    let renamed = dir.path().join("merged (1).pdf");
    assert!(renamed.exists(), "{}", report.message);
    assert!(report.message.contains("merged (1).pdf"));
    // The original file is untouched.
    assert_eq!(std::fs::read(&output).expect("read"), b"already here");
    assert_eq!(PdfReader::open(&renamed, None).expect("reopen").page_count(), 2);
}

#[test]
fn split_writes_one_file_per_selected_page() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = sample_pdf(dir.path(), "report.pdf", 5);
    let out_dir = dir.path().join("pages");

    let settings = ConversionSettings {
        page_range: "2-3,5".into(),
        ..Default::default()
    };
    let mut seen = Vec::new();
    let mut progress = |percent: u8| seen.push(percent);
    let report = split::split_pdf(&input, &out_dir, &settings, &CancelToken::new(), &mut progress)
        .expect("split");

    assert_eq!(report.message, "Created 3 split PDF files.");
    for name in ["report_p002.pdf", "report_p003.pdf", "report_p005.pdf"] {
        let page = out_dir.join(name);
        assert!(page.exists(), "missing {name}");
        assert_eq!(PdfReader::open(&page, None).expect("reopen").page_count(), 1);
    }
    assert!(!out_dir.join("report_p001.pdf").exists());
    assert_eq!(seen.last().copied(), Some(100));
}

#[test]
fn split_skip_policy_leaves_existing_outputs_alone() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = sample_pdf(dir.path(), "report.pdf", 2);
    let out_dir = dir.path().join("pages");

    let settings = ConversionSettings {
        collision: CollisionPolicy::Skip,
        ..Default::default()
    };
    let mut progress = no_progress();
    split::split_pdf(&input, &out_dir, &settings, &CancelToken::new(), &mut progress)
        .expect("first run");

    let mut progress = no_progress();
    let report = split::split_pdf(&input, &out_dir, &settings, &CancelToken::new(), &mut progress)
        .expect("second run");
    assert!(report.skipped);
    assert!(report.message.contains("skipped"));
}

#[test]
fn cancelled_split_stops_before_writing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = sample_pdf(dir.path(), "report.pdf", 2);
    let out_dir = dir.path().join("pages");

    let cancel = CancelToken::new();
    cancel.cancel();
    let mut progress = no_progress();
    let result = split::split_pdf(
        &input,
        &out_dir,
        &ConversionSettings::default(),
        &cancel,
        &mut progress,
    );

    assert!(result.is_err());
    assert!(!out_dir.join("report_p001.pdf").exists());
}
