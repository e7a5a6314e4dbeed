// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page range expression parsing.
//
// Grammar: comma-separated tokens, each either a single page number or an
// inclusive `start-end` range. Whitespace around tokens is ignored. Page
// numbers are 1-based; an empty expression selects every page.

use std::collections::BTreeSet;

use crate::error::{Result, SeitenwerkError};

/// Parse a page range expression like `1-3,5,8-10` into the exact sorted
/// set of selected 1-based page indices.
///
/// An empty (or all-whitespace) expression selects all `total_pages` pages.
/// Tokens referencing pages outside `1..=total_pages`, malformed tokens,
/// and reversed ranges are rejected.
pub fn parse_page_range(expression: &str, total_pages: u32) -> Result<Vec<u32>> {
    if total_pages == 0 {
        return Ok(Vec::new());
    }

    if expression.trim().is_empty() {
        return Ok((1..=total_pages).collect());
    }

    let mut selected = BTreeSet::new();

    for token in expression.split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }

        match token.split_once('-') {
            Some((start, end)) => {
                let start = parse_page_number(start.trim(), token)?;
                let end = parse_page_number(end.trim(), token)?;
                if start > end {
                    return Err(SeitenwerkError::PageRange(format!(
                        "range start must not exceed end: {token}"
                    )));
                }
                check_bounds(start, total_pages, token)?;
                check_bounds(end, total_pages, token)?;
                selected.extend(start..=end);
            }
            None => {
                let page = parse_page_number(token, token)?;
                check_bounds(page, total_pages, token)?;
                selected.insert(page);
            }
        }
    }

    if selected.is_empty() {
        return Err(SeitenwerkError::PageRange(
            "expression selects no pages".into(),
        ));
    }

    Ok(selected.into_iter().collect())
}

fn parse_page_number(text: &str, token: &str) -> Result<u32> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(SeitenwerkError::PageRange(format!(
            "invalid page token: {token}"
        )));
    }
    text.parse::<u32>()
        .map_err(|_| SeitenwerkError::PageRange(format!("invalid page token: {token}")))
}

fn check_bounds(page: u32, total_pages: u32, token: &str) -> Result<()> {
    if page == 0 || page > total_pages {
        return Err(SeitenwerkError::PageRange(format!(
            "page out of bounds in `{token}` (valid: 1-{total_pages})"
        )));
    }
    Ok(())
}
