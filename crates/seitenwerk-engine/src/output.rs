// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Output-path collision resolution.
//
// Every write goes through one of the resolvers here. Auto-rename appends
// ` (N)` before the extension, picking the smallest N whose name is free,
// so repeated runs produce a deterministic sequence: `file.pptx`,
// `file (1).pptx`, `file (2).pptx`, ...

use std::path::{Path, PathBuf};

use seitenwerk_core::error::{Result, SeitenwerkError};
use seitenwerk_core::types::CollisionPolicy;
use tracing::debug;

/// Outcome of resolving an output path against the collision policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedOutput {
    /// Write to this (possibly renamed) path.
    Write(PathBuf),
    /// The target exists and the policy says to leave it alone.
    Skip,
}

impl ResolvedOutput {
    pub fn into_path(self) -> Option<PathBuf> {
        match self {
            Self::Write(path) => Some(path),
            Self::Skip => None,
        }
    }
}

/// Resolve a single output file path.
pub fn resolve_file(path: &Path, policy: CollisionPolicy) -> ResolvedOutput {
    if !path.exists() {
        return ResolvedOutput::Write(path.to_path_buf());
    }

    match policy {
        CollisionPolicy::Overwrite => ResolvedOutput::Write(path.to_path_buf()),
        CollisionPolicy::Skip => ResolvedOutput::Skip,
        CollisionPolicy::AutoRename => {
            let renamed = next_free_file_name(path);
            debug!(from = %path.display(), to = %renamed.display(), "output auto-renamed");
            ResolvedOutput::Write(renamed)
        }
    }
}

/// Resolve an output directory path (image conversion, split, batch
/// sub-folders). Fails if the path exists but is a plain file.
pub fn resolve_dir(path: &Path, policy: CollisionPolicy) -> Result<ResolvedOutput> {
    if !path.exists() {
        return Ok(ResolvedOutput::Write(path.to_path_buf()));
    }
    if !path.is_dir() {
        return Err(SeitenwerkError::InvalidOption(format!(
            "output directory path is an existing file: {}",
            path.display()
        )));
    }

    Ok(match policy {
        CollisionPolicy::Overwrite => ResolvedOutput::Write(path.to_path_buf()),
        CollisionPolicy::Skip => ResolvedOutput::Skip,
        CollisionPolicy::AutoRename => {
            let renamed = next_free_dir_name(path);
            debug!(from = %path.display(), to = %renamed.display(), "output directory auto-renamed");
            ResolvedOutput::Write(renamed)
        }
    })
}

/// Suffix note for job messages when auto-rename moved the output.
pub fn output_note(requested: &Path, resolved: &Path) -> String {
    if requested == resolved {
        String::new()
    } else {
        format!(" Saved as: {}", resolved.display())
    }
}

fn next_free_file_name(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = path.extension().map(|e| e.to_string_lossy().into_owned());
    let parent = path.parent().unwrap_or_else(|| Path::new(""));

    for suffix in 1u32.. {
        let name = match &extension {
            Some(ext) => format!("{stem} ({suffix}).{ext}"),
            None => format!("{stem} ({suffix})"),
        };
        let candidate = parent.join(name);
        if !candidate.exists() {
            return candidate;
        }
    }
    unreachable!("u32 suffix space exhausted");
}

fn next_free_dir_name(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let parent = path.parent().unwrap_or_else(|| Path::new(""));

    for suffix in 1u32.. {
        let candidate = parent.join(format!("{name} ({suffix})"));
        if !candidate.exists() {
            return candidate;
        }
    }
    unreachable!("u32 suffix space exhausted");
}
