//! File discovery: walk a base directory and keep the files whose path matches
//! a [`Pattern`].
//!
//! Entries are visited depth-first. Within one directory, files come before
//! subdirectories and both are sorted by name, so a run over the same tree always
//! produces the same order. Symlinks are not followed; a symlink is a candidate
//! like any other non-directory entry.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use crate::error::{ApplyError, ApplyResult};
use crate::pattern::Pattern;

/// Return every non-directory path below `base_dir` whose path matches `pattern`.
///
/// Paths are reported relative to the invocation directory the same way they
/// were reached, with a leading `./` removed (`.` walks yield `a/x.yaml`, not
/// `./a/x.yaml`), and matched in that form.
///
/// Any traversal failure aborts the walk; partial results are dropped.
pub fn locate(base_dir: &Path, pattern: &Pattern) -> ApplyResult<Vec<PathBuf>> {
    tracing::info!(base_dir = %base_dir.display(), pattern = %pattern, "Locating files");

    let mut paths = Vec::new();
    for entry in WalkDir::new(base_dir)
        .follow_links(false)
        .sort_by(files_first_then_name)
    {
        let entry = entry.map_err(|source| {
            let path = source
                .path()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| base_dir.to_path_buf());
            tracing::error!(path = %path.display(), error = %source, "Directory walk failed");
            ApplyError::Walk { path, source }
        })?;

        if entry.file_type().is_dir() {
            continue;
        }

        let path = strip_current_dir(entry.path());
        if pattern.is_match(&path) {
            tracing::debug!(path = %path.display(), "Matched");
            paths.push(path);
        } else {
            tracing::trace!(path = %path.display(), "Skipped, no match");
        }
    }

    tracing::info!(matched = paths.len(), "Located files");
    Ok(paths)
}

fn files_first_then_name(a: &DirEntry, b: &DirEntry) -> Ordering {
    a.file_type()
        .is_dir()
        .cmp(&b.file_type().is_dir())
        .then_with(|| a.file_name().cmp(b.file_name()))
}

fn strip_current_dir(path: &Path) -> PathBuf {
    path.strip_prefix(".")
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| path.to_path_buf())
}
