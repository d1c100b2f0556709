//! Recursive file enumeration with size and extension filters.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Serialize;
use walkdir::WalkDir;

/// A file found by the walker. `size` is read once here and treated as
/// fixed for the rest of the pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRecord {
    pub path: PathBuf,
    pub size: u64,
}

/// Which files the walker yields.
#[derive(Debug, Clone, Default)]
pub struct WalkFilter {
    /// Files smaller than this are skipped.
    pub min_size: u64,
    /// Lowercase extensions without the dot. Empty means every type.
    pub file_types: HashSet<String>,
}

impl WalkFilter {
    fn accepts(&self, path: &Path, size: u64) -> bool {
        if size < self.min_size {
            return false;
        }

        if self.file_types.is_empty() {
            return true;
        }

        match path.extension() {
            Some(ext) => self
                .file_types
                .contains(&ext.to_string_lossy().to_lowercase()),
            None => false,
        }
    }
}

/// Walk each root in order and collect the regular files that pass `filter`.
///
/// Symlinks are not followed. Entries that cannot be read are logged and
/// skipped.
pub fn collect_files(roots: &[PathBuf], filter: &WalkFilter) -> Vec<FileRecord> {
    let mut files = Vec::new();

    for root in roots {
        for entry in WalkDir::new(root).follow_links(false) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    log::warn!("Skipping unreadable entry under {}: {}", root.display(), e);
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let size = match entry.metadata() {
                Ok(metadata) => metadata.len(),
                Err(e) => {
                    log::warn!("Failed to get metadata for {}: {}", entry.path().display(), e);
                    continue;
                }
            };

            if filter.accepts(entry.path(), size) {
                files.push(FileRecord {
                    path: entry.into_path(),
                    size,
                });
            }
        }
    }

    log::debug!("{} files found matching criteria", files.len());
    files
}
