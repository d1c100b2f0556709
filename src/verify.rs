//! Verification of a directory against its checksum manifest.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::VerifyError;
use crate::fingerprint::fingerprint_file;
use crate::manifest::{manifest_path, Manifest, MANIFEST_ALGORITHM};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum EntryStatus {
    Matched,
    ContentDiffers,
    NotFound,
    /// The file exists but could not be hashed.
    Unreadable(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct EntryResult {
    pub filename: String,
    pub path: PathBuf,
    pub status: EntryStatus,
}

/// Per-entry outcome of one verification run, in manifest order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct VerifyReport {
    pub results: Vec<EntryResult>,
}

impl VerifyReport {
    pub fn matched(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.status == EntryStatus::Matched)
            .count()
    }

    pub fn total(&self) -> usize {
        self.results.len()
    }

    /// Entries that did not match, in manifest order.
    pub fn mismatches(&self) -> impl Iterator<Item = &EntryResult> {
        self.results
            .iter()
            .filter(|r| r.status != EntryStatus::Matched)
    }

    pub fn all_matched(&self) -> bool {
        self.matched() == self.total()
    }
}

/// Re-hash every file listed in `dir`'s manifest and compare.
///
/// Files in `dir` that the manifest does not list are ignored.
pub fn verify_directory(dir: &Path) -> Result<VerifyReport, VerifyError> {
    let manifest_file = manifest_path(dir);
    if !manifest_file.is_file() {
        return Err(VerifyError::ManifestMissing(manifest_file));
    }

    let manifest = Manifest::read(dir)?;
    log::debug!(
        "Verifying {} entries from {}",
        manifest.len(),
        manifest_file.display()
    );

    let results = manifest
        .entries
        .into_iter()
        .map(|entry| {
            let path = dir.join(&entry.filename);
            let status = check_entry(&path, &entry.checksum);
            EntryResult {
                filename: entry.filename,
                path,
                status,
            }
        })
        .collect();

    Ok(VerifyReport { results })
}

fn check_entry(path: &Path, recorded: &str) -> EntryStatus {
    if !path.exists() {
        return EntryStatus::NotFound;
    }

    match fingerprint_file(path, MANIFEST_ALGORITHM) {
        Ok(fingerprint) if fingerprint.to_hex() == recorded => EntryStatus::Matched,
        Ok(_) => EntryStatus::ContentDiffers,
        Err(e) => {
            log::warn!("{}", e);
            EntryStatus::Unreadable(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ManifestError;
    use std::fs;
    use tempfile::{tempdir, TempDir};

    fn manifested_dir() -> TempDir {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), b"hello").unwrap();
        fs::write(dir.path().join("b.txt"), b"hello").unwrap();
        fs::write(dir.path().join("c.txt"), b"world").unwrap();
        Manifest::generate(dir.path())
            .unwrap()
            .write(dir.path())
            .unwrap();
        dir
    }

    #[test]
    fn unmodified_directory_fully_matches() {
        let dir = manifested_dir();
        let report = verify_directory(dir.path()).unwrap();
        assert_eq!(report.total(), 3);
        assert_eq!(report.matched(), 3);
        assert!(report.all_matched());
        assert_eq!(report.mismatches().count(), 0);
    }

    #[test]
    fn single_byte_corruption_is_detected() {
        let dir = manifested_dir();
        fs::write(dir.path().join("c.txt"), b"worle").unwrap();

        let report = verify_directory(dir.path()).unwrap();
        assert_eq!(report.matched(), 2);
        let mismatches: Vec<_> = report.mismatches().collect();
        assert_eq!(mismatches.len(), 1);
        assert_eq!(mismatches[0].filename, "c.txt");
        assert_eq!(mismatches[0].status, EntryStatus::ContentDiffers);
    }

    #[test]
    fn deleted_file_is_not_found() {
        let dir = manifested_dir();
        fs::remove_file(dir.path().join("a.txt")).unwrap();

        let report = verify_directory(dir.path()).unwrap();
        assert_eq!(report.matched(), 2);
        assert_eq!(report.total(), 3);
        let missing = report.mismatches().next().unwrap();
        assert_eq!(missing.filename, "a.txt");
        assert_eq!(missing.status, EntryStatus::NotFound);
    }

    #[test]
    fn untracked_files_are_ignored() {
        let dir = manifested_dir();
        fs::write(dir.path().join("new.txt"), b"new").unwrap();

        let report = verify_directory(dir.path()).unwrap();
        assert_eq!(report.total(), 3);
        assert!(report.all_matched());
    }

    #[test]
    fn missing_manifest_is_fatal() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), b"hello").unwrap();
        assert!(matches!(
            verify_directory(dir.path()),
            Err(VerifyError::ManifestMissing(_))
        ));
    }

    #[test]
    fn uppercase_recorded_checksum_still_matches() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), b"hello").unwrap();
        fs::write(
            manifest_path(dir.path()),
            "a.txt, 5D41402ABC4B2A76B9719D911017C592\n",
        )
        .unwrap();

        assert!(verify_directory(dir.path()).unwrap().all_matched());
    }

    #[test]
    fn unreadable_entry_is_reported_and_verification_continues() {
        let dir = manifested_dir();
        fs::remove_file(dir.path().join("b.txt")).unwrap();
        fs::create_dir(dir.path().join("b.txt")).unwrap();

        let report = verify_directory(dir.path()).unwrap();
        assert_eq!(report.total(), 3);
        assert_eq!(report.matched(), 2);
        let bad = report.mismatches().next().unwrap();
        assert_eq!(bad.filename, "b.txt");
        assert!(matches!(bad.status, EntryStatus::Unreadable(_)));
    }

    #[test]
    fn entries_pointing_outside_the_directory_are_rejected() {
        let outside = tempdir().unwrap();
        let secret = outside.path().join("secret.txt");
        fs::write(&secret, b"hello").unwrap();

        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("inner")).unwrap();
        let inner = dir.path().join("inner");
        fs::write(inner.join("../sibling.txt"), b"hello").unwrap();

        for (target, line) in [
            (dir.path(), format!("{}, 5d41402abc4b2a76b9719d911017c592\n", secret.display())),
            (inner.as_path(), "../sibling.txt, 5d41402abc4b2a76b9719d911017c592\n".to_string()),
        ] {
            fs::write(manifest_path(target), line).unwrap();
            assert!(matches!(
                verify_directory(target),
                Err(VerifyError::Manifest(ManifestError::Malformed { .. }))
            ));
        }
    }

    #[test]
    fn empty_manifest_verifies_trivially() {
        let dir = tempdir().unwrap();
        Manifest::default().write(dir.path()).unwrap();
        let report = verify_directory(dir.path()).unwrap();
        assert_eq!(report.total(), 0);
        assert!(report.all_matched());
    }
}
