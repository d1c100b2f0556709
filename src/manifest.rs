//! Checksum manifests.
//!
//! A manifest lists every regular file directly inside one directory with
//! its MD5 checksum, one `<filename>, <hex>` line per file, and lives in that
//! same directory under [`MANIFEST_FILE_NAME`].

use std::fs;
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};

use serde::Serialize;

use crate::error::{HashError, ManifestError};
use crate::fingerprint::{fingerprint_file, Algorithm};

pub const MANIFEST_FILE_NAME: &str = "checkSum.txt";

/// Algorithm used for every manifest checksum.
pub const MANIFEST_ALGORITHM: Algorithm = Algorithm::Md5;

const SEPARATOR: &str = ", ";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestEntry {
    /// Name relative to the manifest's directory.
    pub filename: String,
    /// Lowercase hex checksum.
    pub checksum: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Manifest {
    pub entries: Vec<ManifestEntry>,
}

/// Location of the manifest for `dir`.
pub fn manifest_path(dir: &Path) -> PathBuf {
    dir.join(MANIFEST_FILE_NAME)
}

impl Manifest {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Checksum every regular file directly inside `dir`, excluding the
    /// manifest itself. Not recursive. Entries are sorted by filename.
    ///
    /// Files that cannot be hashed are left out; see
    /// [`generate_with_skipped`](Self::generate_with_skipped) to get them.
    pub fn generate(dir: &Path) -> Result<Self, ManifestError> {
        Self::generate_with_skipped(dir).map(|(manifest, _)| manifest)
    }

    /// Like [`generate`](Self::generate), also returning the files that could
    /// not be hashed.
    pub fn generate_with_skipped(dir: &Path) -> Result<(Self, Vec<HashError>), ManifestError> {
        let read_dir = fs::read_dir(dir).map_err(|source| ManifestError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut entries = Vec::new();
        let mut skipped = Vec::new();
        for dir_entry in read_dir {
            let dir_entry = dir_entry.map_err(|source| ManifestError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
            let path = dir_entry.path();
            if !path.is_file() {
                continue;
            }

            let filename = match dir_entry.file_name().into_string() {
                Ok(name) => name,
                Err(raw) => {
                    log::warn!("Skipping non UTF-8 filename {:?}", raw);
                    continue;
                }
            };
            if filename == MANIFEST_FILE_NAME {
                continue;
            }
            if filename.contains(['\n', '\r']) {
                log::warn!("Skipping filename with a line break {:?}", filename);
                continue;
            }

            let checksum = match fingerprint_file(&path, MANIFEST_ALGORITHM) {
                Ok(fingerprint) => fingerprint.to_hex(),
                Err(e) => {
                    log::warn!("Skipping {}", e);
                    skipped.push(e);
                    continue;
                }
            };
            log::debug!("{}{}{}", filename, SEPARATOR, checksum);
            entries.push(ManifestEntry { filename, checksum });
        }

        entries.sort_by(|a, b| a.filename.cmp(&b.filename));
        Ok((Self { entries }, skipped))
    }

    /// Parse manifest text. Blank lines are skipped, a leading BOM and CRLF
    /// line endings are tolerated, and each line splits at its last `", "`.
    /// A filename that is absolute, `..`, or contains a path separator makes
    /// the line malformed.
    pub fn parse(text: &str) -> Result<Self, ManifestError> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let mut entries = Vec::new();

        for (index, line) in text.lines().enumerate() {
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() {
                continue;
            }

            let (filename, checksum) =
                line.rsplit_once(SEPARATOR)
                    .ok_or_else(|| ManifestError::Malformed {
                        line: index + 1,
                        content: line.to_string(),
                    })?;

            let checksum = checksum.trim();
            if !is_plain_filename(filename) || checksum.is_empty() {
                return Err(ManifestError::Malformed {
                    line: index + 1,
                    content: line.to_string(),
                });
            }

            entries.push(ManifestEntry {
                filename: filename.to_string(),
                checksum: checksum.to_lowercase(),
            });
        }

        Ok(Self { entries })
    }

    /// Render in the on-disk format.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            out.push_str(&entry.filename);
            out.push_str(SEPARATOR);
            out.push_str(&entry.checksum);
            out.push('\n');
        }
        out
    }

    /// Read and parse the manifest stored in `dir`.
    pub fn read(dir: &Path) -> Result<Self, ManifestError> {
        let path = manifest_path(dir);
        let text = fs::read_to_string(&path).map_err(|source| ManifestError::Io {
            path: path.clone(),
            source,
        })?;
        Self::parse(&text)
    }

    /// Write the manifest into `dir`, replacing any previous one.
    pub fn write(&self, dir: &Path) -> Result<PathBuf, ManifestError> {
        let path = manifest_path(dir);
        let io_err = |source: io::Error| ManifestError::Io {
            path: path.clone(),
            source,
        };

        let mut file = fs::File::create(&path).map_err(io_err)?;
        file.write_all(self.render().as_bytes()).map_err(io_err)?;
        file.sync_all().map_err(io_err)?;
        Ok(path)
    }
}

/// A single normal path component, so joining it to the manifest's
/// directory stays inside that directory.
fn is_plain_filename(name: &str) -> bool {
    if name.is_empty() || name.contains('/') {
        return false;
    }
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}
