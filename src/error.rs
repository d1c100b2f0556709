//! Error types for the library.
//!
//! Each fallible area gets its own enum so callers can tell a fatal
//! configuration problem apart from a per-file failure that a scan is
//! expected to survive.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::Mode;

/// Failure while streaming a file through a hash accumulator.
#[derive(Debug, Error)]
pub enum HashError {
    #[error("failed to open {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl HashError {
    /// Path of the file that could not be hashed.
    pub fn path(&self) -> &Path {
        match self {
            Self::Open { path, .. } | Self::Read { path, .. } => path,
        }
    }

    /// Underlying I/O error kind.
    pub fn kind(&self) -> io::ErrorKind {
        match self {
            Self::Open { source, .. } | Self::Read { source, .. } => source.kind(),
        }
    }
}

/// Failure while reading, parsing, listing or writing a manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("I/O error for {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed manifest line {line}: {content:?}")]
    Malformed { line: usize, content: String },
}

/// Fatal verification failures. Per-file problems are reported in the
/// [`VerifyReport`](crate::verify::VerifyReport) instead.
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("Manifest {} not found!", .0.display())]
    ManifestMissing(PathBuf),

    #[error(transparent)]
    Manifest(#[from] ManifestError),
}

/// Invalid or incomplete configuration, detected before any work starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("No {0} path was specified")]
    MissingPath(&'static str),

    #[error("{} path <{}> is not valid!", capitalize(.role), .path.display())]
    InvalidPath { role: &'static str, path: PathBuf },

    #[error("Mode was not specified")]
    MissingMode,

    #[error("Mode '{mode}' is not supported by {command}")]
    UnsupportedMode { mode: Mode, command: &'static str },
}

/// Fatal duplicate scan failures.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_path_message_names_the_role() {
        let err = ConfigError::InvalidPath {
            role: "target",
            path: PathBuf::from("/no/such/dir"),
        };
        assert_eq!(err.to_string(), "Target path </no/such/dir> is not valid!");
    }

    #[test]
    fn hash_error_exposes_path_and_kind() {
        let err = HashError::Open {
            path: PathBuf::from("gone.bin"),
            source: io::Error::from(io::ErrorKind::NotFound),
        };
        assert_eq!(err.path(), Path::new("gone.bin"));
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn unsupported_mode_message() {
        let err = ConfigError::UnsupportedMode {
            mode: Mode::Copy,
            command: "dedup",
        };
        assert_eq!(err.to_string(), "Mode 'copy' is not supported by dedup");
    }
}
