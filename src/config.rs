//! Typed run configuration shared by every subcommand.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::scanner::DedupMode;

/// Operating mode recognized on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Report what would happen without touching the filesystem
    Test,
    /// Copy matching files
    Copy,
    /// Move matching files
    Move,
    /// Delete duplicate files
    Remove,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Mode::Test => "test",
            Mode::Copy => "copy",
            Mode::Move => "move",
            Mode::Remove => "remove",
        };
        f.write_str(name)
    }
}

/// Every option the tools recognize. Commands read only the fields they use.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub target_path: Option<PathBuf>,
    pub mode: Option<Mode>,
    pub source_paths: Vec<PathBuf>,
    pub file_types: HashSet<String>,
    pub min_size: u64,
}

impl Config {
    /// The target directory, which must exist.
    pub fn target_dir(&self) -> Result<&Path, ConfigError> {
        let path = self
            .target_path
            .as_deref()
            .ok_or(ConfigError::MissingPath("target"))?;
        validate_dir("target", path)?;
        Ok(path)
    }

    /// All source directories, each of which must exist. At least one is required.
    pub fn source_dirs(&self) -> Result<&[PathBuf], ConfigError> {
        if self.source_paths.is_empty() {
            return Err(ConfigError::MissingPath("source"));
        }
        for path in &self.source_paths {
            validate_dir("source", path)?;
        }
        Ok(&self.source_paths)
    }

    /// Map the configured mode onto the duplicate scanner's modes.
    pub fn dedup_mode(&self) -> Result<DedupMode, ConfigError> {
        match self.mode.ok_or(ConfigError::MissingMode)? {
            Mode::Test => Ok(DedupMode::Test),
            Mode::Remove => Ok(DedupMode::Remove),
            mode => Err(ConfigError::UnsupportedMode {
                mode,
                command: "dedup",
            }),
        }
    }

    /// Extensions normalized to lowercase without a leading dot.
    pub fn normalized_file_types(&self) -> HashSet<String> {
        normalize_extensions(self.file_types.iter().map(String::as_str))
    }
}

/// Fail unless `path` is an existing directory.
pub fn validate_dir(role: &'static str, path: &Path) -> Result<(), ConfigError> {
    if path.is_dir() {
        Ok(())
    } else {
        Err(ConfigError::InvalidPath {
            role,
            path: path.to_path_buf(),
        })
    }
}

pub fn normalize_extensions<'a>(extensions: impl IntoIterator<Item = &'a str>) -> HashSet<String> {
    extensions
        .into_iter()
        .map(|ext| ext.trim().trim_start_matches('.').to_lowercase())
        .filter(|ext| !ext.is_empty())
        .collect()
}
