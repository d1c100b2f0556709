//! Append-only session log.
//!
//! Writes are best effort: a line that cannot be appended is reported as a
//! warning and the caller carries on.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::Local;

#[derive(Debug, Clone)]
pub struct SessionLog {
    path: PathBuf,
}

impl SessionLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `msg` with a timestamp. Returns whether the write succeeded.
    pub fn record(&self, msg: &str) -> bool {
        match self.append(msg) {
            Ok(()) => true,
            Err(e) => {
                log::warn!(
                    "Error writing this event to log {}: {} ({})",
                    self.path.display(),
                    msg,
                    e
                );
                false
            }
        }
    }

    fn append(&self, msg: &str) -> io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{} : {}", timestamp(), msg)
    }
}

fn timestamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}
