use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use serde::Serialize;

/// Result of a best-effort delete. Deletion failures never abort a scan;
/// they are reported through this value and otherwise ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum DeleteOutcome {
    Deleted,
    /// The file was already gone.
    NotFound,
    PermissionDenied,
    /// Any other I/O failure, with the error text.
    Failed(String),
}

impl DeleteOutcome {
    pub fn is_deleted(&self) -> bool {
        matches!(self, DeleteOutcome::Deleted)
    }
}

impl fmt::Display for DeleteOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeleteOutcome::Deleted => write!(f, "deleted"),
            DeleteOutcome::NotFound => write!(f, "not found"),
            DeleteOutcome::PermissionDenied => write!(f, "permission denied"),
            DeleteOutcome::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

/// Delete a file, swallowing any failure into the returned outcome.
pub fn delete_file(path: &Path) -> DeleteOutcome {
    match fs::remove_file(path) {
        Ok(()) => {
            log::debug!("Deleted: {}", path.display());
            DeleteOutcome::Deleted
        }
        Err(e) => {
            let outcome = match e.kind() {
                io::ErrorKind::NotFound => DeleteOutcome::NotFound,
                io::ErrorKind::PermissionDenied => DeleteOutcome::PermissionDenied,
                _ => DeleteOutcome::Failed(e.to_string()),
            };
            log::warn!("Could not delete {}: {}", path.display(), outcome);
            outcome
        }
    }
}
