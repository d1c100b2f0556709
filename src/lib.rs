//! Tools for recovered file collections: checksum manifests, verification
//! against them, and duplicate removal by content identity.
//!
//! The command-line front end lives in `src/main.rs`.

pub mod actions;
pub mod config;
pub mod error;
pub mod fingerprint;
pub mod identity;
pub mod logging;
pub mod manifest;
pub mod scanner;
pub mod session_log;
pub mod utils;
pub mod verify;
pub mod walker;

pub use actions::{delete_file, DeleteOutcome};
pub use config::{Config, Mode};
pub use error::{ConfigError, HashError, ManifestError, ScanError, VerifyError};
pub use fingerprint::{fingerprint_file, Algorithm, Fingerprint};
pub use identity::{Classification, Identity, IdentityIndex};
pub use manifest::{Manifest, ManifestEntry, MANIFEST_FILE_NAME};
pub use scanner::{DedupMode, ScanConfig, ScanReport, Scanner};
pub use verify::{verify_directory, EntryStatus, VerifyReport};
pub use walker::{FileRecord, WalkFilter};
