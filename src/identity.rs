//! Content identity and the first-seen index used for duplicate detection.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::fingerprint::Fingerprint;

/// `(fingerprint, size)`. Two files are content-identical iff their
/// identities are equal; size stays in the key as an extra collision guard.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity {
    pub fingerprint: Fingerprint,
    pub size: u64,
}

impl Identity {
    pub fn new(fingerprint: Fingerprint, size: u64) -> Self {
        Self { fingerprint, size }
    }
}

/// Outcome of [`IdentityIndex::classify`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// First file seen with this identity. Kept.
    Original,
    /// Another file already holds this identity.
    Duplicate { original: PathBuf },
}

/// Maps each identity to the first path observed with it.
///
/// The index only grows. It is not synchronized; concurrent callers must
/// serialize access so that check-then-insert stays atomic.
#[derive(Debug, Default)]
pub struct IdentityIndex {
    entries: HashMap<Identity, PathBuf>,
}

impl IdentityIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(&self, identity: &Identity) -> Option<&Path> {
        self.entries.get(identity).map(PathBuf::as_path)
    }

    /// Record `path` as the survivor for `identity` unless one already
    /// exists. Returns `false` and leaves the index untouched otherwise.
    pub fn insert(&mut self, identity: Identity, path: PathBuf) -> bool {
        if self.entries.contains_key(&identity) {
            return false;
        }
        self.entries.insert(identity, path);
        true
    }

    /// Look up `identity` and record `path` if it is new, in one step.
    pub fn classify(&mut self, identity: Identity, path: &Path) -> Classification {
        if let Some(original) = self.lookup(&identity) {
            return Classification::Duplicate {
                original: original.to_path_buf(),
            };
        }
        self.entries.insert(identity, path.to_path_buf());
        Classification::Original
    }

    /// Number of distinct identities seen.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
