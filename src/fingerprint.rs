//! Content fingerprints.
//!
//! Files are streamed through a hash accumulator in fixed-size chunks so
//! memory use stays bounded no matter how large the file is. Two algorithms
//! are kept apart on purpose: MD5 for checksum manifests, which must match
//! the digests already recorded in existing `checkSum.txt` files, and BLAKE3
//! for duplicate detection.

use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use md5::{Digest, Md5};
use serde::Serialize;

use crate::error::HashError;

/// Read buffer size for streaming hashes.
pub const CHUNK_SIZE: usize = 8192;

/// Digest algorithm used to produce a [`Fingerprint`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    /// Manifest checksums.
    Md5,
    /// Duplicate detection.
    Blake3,
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Algorithm::Md5 => write!(f, "md5"),
            Algorithm::Blake3 => write!(f, "blake3"),
        }
    }
}

/// Digest of a file's full byte content. Only ever compared for equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    algorithm: Algorithm,
    bytes: Vec<u8>,
}

impl Fingerprint {
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Lowercase hexadecimal rendering, as written to manifests.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

enum Accumulator {
    Md5(Md5),
    Blake3(Box<blake3::Hasher>),
}

impl Accumulator {
    fn new(algorithm: Algorithm) -> Self {
        match algorithm {
            Algorithm::Md5 => Accumulator::Md5(Md5::new()),
            Algorithm::Blake3 => Accumulator::Blake3(Box::new(blake3::Hasher::new())),
        }
    }

    fn update(&mut self, chunk: &[u8]) {
        match self {
            Accumulator::Md5(hasher) => hasher.update(chunk),
            Accumulator::Blake3(hasher) => {
                hasher.update(chunk);
            }
        }
    }

    fn finish(self) -> Fingerprint {
        match self {
            Accumulator::Md5(hasher) => Fingerprint {
                algorithm: Algorithm::Md5,
                bytes: hasher.finalize().to_vec(),
            },
            Accumulator::Blake3(hasher) => Fingerprint {
                algorithm: Algorithm::Blake3,
                bytes: hasher.finalize().as_bytes().to_vec(),
            },
        }
    }
}

/// Hash a file's full content with the given algorithm.
pub fn fingerprint_file(path: &Path, algorithm: Algorithm) -> Result<Fingerprint, HashError> {
    let mut file = File::open(path).map_err(|source| HashError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    let mut accumulator = Accumulator::new(algorithm);
    let mut buffer = vec![0; CHUNK_SIZE];

    loop {
        let bytes_read = file.read(&mut buffer).map_err(|source| HashError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        if bytes_read == 0 {
            break;
        }

        accumulator.update(&buffer[..bytes_read]);
    }

    Ok(accumulator.finish())
}

/// Hash an in-memory buffer.
pub fn fingerprint_bytes(data: &[u8], algorithm: Algorithm) -> Fingerprint {
    let mut accumulator = Accumulator::new(algorithm);
    accumulator.update(data);
    accumulator.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn md5_matches_known_digest() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("hello.txt");
        fs::write(&path, b"hello").unwrap();

        let fingerprint = fingerprint_file(&path, Algorithm::Md5).unwrap();
        assert_eq!(fingerprint.to_hex(), "5d41402abc4b2a76b9719d911017c592");
        assert_eq!(fingerprint.algorithm(), Algorithm::Md5);
    }

    #[test]
    fn empty_file_md5() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty");
        fs::write(&path, b"").unwrap();

        let fingerprint = fingerprint_file(&path, Algorithm::Md5).unwrap();
        assert_eq!(fingerprint.to_hex(), "d41d8cd98f00b204e9800998ecf8427e");
    }

    #[test]
    fn blake3_matches_reference_hash() {
        let fingerprint = fingerprint_bytes(b"hello", Algorithm::Blake3);
        assert_eq!(fingerprint.as_bytes(), blake3::hash(b"hello").as_bytes());
        assert_eq!(fingerprint.to_hex().len(), 64);
    }

    #[test]
    fn identical_content_at_different_paths_hashes_equal() {
        let dir = tempdir().unwrap();
        let first = dir.path().join("first.bin");
        let second = dir.path().join("nested").join("second.bin");
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(&first, b"same bytes").unwrap();
        fs::write(&second, b"same bytes").unwrap();

        for algorithm in [Algorithm::Md5, Algorithm::Blake3] {
            let a = fingerprint_file(&first, algorithm).unwrap();
            let b = fingerprint_file(&second, algorithm).unwrap();
            assert_eq!(a, b);
            assert_eq!(a, fingerprint_file(&first, algorithm).unwrap());
        }
    }

    #[test]
    fn streaming_across_chunk_boundaries_matches_one_shot() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("large.bin");
        let data: Vec<u8> = (0..CHUNK_SIZE * 3 + 17).map(|i| (i % 251) as u8).collect();
        fs::write(&path, &data).unwrap();

        let streamed = fingerprint_file(&path, Algorithm::Blake3).unwrap();
        assert_eq!(streamed, fingerprint_bytes(&data, Algorithm::Blake3));
    }

    #[test]
    fn algorithms_never_compare_equal() {
        let md5 = fingerprint_bytes(b"x", Algorithm::Md5);
        let blake = fingerprint_bytes(b"x", Algorithm::Blake3);
        assert_ne!(md5, blake);
    }

    #[test]
    fn missing_file_is_an_open_error() {
        let dir = tempdir().unwrap();
        let err = fingerprint_file(&dir.path().join("missing"), Algorithm::Blake3).unwrap_err();
        assert!(matches!(err, HashError::Open { .. }));
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }
}
