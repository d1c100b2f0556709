use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};
use parking_lot::Mutex;
use rayon::prelude::*;
use serde::Serialize;

use crate::actions::{delete_file, DeleteOutcome};
use crate::config::validate_dir;
use crate::error::{ConfigError, ScanError};
use crate::fingerprint::{fingerprint_file, Algorithm};
use crate::identity::{Classification, Identity, IdentityIndex};
use crate::walker::{collect_files, FileRecord, WalkFilter};

/// Algorithm used to fingerprint files for duplicate detection.
pub const DEDUP_ALGORITHM: Algorithm = Algorithm::Blake3;

/// What the scanner does with a duplicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DedupMode {
    /// Report only; nothing is touched.
    Test,
    /// Delete every duplicate, keeping the first file seen per identity.
    Remove,
}

/// Configuration for a duplicate scan
#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub mode: DedupMode,
    pub filter: WalkFilter,
    /// Worker threads for hashing. 0 picks the rayon default.
    pub threads: usize,
    pub show_progress: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            mode: DedupMode::Test,
            filter: WalkFilter::default(),
            threads: 0,
            show_progress: false,
        }
    }
}

/// A file classified as a duplicate of an earlier one.
#[derive(Debug, Clone, Serialize)]
pub struct DuplicateRecord {
    pub path: PathBuf,
    /// The survivor this file duplicates.
    pub original: PathBuf,
    pub size: u64,
    /// Set in remove mode only.
    pub delete: Option<DeleteOutcome>,
}

/// A file that could not be hashed and was left out of the scan.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub error: String,
}

/// Everything one scan observed.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub mode: DedupMode,
    pub files_visited: usize,
    pub duplicates: Vec<DuplicateRecord>,
    pub skipped: Vec<SkippedFile>,
    #[serde(skip)]
    pub elapsed: Duration,
}

impl ScanReport {
    fn empty(mode: DedupMode) -> Self {
        Self {
            mode,
            files_visited: 0,
            duplicates: Vec::new(),
            skipped: Vec::new(),
            elapsed: Duration::ZERO,
        }
    }

    pub fn duplicates_found(&self) -> usize {
        self.duplicates.len()
    }

    /// Files kept as the first of their identity.
    pub fn originals(&self) -> usize {
        self.files_visited - self.duplicates.len() - self.skipped.len()
    }

    pub fn removed(&self) -> usize {
        self.duplicates
            .iter()
            .filter(|d| d.delete.as_ref().is_some_and(DeleteOutcome::is_deleted))
            .count()
    }

    pub fn bytes_reclaimed(&self) -> u64 {
        self.duplicates
            .iter()
            .filter(|d| d.delete.as_ref().is_some_and(DeleteOutcome::is_deleted))
            .map(|d| d.size)
            .sum()
    }

    /// Bytes held by duplicates, whether or not they were removed.
    pub fn duplicate_bytes(&self) -> u64 {
        self.duplicates.iter().map(|d| d.size).sum()
    }
}

enum FileOutcome {
    Original,
    Duplicate(DuplicateRecord),
    Skipped(SkippedFile),
}

/// Scanner for finding duplicate files
pub struct Scanner {
    config: ScanConfig,
}

impl Scanner {
    pub fn new(config: ScanConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Walk every root, classify each file against the files seen before it,
    /// and in remove mode delete the duplicates.
    pub fn scan(&self, roots: &[PathBuf]) -> Result<ScanReport, ScanError> {
        if roots.is_empty() {
            return Err(ConfigError::MissingPath("source").into());
        }
        for root in roots {
            validate_dir("source", root)?;
        }

        let start = Instant::now();
        let files = unique_paths(collect_files(roots, &self.config.filter));
        if files.is_empty() {
            return Ok(ScanReport::empty(self.config.mode));
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.threads)
            .build()?;

        let index = Mutex::new(IdentityIndex::new());
        let progress = self.progress_bar(files.len() as u64);

        let outcomes: Vec<FileOutcome> = pool.install(|| {
            files
                .par_iter()
                .map(|record| {
                    let outcome = self.process_file(record, &index);
                    progress.inc(1);
                    outcome
                })
                .collect()
        });

        progress.finish_and_clear();

        let mut report = ScanReport::empty(self.config.mode);
        report.files_visited = outcomes.len();
        for outcome in outcomes {
            match outcome {
                FileOutcome::Original => {}
                FileOutcome::Duplicate(record) => report.duplicates.push(record),
                FileOutcome::Skipped(skipped) => report.skipped.push(skipped),
            }
        }
        report.elapsed = start.elapsed();

        log::info!(
            "Scanned {} files: {} duplicates, {} skipped, {} unique identities",
            report.files_visited,
            report.duplicates_found(),
            report.skipped.len(),
            index.lock().len()
        );

        Ok(report)
    }

    fn process_file(&self, record: &FileRecord, index: &Mutex<IdentityIndex>) -> FileOutcome {
        let fingerprint = match fingerprint_file(&record.path, DEDUP_ALGORITHM) {
            Ok(fingerprint) => fingerprint,
            Err(e) => {
                log::warn!("Skipping {}", e);
                return FileOutcome::Skipped(SkippedFile {
                    path: record.path.clone(),
                    error: e.to_string(),
                });
            }
        };

        let identity = Identity::new(fingerprint, record.size);
        // The guard is dropped at the end of this statement, before any delete.
        let classification = index.lock().classify(identity, &record.path);

        match classification {
            Classification::Original => FileOutcome::Original,
            Classification::Duplicate { original } => {
                log::debug!(
                    "Duplicate found: {} and {}",
                    record.path.display(),
                    original.display()
                );
                let delete = match self.config.mode {
                    DedupMode::Remove => Some(delete_file(&record.path)),
                    DedupMode::Test => None,
                };
                FileOutcome::Duplicate(DuplicateRecord {
                    path: record.path.clone(),
                    original,
                    size: record.size,
                    delete,
                })
            }
        }
    }

    fn progress_bar(&self, len: u64) -> ProgressBar {
        if !self.config.show_progress {
            return ProgressBar::hidden();
        }

        let progress = ProgressBar::new(len);
        match ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
        {
            Ok(style) => progress.set_style(style.progress_chars("##-")),
            Err(e) => log::debug!("Falling back to default progress style: {}", e),
        }
        progress
    }
}

/// Drop repeat visits of the same path, which overlapping roots produce.
/// Without this a file would be classified as a duplicate of itself.
fn unique_paths(files: Vec<FileRecord>) -> Vec<FileRecord> {
    let mut seen: HashSet<PathBuf> = HashSet::with_capacity(files.len());
    files
        .into_iter()
        .filter(|record| seen.insert(normalized(&record.path)))
        .collect()
}

fn normalized(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}
