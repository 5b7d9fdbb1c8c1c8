//! Directory scanner with bounded parallel aggregation.
//!
//! A scan lists one directory, stats its immediate files, and computes the
//! aggregate size and descendant counts of every immediate subdirectory.
//! Subdirectories are dispatched onto a pool of at most 16 walkers; each
//! walker descends its subtree serially. The scan returns only after every
//! walker has finished.

use std::fs::{self, DirEntry};
use std::path::{Path, PathBuf};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use rayon::ThreadPool;
use rayon::prelude::*;
use tracing::debug;

use dirgo_core::{Entry, ScanConfig, ScanError, ScanResult, escape_name};

use crate::pool::build_pool;
use crate::progress::ProgressReporter;

/// Aggregate totals for one subdirectory tree, excluding the directory itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirTotals {
    /// Sum of all nested file sizes.
    pub size: u64,
    /// Number of nested files.
    pub files: u64,
    /// Number of nested directories.
    pub dirs: u64,
}

/// Scanner that owns its worker pools.
///
/// Create one and reuse it; pools are built once and shared by every scan.
pub struct DirScanner {
    config: ScanConfig,
    walk_pool: ThreadPool,
    stat_pool: ThreadPool,
}

impl DirScanner {
    /// Create a scanner, starting its worker pools.
    pub fn new(config: ScanConfig) -> Result<Self, ScanError> {
        let walk_pool = build_pool("walk", config.effective_scan_workers())?;
        let stat_pool = build_pool("stat", config.effective_stat_workers())?;
        Ok(Self {
            config,
            walk_pool,
            stat_pool,
        })
    }

    /// Scan a directory without observing progress.
    pub fn scan(&self, path: &Path) -> Result<ScanResult, ScanError> {
        self.scan_with_progress(path, &ProgressReporter::new())
    }

    /// Scan a directory, counting every nested file and directory on `progress`.
    pub fn scan_with_progress(
        &self,
        path: &Path,
        progress: &ProgressReporter,
    ) -> Result<ScanResult, ScanError> {
        let start = Instant::now();
        let root = path.canonicalize().map_err(|e| ScanError::io(path, e))?;

        let metadata = fs::metadata(&root).map_err(|e| ScanError::io(&root, e))?;
        if !metadata.is_dir() {
            return Err(ScanError::NotADirectory { path: root });
        }
        let dir_modified = metadata.modified().unwrap_or(UNIX_EPOCH);

        let listing = read_listing(&root)?;

        let mut entries = Vec::with_capacity(listing.len());
        let mut subdirs: Vec<(usize, PathBuf)> = Vec::new();
        let mut files: Vec<(usize, DirEntry)> = Vec::new();

        for dir_entry in listing {
            let os_name = dir_entry.file_name();
            let name = escape_name(&os_name);
            let (is_dir, is_symlink) = classify(&dir_entry);

            if is_dir {
                let modified = dir_entry
                    .metadata()
                    .and_then(|m| m.modified())
                    .unwrap_or(UNIX_EPOCH);
                subdirs.push((entries.len(), dir_entry.path()));
                entries.push(
                    Entry::directory(name)
                        .with_os_name(os_name)
                        .with_symlink(is_symlink)
                        .with_modified(modified),
                );
            } else {
                entries.push(
                    Entry::file(name)
                        .with_os_name(os_name)
                        .with_symlink(is_symlink),
                );
                files.push((entries.len() - 1, dir_entry));
            }
        }

        for ((index, _), (size, modified)) in files.iter().zip(self.stat_files(&files)) {
            let entry = &mut entries[*index];
            entry.size = size;
            entry.modified = modified;
        }

        let totals: Vec<DirTotals> = self.walk_pool.install(|| {
            subdirs
                .par_iter()
                .map(|(_, dir)| aggregate_dir(dir, progress))
                .collect()
        });

        for ((index, _), totals) in subdirs.iter().zip(totals) {
            let entry = &mut entries[*index];
            entry.size = totals.size;
            entry.child_files = totals.files;
            entry.child_dirs = totals.dirs;
        }

        let result = ScanResult::from_entries(root, entries, dir_modified);

        debug!(
            path = %result.path.display(),
            files = result.total_files,
            dirs = result.total_dirs,
            bytes = result.total_size,
            elapsed = ?start.elapsed(),
            "scan complete"
        );

        Ok(result)
    }

    /// Stat immediate files, in parallel only when there are enough of them.
    fn stat_files(&self, files: &[(usize, DirEntry)]) -> Vec<(u64, SystemTime)> {
        if files.len() > self.config.parallel_stat_threshold {
            self.stat_pool.install(|| {
                files
                    .par_iter()
                    .map(|(_, dir_entry)| stat_entry(dir_entry))
                    .collect()
            })
        } else {
            files
                .iter()
                .map(|(_, dir_entry)| stat_entry(dir_entry))
                .collect()
        }
    }
}

/// Compute aggregate size and descendant counts of a directory tree.
///
/// Each directory is read with a single listing call; directories are never
/// stat'd. Unreadable directories and entries contribute nothing.
pub fn aggregate_dir(root: &Path, progress: &ProgressReporter) -> DirTotals {
    let mut totals = DirTotals::default();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let read_dir = match fs::read_dir(&dir) {
            Ok(read_dir) => read_dir,
            Err(err) => {
                debug!(path = %dir.display(), error = %err, "skipping unreadable directory");
                continue;
            }
        };

        for dir_entry in read_dir.flatten() {
            let Ok(file_type) = dir_entry.file_type() else {
                continue;
            };

            if file_type.is_dir() {
                totals.dirs += 1;
                progress.record_dir();
                pending.push(dir_entry.path());
            } else if let Ok(metadata) = dir_entry.metadata() {
                let size = metadata.len();
                totals.files += 1;
                totals.size += size;
                progress.record_file(size);
            }
        }
    }

    totals
}

/// List a directory's children in name order.
fn read_listing(dir: &Path) -> Result<Vec<DirEntry>, ScanError> {
    let mut listing = fs::read_dir(dir)
        .map_err(|e| ScanError::io(dir, e))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| ScanError::io(dir, e))?;
    listing.sort_by_key(DirEntry::file_name);
    Ok(listing)
}

/// Returns `(is_dir, is_symlink)`. A symlink counts as a directory when its
/// target is one.
fn classify(dir_entry: &DirEntry) -> (bool, bool) {
    let Ok(file_type) = dir_entry.file_type() else {
        return (false, false);
    };

    if file_type.is_symlink() {
        let target_is_dir = fs::metadata(dir_entry.path()).is_ok_and(|m| m.is_dir());
        (target_is_dir, true)
    } else {
        (file_type.is_dir(), false)
    }
}

/// Size and modification time of a file, without following symlinks.
fn stat_entry(dir_entry: &DirEntry) -> (u64, SystemTime) {
    match dir_entry.metadata() {
        Ok(metadata) => (metadata.len(), metadata.modified().unwrap_or(UNIX_EPOCH)),
        Err(_) => (0, UNIX_EPOCH),
    }
}
