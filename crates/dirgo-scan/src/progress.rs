//! Scan progress reporting.
//!
//! Walkers bump three independent atomic counters; a consumer polls
//! [`ProgressReporter::snapshot`] for live feedback. The counters are not
//! updated together, so a snapshot may combine values from slightly
//! different instants.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Progress information during a scan.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanProgress {
    /// Number of files seen so far.
    pub files_scanned: u64,
    /// Number of directories seen so far.
    pub dirs_scanned: u64,
    /// Total bytes seen so far.
    pub bytes_scanned: u64,
    /// Time elapsed since the scan started.
    pub elapsed: Duration,
}

impl ScanProgress {
    /// Calculate scan rate in files per second.
    pub fn files_per_second(&self) -> f64 {
        if self.elapsed.as_secs_f64() > 0.0 {
            self.files_scanned as f64 / self.elapsed.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Calculate scan rate in bytes per second.
    pub fn bytes_per_second(&self) -> f64 {
        if self.elapsed.as_secs_f64() > 0.0 {
            self.bytes_scanned as f64 / self.elapsed.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Get total items scanned (files + dirs).
    pub fn total_items(&self) -> u64 {
        self.files_scanned + self.dirs_scanned
    }
}

/// Lock-free counters shared by every walker of a single scan.
///
/// Create one per scan and drop it afterwards; it carries nothing between scans.
#[derive(Debug)]
pub struct ProgressReporter {
    files: AtomicU64,
    dirs: AtomicU64,
    bytes: AtomicU64,
    started: Instant,
}

impl ProgressReporter {
    /// Create zeroed counters, starting the clock now.
    pub fn new() -> Self {
        Self {
            files: AtomicU64::new(0),
            dirs: AtomicU64::new(0),
            bytes: AtomicU64::new(0),
            started: Instant::now(),
        }
    }

    /// Count one file of the given size.
    #[inline]
    pub fn record_file(&self, size: u64) {
        self.files.fetch_add(1, Ordering::Relaxed);
        self.bytes.fetch_add(size, Ordering::Relaxed);
    }

    /// Count one directory.
    #[inline]
    pub fn record_dir(&self) {
        self.dirs.fetch_add(1, Ordering::Relaxed);
    }

    pub fn files(&self) -> u64 {
        self.files.load(Ordering::Relaxed)
    }

    pub fn dirs(&self) -> u64 {
        self.dirs.load(Ordering::Relaxed)
    }

    pub fn bytes(&self) -> u64 {
        self.bytes.load(Ordering::Relaxed)
    }

    /// Read all counters. Not atomic across the three values.
    pub fn snapshot(&self) -> ScanProgress {
        ScanProgress {
            files_scanned: self.files(),
            dirs_scanned: self.dirs(),
            bytes_scanned: self.bytes(),
            elapsed: self.started.elapsed(),
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}
