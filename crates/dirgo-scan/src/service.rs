//! Async entry points over the blocking scanner and line counter.
//!
//! All blocking filesystem work runs on Tokio's blocking thread pool, so
//! these functions must be called from within a Tokio runtime.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use compact_str::CompactString;
use tokio::task::JoinHandle;
use tracing::debug;

use dirgo_core::{Entry, ScanConfig, ScanError, ScanResult};

use crate::lines::LineCounter;
use crate::progress::{ProgressReporter, ScanProgress};
use crate::refresh::needs_rescan;
use crate::scanner::DirScanner;

/// Result of a smart refresh.
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    /// The directory's modification time matches the cached result.
    Unchanged,
    /// The directory changed and was scanned again.
    Rescanned(ScanResult),
}

/// A running scan with its live progress counters.
pub struct ScanHandle<T> {
    progress: Arc<ProgressReporter>,
    task: JoinHandle<Result<T, ScanError>>,
}

impl<T> ScanHandle<T> {
    /// Current counter values.
    pub fn progress(&self) -> ScanProgress {
        self.progress.snapshot()
    }

    /// Shared counters, for polling after the handle has been consumed.
    pub fn reporter(&self) -> Arc<ProgressReporter> {
        Arc::clone(&self.progress)
    }

    /// Whether the scan has completed.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the scan to complete.
    pub async fn join(self) -> Result<T, ScanError> {
        self.task.await.map_err(|e| ScanError::TaskFailed {
            message: e.to_string(),
        })?
    }
}

/// Scanner and line counter shared by every request of a session.
pub struct ScanService {
    scanner: Arc<DirScanner>,
    lines: Arc<LineCounter>,
}

impl ScanService {
    /// Create a service, starting its worker pools.
    pub fn new(config: ScanConfig) -> Result<Self, ScanError> {
        let lines = LineCounter::new(&config)?;
        let scanner = DirScanner::new(config)?;
        Ok(Self {
            scanner: Arc::new(scanner),
            lines: Arc::new(lines),
        })
    }

    /// Start scanning `path` in the background with fresh progress counters.
    pub fn start_scan(&self, path: PathBuf) -> ScanHandle<ScanResult> {
        let progress = Arc::new(ProgressReporter::new());
        let scanner = Arc::clone(&self.scanner);
        let reporter = Arc::clone(&progress);

        let task = tokio::task::spawn_blocking(move || {
            scanner.scan_with_progress(&path, &reporter)
        });

        ScanHandle { progress, task }
    }

    /// Start a smart refresh: rescan only if the modification time changed.
    pub fn start_refresh(&self, path: PathBuf, cached: ScanResult) -> ScanHandle<RefreshOutcome> {
        let progress = Arc::new(ProgressReporter::new());
        let scanner = Arc::clone(&self.scanner);
        let reporter = Arc::clone(&progress);

        let task = tokio::task::spawn_blocking(move || {
            if !needs_rescan(&path, &cached) {
                debug!(path = %path.display(), "directory unchanged");
                return Ok(RefreshOutcome::Unchanged);
            }
            scanner
                .scan_with_progress(&path, &reporter)
                .map(RefreshOutcome::Rescanned)
        });

        ScanHandle { progress, task }
    }

    /// Scan `path` and wait for the result.
    pub async fn scan(&self, path: PathBuf) -> Result<ScanResult, ScanError> {
        self.start_scan(path).join().await
    }

    /// Smart-refresh `path` and wait for the outcome.
    pub async fn refresh(
        &self,
        path: PathBuf,
        cached: ScanResult,
    ) -> Result<RefreshOutcome, ScanError> {
        self.start_refresh(path, cached).join().await
    }

    /// Count lines of one file in `dir`. Failures and binary files count as 0.
    pub async fn count_lines(&self, dir: PathBuf, entry: Entry) -> (CompactString, u64) {
        let lines = Arc::clone(&self.lines);
        let path = dir.join(entry.fs_name());

        let count = tokio::task::spawn_blocking(move || match lines.count(&path) {
            Ok(count) => count.lines,
            Err(err) => {
                debug!(path = %path.display(), error = %err, "line count failed");
                0
            }
        })
        .await
        .unwrap_or_default();

        (entry.name, count)
    }

    /// Count lines of every countable entry in `dir`.
    pub async fn count_all_lines(
        &self,
        entries: Vec<Entry>,
        dir: PathBuf,
    ) -> HashMap<CompactString, u64> {
        let lines = Arc::clone(&self.lines);
        tokio::task::spawn_blocking(move || lines.count_all(&entries, &dir))
            .await
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn service() -> ScanService {
        ScanService::new(ScanConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_scan_reports_progress() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("sub")).unwrap();
        fs::write(temp.path().join("sub/a.txt"), "abc").unwrap();

        let handle = service().start_scan(temp.path().to_path_buf());
        let reporter = handle.reporter();
        let result = handle.join().await.unwrap();

        assert_eq!(result.total_dirs, 1);
        assert_eq!(reporter.files(), 1);
        assert_eq!(reporter.bytes(), 3);
    }

    #[tokio::test]
    async fn test_scan_error_is_returned() {
        let temp = TempDir::new().unwrap();
        let err = service().scan(temp.path().join("missing")).await.unwrap_err();
        assert!(matches!(err, ScanError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_refresh_unchanged() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.txt"), "abc").unwrap();
        let service = service();

        let cached = service.scan(temp.path().to_path_buf()).await.unwrap();
        let outcome = service
            .refresh(cached.path.clone(), cached.clone())
            .await
            .unwrap();
        assert_eq!(outcome, RefreshOutcome::Unchanged);
    }

    #[tokio::test]
    async fn test_count_lines_swallows_errors() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.txt"), "1\n2\n").unwrap();
        let service = service();

        let (name, lines) = service
            .count_lines(temp.path().to_path_buf(), Entry::file("a.txt"))
            .await;
        assert_eq!(name, "a.txt");
        assert_eq!(lines, 2);

        let (_, lines) = service
            .count_lines(temp.path().to_path_buf(), Entry::file("missing.txt"))
            .await;
        assert_eq!(lines, 0);
    }
}
