//! Channel-based delivery of async results to a single consumer.
//!
//! The consumer owns the receiving end and applies each [`ScanEvent`] to its
//! own state. Every request produces exactly one event, including requests
//! for paths the consumer has since navigated away from.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use compact_str::CompactString;
use tokio::sync::mpsc;

use dirgo_core::{Entry, ScanError, ScanResult};

use crate::progress::ProgressReporter;
use crate::service::{RefreshOutcome, ScanService};

/// Default channel buffer size for scan events.
pub const EVENT_CHANNEL_SIZE: usize = 100;

/// A completed async request.
#[derive(Debug)]
pub enum ScanEvent {
    /// A full scan finished.
    Scanned(ScanResult),
    /// A smart refresh found nothing changed.
    UpToDate { path: PathBuf },
    /// A scan or refresh failed on its root directory.
    Failed { path: PathBuf, error: ScanError },
    /// A single-file line count finished.
    LineCount {
        dir: PathBuf,
        name: CompactString,
        lines: u64,
    },
    /// A batch line count finished.
    BatchLineCount {
        dir: PathBuf,
        counts: HashMap<CompactString, u64>,
    },
}

/// Spawns requests against a [`ScanService`] and reports completions as events.
#[derive(Clone)]
pub struct Dispatcher {
    service: Arc<ScanService>,
    tx: mpsc::Sender<ScanEvent>,
}

impl Dispatcher {
    /// Create a dispatcher and the receiver its events arrive on.
    pub fn new(service: Arc<ScanService>) -> (Self, mpsc::Receiver<ScanEvent>) {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_SIZE);
        (Self { service, tx }, rx)
    }

    /// Request a full scan. Returns the counters of this scan for polling.
    pub fn scan(&self, path: PathBuf) -> Arc<ProgressReporter> {
        let handle = self.service.start_scan(path.clone());
        let reporter = handle.reporter();
        let tx = self.tx.clone();

        tokio::spawn(async move {
            let event = match handle.join().await {
                Ok(result) => ScanEvent::Scanned(result),
                Err(error) => ScanEvent::Failed { path, error },
            };
            let _ = tx.send(event).await;
        });

        reporter
    }

    /// Request a smart refresh against a cached result.
    pub fn refresh(&self, path: PathBuf, cached: ScanResult) -> Arc<ProgressReporter> {
        let handle = self.service.start_refresh(path.clone(), cached);
        let reporter = handle.reporter();
        let tx = self.tx.clone();

        tokio::spawn(async move {
            let event = match handle.join().await {
                Ok(RefreshOutcome::Unchanged) => ScanEvent::UpToDate { path },
                Ok(RefreshOutcome::Rescanned(result)) => ScanEvent::Scanned(result),
                Err(error) => ScanEvent::Failed { path, error },
            };
            let _ = tx.send(event).await;
        });

        reporter
    }

    /// Request a line count for one file in `dir`.
    pub fn count_lines(&self, dir: PathBuf, entry: Entry) {
        let service = Arc::clone(&self.service);
        let tx = self.tx.clone();

        tokio::spawn(async move {
            let (name, lines) = service.count_lines(dir.clone(), entry).await;
            let _ = tx.send(ScanEvent::LineCount { dir, name, lines }).await;
        });
    }

    /// Request line counts for every countable entry in `dir`.
    pub fn count_all_lines(&self, entries: Vec<Entry>, dir: PathBuf) {
        let service = Arc::clone(&self.service);
        let tx = self.tx.clone();

        tokio::spawn(async move {
            let counts = service.count_all_lines(entries, dir.clone()).await;
            let _ = tx.send(ScanEvent::BatchLineCount { dir, counts }).await;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dirgo_core::ScanConfig;
    use std::fs;
    use tempfile::TempDir;

    fn dispatcher() -> (Dispatcher, mpsc::Receiver<ScanEvent>) {
        let service = ScanService::new(ScanConfig::default()).unwrap();
        Dispatcher::new(Arc::new(service))
    }

    #[tokio::test]
    async fn test_scan_then_refresh_events() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.txt"), "hello\n").unwrap();
        let (dispatcher, mut rx) = dispatcher();

        dispatcher.scan(temp.path().to_path_buf());
        let result = match rx.recv().await {
            Some(ScanEvent::Scanned(result)) => result,
            other => panic!("expected Scanned, got {other:?}"),
        };
        assert_eq!(result.total_files, 1);

        dispatcher.refresh(result.path.clone(), result.clone());
        match rx.recv().await {
            Some(ScanEvent::UpToDate { path }) => assert_eq!(path, result.path),
            other => panic!("expected UpToDate, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_failed_scan_event() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("missing");
        let (dispatcher, mut rx) = dispatcher();

        dispatcher.scan(missing.clone());
        match rx.recv().await {
            Some(ScanEvent::Failed { path, error }) => {
                assert_eq!(path, missing);
                assert!(matches!(error, ScanError::NotFound { .. }));
            }
            other => panic!("expected Failed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_batch_line_count_event() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.txt"), "1\n2\n3\n").unwrap();
        let (dispatcher, mut rx) = dispatcher();

        dispatcher.count_all_lines(vec![Entry::file("a.txt")], temp.path().to_path_buf());
        match rx.recv().await {
            Some(ScanEvent::BatchLineCount { counts, .. }) => {
                assert_eq!(counts.get("a.txt"), Some(&3));
            }
            other => panic!("expected BatchLineCount, got {other:?}"),
        }
    }
}
