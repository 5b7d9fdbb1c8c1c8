//! Directory scanning and line counting engine for dirgo.
//!
//! # Overview
//!
//! `dirgo-scan` measures one directory at a time:
//!
//! - **Bounded parallel aggregation** of every immediate subdirectory
//! - **Lock-free progress counters** polled while a scan runs
//! - **Smart refresh** that skips a rescan when the directory's
//!   modification time is unchanged
//! - **Streaming line counting** with binary sniffing and pooled buffers
//!
//! # Example
//!
//! ```rust,no_run
//! use dirgo_scan::{DirScanner, ScanConfig};
//!
//! let scanner = DirScanner::new(ScanConfig::default()).unwrap();
//! let result = scanner.scan("/path/to/scan".as_ref()).unwrap();
//!
//! for entry in &result.entries {
//!     println!("{:>5.1}% {}", entry.percentage, entry.name);
//! }
//! ```
//!
//! # Async usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use dirgo_scan::{Dispatcher, ScanConfig, ScanEvent, ScanService};
//!
//! # async fn run() {
//! let service = Arc::new(ScanService::new(ScanConfig::default()).unwrap());
//! let (dispatcher, mut events) = Dispatcher::new(service);
//!
//! let progress = dispatcher.scan("/path/to/scan".into());
//! println!("{} files so far", progress.files());
//!
//! if let Some(ScanEvent::Scanned(result)) = events.recv().await {
//!     println!("{} bytes", result.total_size);
//! }
//! # }
//! ```

mod events;
mod lines;
mod pool;
mod progress;
mod refresh;
mod scanner;
mod service;

pub use events::{Dispatcher, EVENT_CHANNEL_SIZE, ScanEvent};
pub use lines::{
    BufferPool, DEFAULT_BUFFER_SIZE, DEFAULT_SNIFF_LEN, LineCount, LineCounter, PooledBuffer,
    count_lines, count_lines_with,
};
pub use progress::{ProgressReporter, ScanProgress};
pub use refresh::needs_rescan;
pub use scanner::{DirScanner, DirTotals, aggregate_dir};
pub use service::{RefreshOutcome, ScanHandle, ScanService};

// Re-export core types for convenience
pub use dirgo_core::{Entry, ScanConfig, ScanError, ScanResult};
