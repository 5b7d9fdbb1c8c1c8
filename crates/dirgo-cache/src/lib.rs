//! Scan result caching for dirgo.
//!
//! This crate provides:
//! - [`ScanCache`], the thread-safe cache of scan results by path
//! - [`DiskCache`], best-effort persistence of recent results between runs
//! - [`CursorHistory`], the last selected entry per directory

mod config;
mod error;
mod history;
mod persist;
mod scan_cache;

pub use config::{
    CacheConfig, CacheConfigBuilder, DEFAULT_CAPACITY, DEFAULT_DISK_MAX_ENTRIES,
    DEFAULT_HISTORY_CAPACITY, DEFAULT_MAX_AGE, default_cache_file,
};
pub use error::CacheError;
pub use history::CursorHistory;
pub use persist::{CACHE_FORMAT_VERSION, DiskCache};
pub use scan_cache::ScanCache;
