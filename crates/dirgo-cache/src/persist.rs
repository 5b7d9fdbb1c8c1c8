//! Disk persistence for the scan cache.
//!
//! The cache file is a versioned JSON document holding the most recently
//! used results, each stamped with the time it was saved. Loading is best
//! effort: any problem with the file leaves the cache cold.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use dirgo_core::ScanResult;

use crate::config::{CacheConfig, DEFAULT_DISK_MAX_ENTRIES, DEFAULT_MAX_AGE};
use crate::error::CacheError;
use crate::scan_cache::ScanCache;

/// Version of the on-disk format. Files with any other version are discarded.
pub const CACHE_FORMAT_VERSION: u32 = 2;

#[derive(Serialize, Deserialize)]
struct CacheFile {
    version: u32,
    records: Vec<CacheRecord>,
}

/// Only the version is read first, so an outdated file is rejected whole.
#[derive(Deserialize)]
struct VersionHeader {
    version: u32,
}

#[derive(Serialize, Deserialize)]
struct CacheRecord {
    #[serde(flatten)]
    result: ScanResult,
    saved_at: DateTime<Utc>,
}

/// Reads and writes a [`ScanCache`] snapshot at a fixed location.
#[derive(Debug, Clone)]
pub struct DiskCache {
    path: PathBuf,
    max_entries: usize,
    max_age: Duration,
}

impl DiskCache {
    /// Persist to `path` with default limits.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            max_entries: DEFAULT_DISK_MAX_ENTRIES,
            max_age: DEFAULT_MAX_AGE,
        }
    }

    /// Persist to the configured or platform-default location.
    pub fn from_config(config: &CacheConfig) -> Result<Self, CacheError> {
        let path = config.resolve_cache_file().ok_or(CacheError::NoCacheDir)?;
        Ok(Self {
            path,
            max_entries: config.disk_max_entries,
            max_age: config.max_age,
        })
    }

    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }

    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write up to `max_entries` most recently used results.
    ///
    /// The file is written beside its final location and renamed into place.
    /// Returns the number of results written.
    pub fn save(&self, cache: &ScanCache) -> Result<usize, CacheError> {
        self.save_at(cache, Utc::now())
    }

    fn save_at(&self, cache: &ScanCache, now: DateTime<Utc>) -> Result<usize, CacheError> {
        let records: Vec<CacheRecord> = cache
            .recent(self.max_entries)
            .into_iter()
            .map(|result| CacheRecord {
                result,
                saved_at: now,
            })
            .collect();
        let count = records.len();

        let file = CacheFile {
            version: CACHE_FORMAT_VERSION,
            records,
        };
        let json = serde_json::to_vec(&file)?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| CacheError::io(parent, e))?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|e| CacheError::io(&tmp, e))?;
        if let Err(err) = fs::rename(&tmp, &self.path) {
            let _ = fs::remove_file(&tmp);
            return Err(CacheError::io(&self.path, err));
        }

        info!(path = %self.path.display(), records = count, "saved scan cache");
        Ok(count)
    }

    /// Populate `cache` from disk, returning the number of results restored.
    ///
    /// Missing, unreadable, malformed, and outdated files restore nothing.
    /// Records older than `max_age` are skipped. The rest are inserted
    /// oldest first so the most recent one ends up most recently used.
    pub fn load(&self, cache: &ScanCache) -> usize {
        self.load_at(cache, Utc::now())
    }

    fn load_at(&self, cache: &ScanCache, now: DateTime<Utc>) -> usize {
        let Some(file) = self.read_file() else {
            return 0;
        };

        let max_age = TimeDelta::from_std(self.max_age).unwrap_or(TimeDelta::MAX);
        let mut records: Vec<CacheRecord> = file
            .records
            .into_iter()
            .filter(|record| now.signed_duration_since(record.saved_at) <= max_age)
            .collect();

        // Stored most recently used first; ties in saved_at insert the least
        // recently used first.
        records.reverse();
        records.sort_by_key(|record| record.saved_at);

        let count = records.len();
        for record in records {
            cache.insert(record.result);
        }

        info!(path = %self.path.display(), records = count, "loaded scan cache");
        count
    }

    fn read_file(&self) -> Option<CacheFile> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) => {
                debug!(path = %self.path.display(), error = %err, "no scan cache loaded");
                return None;
            }
        };

        match serde_json::from_slice::<VersionHeader>(&bytes) {
            Ok(header) if header.version == CACHE_FORMAT_VERSION => {}
            Ok(header) => {
                warn!(
                    path = %self.path.display(),
                    version = header.version,
                    expected = CACHE_FORMAT_VERSION,
                    "discarding scan cache with unsupported version"
                );
                return None;
            }
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "discarding malformed scan cache");
                return None;
            }
        }

        match serde_json::from_slice(&bytes) {
            Ok(file) => Some(file),
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "discarding malformed scan cache");
                None
            }
        }
    }
}
