//! Cache configuration.

use std::path::PathBuf;
use std::time::Duration;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// Default number of scan results kept in memory.
pub const DEFAULT_CAPACITY: usize = 100;

/// Default number of most recently used results written to disk.
pub const DEFAULT_DISK_MAX_ENTRIES: usize = 50;

/// Default age after which a persisted result is dropped at load.
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(24 * 60 * 60);

/// Default number of directories remembered by cursor history.
pub const DEFAULT_HISTORY_CAPACITY: usize = 500;

/// Configuration for the in-memory cache and its disk persistence.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct CacheConfig {
    /// Maximum scan results held in memory.
    #[builder(default = "DEFAULT_CAPACITY")]
    #[serde(default = "default_capacity")]
    pub capacity: usize,

    /// Maximum scan results written to disk.
    #[builder(default = "DEFAULT_DISK_MAX_ENTRIES")]
    #[serde(default = "default_disk_max_entries")]
    pub disk_max_entries: usize,

    /// Persisted results older than this are discarded when loading.
    #[builder(default = "DEFAULT_MAX_AGE")]
    #[serde(default = "default_max_age")]
    pub max_age: Duration,

    /// Cache file location (None = platform cache directory).
    #[builder(default)]
    #[serde(default)]
    pub cache_file: Option<PathBuf>,

    /// Maximum directories remembered by cursor history.
    #[builder(default = "DEFAULT_HISTORY_CAPACITY")]
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
}

fn default_capacity() -> usize {
    DEFAULT_CAPACITY
}

fn default_disk_max_entries() -> usize {
    DEFAULT_DISK_MAX_ENTRIES
}

fn default_max_age() -> Duration {
    DEFAULT_MAX_AGE
}

fn default_history_capacity() -> usize {
    DEFAULT_HISTORY_CAPACITY
}

impl CacheConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if self.capacity == Some(0) {
            return Err("Cache capacity must be greater than zero".to_string());
        }
        if self.history_capacity == Some(0) {
            return Err("History capacity must be greater than zero".to_string());
        }
        Ok(())
    }
}

impl CacheConfig {
    /// Create a new cache config builder.
    pub fn builder() -> CacheConfigBuilder {
        CacheConfigBuilder::default()
    }

    /// The configured cache file, falling back to the platform default.
    pub fn resolve_cache_file(&self) -> Option<PathBuf> {
        self.cache_file.clone().or_else(default_cache_file)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            disk_max_entries: DEFAULT_DISK_MAX_ENTRIES,
            max_age: DEFAULT_MAX_AGE,
            cache_file: None,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

/// `<platform cache dir>/dirgo/cache.json`, if the platform has a cache directory.
pub fn default_cache_file() -> Option<PathBuf> {
    dirs::cache_dir().map(|d| d.join("dirgo").join("cache.json"))
}
