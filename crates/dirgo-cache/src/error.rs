//! Error types for cache persistence.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while saving the cache to disk.
///
/// Loading never fails: a missing, unreadable, or outdated cache file is
/// treated as an empty cache.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Reading or writing the cache file failed.
    #[error("cache I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The cache contents could not be serialized.
    #[error("failed to serialize cache: {0}")]
    Serialize(#[from] serde_json::Error),

    /// No cache file was configured and the platform has no cache directory.
    #[error("no cache directory available on this platform")]
    NoCacheDir,
}

impl CacheError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
