//! Thread-safe cache of scan results keyed by directory path.

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use lru::LruCache;
use parking_lot::Mutex;
use tracing::debug;

use dirgo_core::ScanResult;

use crate::config::CacheConfig;

/// Bounded LRU map from absolute directory path to its latest scan result.
///
/// Every operation takes a single short-lived lock; no I/O happens under it.
pub struct ScanCache {
    inner: Mutex<LruCache<PathBuf, ScanResult>>,
}

impl ScanCache {
    /// Create an empty cache. A capacity of 0 is treated as 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.capacity)
    }

    /// Cached result for `path`, marking it most recently used.
    pub fn get(&self, path: &Path) -> Option<ScanResult> {
        self.inner.lock().get(path).cloned()
    }

    /// Store a result, replacing any previous one for the same path.
    pub fn put(&self, path: impl Into<PathBuf>, result: ScanResult) {
        let path = path.into();
        let mut inner = self.inner.lock();
        let replacing = inner.contains(&path);
        if let Some((evicted, _)) = inner.push(path, result).filter(|_| !replacing) {
            debug!(path = %evicted.display(), "evicted cached scan");
        }
    }

    /// Store a result under its own path.
    pub fn insert(&self, result: ScanResult) {
        self.put(result.path.clone(), result);
    }

    /// Modify a cached result in place. Returns false if `path` is not cached.
    pub fn update<F>(&self, path: &Path, f: F) -> bool
    where
        F: FnOnce(&mut ScanResult),
    {
        match self.inner.lock().get_mut(path) {
            Some(result) => {
                f(result);
                true
            }
            None => false,
        }
    }

    pub fn delete(&self, path: &Path) -> Option<ScanResult> {
        self.inner.lock().pop(path)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.inner.lock().cap().get()
    }

    /// Up to `limit` results, most recently used first. Recency is untouched.
    pub fn recent(&self, limit: usize) -> Vec<ScanResult> {
        self.inner
            .lock()
            .iter()
            .take(limit)
            .map(|(_, result)| result.clone())
            .collect()
    }

    pub fn clear(&self) {
        self.inner.lock().clear();
    }
}

impl Default for ScanCache {
    fn default() -> Self {
        Self::from_config(&CacheConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(path: &str, total_files: u64) -> ScanResult {
        let mut result = ScanResult::new(path);
        result.total_files = total_files;
        result
    }

    #[test]
    fn test_put_get_delete() {
        let cache = ScanCache::new(4);
        cache.insert(result("/a", 1));
        cache.put("/b", result("/b", 2));

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(Path::new("/a")).unwrap().total_files, 1);
        assert!(cache.get(Path::new("/missing")).is_none());

        assert!(cache.delete(Path::new("/a")).is_some());
        assert!(cache.get(Path::new("/a")).is_none());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_eviction_follows_recency() {
        let cache = ScanCache::new(2);
        cache.insert(result("/a", 1));
        cache.insert(result("/b", 2));
        cache.get(Path::new("/a"));
        cache.insert(result("/c", 3));

        assert!(cache.get(Path::new("/a")).is_some());
        assert!(cache.get(Path::new("/b")).is_none());
    }

    #[test]
    fn test_update_in_place() {
        let cache = ScanCache::new(2);
        cache.insert(result("/a", 1));

        assert!(cache.update(Path::new("/a"), |r| r.total_files = 7));
        assert!(!cache.update(Path::new("/b"), |r| r.total_files = 7));
        assert_eq!(cache.get(Path::new("/a")).unwrap().total_files, 7);
    }

    #[test]
    fn test_recent_is_mru_first() {
        let cache = ScanCache::new(5);
        for path in ["/a", "/b", "/c"] {
            cache.insert(result(path, 0));
        }
        cache.get(Path::new("/a"));

        let paths: Vec<PathBuf> = cache.recent(2).into_iter().map(|r| r.path).collect();
        assert_eq!(paths, vec![PathBuf::from("/a"), PathBuf::from("/c")]);
    }

    #[test]
    fn test_update_does_not_evict() {
        let cache = ScanCache::new(2);
        cache.insert(result("/a", 1));
        cache.insert(result("/b", 2));
        cache.insert(result("/a", 3));

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(Path::new("/a")).unwrap().total_files, 3);
        assert!(cache.get(Path::new("/b")).is_some());
    }

    #[test]
    fn test_zero_capacity_holds_one() {
        let cache = ScanCache::new(0);
        cache.insert(result("/a", 1));
        cache.insert(result("/b", 2));

        assert_eq!(cache.capacity(), 1);
        assert_eq!(cache.len(), 1);
        assert!(cache.get(Path::new("/b")).is_some());
    }

    #[test]
    fn test_concurrent_access() {
        let cache = ScanCache::new(16);
        std::thread::scope(|s| {
            for t in 0..4 {
                let cache = &cache;
                s.spawn(move || {
                    for i in 0..100 {
                        let path = format!("/t{t}/{}", i % 8);
                        cache.insert(result(&path, i));
                        cache.get(Path::new(&path));
                    }
                });
            }
        });
        assert_eq!(cache.len(), 16);
    }
}
