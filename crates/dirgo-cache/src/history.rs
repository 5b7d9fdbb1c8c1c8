//! Per-directory memory of the last selected entry.

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use compact_str::CompactString;
use lru::LruCache;

use crate::config::DEFAULT_HISTORY_CAPACITY;

/// Remembers which entry was selected in each visited directory.
///
/// Bounded; the least recently visited directory is forgotten first.
pub struct CursorHistory {
    entries: LruCache<PathBuf, CompactString>,
}

impl CursorHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(capacity),
        }
    }

    /// Record the selected entry name for `dir`.
    pub fn remember(&mut self, dir: impl Into<PathBuf>, name: impl Into<CompactString>) {
        self.entries.put(dir.into(), name.into());
    }

    /// The last selected entry name for `dir`, if any.
    pub fn recall(&mut self, dir: &Path) -> Option<&str> {
        self.entries.get(dir).map(CompactString::as_str)
    }

    /// Resolve the remembered name to an index in `names`, falling back to 0.
    pub fn restore_index<'a, I>(&mut self, dir: &Path, names: I) -> usize
    where
        I: IntoIterator<Item = &'a str>,
    {
        self.recall(dir)
            .and_then(|wanted| names.into_iter().position(|name| name == wanted))
            .unwrap_or(0)
    }

    pub fn forget(&mut self, dir: &Path) {
        self.entries.pop(dir);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for CursorHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}
