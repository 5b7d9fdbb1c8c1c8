//! Modification-time gate in front of full rescans.

use std::fs;
use std::path::Path;

use dirgo_core::ScanResult;

/// Decide whether `path` must be rescanned given a cached result.
///
/// Only the directory's own modification time is compared, and only for
/// exact equality. A failed stat always asks for a rescan so the scanner can
/// report the real error.
pub fn needs_rescan(path: &Path, cached: &ScanResult) -> bool {
    match fs::metadata(path).and_then(|m| m.modified()) {
        Ok(modified) => modified != cached.dir_modified,
        Err(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, UNIX_EPOCH};
    use tempfile::TempDir;

    #[test]
    fn test_unchanged_when_mtime_matches() {
        let temp = TempDir::new().unwrap();
        let modified = fs::metadata(temp.path()).unwrap().modified().unwrap();
        let mut cached = ScanResult::new(temp.path());
        cached.dir_modified = modified;

        assert!(!needs_rescan(temp.path(), &cached));
    }

    #[test]
    fn test_changed_when_mtime_differs() {
        let temp = TempDir::new().unwrap();
        let mut cached = ScanResult::new(temp.path());
        cached.dir_modified = UNIX_EPOCH + Duration::from_secs(1);

        assert!(needs_rescan(temp.path(), &cached));
    }

    #[test]
    fn test_missing_path_needs_rescan() {
        let temp = TempDir::new().unwrap();
        let gone = temp.path().join("gone");
        let cached = ScanResult::new(&gone);

        assert!(needs_rescan(&gone, &cached));
    }
}
