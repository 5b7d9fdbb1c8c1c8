//! Scan results and view filtering.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

use crate::entry::{Entry, sort_by_size};

/// Number of entries kept by [`EntryFilter::top_only`].
pub const TOP_ENTRIES: usize = 10;

/// The output of scanning one directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanResult {
    /// Absolute, canonical path of the scanned directory.
    pub path: PathBuf,

    /// Immediate children, sorted by size descending.
    pub entries: Vec<Entry>,

    /// Sum of all entry sizes.
    pub total_size: u64,

    /// Number of immediate files.
    pub total_files: u64,

    /// Number of immediate directories.
    pub total_dirs: u64,

    /// Modification time of the directory itself.
    #[serde(with = "crate::timestamp")]
    pub dir_modified: SystemTime,
}

impl ScanResult {
    /// Create an empty result for a path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: Vec::new(),
            total_size: 0,
            total_files: 0,
            total_dirs: 0,
            dir_modified: UNIX_EPOCH,
        }
    }

    /// Build a result from unsorted entries, deriving totals, percentages and order.
    pub fn from_entries(
        path: impl Into<PathBuf>,
        mut entries: Vec<Entry>,
        dir_modified: SystemTime,
    ) -> Self {
        let total_dirs = entries.iter().filter(|e| e.is_dir).count() as u64;
        let total_files = entries.len() as u64 - total_dirs;
        let total_size = entries.iter().map(|e| e.size).sum();
        for entry in &mut entries {
            entry.update_percentage(total_size);
        }
        sort_by_size(&mut entries);

        Self {
            path: path.into(),
            entries,
            total_size,
            total_files,
            total_dirs,
            dir_modified,
        }
    }

    /// Look up an entry by name.
    pub fn entry(&self, name: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Recompute every percentage from the current sizes and total.
    pub fn recompute_percentages(&mut self) {
        let total = self.total_size;
        for entry in &mut self.entries {
            entry.update_percentage(total);
        }
    }

    /// Record a line count for one entry. Returns `false` if no entry has that name.
    pub fn apply_line_count(&mut self, name: &str, lines: u64) -> bool {
        match self.entries.iter_mut().find(|e| e.name == name) {
            Some(entry) => {
                entry.line_count = lines;
                true
            }
            None => false,
        }
    }

    /// Record a batch of line counts keyed by entry name.
    pub fn apply_line_counts(&mut self, counts: &HashMap<CompactString, u64>) {
        for entry in &mut self.entries {
            if let Some(&lines) = counts.get(&entry.name) {
                entry.line_count = lines;
            }
        }
    }

    /// Remove an entry that no longer exists on disk, keeping totals and
    /// percentages consistent.
    pub fn remove_entry(&mut self, name: &str) -> Option<Entry> {
        let index = self.entries.iter().position(|e| e.name == name)?;
        let removed = self.entries.remove(index);

        self.total_size = self.total_size.saturating_sub(removed.size);
        if removed.is_dir {
            self.total_dirs = self.total_dirs.saturating_sub(1);
        } else {
            self.total_files = self.total_files.saturating_sub(1);
        }
        self.recompute_percentages();

        Some(removed)
    }

    /// Files and directories anywhere beneath this directory.
    pub fn deep_totals(&self) -> (u64, u64) {
        self.entries
            .iter()
            .filter(|e| e.is_dir)
            .fold((self.total_files, self.total_dirs), |(files, dirs), e| {
                (files + e.child_files, dirs + e.child_dirs)
            })
    }

    /// Entries visible under a filter, in size order.
    pub fn filtered<'a>(&'a self, filter: &EntryFilter) -> Vec<&'a Entry> {
        let mut visible: Vec<&Entry> = self
            .entries
            .iter()
            .filter(|e| filter.matches(e))
            .collect();
        if filter.top_only {
            visible.truncate(TOP_ENTRIES);
        }
        visible
    }
}

/// Which kinds of entries a view shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViewFilter {
    #[default]
    All,
    DirsOnly,
    FilesOnly,
}

impl ViewFilter {
    /// Cycle to the next view.
    pub fn next(self) -> Self {
        match self {
            Self::All => Self::DirsOnly,
            Self::DirsOnly => Self::FilesOnly,
            Self::FilesOnly => Self::All,
        }
    }

    fn admits(self, entry: &Entry) -> bool {
        match self {
            Self::All => true,
            Self::DirsOnly => entry.is_dir,
            Self::FilesOnly => !entry.is_dir,
        }
    }
}

/// Visibility rules applied to a listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntryFilter {
    /// Show names starting with a dot.
    pub show_hidden: bool,
    /// Restrict to one kind of entry.
    pub view: ViewFilter,
    /// Case-insensitive substring the name must contain. Empty matches all.
    pub search: String,
    /// Keep only the largest [`TOP_ENTRIES`] entries.
    pub top_only: bool,
}

impl EntryFilter {
    /// Check a single entry against the hidden, view, and search rules.
    pub fn matches(&self, entry: &Entry) -> bool {
        if !self.show_hidden && entry.is_hidden {
            return false;
        }
        if !self.view.admits(entry) {
            return false;
        }
        self.search.is_empty() || contains_ignore_case(&entry.name, &self.search)
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ScanResult {
        let mut src = Entry::directory("src").with_size(600);
        src.child_files = 12;
        src.child_dirs = 3;
        ScanResult::from_entries(
            "/project",
            vec![
                Entry::file("visible.go").with_size(300),
                Entry::file(".hidden").with_size(100),
                src,
                Entry::directory(".git"),
            ],
            UNIX_EPOCH,
        )
    }

    #[test]
    fn test_from_entries_totals() {
        let result = sample();
        assert_eq!(result.total_size, 1000);
        assert_eq!(result.total_files, 2);
        assert_eq!(result.total_dirs, 2);
        assert_eq!(result.entries[0].name, "src");
        assert!((result.entries[0].percentage - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_remove_entry_updates_totals() {
        let mut result = sample();
        let removed = result.remove_entry("src").unwrap();
        assert_eq!(removed.size, 600);
        assert_eq!(result.total_size, 400);
        assert_eq!(result.total_dirs, 1);
        let visible = result.entry("visible.go").unwrap();
        assert!((visible.percentage - 75.0).abs() < 1e-9);
        assert!(result.remove_entry("missing").is_none());
    }

    #[test]
    fn test_remove_last_sized_entry_zeroes_percentages() {
        let mut result = ScanResult::from_entries(
            "/x",
            vec![Entry::file("a").with_size(10), Entry::file("b")],
            UNIX_EPOCH,
        );
        result.remove_entry("a");
        assert_eq!(result.total_size, 0);
        assert!(result.entries.iter().all(|e| e.percentage == 0.0));
    }

    #[test]
    fn test_deep_totals() {
        assert_eq!(sample().deep_totals(), (14, 5));
    }

    #[test]
    fn test_filtered() {
        let result = sample();

        let filter = EntryFilter::default();
        assert_eq!(result.filtered(&filter).len(), 2);

        let filter = EntryFilter {
            show_hidden: true,
            ..Default::default()
        };
        assert_eq!(result.filtered(&filter).len(), 4);

        let filter = EntryFilter {
            view: ViewFilter::DirsOnly,
            ..Default::default()
        };
        assert_eq!(result.filtered(&filter).len(), 1);

        let filter = EntryFilter {
            show_hidden: true,
            search: "GIT".to_string(),
            ..Default::default()
        };
        let names: Vec<_> = result.filtered(&filter).iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec![".git"]);
    }

    #[test]
    fn test_view_filter_cycles() {
        assert_eq!(ViewFilter::All.next(), ViewFilter::DirsOnly);
        assert_eq!(ViewFilter::DirsOnly.next(), ViewFilter::FilesOnly);
        assert_eq!(ViewFilter::FilesOnly.next(), ViewFilter::All);
    }

    #[test]
    fn test_apply_line_counts() {
        let mut result = sample();
        assert!(result.apply_line_count("visible.go", 42));
        assert!(!result.apply_line_count("nope", 1));

        let counts = HashMap::from([(CompactString::new(".hidden"), 7)]);
        result.apply_line_counts(&counts);
        assert_eq!(result.entry("visible.go").unwrap().line_count, 42);
        assert_eq!(result.entry(".hidden").unwrap().line_count, 7);
    }
}
