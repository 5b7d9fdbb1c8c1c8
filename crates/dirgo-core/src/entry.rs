//! Directory listing entries.

use std::ffi::{OsStr, OsString};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// Extensions treated as binary without reading file content.
const BINARY_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "bmp", "ico", "webp", "svg", // images
    "mp3", "mp4", "wav", "avi", "mov", "mkv", "flac", "ogg", // media
    "zip", "tar", "gz", "bz2", "xz", "7z", "rar", "zst", // archives
    "exe", "dll", "so", "dylib", "bin", "o", "a", // executables and objects
    "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", // documents
    "ttf", "otf", "woff", "woff2", "eot", // fonts
    "pyc", "pyo", "class", "wasm", // bytecode
    "db", "sqlite", "sqlite3",
];

/// Check whether a file name carries an extension known to be binary.
///
/// The comparison is case-insensitive: `IMAGE.PNG` is binary.
pub fn is_binary_extension(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            BINARY_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
}

/// Check whether a name follows the leading-dot hidden convention.
pub fn is_hidden_name(name: &str) -> bool {
    name.starts_with('.')
}

/// Display form of a file name.
///
/// Backslashes are doubled and anything that is not valid Unicode is written
/// as a `\xNN` (Unix bytes) or `\u{NNNN}` (Windows code units) escape, so
/// distinct names always produce distinct strings.
pub fn escape_name(name: &OsStr) -> CompactString {
    match name.to_str() {
        Some(s) if !s.contains('\\') => CompactString::from(s),
        _ => escape_raw(name),
    }
}

fn push_escaped_char(out: &mut CompactString, c: char) {
    if c == '\\' {
        out.push_str("\\\\");
    } else {
        out.push(c);
    }
}

#[cfg(unix)]
fn escape_raw(name: &OsStr) -> CompactString {
    use std::fmt::Write;
    use std::os::unix::ffi::OsStrExt;

    let mut out = CompactString::default();
    for chunk in name.as_bytes().utf8_chunks() {
        chunk.valid().chars().for_each(|c| push_escaped_char(&mut out, c));
        for byte in chunk.invalid() {
            let _ = write!(out, "\\x{byte:02X}");
        }
    }
    out
}

#[cfg(windows)]
fn escape_raw(name: &OsStr) -> CompactString {
    use std::fmt::Write;
    use std::os::windows::ffi::OsStrExt;

    let mut out = CompactString::default();
    for unit in char::decode_utf16(name.encode_wide()) {
        match unit {
            Ok(c) => push_escaped_char(&mut out, c),
            Err(err) => {
                let _ = write!(out, "\\u{{{:04X}}}", err.unpaired_surrogate());
            }
        }
    }
    out
}

#[cfg(not(any(unix, windows)))]
fn escape_raw(name: &OsStr) -> CompactString {
    let mut out = CompactString::default();
    name.to_string_lossy()
        .chars()
        .for_each(|c| push_escaped_char(&mut out, c));
    out
}

/// One file, directory, or symlink within a scanned directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    /// Name within the parent directory (not a full path), as produced by
    /// [`escape_name`].
    pub name: CompactString,

    /// Raw file name, kept only when it differs from `name`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os_name: Option<OsString>,

    /// Size in bytes. Aggregate of all descendants for directories.
    pub size: u64,

    /// Treated as a directory for traversal (includes symlinks to directories).
    pub is_dir: bool,

    /// Name starts with a dot.
    pub is_hidden: bool,

    /// The entry itself is a symbolic link.
    pub is_symlink: bool,

    /// Binary by extension or content sniff. Files only.
    pub is_binary: bool,

    /// Number of lines; 0 means unknown, not applicable, or binary.
    pub line_count: u64,

    /// Share of the parent total, 0 to 100.
    pub percentage: f64,

    /// Number of files anywhere beneath this directory.
    pub child_files: u64,

    /// Number of directories anywhere beneath this directory.
    pub child_dirs: u64,

    /// Last modification time.
    #[serde(with = "crate::timestamp")]
    pub modified: SystemTime,
}

impl Entry {
    /// Create a file entry, classifying hidden and binary-by-extension from the name.
    pub fn file(name: impl Into<CompactString>) -> Self {
        let name = name.into();
        Self {
            is_hidden: is_hidden_name(&name),
            is_binary: is_binary_extension(&name),
            name,
            os_name: None,
            size: 0,
            is_dir: false,
            is_symlink: false,
            line_count: 0,
            percentage: 0.0,
            child_files: 0,
            child_dirs: 0,
            modified: UNIX_EPOCH,
        }
    }

    /// Create a directory entry whose aggregate size is not yet known.
    pub fn directory(name: impl Into<CompactString>) -> Self {
        let name = name.into();
        Self {
            is_hidden: is_hidden_name(&name),
            name,
            os_name: None,
            size: 0,
            is_dir: true,
            is_symlink: false,
            is_binary: false,
            line_count: 0,
            percentage: 0.0,
            child_files: 0,
            child_dirs: 0,
            modified: UNIX_EPOCH,
        }
    }

    /// Set the size in bytes.
    pub fn with_size(mut self, size: u64) -> Self {
        self.size = size;
        self
    }

    /// Mark the entry as a symbolic link.
    pub fn with_symlink(mut self, is_symlink: bool) -> Self {
        self.is_symlink = is_symlink;
        self
    }

    /// Set the modification time.
    pub fn with_modified(mut self, modified: SystemTime) -> Self {
        self.modified = modified;
        self
    }

    /// Attach the raw file name the display name was escaped from.
    pub fn with_os_name(mut self, os_name: OsString) -> Self {
        self.os_name = (os_name.to_str() != Some(self.name.as_str())).then_some(os_name);
        self
    }

    /// Name to join onto the parent directory for filesystem access.
    pub fn fs_name(&self) -> &OsStr {
        match &self.os_name {
            Some(raw) => raw,
            None => OsStr::new(self.name.as_str()),
        }
    }

    /// Whether a line count makes sense for this entry.
    pub fn is_countable(&self) -> bool {
        !self.is_dir && !self.is_binary
    }

    /// Recompute the percentage against a parent total.
    pub fn update_percentage(&mut self, total: u64) {
        self.percentage = if total > 0 {
            self.size as f64 / total as f64 * 100.0
        } else {
            0.0
        };
    }
}

/// Sort entries by size, largest first. Equal sizes keep their relative order.
pub fn sort_by_size(entries: &mut [Entry]) {
    entries.sort_by(|a, b| b.size.cmp(&a.size));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_extension() {
        assert!(is_binary_extension("photo.png"));
        assert!(is_binary_extension("ARCHIVE.ZIP"));
        assert!(is_binary_extension("lib.so"));
        assert!(!is_binary_extension("main.rs"));
        assert!(!is_binary_extension("Makefile"));
        assert!(!is_binary_extension(".gitignore"));
    }

    #[test]
    fn test_file_entry_classification() {
        let entry = Entry::file(".env");
        assert!(entry.is_hidden);
        assert!(!entry.is_dir);
        assert!(!entry.is_binary);

        let entry = Entry::file("logo.svg");
        assert!(entry.is_binary);
        assert!(!entry.is_countable());
    }

    #[test]
    fn test_directory_entry() {
        let entry = Entry::directory(".git");
        assert!(entry.is_dir);
        assert!(entry.is_hidden);
        assert!(!entry.is_countable());
    }

    #[test]
    fn test_sort_is_stable() {
        let mut entries = vec![
            Entry::file("a").with_size(10),
            Entry::file("b").with_size(30),
            Entry::file("c").with_size(10),
            Entry::file("d").with_size(20),
        ];
        sort_by_size(&mut entries);
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["b", "d", "a", "c"]);
    }

    #[test]
    fn test_escape_name_keeps_plain_names() {
        assert_eq!(escape_name(OsStr::new("main.rs")), "main.rs");
        assert_eq!(escape_name(OsStr::new("日本語.txt")), "日本語.txt");
        assert_eq!(escape_name(OsStr::new(r"a\b")), r"a\\b");
    }

    #[cfg(unix)]
    #[test]
    fn test_escape_name_distinguishes_invalid_bytes() {
        use std::os::unix::ffi::OsStrExt;

        let ff = escape_name(OsStr::from_bytes(b"a\xff"));
        let fe = escape_name(OsStr::from_bytes(b"a\xfe"));
        let literal = escape_name(OsStr::new(r"a\xFF"));

        assert_eq!(ff, r"a\xFF");
        assert_eq!(fe, r"a\xFE");
        assert_ne!(ff, literal);
    }

    #[cfg(unix)]
    #[test]
    fn test_fs_name_uses_raw_name() {
        use std::os::unix::ffi::OsStrExt;

        let raw = OsStr::from_bytes(b"data\xff.txt").to_os_string();
        let entry = Entry::file(escape_name(&raw)).with_os_name(raw.clone());
        assert_eq!(entry.fs_name(), raw.as_os_str());

        let plain = Entry::file("plain.txt").with_os_name(OsString::from("plain.txt"));
        assert!(plain.os_name.is_none());
        assert_eq!(plain.fs_name(), OsStr::new("plain.txt"));
    }

    #[test]
    fn test_pre_epoch_modified_serializes() {
        let modified = UNIX_EPOCH - std::time::Duration::from_secs(100);
        let entry = Entry::file("old.txt").with_modified(modified);
        let json = serde_json::to_string(&entry).unwrap();
        let back: Entry = serde_json::from_str(&json).unwrap();
        assert_eq!(back, entry);
        assert!(!json.contains("os_name"));
    }

    #[test]
    fn test_update_percentage_zero_total() {
        let mut entry = Entry::file("x").with_size(5);
        entry.update_percentage(0);
        assert_eq!(entry.percentage, 0.0);
        entry.update_percentage(20);
        assert!((entry.percentage - 25.0).abs() < f64::EPSILON);
    }
}
