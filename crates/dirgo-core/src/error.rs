//! Error types for scanning operations.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that abort a scan. Failures below the scanned directory are
/// absorbed during aggregation and never surface here.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The scanned directory could not be read.
    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// The scanned directory does not exist.
    #[error("Path not found: {path}")]
    NotFound { path: PathBuf },

    /// Any other I/O failure on the scanned directory.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Scanned path is not a directory.
    #[error("Not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// A worker pool could not be started.
    #[error("Failed to start worker pool: {message}")]
    WorkerPool { message: String },

    /// A background task panicked or was aborted.
    #[error("Scan task failed: {message}")]
    TaskFailed { message: String },
}

impl ScanError {
    /// Classify an I/O error on `path` by its kind.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            _ => Self::Io { path, source },
        }
    }

    /// The path the error refers to, if any.
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::PermissionDenied { path }
            | Self::NotFound { path }
            | Self::Io { path, .. }
            | Self::NotADirectory { path } => Some(path),
            Self::WorkerPool { .. } | Self::TaskFailed { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_error_io() {
        let err = ScanError::io(
            "/test/path",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(matches!(err, ScanError::PermissionDenied { .. }));

        let err = ScanError::io(
            "/test/path",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(matches!(err, ScanError::NotFound { .. }));
        assert_eq!(err.path(), Some(&PathBuf::from("/test/path")));
    }

    #[test]
    fn test_scan_error_display() {
        let err = ScanError::NotADirectory {
            path: PathBuf::from("/etc/hosts"),
        };
        assert_eq!(err.to_string(), "Not a directory: /etc/hosts");
    }
}
