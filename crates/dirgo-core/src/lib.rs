//! Core types and configuration for dirgo.
//!
//! This crate provides the data model shared by the scanner, the cache and
//! any frontend: directory entries, scan results, view filters, scan errors
//! and scan configuration. It performs no I/O.

mod config;
mod entry;
mod error;
mod result;
mod timestamp;

pub use config::{MAX_SCAN_WORKERS, ScanConfig, ScanConfigBuilder, available_parallelism};
pub use entry::{Entry, escape_name, is_binary_extension, is_hidden_name, sort_by_size};
pub use error::ScanError;
pub use result::{EntryFilter, ScanResult, TOP_ENTRIES, ViewFilter};
