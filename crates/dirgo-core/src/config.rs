//! Scan configuration types.

use std::num::NonZeroUsize;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// Upper bound on concurrent subdirectory walkers.
pub const MAX_SCAN_WORKERS: usize = 16;

/// Configuration for scanning and line counting.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct ScanConfig {
    /// Concurrent subdirectory walkers (0 = auto-detect, capped at 16).
    #[builder(default = "0")]
    #[serde(default)]
    pub scan_workers: usize,

    /// Threads used to stat immediate files (0 = auto-detect).
    #[builder(default = "0")]
    #[serde(default)]
    pub stat_workers: usize,

    /// Stat immediate files in parallel only above this many files.
    #[builder(default = "20")]
    #[serde(default = "default_parallel_stat_threshold")]
    pub parallel_stat_threshold: usize,

    /// Files larger than this are never line-counted.
    #[builder(default = "10 * 1024 * 1024")]
    #[serde(default = "default_max_line_count_size")]
    pub max_line_count_size: u64,

    /// Read chunk size for line counting.
    #[builder(default = "32 * 1024")]
    #[serde(default = "default_line_buffer_size")]
    pub line_buffer_size: usize,

    /// Bytes at the start of a file inspected for a zero byte.
    #[builder(default = "512")]
    #[serde(default = "default_binary_sniff_len")]
    pub binary_sniff_len: usize,
}

fn default_parallel_stat_threshold() -> usize {
    20
}

fn default_max_line_count_size() -> u64 {
    10 * 1024 * 1024
}

fn default_line_buffer_size() -> usize {
    32 * 1024
}

fn default_binary_sniff_len() -> usize {
    512
}

impl ScanConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if self.line_buffer_size == Some(0) {
            return Err("Line buffer size must be greater than zero".to_string());
        }
        if self.binary_sniff_len == Some(0) {
            return Err("Binary sniff length must be greater than zero".to_string());
        }
        Ok(())
    }
}

impl ScanConfig {
    /// Create a new scan config builder.
    pub fn builder() -> ScanConfigBuilder {
        ScanConfigBuilder::default()
    }

    /// Number of subdirectory walkers to run.
    pub fn effective_scan_workers(&self) -> usize {
        match self.scan_workers {
            0 => available_parallelism().min(MAX_SCAN_WORKERS),
            n => n,
        }
    }

    /// Number of threads used to stat immediate files.
    pub fn effective_stat_workers(&self) -> usize {
        match self.stat_workers {
            0 => available_parallelism(),
            n => n,
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            scan_workers: 0,
            stat_workers: 0,
            parallel_stat_threshold: default_parallel_stat_threshold(),
            max_line_count_size: default_max_line_count_size(),
            line_buffer_size: default_line_buffer_size(),
            binary_sniff_len: default_binary_sniff_len(),
        }
    }
}

/// Number of CPUs available to this process, at least 1.
pub fn available_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = ScanConfig::builder()
            .scan_workers(4usize)
            .parallel_stat_threshold(100usize)
            .build()
            .unwrap();

        assert_eq!(config.scan_workers, 4);
        assert_eq!(config.effective_scan_workers(), 4);
        assert_eq!(config.parallel_stat_threshold, 100);
        assert_eq!(config.max_line_count_size, 10 * 1024 * 1024);
    }

    #[test]
    fn test_config_rejects_zero_buffer() {
        let result = ScanConfig::builder().line_buffer_size(0usize).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_auto_workers_are_capped() {
        let config = ScanConfig::default();
        let workers = config.effective_scan_workers();
        assert!(workers >= 1);
        assert!(workers <= MAX_SCAN_WORKERS);
        assert_eq!(config.effective_stat_workers(), available_parallelism());
    }

    #[test]
    fn test_config_deserialize_defaults() {
        let config: ScanConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.parallel_stat_threshold, 20);
        assert_eq!(config.binary_sniff_len, 512);
    }
}
