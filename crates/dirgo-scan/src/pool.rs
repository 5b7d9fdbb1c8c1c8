//! Bounded worker pools.

use rayon::{ThreadPool, ThreadPoolBuilder};

use dirgo_core::ScanError;

/// Build a named rayon pool with a fixed number of threads.
pub(crate) fn build_pool(name: &'static str, threads: usize) -> Result<ThreadPool, ScanError> {
    ThreadPoolBuilder::new()
        .num_threads(threads.max(1))
        .thread_name(move |i| format!("dirgo-{name}-{i}"))
        .build()
        .map_err(|e| ScanError::WorkerPool {
            message: e.to_string(),
        })
}
