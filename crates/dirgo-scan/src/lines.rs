//! Streaming line counting with binary sniffing.
//!
//! Files are read in fixed-size chunks borrowed from a [`BufferPool`]. The
//! first chunk doubles as the binary sniff: a zero byte in its first
//! `sniff_len` bytes marks the file as binary and stops the count. Later
//! chunks are never sniffed.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, Read};
use std::ops::{Deref, DerefMut};
use std::path::Path;
use std::sync::LazyLock;

use compact_str::CompactString;
use dashmap::DashMap;
use parking_lot::Mutex;
use rayon::ThreadPool;
use rayon::prelude::*;
use tracing::debug;

use dirgo_core::{Entry, ScanConfig, ScanError};

use crate::pool::build_pool;

/// Default read chunk size.
pub const DEFAULT_BUFFER_SIZE: usize = 32 * 1024;

/// Default number of leading bytes inspected for a zero byte.
pub const DEFAULT_SNIFF_LEN: usize = 512;

/// Buffers kept idle per pool; extra returns are dropped.
const MAX_IDLE_BUFFERS: usize = 64;

static DEFAULT_POOL: LazyLock<BufferPool> =
    LazyLock::new(|| BufferPool::new(DEFAULT_BUFFER_SIZE));

/// Outcome of counting one file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineCount {
    /// Newline bytes seen. Always 0 for binary files.
    pub lines: u64,
    /// A zero byte was found in the sniffed prefix.
    pub is_binary: bool,
}

impl LineCount {
    const BINARY: Self = Self {
        lines: 0,
        is_binary: true,
    };
}

/// Reusable read buffers, safe to check out from many threads.
#[derive(Debug)]
pub struct BufferPool {
    idle: Mutex<Vec<Vec<u8>>>,
    buffer_size: usize,
}

impl BufferPool {
    /// Create an empty pool handing out buffers of `buffer_size` bytes.
    pub fn new(buffer_size: usize) -> Self {
        Self {
            idle: Mutex::new(Vec::new()),
            buffer_size: buffer_size.max(1),
        }
    }

    /// Borrow a buffer. It returns to the pool when dropped.
    pub fn checkout(&self) -> PooledBuffer<'_> {
        let buf = self
            .idle
            .lock()
            .pop()
            .unwrap_or_else(|| vec![0; self.buffer_size]);
        PooledBuffer { pool: self, buf }
    }

    /// Number of buffers currently waiting for reuse.
    pub fn idle_count(&self) -> usize {
        self.idle.lock().len()
    }

    fn give_back(&self, buf: Vec<u8>) {
        let mut idle = self.idle.lock();
        if idle.len() < MAX_IDLE_BUFFERS {
            idle.push(buf);
        }
    }
}

/// A buffer checked out of a [`BufferPool`].
pub struct PooledBuffer<'a> {
    pool: &'a BufferPool,
    buf: Vec<u8>,
}

impl Deref for PooledBuffer<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.buf
    }
}

impl DerefMut for PooledBuffer<'_> {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.buf
    }
}

impl Drop for PooledBuffer<'_> {
    fn drop(&mut self) {
        self.pool.give_back(std::mem::take(&mut self.buf));
    }
}

/// Count lines in a file using the shared default buffer pool.
///
/// Directories, empty files, and files larger than `max_size` yield a zero
/// count without being read. Stat and read failures are returned as errors.
pub fn count_lines(path: &Path, max_size: u64) -> io::Result<LineCount> {
    count_lines_with(path, max_size, &DEFAULT_POOL, DEFAULT_SNIFF_LEN)
}

/// Count lines in a file with an explicit buffer pool and sniff length.
pub fn count_lines_with(
    path: &Path,
    max_size: u64,
    pool: &BufferPool,
    sniff_len: usize,
) -> io::Result<LineCount> {
    let metadata = fs::metadata(path)?;
    if metadata.is_dir() || metadata.len() == 0 || metadata.len() > max_size {
        return Ok(LineCount::default());
    }

    let mut file = File::open(path)?;
    let mut buf = pool.checkout();

    let mut read = read_chunk(&mut file, &mut buf)?;
    let head = &buf[..read.min(sniff_len)];
    if memchr::memchr(0, head).is_some() {
        return Ok(LineCount::BINARY);
    }

    let mut lines = count_newlines(&buf[..read]);
    let mut total = read as u64;

    while read > 0 && total < max_size {
        read = read_chunk(&mut file, &mut buf)?;
        lines += count_newlines(&buf[..read]);
        total += read as u64;
    }

    Ok(LineCount {
        lines,
        is_binary: false,
    })
}

fn count_newlines(chunk: &[u8]) -> u64 {
    memchr::memchr_iter(b'\n', chunk).count() as u64
}

/// Read once, retrying on interruption. Returns 0 at end of file.
fn read_chunk(file: &mut File, buf: &mut [u8]) -> io::Result<usize> {
    loop {
        match file.read(buf) {
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            result => return result,
        }
    }
}

/// Line counter for single files and whole listings.
pub struct LineCounter {
    max_size: u64,
    sniff_len: usize,
    buffers: BufferPool,
    pool: ThreadPool,
}

impl LineCounter {
    /// Create a counter sized from the scan configuration.
    pub fn new(config: &ScanConfig) -> Result<Self, ScanError> {
        Ok(Self {
            max_size: config.max_line_count_size,
            sniff_len: config.binary_sniff_len,
            buffers: BufferPool::new(config.line_buffer_size),
            pool: build_pool("lines", config.effective_stat_workers())?,
        })
    }

    /// Count lines in one file.
    pub fn count(&self, path: &Path) -> io::Result<LineCount> {
        count_lines_with(path, self.max_size, &self.buffers, self.sniff_len)
    }

    /// Count lines of every countable entry in `dir`.
    ///
    /// Directories and entries already known to be binary are skipped. Only
    /// text files with at least one line appear in the result; failures are
    /// logged and left out.
    pub fn count_all(&self, entries: &[Entry], dir: &Path) -> HashMap<CompactString, u64> {
        let counts = DashMap::new();

        self.pool.install(|| {
            entries
                .par_iter()
                .filter(|entry| entry.is_countable())
                .for_each(|entry| {
                    let path = dir.join(entry.fs_name());
                    match self.count(&path) {
                        Ok(count) if !count.is_binary && count.lines > 0 => {
                            counts.insert(entry.name.clone(), count.lines);
                        }
                        Ok(_) => {}
                        Err(err) => {
                            debug!(path = %path.display(), error = %err, "line count failed");
                        }
                    }
                });
        });

        counts.into_iter().collect()
    }
}
