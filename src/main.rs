//! dirgo - a fast disk usage analyzer with cached, incrementally refreshed scans.
//!
//! Usage:
//!   dirgo [PATH]             Show the largest entries of PATH
//!   dirgo [PATH] --lines     Also count lines of text files
//!   dirgo --help             Show help

use std::io::{IsTerminal, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use color_eyre::eyre::{Context, Report, Result, eyre};
use tokio::sync::mpsc;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use dirgo_cache::{CacheConfig, DiskCache, ScanCache};
use dirgo_core::{Entry, EntryFilter, ScanConfig, ScanResult, ViewFilter};
use dirgo_scan::{Dispatcher, ProgressReporter, ScanEvent, ScanService};

/// How often the progress line on stderr is redrawn.
const PROGRESS_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Parser)]
#[command(
    name = "dirgo",
    version,
    about = "A fast disk usage analyzer",
    long_about = "dirgo shows which entries of a directory use the most space.\n\n\
                  Results are cached between runs; an unchanged directory is \
                  shown without walking it again."
)]
struct Cli {
    /// Path to analyze (defaults to current directory)
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Number of entries to show (0 = all)
    #[arg(short = 'n', long, default_value = "20")]
    top: usize,

    /// Count lines of text files
    #[arg(short, long)]
    lines: bool,

    /// Neither read nor write the scan cache
    #[arg(long)]
    no_cache: bool,

    /// Show hidden entries
    #[arg(short, long)]
    all: bool,

    /// Show only directories
    #[arg(long, conflicts_with = "files")]
    dirs: bool,

    /// Show only files
    #[arg(long)]
    files: bool,

    /// Show only entries whose name contains this text
    #[arg(short, long)]
    search: Option<String>,

    /// Log debug output to stderr
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn filter(&self) -> EntryFilter {
        let view = if self.dirs {
            ViewFilter::DirsOnly
        } else if self.files {
            ViewFilter::FilesOnly
        } else {
            ViewFilter::All
        };

        EntryFilter {
            show_hidden: self.all,
            view,
            search: self.search.clone().unwrap_or_default(),
            top_only: false,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_logging(cli.verbose);

    run(cli).await
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let path = cli.path.canonicalize().context("Invalid path")?;

    let cache_config = CacheConfig::default();
    let cache = ScanCache::from_config(&cache_config);
    let disk = if cli.no_cache {
        None
    } else {
        match DiskCache::from_config(&cache_config) {
            Ok(disk) => {
                disk.load(&cache);
                Some(disk)
            }
            Err(err) => {
                warn!(error = %err, "scan cache disabled");
                None
            }
        }
    };

    let service = ScanService::new(ScanConfig::default()).context("Failed to start scanner")?;
    let (dispatcher, mut events) = Dispatcher::new(Arc::new(service));

    let cached = cache.get(&path);
    let progress = match &cached {
        Some(cached) => {
            eprintln!("Refreshing {}...", path.display());
            dispatcher.refresh(path.clone(), cached.clone())
        }
        None => {
            eprintln!("Scanning {}...", path.display());
            dispatcher.scan(path.clone())
        }
    };

    let mut result = wait_for_scan(&mut events, &progress, cached)
        .await
        .with_context(|| format!("Failed to scan {}", path.display()))?;

    if cli.lines {
        dispatcher.count_all_lines(result.entries.clone(), result.path.clone());
        if let Some(ScanEvent::BatchLineCount { counts, .. }) = events.recv().await {
            result.apply_line_counts(&counts);
        }
    }

    print_listing(&result, &cli.filter(), cli.top);

    cache.insert(result);
    if let Some(disk) = &disk {
        if let Err(err) = disk.save(&cache) {
            warn!(error = %err, "failed to save scan cache");
        }
    }

    Ok(())
}

/// Wait for the scan or refresh result, redrawing progress while it runs.
async fn wait_for_scan(
    events: &mut mpsc::Receiver<ScanEvent>,
    progress: &ProgressReporter,
    cached: Option<ScanResult>,
) -> Result<ScanResult> {
    let draw = std::io::stderr().is_terminal();
    let mut ticker = tokio::time::interval(PROGRESS_INTERVAL);

    loop {
        tokio::select! {
            event = events.recv() => {
                if draw {
                    eprint!("\r\x1b[2K");
                }
                return match event {
                    Some(ScanEvent::Scanned(result)) => Ok(result),
                    Some(ScanEvent::UpToDate { .. }) => {
                        cached.ok_or_else(|| eyre!("refresh reported no change without a cached scan"))
                    }
                    Some(ScanEvent::Failed { error, .. }) => Err(Report::new(error)),
                    Some(other) => Err(eyre!("unexpected event: {other:?}")),
                    None => Err(eyre!("scan task ended without a result")),
                };
            }
            _ = ticker.tick() => {
                if draw {
                    draw_progress(progress);
                }
            }
        }
    }
}

fn draw_progress(progress: &ProgressReporter) {
    let snapshot = progress.snapshot();
    eprint!(
        "\r\x1b[2K {} files, {} dirs, {} ({:.0} files/s)",
        snapshot.files_scanned,
        snapshot.dirs_scanned,
        format_size(snapshot.bytes_scanned),
        snapshot.files_per_second()
    );
    let _ = std::io::stderr().flush();
}

fn print_listing(result: &ScanResult, filter: &EntryFilter, top: usize) {
    let (deep_files, deep_dirs) = result.deep_totals();

    println!();
    println!("{}", "─".repeat(72));
    println!(
        " {} - {}",
        result.path.display(),
        format_size(result.total_size)
    );
    println!(
        " {} files, {} directories ({} files, {} directories in total)",
        result.total_files, result.total_dirs, deep_files, deep_dirs
    );
    println!("{}", "─".repeat(72));
    println!();

    let visible = result.filtered(filter);
    let limit = if top == 0 { visible.len() } else { top };

    for entry in visible.iter().take(limit) {
        print_entry(entry);
    }

    let remaining = visible.len().saturating_sub(limit);
    if remaining > 0 {
        println!("  ... and {} more", remaining);
    }
}

fn print_entry(entry: &Entry) {
    let marker = if entry.is_dir { "/" } else { "" };
    let lines = if entry.line_count > 0 {
        format!("{} lines", entry.line_count)
    } else {
        String::new()
    };

    println!(
        "  {:<40} {:>10} {:>5.1}% {} {}",
        truncate(&format!("{}{}", entry.name, marker), 40),
        format_size(entry.size),
        entry.percentage,
        make_bar(entry.percentage / 100.0, 10),
        lines
    );
}

/// Create a simple ASCII bar.
fn make_bar(ratio: f64, width: usize) -> String {
    let filled = ((ratio * width as f64).round() as usize).min(width);
    let empty = width - filled;
    format!("[{}{}]", "█".repeat(filled), "░".repeat(empty))
}

/// Format size in human-readable form.
fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}

/// Truncate a string to `max_chars` characters.
fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_chars.saturating_sub(1)).collect();
        format!("{kept}…")
    }
}
