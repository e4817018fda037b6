//! wordfreq - Count word frequencies across a directory tree.
//!
//! Usage:
//!   wordfreq [PATH]              Count words in every .txt file under PATH
//!   wordfreq PATH -n 25          Show the 25 most frequent words
//!   wordfreq PATH --format json  Emit the report as JSON
//!   wordfreq --help              Show help

use std::path::PathBuf;

use clap::{ArgAction, CommandFactory, Parser, ValueEnum};
use color_eyre::eyre::{Context, Result};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use wordfreq_core::{CountConfig, DEFAULT_MAX_LINE_LEN};
use wordfreq_scan::{CountEvent, CountReport, DEFAULT_EVENT_CAPACITY, WordCounter};

#[derive(Parser)]
#[command(
    name = "wordfreq",
    version,
    about = "Count word frequencies across a directory tree",
    long_about = "wordfreq walks a directory, counts the words of every matching \
                  text file in parallel, and reports the most frequent ones."
)]
struct Cli {
    /// Directory to scan
    path: Option<PathBuf>,

    /// Number of top words to show
    #[arg(short = 'n', long, default_value = "10")]
    top: usize,

    /// Number of file workers (0 = one per CPU)
    #[arg(short, long, default_value = "0")]
    workers: usize,

    /// Number of aggregation shards
    #[arg(short, long, default_value = "4")]
    shards: usize,

    /// File extension to include (repeatable)
    #[arg(short, long = "ext", default_value = "txt")]
    extensions: Vec<String>,

    /// Longest accepted line in bytes; files with longer lines are skipped
    #[arg(long, default_value_t = DEFAULT_MAX_LINE_LEN)]
    max_line_len: usize,

    /// Follow symbolic links to directories
    #[arg(long)]
    follow_symlinks: bool,

    /// Output format
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,

    /// Suppress per-file lines
    ///
    /// Per-file lines are buffered up to --progress-buffer events; if output
    /// falls further behind, the oldest are dropped and a count is printed.
    #[arg(short, long)]
    quiet: bool,

    /// Progress events buffered for per-file output
    #[arg(long, default_value_t = DEFAULT_EVENT_CAPACITY)]
    progress_buffer: usize,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    let Some(path) = cli.path.clone() else {
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let config = CountConfig::builder()
        .root(path)
        .extensions(cli.extensions.clone())
        .workers(cli.workers)
        .shards(cli.shards)
        .top_k(cli.top)
        .max_line_len(cli.max_line_len)
        .follow_symlinks(cli.follow_symlinks)
        .build()
        .wrap_err("Invalid options")?;

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, cancelling");
            interrupt.cancel();
        }
    });

    let counter = WordCounter::with_event_capacity(cli.progress_buffer);
    let printer = match cli.format {
        OutputFormat::Text if !cli.quiet => Some(spawn_file_printer(counter.subscribe())),
        _ => None,
    };

    let result = counter.count(&config, cancel).await;
    // Closes the event stream so the printer finishes.
    drop(counter);
    if let Some(printer) = printer {
        let _ = printer.await;
    }

    let report = result.wrap_err("Word count failed")?;

    match cli.format {
        OutputFormat::Text => print_report(&report, config.top_k),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    Ok(())
}

/// Install the stderr log subscriber. `RUST_LOG` wins over `-v`.
fn init_logging(verbose: u8) -> Result<()> {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .context("Invalid log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    Ok(())
}

/// Print one line per finished file as events arrive.
fn spawn_file_printer(mut events: broadcast::Receiver<CountEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    if let Some(line) = file_line(&event) {
                        println!("{line}");
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "progress output fell behind");
                    println!("{}", dropped_line(skipped));
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

/// Render a per-file event; phase changes print nothing.
fn file_line(event: &CountEvent) -> Option<String> {
    match event {
        CountEvent::FileCompleted {
            worker,
            path,
            lines,
        } => Some(format!(
            "[Worker {worker}] File: {}, Lines: {lines}",
            path.display()
        )),
        CountEvent::FileFailed {
            worker,
            path,
            error,
        } => Some(format!(
            "[Worker {worker}] Error reading {}: {error}",
            path.display()
        )),
        CountEvent::PhaseChanged(_) => None,
    }
}

fn dropped_line(skipped: u64) -> String {
    format!("[Progress] {skipped} events dropped (raise --progress-buffer)")
}

/// Print the summary, ranking and timings.
fn print_report(report: &CountReport, top_k: usize) {
    println!(
        "Found {} text files. Using {} workers.",
        report.files_found, report.workers
    );
    if report.files_failed > 0 {
        println!("Skipped {} unreadable files.", report.files_failed);
    }
    if !report.warnings.is_empty() {
        println!("{} warning(s) during walk", report.warnings.len());
    }
    println!(
        "Read {} lines ({}), {} words, {} distinct.",
        report.total_lines,
        format_size(report.bytes_read),
        report.total_words,
        report.vocabulary_size
    );

    println!("Top {top_k} words:");
    for entry in &report.top {
        println!("{}: {}", entry.word, entry.count);
    }

    println!("Aggregation time: {:?}", report.timings.aggregation);
    println!("Top words calculation time: {:?}", report.timings.selection);
    println!("Total execution time: {:?}", report.timings.total);
}

/// Format size in human-readable form.
fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wordfreq_core::RunPhase;

    #[test]
    fn test_file_lines() {
        let done = CountEvent::FileCompleted {
            worker: 2,
            path: PathBuf::from("docs/a.txt"),
            lines: 14,
        };
        assert_eq!(
            file_line(&done).unwrap(),
            "[Worker 2] File: docs/a.txt, Lines: 14"
        );

        let failed = CountEvent::FileFailed {
            worker: 0,
            path: PathBuf::from("docs/b.txt"),
            error: "permission denied".to_string(),
        };
        assert_eq!(
            file_line(&failed).unwrap(),
            "[Worker 0] Error reading docs/b.txt: permission denied"
        );

        assert!(file_line(&CountEvent::PhaseChanged(RunPhase::Walking)).is_none());
    }

    #[test]
    fn test_progress_buffer_flag() {
        let cli = Cli::parse_from(["wordfreq", "corpus"]);
        assert_eq!(cli.progress_buffer, DEFAULT_EVENT_CAPACITY);

        let cli = Cli::parse_from(["wordfreq", "corpus", "--progress-buffer", "50000"]);
        assert_eq!(cli.progress_buffer, 50000);
        assert!(dropped_line(7).contains("7 events dropped"));
    }
}
