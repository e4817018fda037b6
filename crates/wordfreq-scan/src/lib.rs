//! Concurrent word counting pipeline for wordfreq.
//!
//! # Overview
//!
//! `wordfreq-scan` walks a directory tree and counts the words of every
//! matching file:
//!
//! - **Walker** feeds file paths into a bounded queue via jwalk
//! - **Worker pool** counts one file at a time per worker
//! - **Shards** own disjoint slices of the vocabulary, chosen by a stable
//!   hash of each word, so totals are merged without locks
//! - **Top-K** selection runs once all shards have reported
//!
//! Bounded channels connect every stage, so a slow stage pushes back on the
//! one feeding it.
//!
//! # Example
//!
//! ```rust,no_run
//! use tokio_util::sync::CancellationToken;
//! use wordfreq_scan::{CountConfig, WordCounter};
//!
//! # async fn run() -> Result<(), wordfreq_scan::CountError> {
//! let config = CountConfig::new("/path/to/corpus");
//! let report = WordCounter::new()
//!     .count(&config, CancellationToken::new())
//!     .await?;
//!
//! for entry in &report.top {
//!     println!("{}: {}", entry.word, entry.count);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Progress Monitoring
//!
//! Subscribe before starting the run:
//!
//! ```rust,no_run
//! use wordfreq_scan::{CountEvent, WordCounter};
//!
//! let counter = WordCounter::new();
//! let mut events = counter.subscribe();
//!
//! tokio::spawn(async move {
//!     while let Ok(event) = events.recv().await {
//!         if let CountEvent::FileCompleted { path, lines, .. } = event {
//!             println!("{}: {lines} lines", path.display());
//!         }
//!     }
//! });
//! ```

mod counter;
mod event;
mod pool;
mod processor;
mod router;
mod shards;
mod walker;

pub use counter::{CountReport, PhaseTimings, WordCounter};
pub use event::{CountEvent, DEFAULT_EVENT_CAPACITY};
pub use pool::{PoolStats, WorkerPool};
pub use processor::{FileCounts, count_lines, process_file};
pub use router::{ShardBatch, ShardRouter, fnv1a_32, shard_index};
pub use shards::{ShardSet, spawn_shards};
pub use walker::{WalkSummary, resolve_root, walk_files};

// Re-export core types for convenience
pub use wordfreq_core::{
    CountConfig, CountError, FileReadError, FrequencyTable, RunPhase, ScanWarning, ShardTotal,
    WarningKind, WordCount, WordCounts,
};
