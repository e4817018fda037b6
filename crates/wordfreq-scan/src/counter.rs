//! End-to-end counting pipeline.
//!
//! ```text
//! walker ──paths──▶ worker pool ──batches by hash(word)──▶ shards
//!                                                            │
//!                        top-K ◀── merge ◀── one total per shard
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use wordfreq_analyze::top_k;
use wordfreq_core::{
    CountConfig, CountError, FrequencyTable, PhaseTracker, RunPhase, ScanWarning, WordCount,
};

use crate::event::{CountEvent, DEFAULT_EVENT_CAPACITY};
use crate::pool::WorkerPool;
use crate::shards::spawn_shards;
use crate::walker::{resolve_root, walk_files};

/// Wall time spent in each phase of a run.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct PhaseTimings {
    /// Directory traversal, with workers counting alongside.
    pub walk: Duration,
    /// Draining the queue after the walk finished, up to the pool join.
    pub processing: Duration,
    /// Collecting shard totals and merging them.
    pub aggregation: Duration,
    /// Top-K selection.
    pub selection: Duration,
    /// Whole run.
    pub total: Duration,
}

impl PhaseTimings {
    fn from_tracker(phases: &PhaseTracker) -> Self {
        Self {
            walk: phases.duration(RunPhase::Walking),
            processing: phases.duration(RunPhase::Processing),
            aggregation: phases.duration(RunPhase::Aggregating),
            selection: phases.duration(RunPhase::Selecting),
            total: phases.elapsed(),
        }
    }
}

/// Result of a completed run.
#[derive(Debug, Clone, Serialize)]
pub struct CountReport {
    /// Canonical root that was walked.
    pub root: PathBuf,
    /// Matching files found by the walker.
    pub files_found: u64,
    /// Files counted successfully.
    pub files_processed: u64,
    /// Files skipped after read errors.
    pub files_failed: u64,
    /// Lines read across all counted files.
    pub total_lines: u64,
    /// Bytes read across all counted files.
    pub bytes_read: u64,
    /// Worker count used.
    pub workers: usize,
    /// Shard count used.
    pub shards: usize,
    /// Distinct words.
    pub vocabulary_size: usize,
    /// Sum of all word counts.
    pub total_words: u64,
    /// Most frequent words, highest first.
    pub top: Vec<WordCount>,
    /// Traversal problems below the root.
    pub warnings: Vec<ScanWarning>,
    /// Phase durations.
    pub timings: PhaseTimings,
    /// Full merged table.
    #[serde(skip)]
    pub table: FrequencyTable,
}

/// Runs the counting pipeline and broadcasts progress.
pub struct WordCounter {
    events_tx: broadcast::Sender<CountEvent>,
}

impl WordCounter {
    /// Create a counter with the default event buffer.
    pub fn new() -> Self {
        Self::with_event_capacity(DEFAULT_EVENT_CAPACITY)
    }

    /// Create a counter whose event channel buffers `capacity` events per
    /// subscriber before older ones are dropped.
    pub fn with_event_capacity(capacity: usize) -> Self {
        let (events_tx, _) = broadcast::channel(capacity.max(1));
        Self { events_tx }
    }

    /// Subscribe to progress events.
    ///
    /// The stream ends once the counter is dropped.
    pub fn subscribe(&self) -> broadcast::Receiver<CountEvent> {
        self.events_tx.subscribe()
    }

    /// Count words under `config.root`.
    ///
    /// Returns [`CountError::Interrupted`] if `cancel` fires first. Every task
    /// the run spawned has exited by the time this returns.
    pub async fn count(
        &self,
        config: &CountConfig,
        cancel: CancellationToken,
    ) -> Result<CountReport, CountError> {
        config
            .validate()
            .map_err(|message| CountError::InvalidConfig { message })?;

        let mut phases = PhaseTracker::new();
        let root = resolve_root(&config.root)?;
        let workers = config.effective_workers();

        info!(
            root = %root.display(),
            workers,
            shards = config.shards,
            "starting word count"
        );

        let (router, shard_set) = spawn_shards(config.shards, config.shard_capacity, cancel.clone());
        let (queue_tx, queue_rx) = async_channel::bounded(config.queue_capacity);
        let pool = WorkerPool::spawn(
            workers,
            queue_rx,
            router,
            config.max_line_len,
            self.events_tx.clone(),
            cancel.clone(),
        );

        self.enter(&mut phases, RunPhase::Walking)?;
        let walk_root = root.clone();
        let walk_config = config.clone();
        let walk_cancel = cancel.clone();
        let walk = tokio::task::spawn_blocking(move || {
            walk_files(&walk_root, &walk_config, queue_tx, &walk_cancel)
        })
        .await
        .unwrap_or_else(|e| {
            Err(CountError::TaskFailed {
                message: format!("walker task failed: {e}"),
            })
        });

        let summary = match walk {
            Ok(summary) => summary,
            Err(err) => {
                // The queue is closed; let workers and shards wind down first.
                let _ = pool.join().await;
                let _ = shard_set.collect(&cancel).await;
                return Err(err);
            }
        };
        for warning in &summary.warnings {
            warn!(path = %warning.path.display(), "{}", warning.message);
        }
        info!(files = summary.files_found, complete = summary.completed, "walk finished");

        self.enter(&mut phases, RunPhase::Processing)?;
        let stats = match pool.join().await {
            Ok(stats) => stats,
            Err(err) => {
                let _ = shard_set.collect(&cancel).await;
                return Err(err);
            }
        };
        if cancel.is_cancelled() {
            let _ = shard_set.collect(&cancel).await;
            return Err(CountError::Interrupted);
        }

        // Every router clone died with its worker, so shard inboxes are closed.
        self.enter(&mut phases, RunPhase::Aggregating)?;
        let totals = shard_set.collect(&cancel).await?;
        let table = FrequencyTable::from_shards(totals);
        debug!(vocabulary = table.len(), "shard totals merged");

        self.enter(&mut phases, RunPhase::Selecting)?;
        let top = top_k(&table, config.top_k);

        self.enter(&mut phases, RunPhase::Done)?;
        let timings = PhaseTimings::from_tracker(&phases);
        info!(
            files = stats.files_processed,
            failed = stats.files_failed,
            vocabulary = table.len(),
            elapsed_ms = timings.total.as_millis() as u64,
            "word count finished"
        );

        Ok(CountReport {
            root,
            files_found: summary.files_found,
            files_processed: stats.files_processed,
            files_failed: stats.files_failed,
            total_lines: stats.lines,
            bytes_read: stats.bytes,
            workers,
            shards: config.shards,
            vocabulary_size: table.len(),
            total_words: table.total_words(),
            top,
            warnings: summary.warnings,
            timings,
            table,
        })
    }

    fn enter(&self, phases: &mut PhaseTracker, phase: RunPhase) -> Result<(), CountError> {
        phases.advance(phase)?;
        debug!(%phase, "phase entered");
        let _ = self.events_tx.send(CountEvent::PhaseChanged(phase));
        Ok(())
    }
}

impl Default for WordCounter {
    fn default() -> Self {
        Self::new()
    }
}
