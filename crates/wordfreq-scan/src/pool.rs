//! Fixed-size pool of file workers.

use std::path::PathBuf;

use serde::Serialize;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use wordfreq_core::{CountError, FileReadError};

use crate::event::CountEvent;
use crate::processor::process_file;
use crate::router::ShardRouter;

/// Totals reported by the pool once every worker has exited.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    /// Files counted successfully.
    pub files_processed: u64,
    /// Files skipped because they could not be read.
    pub files_failed: u64,
    /// Lines read from successful files.
    pub lines: u64,
    /// Bytes read from successful files.
    pub bytes: u64,
}

impl PoolStats {
    fn merge(&mut self, other: &PoolStats) {
        self.files_processed += other.files_processed;
        self.files_failed += other.files_failed;
        self.lines += other.lines;
        self.bytes += other.bytes;
    }
}

/// Running workers. Dropping the pool detaches them; call [`WorkerPool::join`]
/// to wait.
#[derive(Debug)]
pub struct WorkerPool {
    handles: Vec<JoinHandle<Result<PoolStats, CountError>>>,
}

impl WorkerPool {
    /// Spawn `workers` tasks pulling paths from `queue`.
    ///
    /// The pool takes ownership of `router`; each worker holds a clone, so the
    /// shard channels close as soon as the last worker exits.
    pub fn spawn(
        workers: usize,
        queue: async_channel::Receiver<PathBuf>,
        router: ShardRouter,
        max_line_len: usize,
        events: broadcast::Sender<CountEvent>,
        cancel: CancellationToken,
    ) -> Self {
        let handles = (0..workers)
            .map(|id| {
                let worker = Worker {
                    id,
                    queue: queue.clone(),
                    router: router.clone(),
                    max_line_len,
                    events: events.clone(),
                    cancel: cancel.clone(),
                };
                tokio::spawn(worker.run())
            })
            .collect();
        Self { handles }
    }

    /// Number of workers in the pool.
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Check whether the pool has no workers.
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Wait for every worker to exit.
    ///
    /// Always waits for all of them, even after a failure, then reports the
    /// first error seen.
    pub async fn join(self) -> Result<PoolStats, CountError> {
        let mut stats = PoolStats::default();
        let mut first_err = None;

        for handle in self.handles {
            let outcome = match handle.await {
                Ok(result) => result,
                Err(e) => Err(CountError::TaskFailed {
                    message: format!("worker task failed: {e}"),
                }),
            };
            match outcome {
                Ok(worker_stats) => stats.merge(&worker_stats),
                Err(err) => {
                    if first_err.is_none() {
                        first_err = Some(err);
                    }
                }
            }
        }

        match first_err {
            Some(err) => Err(err),
            None => Ok(stats),
        }
    }
}

struct Worker {
    id: usize,
    queue: async_channel::Receiver<PathBuf>,
    router: ShardRouter,
    max_line_len: usize,
    events: broadcast::Sender<CountEvent>,
    cancel: CancellationToken,
}

impl Worker {
    async fn run(self) -> Result<PoolStats, CountError> {
        let mut stats = PoolStats::default();

        loop {
            let path = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(CountError::Interrupted),
                next = self.queue.recv() => match next {
                    Ok(path) => path,
                    // Queue closed and drained.
                    Err(_) => break,
                },
            };

            let job_path = path.clone();
            let max_line_len = self.max_line_len;
            let job_cancel = self.cancel.clone();
            let outcome = tokio::task::spawn_blocking(move || {
                process_file(&job_path, max_line_len, &job_cancel)
            })
            .await
            .map_err(|e| CountError::TaskFailed {
                message: format!("counting {} failed: {e}", path.display()),
            })?;

            match outcome {
                Ok(file) => {
                    if self.cancel.is_cancelled() {
                        return Err(CountError::Interrupted);
                    }
                    info!(worker = self.id, path = %path.display(), lines = file.lines, "file counted");
                    stats.files_processed += 1;
                    stats.lines += file.lines;
                    stats.bytes += file.bytes;
                    let _ = self.events.send(CountEvent::FileCompleted {
                        worker: self.id,
                        path,
                        lines: file.lines,
                    });
                    self.router.route(file.counts, &self.cancel).await?;
                }
                Err(FileReadError::Interrupted { .. }) => return Err(CountError::Interrupted),
                Err(err) => {
                    warn!(worker = self.id, error = %err, "skipping file");
                    stats.files_failed += 1;
                    let _ = self.events.send(CountEvent::FileFailed {
                        worker: self.id,
                        path,
                        error: err.to_string(),
                    });
                }
            }
        }

        debug!(
            worker = self.id,
            files = stats.files_processed,
            failed = stats.files_failed,
            "worker finished"
        );
        Ok(stats)
    }
}
