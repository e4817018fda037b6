//! Sharded aggregation.
//!
//! Each shard is a tokio task that exclusively owns the running totals for
//! the words routed to it. Workers never touch those totals, so no locking is
//! needed anywhere; the only coordination is the bounded inbound channel.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use wordfreq_core::{CountError, ShardTotal};

use crate::router::{ShardBatch, ShardRouter};

/// Handles for running shards and the channel their totals arrive on.
#[derive(Debug)]
pub struct ShardSet {
    shards: usize,
    results: mpsc::Receiver<ShardTotal>,
    handles: Vec<JoinHandle<()>>,
}

/// Start `count` shards, each with an inbound channel of `capacity` batches.
///
/// Returns the router workers send through and the set to collect totals
/// from. Shards finish once every router clone has been dropped.
pub fn spawn_shards(
    count: usize,
    capacity: usize,
    cancel: CancellationToken,
) -> (ShardRouter, ShardSet) {
    let (results_tx, results_rx) = mpsc::channel(count.max(1));
    let mut senders = Vec::with_capacity(count);
    let mut handles = Vec::with_capacity(count);

    for shard in 0..count {
        let (tx, rx) = mpsc::channel(capacity);
        senders.push(tx);
        handles.push(tokio::spawn(run_shard(
            shard,
            rx,
            results_tx.clone(),
            cancel.clone(),
        )));
    }

    let set = ShardSet {
        shards: count,
        results: results_rx,
        handles,
    };
    (ShardRouter::new(senders), set)
}

async fn run_shard(
    shard: usize,
    mut inbox: mpsc::Receiver<ShardBatch>,
    results: mpsc::Sender<ShardTotal>,
    cancel: CancellationToken,
) {
    let mut total = ShardTotal::new(shard);
    let mut batches: u64 = 0;

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(shard, batches, "shard cancelled");
                return;
            }
            batch = inbox.recv() => match batch {
                Some(batch) => {
                    total.absorb(batch);
                    batches += 1;
                }
                None => break,
            }
        }
    }

    debug!(shard, batches, words = total.counts.len(), "shard drained");
    // Capacity equals the shard count, so this never waits.
    let _ = results.send(total).await;
}

impl ShardSet {
    /// Number of shards in the set.
    pub fn len(&self) -> usize {
        self.shards
    }

    /// Check whether the set has no shards.
    pub fn is_empty(&self) -> bool {
        self.shards == 0
    }

    /// Wait for every shard to finish and return exactly one total per shard,
    /// ordered by shard index.
    ///
    /// Only call this after every [`ShardRouter`] clone is dropped; otherwise
    /// the shards keep waiting for more batches.
    pub async fn collect(self, cancel: &CancellationToken) -> Result<Vec<ShardTotal>, CountError> {
        let Self {
            shards,
            mut results,
            handles,
        } = self;

        let mut totals = Vec::with_capacity(shards);
        while let Some(total) = results.recv().await {
            totals.push(total);
        }

        for handle in handles {
            handle.await.map_err(|e| CountError::TaskFailed {
                message: format!("shard task failed: {e}"),
            })?;
        }

        if cancel.is_cancelled() {
            return Err(CountError::Interrupted);
        }
        if totals.len() != shards {
            return Err(CountError::TaskFailed {
                message: format!("expected {shards} shard totals, got {}", totals.len()),
            });
        }

        totals.sort_by_key(|t| t.shard);
        Ok(totals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use compact_str::CompactString;
    use wordfreq_core::WordCounts;

    fn counts(pairs: &[(&str, u64)]) -> WordCounts {
        pairs
            .iter()
            .map(|(w, c)| (CompactString::from(*w), *c))
            .collect()
    }

    #[tokio::test]
    async fn test_one_total_per_shard() {
        let cancel = CancellationToken::new();
        let (router, set) = spawn_shards(3, 4, cancel.clone());
        assert_eq!(set.len(), 3);

        router
            .route(counts(&[("a", 1), ("b", 2), ("c", 3)]), &cancel)
            .await
            .unwrap();
        router
            .route(counts(&[("a", 10), ("c", 30)]), &cancel)
            .await
            .unwrap();
        drop(router);

        let totals = set.collect(&cancel).await.unwrap();
        assert_eq!(totals.len(), 3);
        assert_eq!(
            totals.iter().map(|t| t.shard).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );

        let a_shard = crate::router::shard_index("a", 3);
        assert_eq!(totals[a_shard].counts.get("a"), Some(&11));
        let c_shard = crate::router::shard_index("c", 3);
        assert_eq!(totals[c_shard].counts.get("c"), Some(&33));

        // No word lives in two shards.
        let words: usize = totals.iter().map(|t| t.counts.len()).sum();
        assert_eq!(words, 3);
    }

    #[tokio::test]
    async fn test_idle_shards_emit_empty_totals() {
        let cancel = CancellationToken::new();
        let (router, set) = spawn_shards(4, 1, cancel.clone());
        drop(router);

        let totals = set.collect(&cancel).await.unwrap();
        assert_eq!(totals.len(), 4);
        assert!(totals.iter().all(|t| t.counts.is_empty()));
    }

    #[tokio::test]
    async fn test_cancelled_shards_unwind() {
        let cancel = CancellationToken::new();
        let (router, set) = spawn_shards(2, 1, cancel.clone());
        cancel.cancel();

        // Router is still alive: shards must exit on the token alone.
        let err = set.collect(&cancel).await.unwrap_err();
        assert!(matches!(err, CountError::Interrupted));
        drop(router);
    }
}
