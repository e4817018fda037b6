//! Word to shard routing.
//!
//! A word's shard is `fnv1a_32(word) % shards`. The hash is pure and does not
//! depend on process state, so every partial count for a word reaches the
//! same shard for the whole run and shard totals never overlap.

use compact_str::CompactString;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use wordfreq_core::{CountError, WordCounts};

/// Partial counts bound for one shard, taken from one file.
pub type ShardBatch = Vec<(CompactString, u64)>;

const FNV_OFFSET: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// 32-bit FNV-1a.
pub fn fnv1a_32(bytes: &[u8]) -> u32 {
    let mut hash = FNV_OFFSET;
    for byte in bytes {
        hash ^= u32::from(*byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Shard that owns `word` among `shards` shards.
pub fn shard_index(word: &str, shards: usize) -> usize {
    debug_assert!(shards > 0);
    fnv1a_32(word.as_bytes()) as usize % shards
}

/// Sending half of every shard's inbound channel.
///
/// Each worker holds a clone. Shards see their channel close once every clone
/// has been dropped.
#[derive(Debug, Clone)]
pub struct ShardRouter {
    senders: Vec<mpsc::Sender<ShardBatch>>,
}

impl ShardRouter {
    pub(crate) fn new(senders: Vec<mpsc::Sender<ShardBatch>>) -> Self {
        Self { senders }
    }

    /// Split one file's counts into per-shard batches, indexed by shard.
    pub fn partition(&self, counts: WordCounts) -> Vec<ShardBatch> {
        let shards = self.senders.len();
        let mut batches = vec![ShardBatch::new(); shards];
        for (word, count) in counts {
            let idx = shard_index(&word, shards);
            batches[idx].push((word, count));
        }
        batches
    }

    /// Deliver one file's counts, waiting on full shard channels.
    pub async fn route(
        &self,
        counts: WordCounts,
        cancel: &CancellationToken,
    ) -> Result<(), CountError> {
        for (shard, batch) in self.partition(counts).into_iter().enumerate() {
            if batch.is_empty() {
                continue;
            }
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(CountError::Interrupted),
                sent = self.senders[shard].send(batch) => {
                    sent.map_err(|_| CountError::TaskFailed {
                        message: format!("shard {shard} stopped accepting counts"),
                    })?;
                }
            }
        }
        Ok(())
    }
}
