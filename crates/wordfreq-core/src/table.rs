//! Word frequency maps at file, shard and run scope.

use std::collections::HashMap;
use std::collections::hash_map;

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// Word to count mapping. Used for one file's counts and for shard totals.
pub type WordCounts = HashMap<CompactString, u64>;

/// Final totals owned by one aggregation shard.
#[derive(Debug, Clone, Default)]
pub struct ShardTotal {
    /// Index of the shard that produced these totals.
    pub shard: usize,
    /// Totals for every word routed to this shard.
    pub counts: WordCounts,
}

impl ShardTotal {
    /// Create an empty total for a shard.
    pub fn new(shard: usize) -> Self {
        Self {
            shard,
            counts: WordCounts::new(),
        }
    }

    /// Fold a batch of partial counts into this shard's totals.
    pub fn absorb(&mut self, batch: impl IntoIterator<Item = (CompactString, u64)>) {
        for (word, count) in batch {
            *self.counts.entry(word).or_insert(0) += count;
        }
    }
}

/// Run-wide word frequencies, built once from every shard total.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrequencyTable {
    counts: WordCounts,
}

impl FrequencyTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge every shard total into a single table.
    pub fn from_shards(totals: impl IntoIterator<Item = ShardTotal>) -> Self {
        let mut table = Self::new();
        for total in totals {
            table.merge(total.counts);
        }
        table
    }

    /// Add counts into the table by summation per word.
    pub fn merge(&mut self, counts: WordCounts) {
        if self.counts.is_empty() {
            self.counts = counts;
            return;
        }
        for (word, count) in counts {
            *self.counts.entry(word).or_insert(0) += count;
        }
    }

    /// Count for a word, if it was seen.
    pub fn get(&self, word: &str) -> Option<u64> {
        self.counts.get(word).copied()
    }

    /// Number of distinct words.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Check whether no words were counted.
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of all counts.
    pub fn total_words(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Iterate all (word, count) entries in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counts.iter().map(|(w, c)| (w.as_str(), *c))
    }
}

impl From<WordCounts> for FrequencyTable {
    fn from(counts: WordCounts) -> Self {
        Self { counts }
    }
}

impl IntoIterator for FrequencyTable {
    type Item = (CompactString, u64);
    type IntoIter = hash_map::IntoIter<CompactString, u64>;

    fn into_iter(self) -> Self::IntoIter {
        self.counts.into_iter()
    }
}

/// A word with its count, as reported in ranked output.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WordCount {
    pub word: CompactString,
    pub count: u64,
}

impl WordCount {
    pub fn new(word: impl Into<CompactString>, count: u64) -> Self {
        Self {
            word: word.into(),
            count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(pairs: &[(&str, u64)]) -> WordCounts {
        pairs
            .iter()
            .map(|(w, c)| (CompactString::from(*w), *c))
            .collect()
    }

    #[test]
    fn test_shard_absorb_sums() {
        let mut shard = ShardTotal::new(2);
        shard.absorb(counts(&[("go", 2), ("rust", 1)]));
        shard.absorb(counts(&[("go", 3)]));

        assert_eq!(shard.counts.get("go"), Some(&5));
        assert_eq!(shard.counts.get("rust"), Some(&1));
    }

    #[test]
    fn test_merge_order_independent() {
        let a = ShardTotal {
            shard: 0,
            counts: counts(&[("x", 1), ("y", 2)]),
        };
        let b = ShardTotal {
            shard: 1,
            counts: counts(&[("y", 5), ("z", 7)]),
        };

        let forward = FrequencyTable::from_shards(vec![a.clone(), b.clone()]);
        let backward = FrequencyTable::from_shards(vec![b, a]);

        assert_eq!(forward, backward);
        assert_eq!(forward.get("y"), Some(7));
        assert_eq!(forward.len(), 3);
        assert_eq!(forward.total_words(), 15);
    }

    #[test]
    fn test_empty_table() {
        let table = FrequencyTable::from_shards(Vec::new());
        assert!(table.is_empty());
        assert_eq!(table.total_words(), 0);
        assert_eq!(table.get("anything"), None);
    }
}
