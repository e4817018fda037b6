//! Bounded top-K selection.
//!
//! Offers every (word, count) entry to a min-heap capped at K entries. Once
//! full, a candidate only enters by beating the current minimum, which is
//! evicted. That is O(N log K) time and O(K) extra space instead of sorting
//! the whole table.
//!
//! Equal counts are ordered by word, lexically ascending, so the ranking is
//! the same on every run.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use tracing::debug;
use wordfreq_core::{FrequencyTable, WordCount};

/// Heap entry borrowing its word from the table being ranked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Candidate<'a> {
    count: u64,
    word: &'a str,
}

impl Ord for Candidate<'_> {
    // Higher count ranks higher; on a tie the lexically smaller word does.
    fn cmp(&self, other: &Self) -> Ordering {
        self.count
            .cmp(&other.count)
            .then_with(|| other.word.cmp(self.word))
    }
}

impl PartialOrd for Candidate<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Streaming selector for the K highest-ranked words.
#[derive(Debug)]
pub struct TopKSelector<'a> {
    k: usize,
    heap: BinaryHeap<Reverse<Candidate<'a>>>,
}

impl<'a> TopKSelector<'a> {
    /// Create a selector keeping at most `k` entries.
    pub fn new(k: usize) -> Self {
        Self {
            k,
            heap: BinaryHeap::with_capacity(k),
        }
    }

    /// Offer one entry.
    pub fn offer(&mut self, word: &'a str, count: u64) {
        if self.k == 0 {
            return;
        }
        let candidate = Candidate { count, word };
        if self.heap.len() < self.k {
            self.heap.push(Reverse(candidate));
            return;
        }
        if let Some(Reverse(min)) = self.heap.peek() {
            if candidate > *min {
                self.heap.pop();
                self.heap.push(Reverse(candidate));
            }
        }
    }

    /// Number of entries currently held.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Check whether nothing has been kept yet.
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Drain the heap into descending rank order.
    pub fn finish(mut self) -> Vec<WordCount> {
        let mut ranked = Vec::with_capacity(self.heap.len());
        while let Some(Reverse(candidate)) = self.heap.pop() {
            ranked.push(WordCount::new(candidate.word, candidate.count));
        }
        // Pops come out smallest first.
        ranked.reverse();
        ranked
    }
}

/// Select the `k` most frequent words from a table, highest count first.
pub fn top_k(table: &FrequencyTable, k: usize) -> Vec<WordCount> {
    let mut selector = TopKSelector::new(k.min(table.len()));
    for (word, count) in table.iter() {
        selector.offer(word, count);
    }
    let ranked = selector.finish();
    debug!(k, vocabulary = table.len(), selected = ranked.len(), "top-k selected");
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_ordering() {
        let low = Candidate { count: 1, word: "a" };
        let high = Candidate { count: 2, word: "z" };
        assert!(high > low);

        let apple = Candidate { count: 5, word: "apple" };
        let banana = Candidate { count: 5, word: "banana" };
        assert!(apple > banana);
    }

    #[test]
    fn test_selector_evicts_minimum() {
        let mut selector = TopKSelector::new(2);
        selector.offer("one", 1);
        selector.offer("three", 3);
        selector.offer("two", 2);
        assert_eq!(selector.len(), 2);

        let ranked = selector.finish();
        assert_eq!(
            ranked,
            vec![WordCount::new("three", 3), WordCount::new("two", 2)]
        );
    }

    #[test]
    fn test_selector_zero_capacity() {
        let mut selector = TopKSelector::new(0);
        selector.offer("ignored", 100);
        assert!(selector.is_empty());
        assert!(selector.finish().is_empty());
    }

    #[test]
    fn test_tie_prefers_smaller_word() {
        let mut selector = TopKSelector::new(1);
        selector.offer("pear", 4);
        selector.offer("apple", 4);
        selector.offer("zebra", 4);
        assert_eq!(selector.finish(), vec![WordCount::new("apple", 4)]);
    }
}
