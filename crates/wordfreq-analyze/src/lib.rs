//! Ranking algorithms for wordfreq.
//!
//! Selects the most frequent words from a merged [`FrequencyTable`] with a
//! bounded min-heap, keeping memory at O(K) regardless of vocabulary size.
//!
//! ```rust
//! use wordfreq_analyze::top_k;
//! use wordfreq_core::{FrequencyTable, WordCounts};
//!
//! let mut counts = WordCounts::new();
//! counts.insert("the".into(), 12);
//! counts.insert("cat".into(), 3);
//! let table = FrequencyTable::from(counts);
//!
//! let top = top_k(&table, 1);
//! assert_eq!(top[0].word, "the");
//! ```

mod topk;

pub use topk::{TopKSelector, top_k};

// Re-export core types
pub use wordfreq_core::{FrequencyTable, WordCount};
