//! Core types and traits for wordfreq.
//!
//! This crate provides the fundamental data structures used throughout
//! the wordfreq workspace: the tokenizer, frequency tables, run phases,
//! configuration and error types.

mod config;
mod error;
mod phase;
mod table;
pub mod tokenizer;

pub use config::{CountConfig, CountConfigBuilder, DEFAULT_MAX_LINE_LEN};
pub use error::{CountError, FileReadError, ScanWarning, WarningKind};
pub use phase::{PhaseTracker, RunPhase};
pub use table::{FrequencyTable, ShardTotal, WordCount, WordCounts};
pub use tokenizer::{normalize, normalized_words, tokens};
