//! Counting run configuration.

use std::path::{Path, PathBuf};

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// Default upper bound on a single line, in bytes.
pub const DEFAULT_MAX_LINE_LEN: usize = 1024 * 1024;

/// Configuration for a word counting run.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct CountConfig {
    /// Root directory to walk.
    pub root: PathBuf,

    /// File extensions to include, without the leading dot.
    #[builder(default = "default_extensions()")]
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Number of file workers (0 = available parallelism).
    #[builder(default = "0")]
    #[serde(default)]
    pub workers: usize,

    /// Number of aggregation shards.
    #[builder(default = "4")]
    #[serde(default = "default_shards")]
    pub shards: usize,

    /// How many of the most frequent words to report.
    #[builder(default = "10")]
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Longest accepted line in bytes, excluding the terminator.
    #[builder(default = "DEFAULT_MAX_LINE_LEN")]
    #[serde(default = "default_max_line_len")]
    pub max_line_len: usize,

    /// Capacity of the file path queue.
    #[builder(default = "100")]
    #[serde(default = "default_capacity")]
    pub queue_capacity: usize,

    /// Capacity of each shard's inbound channel.
    #[builder(default = "100")]
    #[serde(default = "default_capacity")]
    pub shard_capacity: usize,

    /// Follow symbolic links to directories.
    #[builder(default = "false")]
    #[serde(default)]
    pub follow_symlinks: bool,

    /// Include hidden files (starting with .).
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub include_hidden: bool,

    /// Threads for directory traversal (0 = shared rayon pool).
    #[builder(default = "0")]
    #[serde(default)]
    pub walk_threads: usize,
}

fn default_extensions() -> Vec<String> {
    vec!["txt".to_string()]
}

fn default_shards() -> usize {
    4
}

fn default_top_k() -> usize {
    10
}

fn default_max_line_len() -> usize {
    DEFAULT_MAX_LINE_LEN
}

fn default_capacity() -> usize {
    100
}

fn default_true() -> bool {
    true
}

/// Limits shared by the builder and [`CountConfig::validate`].
fn check_limits(
    root: &Path,
    shards: usize,
    queue_capacity: usize,
    shard_capacity: usize,
    max_line_len: usize,
) -> Result<(), String> {
    if root.as_os_str().is_empty() {
        return Err("Root path cannot be empty".to_string());
    }
    if shards == 0 {
        return Err("Shard count must be at least 1".to_string());
    }
    if queue_capacity == 0 || shard_capacity == 0 {
        return Err("Channel capacities must be at least 1".to_string());
    }
    if max_line_len == 0 {
        return Err("Maximum line length must be at least 1".to_string());
    }
    Ok(())
}

impl CountConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        let root = self
            .root
            .as_ref()
            .ok_or_else(|| "Root path is required".to_string())?;
        check_limits(
            root,
            self.shards.unwrap_or_else(default_shards),
            self.queue_capacity.unwrap_or_else(default_capacity),
            self.shard_capacity.unwrap_or_else(default_capacity),
            self.max_line_len.unwrap_or(DEFAULT_MAX_LINE_LEN),
        )
    }
}

impl CountConfig {
    /// Create a new config builder.
    pub fn builder() -> CountConfigBuilder {
        CountConfigBuilder::default()
    }

    /// Create a default config for counting under a path.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            extensions: default_extensions(),
            workers: 0,
            shards: default_shards(),
            top_k: default_top_k(),
            max_line_len: DEFAULT_MAX_LINE_LEN,
            queue_capacity: default_capacity(),
            shard_capacity: default_capacity(),
            follow_symlinks: false,
            include_hidden: true,
            walk_threads: 0,
        }
    }

    /// Check values that the builder would have rejected.
    ///
    /// Configs can also be created with [`CountConfig::new`] or deserialized,
    /// so the pipeline re-checks before starting.
    pub fn validate(&self) -> Result<(), String> {
        check_limits(
            &self.root,
            self.shards,
            self.queue_capacity,
            self.shard_capacity,
            self.max_line_len,
        )
    }

    /// Resolve the worker count, substituting host parallelism for 0.
    pub fn effective_workers(&self) -> usize {
        match self.workers {
            0 => std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            n => n,
        }
    }

    /// Check whether a path carries one of the configured extensions.
    pub fn matches_extension(&self, path: &Path) -> bool {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return false;
        };
        self.extensions
            .iter()
            .any(|wanted| wanted.trim_start_matches('.') == ext)
    }
}

impl Default for CountConfig {
    fn default() -> Self {
        Self::new(".")
    }
}
