//! Error types for counting runs.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::phase::RunPhase;

/// Fatal errors that abort a counting run.
#[derive(Debug, Error)]
pub enum CountError {
    /// Permission denied for a path.
    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// Path not found.
    #[error("Path not found: {path}")]
    NotFound { path: PathBuf },

    /// Generic I/O error.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Root path is not a directory.
    #[error("Root path is not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// The run was cancelled.
    #[error("Operation interrupted")]
    Interrupted,

    /// A spawned task panicked or was aborted.
    #[error("Task failed: {message}")]
    TaskFailed { message: String },

    /// The run tried to move between phases out of order.
    #[error("Invalid phase transition: {from} -> {to}")]
    InvalidTransition { from: RunPhase, to: RunPhase },
}

impl CountError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            _ => Self::Io { path, source },
        }
    }

    /// Whether this error came from traversing the root path.
    pub fn is_traversal(&self) -> bool {
        matches!(
            self,
            Self::PermissionDenied { .. }
                | Self::NotFound { .. }
                | Self::Io { .. }
                | Self::NotADirectory { .. }
        )
    }
}

/// Per-file failure. The file is skipped and the run continues.
#[derive(Debug, Error)]
pub enum FileReadError {
    /// The file could not be opened.
    #[error("cannot open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A read failed part way through the file.
    #[error("read failed in {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A line exceeded the configured maximum length.
    #[error("line {line} of {path} exceeds {limit} bytes")]
    LineTooLong {
        path: PathBuf,
        line: u64,
        limit: usize,
    },

    /// Reading stopped because the run was cancelled.
    #[error("reading {path} interrupted")]
    Interrupted { path: PathBuf },
}

impl FileReadError {
    /// Path of the file that failed.
    pub fn path(&self) -> &PathBuf {
        match self {
            Self::Open { path, .. }
            | Self::Read { path, .. }
            | Self::LineTooLong { path, .. }
            | Self::Interrupted { path } => path,
        }
    }
}

/// Kind of scan warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarningKind {
    /// Permission was denied.
    PermissionDenied,
    /// Error reading an entry below the root.
    ReadError,
}

impl WarningKind {
    /// Classify an I/O error kind.
    pub fn from_io_kind(kind: std::io::ErrorKind) -> Self {
        match kind {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied,
            _ => Self::ReadError,
        }
    }
}

/// Non-fatal warning encountered while walking the tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanWarning {
    /// Path where the warning occurred.
    pub path: PathBuf,
    /// Human-readable message.
    pub message: String,
    /// Kind of warning.
    pub kind: WarningKind,
}

impl ScanWarning {
    /// Create a new scan warning.
    pub fn new(path: impl Into<PathBuf>, message: impl Into<String>, kind: WarningKind) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            kind,
        }
    }
}
