//! Progress events broadcast during a counting run.

use std::path::PathBuf;

use wordfreq_core::RunPhase;

/// Default capacity of the event broadcast channel.
pub const DEFAULT_EVENT_CAPACITY: usize = 1024;

/// Something that happened during a run.
#[derive(Debug, Clone)]
pub enum CountEvent {
    /// The run entered a new phase.
    PhaseChanged(RunPhase),
    /// A worker finished counting a file.
    FileCompleted {
        worker: usize,
        path: PathBuf,
        lines: u64,
    },
    /// A worker skipped a file it could not read.
    FileFailed {
        worker: usize,
        path: PathBuf,
        error: String,
    },
}
