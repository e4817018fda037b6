//! Run lifecycle phases.

use std::fmt;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::error::CountError;

/// Phase of a counting run.
///
/// Phases advance strictly in declaration order. `Processing` and
/// `Aggregating` overlap in wall time (shards fold while workers still
/// produce), but `Aggregating` is only entered once the worker pool has
/// joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RunPhase {
    Idle,
    Walking,
    Processing,
    Aggregating,
    Selecting,
    Done,
}

impl RunPhase {
    /// The only phase that may follow this one.
    pub fn next(self) -> Option<RunPhase> {
        match self {
            Self::Idle => Some(Self::Walking),
            Self::Walking => Some(Self::Processing),
            Self::Processing => Some(Self::Aggregating),
            Self::Aggregating => Some(Self::Selecting),
            Self::Selecting => Some(Self::Done),
            Self::Done => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Walking => "walking",
            Self::Processing => "processing",
            Self::Aggregating => "aggregating",
            Self::Selecting => "selecting",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Records phase transitions and when each phase was entered.
#[derive(Debug)]
pub struct PhaseTracker {
    current: RunPhase,
    started: Instant,
    entered: Vec<(RunPhase, Instant)>,
}

impl PhaseTracker {
    /// Start tracking in the `Idle` phase.
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            current: RunPhase::Idle,
            started: now,
            entered: vec![(RunPhase::Idle, now)],
        }
    }

    /// Current phase.
    pub fn current(&self) -> RunPhase {
        self.current
    }

    /// Move to `to`, which must be the immediate successor of the current phase.
    pub fn advance(&mut self, to: RunPhase) -> Result<(), CountError> {
        if self.current.next() != Some(to) {
            return Err(CountError::InvalidTransition {
                from: self.current,
                to,
            });
        }
        self.current = to;
        self.entered.push((to, Instant::now()));
        Ok(())
    }

    /// Time spent in a phase. A phase still in progress is measured up to now;
    /// a phase never entered reports zero.
    pub fn duration(&self, phase: RunPhase) -> Duration {
        let Some(idx) = self.entered.iter().position(|(p, _)| *p == phase) else {
            return Duration::ZERO;
        };
        let start = self.entered[idx].1;
        match self.entered.get(idx + 1) {
            Some((_, end)) => end.duration_since(start),
            None if phase == RunPhase::Done => Duration::ZERO,
            None => start.elapsed(),
        }
    }

    /// Time since tracking started.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

impl Default for PhaseTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_sequence() {
        let mut tracker = PhaseTracker::new();
        for phase in [
            RunPhase::Walking,
            RunPhase::Processing,
            RunPhase::Aggregating,
            RunPhase::Selecting,
            RunPhase::Done,
        ] {
            tracker.advance(phase).unwrap();
        }
        assert_eq!(tracker.current(), RunPhase::Done);
        assert_eq!(tracker.duration(RunPhase::Done), Duration::ZERO);
    }

    #[test]
    fn test_skip_rejected() {
        let mut tracker = PhaseTracker::new();
        let err = tracker.advance(RunPhase::Processing).unwrap_err();
        assert!(matches!(
            err,
            CountError::InvalidTransition {
                from: RunPhase::Idle,
                to: RunPhase::Processing
            }
        ));
        assert_eq!(tracker.current(), RunPhase::Idle);
    }

    #[test]
    fn test_reenter_rejected() {
        let mut tracker = PhaseTracker::new();
        tracker.advance(RunPhase::Walking).unwrap();
        assert!(tracker.advance(RunPhase::Walking).is_err());
    }

    #[test]
    fn test_unentered_phase_has_zero_duration() {
        let tracker = PhaseTracker::new();
        assert_eq!(tracker.duration(RunPhase::Selecting), Duration::ZERO);
    }
}
