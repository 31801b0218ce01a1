//! Event type definitions for progress reporting.

use crate::core::count::MutationCount;
use crate::core::hasher::Digest256;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// All events emitted while a race runs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// Workers are spawned and racing
    Started {
        workers: usize,
        from: usize,
        to: usize,
    },
    /// The global best hash improved
    NewBest { worker: usize, hash: Digest256 },
    /// A worker sent its final count
    WorkerClosed { worker: usize, count: MutationCount },
    /// A stop was requested; waiting for workers to close
    Stopping,
    /// A worker failed and the race is being aborted
    WorkerFailed { worker: usize, message: String },
    /// The race finished
    Completed { summary: RaceSummary },
}

/// Summary of a finished race
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaceSummary {
    /// Wall-clock duration in milliseconds
    pub duration_ms: u64,
    /// Mutations performed across all workers
    pub mutations: MutationCount,
    /// Smallest hash found
    pub best: Digest256,
    /// Number of workers raced (0 in check mode)
    pub workers: usize,
    /// Where the check-mode glitch was written
    pub output: Option<PathBuf>,
}

impl RaceSummary {
    /// Duration rounded to whole seconds
    pub fn duration_secs(&self) -> u64 {
        (self.duration_ms + 500) / 1000
    }
}
