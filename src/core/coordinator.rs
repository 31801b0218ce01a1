//! Coordinator state.
//!
//! Owns the global best hash and the termination tally. It only decides;
//! broadcasting `set`, logging and reporting are left to the race loop.

use super::count::MutationCount;
use super::hasher::Digest256;
use super::protocol::Report;
use crate::error::ProtocolError;
use crate::events::RaceSummary;
use std::time::{Duration, Instant};

/// What the race loop should do about a report
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// New global best; broadcast `set` to every worker
    Improved(Digest256),
    /// Not better than the current best
    Ignored,
    /// A worker closed with this count
    Closed(MutationCount),
}

#[derive(Debug)]
pub struct Coordinator {
    best: Digest256,
    workers: usize,
    closed: usize,
    total: MutationCount,
    started: Instant,
}

impl Coordinator {
    /// Fresh state for `workers` racers; `started` is when the run began
    pub fn started_at(workers: usize, started: Instant) -> Self {
        Self {
            best: Digest256::MAX,
            workers,
            closed: 0,
            total: MutationCount::zero(),
            started,
        }
    }

    pub fn best(&self) -> Digest256 {
        self.best
    }

    pub fn closed(&self) -> usize {
        self.closed
    }

    pub fn total(&self) -> &MutationCount {
        &self.total
    }

    /// Every worker has sent `close`
    pub fn is_finished(&self) -> bool {
        self.closed >= self.workers
    }

    /// Fold one worker report into the state
    pub fn on_report(&mut self, report: Report) -> Result<Decision, ProtocolError> {
        match report {
            Report::Update { hash } if hash < self.best => {
                self.best = hash;
                Ok(Decision::Improved(hash))
            }
            Report::Update { .. } => Ok(Decision::Ignored),
            Report::Close { .. } if self.is_finished() => Err(ProtocolError::Unexpected {
                action: "close",
                state: "closed",
            }),
            Report::Close { count } => {
                self.total += &count;
                self.closed += 1;
                Ok(Decision::Closed(count))
            }
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Final report
    pub fn summary(&self) -> RaceSummary {
        RaceSummary {
            duration_ms: self.elapsed().as_millis() as u64,
            mutations: self.total.clone(),
            best: self.best,
            workers: self.workers,
            output: None,
        }
    }
}
