//! # Worker Loop
//!
//! One racer. Each batch starts from the pristine image and accumulates
//! `iterations` random bit toggles; after every toggle the buffer is
//! hashed and, if it beats the best hash the worker knows of, saved and
//! reported.
//!
//! The known best only moves when the coordinator sends `set`. Until
//! that echo arrives the worker may save candidates another worker (or
//! itself) has already beaten.
//!
//! Control messages are drained between every single mutation, so a
//! `set` or `stop` is acted upon within one step.

use super::count::MutationCount;
use super::hasher::{hash, Digest256};
use super::jpeg::EntropyRegion;
use super::mutator::random_toggle;
use super::protocol::{Command, Inbound, Job, Report};
use super::storage::GlitchStore;
use crate::error::{GlitchError, ProtocolError};
use crossbeam_channel::{Receiver, Sender, TryRecvError};
use rand::Rng;

/// Worker lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Running,
    Closing,
    Closed,
}

impl WorkerState {
    fn label(self) -> &'static str {
        match self {
            WorkerState::Running => "running",
            WorkerState::Closing => "closing",
            WorkerState::Closed => "closed",
        }
    }
}

/// Result of a single mutation step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub hash: Digest256,
    /// The hash beat the known best and the buffer was saved
    pub improved: bool,
}

/// A started worker
pub struct Worker<S, R> {
    job: Job,
    region: EntropyRegion,
    buffer: Vec<u8>,
    cursor: usize,
    best: Digest256,
    state: WorkerState,
    count: MutationCount,
    store: S,
    rng: R,
}

impl<S: GlitchStore, R: Rng> Worker<S, R> {
    /// Handle the `start` message
    pub fn start(job: Job, store: S, rng: R) -> Result<Self, ProtocolError> {
        if job.iterations == 0 {
            return Err(ProtocolError::InvalidJob(
                "iterations must be at least 1".to_string(),
            ));
        }
        let region = job.region();
        if !region.fits(job.data.len()) {
            return Err(ProtocolError::InvalidJob(format!(
                "region {}..{} does not fit {} bytes",
                region.from,
                region.to,
                job.data.len()
            )));
        }

        Ok(Self {
            buffer: job.data.clone(),
            cursor: job.iterations,
            region,
            job,
            best: Digest256::MAX,
            state: WorkerState::Running,
            count: MutationCount::zero(),
            store,
            rng,
        })
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    /// Best hash this worker knows of, as last set by the coordinator
    pub fn best(&self) -> Digest256 {
        self.best
    }

    pub fn count(&self) -> &MutationCount {
        &self.count
    }

    /// Apply a control message
    pub fn handle(&mut self, command: Command) -> Result<(), ProtocolError> {
        match command {
            Command::Start(_) => {
                return Err(ProtocolError::Unexpected {
                    action: "start",
                    state: self.state.label(),
                })
            }
            Command::Set { hash } => self.best = hash,
            Command::Stop => self.request_stop(),
        }
        Ok(())
    }

    /// Move to `Closing`; the next turn reports `close` instead of mutating
    pub fn request_stop(&mut self) {
        if self.state == WorkerState::Running {
            self.state = WorkerState::Closing;
        }
    }

    /// Mutate once, hash, and save the buffer if it beats the known best
    pub fn step(&mut self) -> Result<Step, GlitchError> {
        if self.cursor >= self.job.iterations {
            self.buffer.copy_from_slice(&self.job.data);
            self.cursor = 0;
        }

        random_toggle(&mut self.buffer, self.region, &mut self.rng);
        let hash = hash(&self.buffer);
        let improved = hash < self.best;
        if improved {
            self.store
                .save(&self.job.file, &hash.to_string(), &self.buffer)?;
        }

        self.cursor += 1;
        self.count.increment();
        Ok(Step { hash, improved })
    }

    /// Enter `Closed` and hand back the final count
    pub fn close(&mut self) -> MutationCount {
        self.state = WorkerState::Closed;
        self.count.clone()
    }

    /// Run until stopped.
    ///
    /// Pending commands are drained before every step. A disconnected
    /// inbox counts as a stop request. Returns the total mutation count
    /// after `close` has been sent.
    pub fn run(
        mut self,
        id: usize,
        inbox: &Receiver<Command>,
        outbox: &Sender<Inbound>,
    ) -> Result<MutationCount, GlitchError> {
        loop {
            loop {
                match inbox.try_recv() {
                    Ok(command) => self.handle(command)?,
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        self.request_stop();
                        break;
                    }
                }
            }

            if self.state == WorkerState::Closing {
                let count = self.close();
                tracing::debug!(worker = id, %count, "worker closing");
                let _ = outbox.send(Inbound::Report {
                    worker: id,
                    report: Report::Close {
                        count: count.clone(),
                    },
                });
                return Ok(count);
            }

            let step = self.step()?;
            if step.improved {
                let _ = outbox.send(Inbound::Report {
                    worker: id,
                    report: Report::Update { hash: step.hash },
                });
            }
        }
    }
}

/// Thread body: wait for `start`, race, and report a fault if anything
/// goes wrong so the coordinator is never left waiting.
pub fn serve<S, R>(id: usize, inbox: Receiver<Command>, outbox: Sender<Inbound>, store: S, rng: R)
where
    S: GlitchStore,
    R: Rng,
{
    let result = match inbox.recv() {
        Ok(Command::Start(job)) => Worker::start(job, store, rng)
            .map_err(GlitchError::from)
            .and_then(|worker| worker.run(id, &inbox, &outbox)),
        Ok(other) => Err(ProtocolError::Unexpected {
            action: other.action(),
            state: "waiting for start",
        }
        .into()),
        Err(_) => return,
    };

    if let Err(error) = result {
        tracing::warn!(worker = id, %error, "worker failed");
        let _ = outbox.send(Inbound::Fault { worker: id, error });
    }
}
