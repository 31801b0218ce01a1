//! Race execution implementation.

use crate::core::coordinator::{Coordinator, Decision};
use crate::core::count::MutationCount;
use crate::core::hasher::hash;
use crate::core::jpeg::{self, EntropyRegion};
use crate::core::mutator::glitch;
use crate::core::protocol::{Command, Inbound, Job};
use crate::core::storage::{FileStore, GlitchStore};
use crate::core::worker;
use crate::error::GlitchError;
use crate::events::{null_sender, Event, EventSender, RaceSummary};
use chrono::{SecondsFormat, Utc};
use crossbeam_channel::{unbounded, Receiver, Sender};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

/// Configuration for a race
#[derive(Debug, Clone)]
pub struct RaceConfig {
    /// Image to glitch
    pub source: PathBuf,
    /// Mutations per batch before resetting to the source
    pub iterations: usize,
    /// Number of workers
    pub workers: usize,
    /// Name written into the attribution comment
    pub label: Option<String>,
    /// Run a single batch instead of racing
    pub check: bool,
    /// Base seed; worker `k` uses `seed + k`
    pub seed: Option<u64>,
}

impl Default for RaceConfig {
    fn default() -> Self {
        Self {
            source: PathBuf::new(),
            iterations: 500,
            workers: default_workers(),
            label: None,
            check: false,
            seed: None,
        }
    }
}

/// One worker per available processing unit
pub fn default_workers() -> usize {
    thread::available_parallelism().map_or(1, |n| n.get())
}

/// Builder for race configuration
pub struct RaceBuilder {
    config: RaceConfig,
    store: Option<Arc<dyn GlitchStore>>,
}

impl RaceBuilder {
    pub fn new() -> Self {
        Self {
            config: RaceConfig::default(),
            store: None,
        }
    }

    /// Set the image to glitch
    pub fn source(mut self, source: impl Into<PathBuf>) -> Self {
        self.config.source = source.into();
        self
    }

    /// Set the batch size
    pub fn iterations(mut self, iterations: usize) -> Self {
        self.config.iterations = iterations;
        self
    }

    /// Set the number of workers
    pub fn workers(mut self, workers: usize) -> Self {
        self.config.workers = workers;
        self
    }

    /// Set the attribution name
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.config.label = Some(label.into());
        self
    }

    /// Run one batch without workers
    pub fn check(mut self, check: bool) -> Self {
        self.config.check = check;
        self
    }

    /// Make mutation sampling reproducible
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    /// Set the storage backend
    pub fn store(mut self, store: Arc<dyn GlitchStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Validate and build the race
    pub fn build(self) -> Result<Race, GlitchError> {
        if self.config.source.as_os_str().is_empty() {
            return Err(GlitchError::Config("no source image given".to_string()));
        }
        if self.config.iterations == 0 {
            return Err(GlitchError::Config(
                "iterations must be at least 1".to_string(),
            ));
        }
        if self.config.workers == 0 {
            return Err(GlitchError::Config(
                "at least one worker is required".to_string(),
            ));
        }

        let (inbound_tx, inbound_rx) = unbounded();
        Ok(Race {
            config: self.config,
            store: self.store.unwrap_or_else(|| Arc::new(FileStore)),
            inbound_tx,
            inbound_rx,
        })
    }
}

impl Default for RaceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Asks a running race to stop gracefully.
///
/// Workers finish their current step, report their counts, and the race
/// returns its summary as usual.
#[derive(Clone)]
pub struct StopHandle {
    inbound: Sender<Inbound>,
}

impl StopHandle {
    pub fn request_stop(&self) {
        let _ = self.inbound.send(Inbound::Interrupt);
    }
}

/// The glitch race
pub struct Race {
    config: RaceConfig,
    store: Arc<dyn GlitchStore>,
    inbound_tx: Sender<Inbound>,
    inbound_rx: Receiver<Inbound>,
}

impl Race {
    /// Create a new race builder
    pub fn builder() -> RaceBuilder {
        RaceBuilder::new()
    }

    pub fn config(&self) -> &RaceConfig {
        &self.config
    }

    /// Handle for stopping the race from another thread or a signal handler
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            inbound: self.inbound_tx.clone(),
        }
    }

    /// Run the race without events
    pub fn run(&self) -> Result<RaceSummary, GlitchError> {
        self.run_with_events(&null_sender())
    }

    /// Run the race with event reporting
    pub fn run_with_events(&self, events: &EventSender) -> Result<RaceSummary, GlitchError> {
        let started = Instant::now();

        // a stop or fault that arrived after the previous run ended
        let stale = self.inbound_rx.try_iter().count();
        if stale > 0 {
            tracing::debug!(stale, "discarding messages left over from a previous run");
        }

        let source = &self.config.source;

        let raw = std::fs::read(source).map_err(|e| GlitchError::Read {
            path: source.clone(),
            source: e,
        })?;
        let time = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let data = jpeg::stamp(&raw, self.config.label.as_deref(), &time)?;
        let region = jpeg::locate(&data)?;

        tracing::info!(
            source = %source.display(),
            from = region.from,
            to = region.to,
            check = self.config.check,
            "glitching"
        );

        if self.config.check {
            self.run_check(data, region, started, events)
        } else {
            self.run_race(data, region, started, events)
        }
    }

    fn rng_for(&self, worker: usize) -> ChaCha8Rng {
        match self.config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed.wrapping_add(worker as u64)),
            None => ChaCha8Rng::from_rng(&mut rand::rng()),
        }
    }

    /// One batch of `iterations` toggles, saved as `<stem>-glitch`
    fn run_check(
        &self,
        mut data: Vec<u8>,
        region: EntropyRegion,
        started: Instant,
        events: &EventSender,
    ) -> Result<RaceSummary, GlitchError> {
        let mut rng = self.rng_for(0);
        glitch(&mut data, region, self.config.iterations, &mut rng);

        let stem = self
            .config
            .source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let output = self
            .store
            .save(&self.config.source, &format!("{stem}-glitch"), &data)?;

        let summary = RaceSummary {
            duration_ms: started.elapsed().as_millis() as u64,
            mutations: MutationCount::from(self.config.iterations as u64),
            best: hash(&data),
            workers: 0,
            output: Some(output),
        };
        events.send(Event::Completed {
            summary: summary.clone(),
        });
        Ok(summary)
    }

    fn run_race(
        &self,
        data: Vec<u8>,
        region: EntropyRegion,
        started: Instant,
        events: &EventSender,
    ) -> Result<RaceSummary, GlitchError> {
        let workers = self.config.workers;
        let mut commands: Vec<Sender<Command>> = Vec::with_capacity(workers);
        let mut handles: Vec<JoinHandle<()>> = Vec::with_capacity(workers);

        for id in 0..workers {
            let (command_tx, command_rx) = unbounded();
            let outbox = self.inbound_tx.clone();
            let store = Arc::clone(&self.store);
            let rng = self.rng_for(id);

            let spawned = thread::Builder::new()
                .name(format!("glitch-worker-{id}"))
                .spawn(move || worker::serve(id, command_rx, outbox, store, rng));
            let handle = match spawned {
                Ok(handle) => handle,
                Err(source) => {
                    broadcast(&commands, &Command::Stop);
                    return Err(GlitchError::Spawn { worker: id, source });
                }
            };

            let _ = command_tx.send(Command::Start(Job {
                file: self.config.source.clone(),
                data: data.clone(),
                iterations: self.config.iterations,
                from: region.from,
                to: region.to,
            }));
            commands.push(command_tx);
            handles.push(handle);
        }

        events.send(Event::Started {
            workers,
            from: region.from,
            to: region.to,
        });

        let mut coordinator = Coordinator::started_at(workers, started);
        coordinate(&mut coordinator, &self.inbound_rx, &commands, events)?;

        for handle in handles {
            let _ = handle.join();
        }

        let summary = coordinator.summary();
        tracing::info!(
            duration_ms = summary.duration_ms,
            mutations = %summary.mutations,
            best = %summary.best,
            "race finished"
        );
        events.send(Event::Completed {
            summary: summary.clone(),
        });
        Ok(summary)
    }
}

/// Fold worker messages into `coordinator` until every worker has closed.
///
/// Each accepted `update` is echoed to every worker as `set`, the sender
/// included. Faults and protocol violations stop all workers and end the
/// race with an error.
fn coordinate(
    coordinator: &mut Coordinator,
    inbox: &Receiver<Inbound>,
    commands: &[Sender<Command>],
    events: &EventSender,
) -> Result<(), GlitchError> {
    while !coordinator.is_finished() {
        // the race keeps a sender alive, so this only fails if it is gone
        let Ok(message) = inbox.recv() else {
            return Err(GlitchError::Config("coordinator mailbox closed".to_string()));
        };

        match message {
            Inbound::Report { worker, report } => match coordinator.on_report(report) {
                Err(violation) => {
                    broadcast(commands, &Command::Stop);
                    return Err(violation.into());
                }
                Ok(Decision::Improved(hash)) => {
                    broadcast(commands, &Command::Set { hash });
                    tracing::debug!(worker, %hash, "new best");
                    events.send(Event::NewBest { worker, hash });
                }
                Ok(Decision::Ignored) => {}
                Ok(Decision::Closed(count)) => {
                    tracing::debug!(worker, %count, "worker closed");
                    events.send(Event::WorkerClosed { worker, count });
                }
            },
            Inbound::Interrupt => {
                tracing::warn!("stop requested, waiting for workers to close");
                events.send(Event::Stopping);
                broadcast(commands, &Command::Stop);
            }
            Inbound::Fault { worker, error } => {
                tracing::warn!(worker, %error, "aborting race");
                events.send(Event::WorkerFailed {
                    worker,
                    message: error.to_string(),
                });
                broadcast(commands, &Command::Stop);
                return Err(error);
            }
        }
    }
    Ok(())
}

/// Send `command` to every worker; workers that already exited are skipped
fn broadcast(commands: &[Sender<Command>], command: &Command) {
    for tx in commands {
        let _ = tx.send(command.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::jpeg::fixtures::{baseline_jpeg, SAMPLE_SCAN};
    use crate::core::hasher::Digest256;
    use crate::core::protocol::Report;
    use crate::core::storage::MemoryStore;
    use crate::events::event_channel;
    use tempfile::TempDir;

    fn write_fixture(dir: &TempDir, name: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, baseline_jpeg(&SAMPLE_SCAN)).unwrap();
        path
    }

    #[test]
    fn builder_applies_settings() {
        let race = Race::builder()
            .source("/photos/cat.jpg")
            .iterations(10)
            .workers(3)
            .label("bob")
            .seed(7)
            .build()
            .unwrap();

        let config = race.config();
        assert_eq!(config.iterations, 10);
        assert_eq!(config.workers, 3);
        assert_eq!(config.label.as_deref(), Some("bob"));
        assert_eq!(config.seed, Some(7));
        assert!(!config.check);
    }

    #[test]
    fn defaults_match_cli_defaults() {
        let config = RaceConfig::default();
        assert_eq!(config.iterations, 500);
        assert!(config.workers >= 1);
        assert_eq!(config.label, None);
    }

    #[test]
    fn builder_rejects_bad_settings() {
        assert!(Race::builder().build().is_err());
        assert!(Race::builder().source("a.jpg").iterations(0).build().is_err());
        assert!(Race::builder().source("a.jpg").workers(0).build().is_err());
    }

    #[test]
    fn missing_source_is_a_read_error() {
        let dir = TempDir::new().unwrap();
        let race = Race::builder()
            .source(dir.path().join("missing.jpg"))
            .build()
            .unwrap();

        assert!(matches!(race.run(), Err(GlitchError::Read { .. })));
    }

    #[test]
    fn non_jpeg_is_malformed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.jpg");
        std::fs::write(&path, b"plain text").unwrap();

        let race = Race::builder().source(&path).check(true).build().unwrap();

        assert!(matches!(race.run(), Err(GlitchError::MalformedImage(_))));
    }

    #[test]
    fn check_mode_saves_one_glitch() {
        let dir = TempDir::new().unwrap();
        let path = write_fixture(&dir, "cat.jpg");
        let store = Arc::new(MemoryStore::new());

        let race = Race::builder()
            .source(&path)
            .iterations(25)
            .check(true)
            .seed(1)
            .store(store.clone())
            .build()
            .unwrap();
        let summary = race.run().unwrap();

        let saved = store.saved();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].path, dir.path().join("cat-glitch.jpg"));
        assert_eq!(summary.best, hash(&saved[0].data));
        assert_eq!(summary.mutations, MutationCount::from(25u64));
        assert_eq!(summary.workers, 0);
        assert_eq!(summary.output, Some(dir.path().join("cat-glitch.jpg")));
    }

    #[test]
    fn race_stops_gracefully_and_counts_everything() {
        let dir = TempDir::new().unwrap();
        let path = write_fixture(&dir, "dog.jpg");
        let store = Arc::new(MemoryStore::new());

        let race = Race::builder()
            .source(&path)
            .iterations(20)
            .workers(2)
            .seed(99)
            .store(store.clone())
            .build()
            .unwrap();
        let stop = race.stop_handle();
        let (sender, receiver) = event_channel();

        let watcher = thread::spawn(move || {
            let mut bests = Vec::new();
            let mut closed = Vec::new();
            let mut completed = None;
            for event in receiver.iter() {
                match event {
                    Event::NewBest { hash, .. } => {
                        if bests.is_empty() {
                            stop.request_stop();
                        }
                        bests.push(hash);
                    }
                    Event::WorkerClosed { count, .. } => closed.push(count),
                    Event::Completed { summary } => completed = Some(summary),
                    _ => {}
                }
            }
            (bests, closed, completed)
        });

        let summary = race.run_with_events(&sender).unwrap();
        drop(sender);
        let (bests, closed, completed) = watcher.join().unwrap();

        assert_eq!(completed, Some(summary.clone()));
        assert_eq!(closed.len(), 2);

        let mut total = MutationCount::zero();
        for count in &closed {
            total += count;
        }
        assert_eq!(summary.mutations, total);

        assert!(!bests.is_empty());
        assert!(bests.windows(2).all(|w| w[1] < w[0]));
        assert_eq!(summary.best, *bests.last().unwrap());
        assert!(store
            .names()
            .contains(&summary.best.to_string()));
    }

    fn digest(first: u8) -> Digest256 {
        let mut bytes = [0x55; 32];
        bytes[0] = first;
        Digest256::from_bytes(bytes)
    }

    fn update(worker: usize, first: u8) -> Inbound {
        Inbound::Report {
            worker,
            report: Report::Update {
                hash: digest(first),
            },
        }
    }

    fn close(worker: usize) -> Inbound {
        Inbound::Report {
            worker,
            report: Report::Close {
                count: MutationCount::from(1u64),
            },
        }
    }

    #[test]
    fn accepted_updates_are_echoed_to_every_worker() {
        let (inbound_tx, inbound_rx) = unbounded();
        let (senders, receivers): (Vec<Sender<Command>>, Vec<Receiver<Command>>) =
            (0..3).map(|_| unbounded()).unzip();
        let (events, event_rx) = event_channel();

        for message in [
            update(1, 0x80),
            update(2, 0x90),
            update(0, 0x10),
            update(1, 0x10),
            close(0),
            close(1),
            close(2),
        ] {
            inbound_tx.send(message).unwrap();
        }

        let mut coordinator = Coordinator::started_at(3, Instant::now());
        coordinate(&mut coordinator, &inbound_rx, &senders, &events).unwrap();
        drop(events);

        // the sender of each update is told too
        for rx in &receivers {
            let received: Vec<Command> = rx.try_iter().collect();
            assert_eq!(
                received,
                vec![
                    Command::Set { hash: digest(0x80) },
                    Command::Set { hash: digest(0x10) }
                ]
            );
        }

        let bests: Vec<usize> = event_rx
            .iter()
            .filter_map(|e| match e {
                Event::NewBest { worker, .. } => Some(worker),
                _ => None,
            })
            .collect();
        assert_eq!(bests, vec![1, 0]);
        assert_eq!(coordinator.total(), &MutationCount::from(3u64));
    }

    #[test]
    fn fault_stops_every_worker() {
        let (inbound_tx, inbound_rx) = unbounded();
        let (senders, receivers): (Vec<Sender<Command>>, Vec<Receiver<Command>>) =
            (0..2).map(|_| unbounded()).unzip();
        inbound_tx
            .send(Inbound::Fault {
                worker: 1,
                error: GlitchError::Config("disk full".to_string()),
            })
            .unwrap();

        let mut coordinator = Coordinator::started_at(2, Instant::now());
        let result = coordinate(&mut coordinator, &inbound_rx, &senders, &null_sender());

        assert!(matches!(result, Err(GlitchError::Config(_))));
        for rx in &receivers {
            assert_eq!(rx.try_iter().collect::<Vec<_>>(), vec![Command::Stop]);
        }
    }

    #[test]
    fn stop_left_over_from_a_finished_run_is_discarded() {
        let dir = TempDir::new().unwrap();
        let path = write_fixture(&dir, "late.jpg");
        let race = Race::builder()
            .source(&path)
            .iterations(20)
            .workers(1)
            .seed(5)
            .store(Arc::new(MemoryStore::new()))
            .build()
            .unwrap();

        // e.g. Ctrl-C pressed after the previous run returned
        race.stop_handle().request_stop();

        let stop = race.stop_handle();
        let (sender, receiver) = event_channel();
        let watcher = thread::spawn(move || {
            let mut seen = Vec::new();
            for event in receiver.iter() {
                match event {
                    Event::NewBest { .. } if !seen.contains(&"best") => {
                        seen.push("best");
                        stop.request_stop();
                    }
                    Event::Stopping => seen.push("stopping"),
                    _ => {}
                }
            }
            seen
        });

        race.run_with_events(&sender).unwrap();
        drop(sender);

        // the queued stop would have ended the race before any best
        assert_eq!(watcher.join().unwrap(), vec!["best", "stopping"]);
    }
}
