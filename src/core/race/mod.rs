//! # Race Module
//!
//! Orchestrates the glitch race.
//!
//! ## Stages
//! 1. **Load** - Read the source image and stamp the attribution comment
//! 2. **Locate** - Find the entropy-coded scan data
//! 3. **Race** - One worker per CPU mutates, hashes and reports
//! 4. **Report** - Wait for every worker to close and summarize
//!
//! In check mode stage 3 is replaced by a single batch on the calling
//! thread, saved as `<name>-glitch`.
//!
//! ## Parallelism
//! Workers are plain OS threads talking to the coordinator over
//! crossbeam channels. Nothing is shared mutably between them.

mod executor;

pub use executor::{default_workers, Race, RaceBuilder, RaceConfig, StopHandle};
