//! # Core Module
//!
//! The glitch engine, independent of any UI.
//!
//! ## Modules
//! - `jpeg` - Marker scanning, scan location, attribution stamp
//! - `mutator` - JPEG-safe bit toggling
//! - `hasher` - Double SHA-256 fingerprints
//! - `count` - Arbitrary-precision mutation counter
//! - `protocol` - Coordinator/worker messages
//! - `storage` - Where glitched images are written
//! - `worker` - The per-thread mutate/hash/report loop
//! - `coordinator` - Global best hash and termination tally
//! - `race` - Orchestrates the full run

pub mod coordinator;
pub mod count;
pub mod hasher;
pub mod jpeg;
pub mod mutator;
pub mod protocol;
pub mod race;
pub mod storage;
pub mod worker;

// Re-export commonly used types
pub use count::MutationCount;
pub use hasher::Digest256;
pub use jpeg::EntropyRegion;
pub use protocol::{Command, Job, Report};
pub use race::{Race, RaceBuilder, StopHandle};
