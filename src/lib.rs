//! # JPEG Glitch Race
//!
//! Glitches a baseline JPEG by flipping bits in its entropy-coded scan
//! data, while a pool of workers races to find the glitch with the
//! smallest double SHA-256 hash.
//!
//! ## Core Ideas
//! - **Never break the container** - only scan data is mutated, and
//!   byte-stuffing is kept intact
//! - **Independent trials** - every batch restarts from the source image
//! - **Explicit messages** - workers and coordinator share nothing and
//!   talk only through tagged records
//!
//! ## Architecture
//! - `core` - Scanner, mutator, hasher, worker loop and coordinator
//! - `events` - Progress events for whatever UI drives the race
//! - `error` - Error types

pub mod core;
pub mod error;
pub mod events;

// Re-export commonly used types at the crate root
pub use error::{GlitchError, Result};

/// Initialize tracing for the library
///
/// Honors `RUST_LOG`; otherwise logs warnings, or debug output when
/// `verbose` is set. Calling it twice is harmless.
pub fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
