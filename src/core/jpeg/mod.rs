//! # JPEG Module
//!
//! Byte-level helpers for baseline JPEG containers.
//!
//! ## Modules
//! - `marker` - Marker classification and scanning
//! - `entropy` - Locates the entropy-coded scan data
//! - `meta` - Rewrites the header with an attribution comment
//!
//! Nothing here decodes pixels. The container is walked just far enough
//! to know which bytes can be changed without breaking it.

pub mod entropy;
pub mod marker;
pub mod meta;

#[cfg(test)]
pub(crate) mod fixtures;

pub use entropy::{locate, EntropyRegion};
pub use marker::{find_marker, Marker, MarkerClass};
pub use meta::stamp;
