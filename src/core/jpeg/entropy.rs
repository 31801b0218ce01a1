//! Locating the entropy-coded scan data.
//!
//! Only baseline images with a single scan are handled. On a progressive
//! image the located range would span several scans and their headers.

use super::marker::{find_marker, segment_length, Marker};
use crate::error::JpegError;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Half-open byte range `[from, to)` that may be mutated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntropyRegion {
    pub from: usize,
    pub to: usize,
}

impl EntropyRegion {
    /// Number of mutable bytes
    pub fn len(&self) -> usize {
        self.to - self.from
    }

    pub fn is_empty(&self) -> bool {
        self.from >= self.to
    }

    /// Byte range
    pub fn bytes(&self) -> Range<usize> {
        self.from..self.to
    }

    /// Bit indices eligible for toggling
    pub fn bits(&self) -> Range<usize> {
        8 * self.from..8 * self.to
    }

    /// Whether the region lies inside a buffer of `len` bytes
    pub fn fits(&self, len: usize) -> bool {
        self.from < self.to && self.to <= len
    }
}

/// Compute the mutable region of a baseline JPEG.
///
/// `from` is the first byte after the SOS header and `to` sits two bytes
/// before the EOI marker, so a stuffed zero written after the last
/// mutable byte still lands inside the scan.
pub fn locate(buffer: &[u8]) -> Result<EntropyRegion, JpegError> {
    let sos = find_marker(buffer, Marker::SOS, 0).ok_or(JpegError::MissingMarker {
        marker: Marker::SOS.name(),
    })?;
    let header = segment_length(buffer, sos + 2).ok_or(JpegError::Truncated {
        marker: Marker::SOS.name(),
        offset: sos,
    })?;
    let from = sos + header + 2;

    let eoi = find_marker(buffer, Marker::EOI, from).ok_or(JpegError::MissingMarker {
        marker: Marker::EOI.name(),
    })?;
    let to = eoi.saturating_sub(2);

    if from >= to {
        return Err(JpegError::EmptyScan { from, to });
    }

    Ok(EntropyRegion { from, to })
}
