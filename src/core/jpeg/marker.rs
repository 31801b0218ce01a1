//! Marker stream scanning.
//!
//! A marker is `0xFF` followed by a code byte. Some markers stand alone,
//! others introduce a segment whose big-endian length (which counts the
//! length field itself) follows the code.

use std::fmt;

/// How a marker code is laid out in the stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerClass {
    /// No length field: stuffing zero, restart markers, SOI, EOI
    Fixed,
    /// A two-byte length field follows the code
    Variable,
    /// Not a marker boundary this scanner knows about
    Unknown,
}

/// A marker code byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Marker(pub u8);

impl Marker {
    /// Stuffed zero after a literal `0xFF` in entropy-coded data
    pub const STUFFING: Self = Self(0x00);
    /// Start of frame, baseline DCT
    pub const SOF0: Self = Self(0xC0);
    /// Start of frame, progressive DCT
    pub const SOF2: Self = Self(0xC2);
    /// Huffman table definition
    pub const DHT: Self = Self(0xC4);
    /// Start of image
    pub const SOI: Self = Self(0xD8);
    /// End of image
    pub const EOI: Self = Self(0xD9);
    /// Start of scan
    pub const SOS: Self = Self(0xDA);
    /// Quantization table definition
    pub const DQT: Self = Self(0xDB);
    /// Restart interval definition
    pub const DRI: Self = Self(0xDD);
    /// JFIF application segment
    pub const APP0: Self = Self(0xE0);
    /// Comment
    pub const COM: Self = Self(0xFE);

    /// Classify this code
    pub fn class(self) -> MarkerClass {
        match self.0 {
            0x00 | 0xD0..=0xD9 => MarkerClass::Fixed,
            0xC0 | 0xC2 | 0xC4 | 0xDA | 0xDB | 0xDD | 0xE0..=0xEF | 0xFE => MarkerClass::Variable,
            _ => MarkerClass::Unknown,
        }
    }

    /// Short mnemonic used in logs and errors
    pub fn name(self) -> &'static str {
        match self.0 {
            0x00 => "stuffing",
            0xC0 => "SOF0",
            0xC2 => "SOF2",
            0xC4 => "DHT",
            0xD0..=0xD7 => "RST",
            0xD8 => "SOI",
            0xD9 => "EOI",
            0xDA => "SOS",
            0xDB => "DQT",
            0xDD => "DRI",
            0xE0..=0xEF => "APP",
            0xFE => "COM",
            _ => "unknown",
        }
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (0xFF{:02X})", self.name(), self.0)
    }
}

/// Read the big-endian segment length stored at `at`
pub fn segment_length(buffer: &[u8], at: usize) -> Option<usize> {
    let field = buffer.get(at..at.checked_add(2)?)?;
    Some(usize::from(u16::from_be_bytes([field[0], field[1]])))
}

/// Find the offset of the `0xFF` byte introducing `target`.
///
/// Scanning starts at `from`. Fixed-size markers are stepped over and
/// variable-size segments are skipped whole, so `0xFF` bytes inside
/// segment payloads are never mistaken for markers. Returns `None` when
/// the buffer ends first, including when a segment length runs past it.
pub fn find_marker(buffer: &[u8], target: Marker, from: usize) -> Option<usize> {
    let mut i = from;
    while i + 1 < buffer.len() {
        if buffer[i] == 0xFF {
            let code = Marker(buffer[i + 1]);
            if code == target {
                return Some(i);
            }
            match code.class() {
                MarkerClass::Fixed => {
                    i += 2;
                    continue;
                }
                MarkerClass::Variable => {
                    let length = segment_length(buffer, i + 2)?;
                    i += length + 2;
                    continue;
                }
                MarkerClass::Unknown => {}
            }
        }
        i += 1;
    }
    None
}
