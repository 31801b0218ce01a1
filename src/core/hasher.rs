//! # Hasher
//!
//! Fingerprints a glitched buffer with double SHA-256, bytes reversed the
//! way proof-of-work hashes are displayed. A smaller fingerprint wins.

use crate::error::ProtocolError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// A 256-bit fingerprint, stored most-significant byte first.
///
/// Ordering on the stored bytes matches ordering on the fixed-width
/// lowercase hex rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Digest256([u8; 32]);

impl Digest256 {
    /// The starting point every race tries to beat
    pub const MAX: Self = Self([0xFF; 32]);

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl Default for Digest256 {
    fn default() -> Self {
        Self::MAX
    }
}

/// Lowercase hex, 64 characters
impl fmt::Display for Digest256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl FromStr for Digest256 {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ProtocolError::InvalidHash {
            value: s.to_string(),
        };
        if s.len() != 64 || !s.is_ascii() {
            return Err(invalid());
        }

        let mut bytes = [0u8; 32];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&s[2 * i..2 * i + 2], 16).map_err(|_| invalid())?;
        }
        Ok(Self(bytes))
    }
}

impl Serialize for Digest256 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Digest256 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// Double SHA-256 of `data`, byte order reversed
pub fn hash(data: &[u8]) -> Digest256 {
    let first = Sha256::digest(data);
    let second = Sha256::digest(first);

    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&second);
    bytes.reverse();
    Digest256(bytes)
}
