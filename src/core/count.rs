//! Mutation counter that never overflows.

use crate::error::ProtocolError;
use num_bigint::BigUint;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::AddAssign;
use std::str::FromStr;

/// Number of mutations performed, arbitrary precision.
///
/// Serialized as a decimal string so the full value survives JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MutationCount(BigUint);

impl MutationCount {
    pub fn zero() -> Self {
        Self::default()
    }

    /// Count one more mutation
    pub fn increment(&mut self) {
        self.0 += 1u32;
    }

    pub fn value(&self) -> &BigUint {
        &self.0
    }
}

impl From<u64> for MutationCount {
    fn from(value: u64) -> Self {
        Self(BigUint::from(value))
    }
}

impl From<BigUint> for MutationCount {
    fn from(value: BigUint) -> Self {
        Self(value)
    }
}

impl AddAssign<&MutationCount> for MutationCount {
    fn add_assign(&mut self, rhs: &MutationCount) {
        self.0 += &rhs.0;
    }
}

impl fmt::Display for MutationCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for MutationCount {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ProtocolError::InvalidCount {
                value: s.to_string(),
            });
        }
        s.parse::<BigUint>()
            .map(Self)
            .map_err(|_| ProtocolError::InvalidCount {
                value: s.to_string(),
            })
    }
}

impl Serialize for MutationCount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MutationCount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
