//! # Protocol
//!
//! Tagged records exchanged between the coordinator and its workers.
//!
//! On the wire every record is a JSON object whose `action` field names
//! the message:
//!
//! | action   | direction            | fields                           |
//! |----------|----------------------|----------------------------------|
//! | `start`  | coordinator → worker | `file, data, iterations, from, to` |
//! | `set`    | coordinator → worker | `hash`                           |
//! | `stop`   | coordinator → worker |                                  |
//! | `update` | worker → coordinator | `hash`                           |
//! | `close`  | worker → coordinator | `count`                          |
//!
//! An unrecognized action is a fatal [`ProtocolError::UnknownTag`].

use super::count::MutationCount;
use super::hasher::Digest256;
use super::jpeg::EntropyRegion;
use crate::error::{GlitchError, ProtocolError};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Everything a worker needs to start racing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    /// Source image path; glitches are saved next to it
    pub file: PathBuf,
    /// Pristine (stamped) image bytes
    pub data: Vec<u8>,
    /// Mutations per batch before resetting to `data`
    pub iterations: usize,
    pub from: usize,
    pub to: usize,
}

impl Job {
    pub fn region(&self) -> EntropyRegion {
        EntropyRegion {
            from: self.from,
            to: self.to,
        }
    }
}

/// Coordinator → worker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum Command {
    Start(Job),
    Set { hash: Digest256 },
    Stop,
}

impl Command {
    const ACTIONS: &'static [&'static str] = &["start", "set", "stop"];

    pub fn action(&self) -> &'static str {
        match self {
            Command::Start(_) => "start",
            Command::Set { .. } => "set",
            Command::Stop => "stop",
        }
    }

    pub fn encode(&self) -> Result<String, ProtocolError> {
        encode(self)
    }

    pub fn decode(raw: &str) -> Result<Self, ProtocolError> {
        decode(raw, Self::ACTIONS)
    }
}

/// Worker → coordinator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum Report {
    Update { hash: Digest256 },
    Close { count: MutationCount },
}

impl Report {
    const ACTIONS: &'static [&'static str] = &["update", "close"];

    pub fn action(&self) -> &'static str {
        match self {
            Report::Update { .. } => "update",
            Report::Close { .. } => "close",
        }
    }

    pub fn encode(&self) -> Result<String, ProtocolError> {
        encode(self)
    }

    pub fn decode(raw: &str) -> Result<Self, ProtocolError> {
        decode(raw, Self::ACTIONS)
    }
}

/// What lands in the coordinator's mailbox.
///
/// Besides worker reports this carries the two out-of-band signals the
/// coordinator reacts to: a worker that died and an operator interrupt.
#[derive(Debug)]
pub enum Inbound {
    Report { worker: usize, report: Report },
    Fault { worker: usize, error: GlitchError },
    Interrupt,
}

fn encode<T: Serialize>(message: &T) -> Result<String, ProtocolError> {
    serde_json::to_string(message).map_err(|e| ProtocolError::Malformed(e.to_string()))
}

fn decode<T: DeserializeOwned>(raw: &str, actions: &[&str]) -> Result<T, ProtocolError> {
    let value: serde_json::Value =
        serde_json::from_str(raw).map_err(|e| ProtocolError::Malformed(e.to_string()))?;

    let tag = value
        .get("action")
        .and_then(serde_json::Value::as_str)
        .ok_or(ProtocolError::MissingTag)?;
    if !actions.contains(&tag) {
        return Err(ProtocolError::UnknownTag {
            tag: tag.to_string(),
        });
    }

    serde_json::from_value(value).map_err(|e| ProtocolError::Malformed(e.to_string()))
}
