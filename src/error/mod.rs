//! # Error Module
//!
//! Error types for the glitch race.
//!
//! ## Design Principles
//! - **Never panic** on image data - return errors instead
//! - **Include context** - paths, marker names, offsets
//! - **Fail fast** - malformed images, I/O failures and protocol
//!   violations all end the run; nothing is retried

use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum GlitchError {
    #[error("Malformed image: {0}")]
    MalformedImage(#[from] JpegError),

    #[error("Protocol violation: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Failed to read image {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write glitched image {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to spawn worker {worker}: {source}")]
    Spawn {
        worker: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Errors raised while walking the JPEG container
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JpegError {
    #[error("no {marker} marker found (only baseline single-scan JPEGs are supported)")]
    MissingMarker { marker: &'static str },

    #[error("{marker} segment at offset {offset} is truncated")]
    Truncated { marker: &'static str, offset: usize },

    #[error("scan holds no entropy-coded data (from {from}, to {to})")]
    EmptyScan { from: usize, to: usize },

    #[error("attribution comment is {len} bytes, a segment holds at most 65533")]
    CommentTooLong { len: usize },
}

/// Errors in the coordinator/worker message exchange
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("unknown message action: {tag}")]
    UnknownTag { tag: String },

    #[error("message has no action tag")]
    MissingTag,

    #[error("malformed message: {0}")]
    Malformed(String),

    #[error("unexpected '{action}' while worker is {state}")]
    Unexpected {
        action: &'static str,
        state: &'static str,
    },

    #[error("invalid hash '{value}' (expected 64 hex characters)")]
    InvalidHash { value: String },

    #[error("invalid mutation count '{value}'")]
    InvalidCount { value: String },

    #[error("invalid job: {0}")]
    InvalidJob(String),
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, GlitchError>;
