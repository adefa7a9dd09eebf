//! Error types for setup-time failures.
//!
//! Per-tick failures never surface here: the stream isolates panicking
//! subscribers and the game rules guard every out-of-range read.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// An event source could not be attached to the host.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SourceError {
    /// The key name is not a character, code name, or known named key.
    #[error("unknown key name: {0:?}")]
    UnknownKey(String),

    /// Click events were requested but the host does not capture the mouse.
    #[error("click events require mouse capture to be enabled")]
    MouseCaptureDisabled,

    /// Timers must have a non-zero interval.
    #[error("timer interval must be greater than zero")]
    ZeroInterval,
}

/// The configuration file could not be used.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level error for the library and binaries.
#[derive(Debug, Error)]
pub enum FlapError {
    #[error("terminal I/O error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("event source error: {0}")]
    Source(#[from] SourceError),

    #[error("invalid event script: {0}")]
    Script(String),
}

/// Result type for fallible setup operations.
pub type FlapResult<T> = Result<T, FlapError>;
