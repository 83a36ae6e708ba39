//! Crate error types
//!
//! Runtime anomalies (bumps, uncalibrated reads, degenerate reference
//! placement) are reported as game events or `Option`s, never as errors.
//! Only configuration and engine plumbing can fail.

use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by configuration loading and the processing engine
#[derive(Debug, Error)]
pub enum Error {
    /// Config file could not be read
    #[error("failed to read config {path}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config JSON could not be parsed
    #[error("invalid config JSON: {0}")]
    ConfigParse(#[from] serde_json::Error),

    /// Config parsed but holds unusable values
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// The processing thread has stopped and no longer accepts commands
    #[error("engine is not running")]
    EngineStopped,

    /// The processing thread could not be spawned
    #[error("failed to spawn engine thread: {0}")]
    Spawn(#[source] std::io::Error),
}

/// Crate result alias
pub type Result<T> = std::result::Result<T, Error>;
