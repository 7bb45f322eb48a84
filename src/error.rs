//! Error types for the logging core

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors produced while configuring channels or writing log lines
#[derive(Debug, Error)]
pub enum Error {
    /// The output directory could not be created
    #[error("failed to create log directory {}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The output path exists but cannot hold log files
    #[error("log directory {} is not usable: {reason}", path.display())]
    UnusableDir { path: PathBuf, reason: &'static str },

    /// Files cannot be created in the output directory
    #[error("log directory {} is not writable", path.display())]
    NotWritable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The line template could not be parsed
    #[error("invalid line format {template:?}: {reason}")]
    InvalidFormat { template: String, reason: String },

    /// A dated log file could not be opened
    #[error("failed to open log file {}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Appending a line to the current file failed
    #[error("failed to write to log file {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The audit payload could not be turned into a JSON object
    #[error("failed to encode audit payload")]
    Encode(#[from] serde_json::Error),

    /// The audit payload serialized to something other than a JSON object
    #[error("audit payload must be a JSON object, got {0}")]
    AuditPayload(&'static str),
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;
