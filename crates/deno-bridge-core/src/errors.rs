//! Error types for binary resolution, download and execution
//!
//! Recoverable conditions (a tier that does not produce a candidate, a missing
//! or unreadable version marker) never surface here; they are absorbed by the
//! locator. Everything in this enum is a failure the caller has to see.

use std::ffi::OsString;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Could not read downloaded binary at '{}'", path.display())]
    UnreadableDownload { path: PathBuf },

    #[error("Download via '{downloader}' failed: {reason}")]
    DownloadFailed { downloader: String, reason: String },

    #[error("Failed to spawn '{}': {message}", binary.display())]
    SpawnFailed { binary: PathBuf, message: String },

    #[error("'{}' exited with code {code:?} (args: {args:?})", binary.display())]
    ProcessFailed {
        binary: PathBuf,
        code: Option<i32>,
        args: Vec<OsString>,
    },

    #[error("Bundler failed: {0}")]
    BundlerError(String),

    #[error("Manifest generation failed: {0}")]
    ManifestError(String),

    #[error("Invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error("Could not determine home directory")]
    HomeDirectoryUnavailable,

    #[error("I/O error: {message}")]
    IoError { message: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<std::io::Error> for BridgeError {
    fn from(err: std::io::Error) -> Self {
        BridgeError::IoError {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for BridgeError {
    fn from(err: serde_json::Error) -> Self {
        BridgeError::SerializationError(err.to_string())
    }
}

/// Result type for bridge operations
pub type BridgeResult<T> = Result<T, BridgeError>;
