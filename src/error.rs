//! Error taxonomy for the publish pipeline.
//!
//! Every stage returns [`PublishError`] and propagates it immediately; nothing is retried or
//! rolled back. The variants map one-to-one onto the failure kinds a caller needs to tell apart:
//! bad input, local filesystem trouble, transport trouble, the overwrite guard firing, and the
//! server rejecting the upload.

use std::fmt;
use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;

/// Boxed source error, as used across the remote-store seam.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Pipeline stage a local I/O failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Rename,
    Timestamp,
    Compress,
    Transfer,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Rename => "rename",
            Stage::Timestamp => "timestamp rename",
            Stage::Compress => "compress",
            Stage::Transfer => "transfer",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum PublishError {
    /// Missing or malformed input, detected before any stage runs.
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("{stage} failed for {}: {source}", path.display())]
    Io {
        stage: Stage,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Transport-level failure: refused connection, DNS, timeout.
    #[error("network error talking to {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: BoxError,
    },

    #[error("file already exists at {url}, set override to true to overwrite")]
    AlreadyExists { url: String },

    #[error("upload rejected with status {status}: {body}")]
    Upload { status: StatusCode, body: String },

    /// Only produced under the strict existence policy.
    #[error("existence check for {url} returned unexpected status {status}")]
    UnexpectedStatus { url: String, status: StatusCode },

    #[error("publish cancelled before completion")]
    Cancelled,
}

impl PublishError {
    pub fn io(stage: Stage, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PublishError::Io {
            stage,
            path: path.into(),
            source,
        }
    }

    pub fn network(url: impl Into<String>, source: impl Into<BoxError>) -> Self {
        PublishError::Network {
            url: url.into(),
            source: source.into(),
        }
    }

    /// Process exit code for this failure: 2 for configuration errors, 1 for everything else.
    pub fn exit_code(&self) -> u8 {
        match self {
            PublishError::Configuration(_) => 2,
            _ => 1,
        }
    }
}
