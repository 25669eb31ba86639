//! Error types for each collaborator boundary.
//!
//! Only [`ConfigError`] is fatal. Everything else is reported by the
//! scheduler and the loop keeps running.

use std::path::PathBuf;

/// Startup configuration failure.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed TOML or a missing required key.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// A snapshot could not be taken this cycle.
#[derive(Debug, thiserror::Error)]
pub enum CollectionError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {reason}")]
    Parse { path: String, reason: String },

    #[error("statvfs failed for {path}: {source}")]
    Statvfs {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0} is not supported on this platform")]
    Unsupported(&'static str),
}

impl CollectionError {
    pub(crate) fn read(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn parse(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Alert delivery failure.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("email build error: {0}")]
    Build(String),

    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),
}

/// History could not be written. The in-memory copy is kept.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode history: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Failure of one scheduler iteration.
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    /// Skip the cycle, keep the normal interval.
    #[error(transparent)]
    Collection(#[from] CollectionError),

    /// The collection worker panicked or was cancelled.
    #[error("collector worker failed: {0}")]
    Worker(String),
}
