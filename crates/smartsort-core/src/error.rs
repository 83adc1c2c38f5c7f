use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// The root of an operation could not be listed or prepared.
    #[error("Scan failed for {}: {source}", path.display())]
    ScanFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A single copy, move or hash failed. Never aborts a batch.
    #[error("IO error on {}: {source}", path.display())]
    IoFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{0} is not available")]
    CapabilityUnavailable(&'static str),

    #[error("An operation is already running for {}", .0.display())]
    AlreadyRunning(PathBuf),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("{0}")]
    Other(String),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::IoFailure {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn scan(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::ScanFailure {
            path: path.into(),
            source,
        }
    }
}
