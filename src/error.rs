//! Error types for extra-copies

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Why a single (message, destination) copy did not happen.
///
/// These never leave the fan-out path; they end up in the log only.
#[derive(Error, Debug)]
pub enum CopyError {
    #[error("destination not found: namespace not found for mailbox \"{0}\"")]
    DestinationNotFound(String),

    #[error("cannot open destination mailbox \"{destination}\": {source}")]
    Open { destination: String, source: Error },

    #[error("cannot begin transaction in \"{destination}\": {source}")]
    Begin { destination: String, source: Error },

    #[error("copy failed: cannot copy mail to \"{destination}\": {source}")]
    Copy { destination: String, source: Error },

    #[error("cannot commit copy into \"{destination}\": {source}")]
    Commit { destination: String, source: Error },
}
