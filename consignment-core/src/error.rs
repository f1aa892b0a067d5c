//! Error types for the consignment contract

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Result type for contract operations
pub type Result<T> = std::result::Result<T, Error>;

/// Contract errors
#[derive(Error, Debug)]
pub enum Error {
    /// Wrong argument count or unparseable argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Role or status gate not satisfied
    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),

    /// Required record absent on the ledger
    #[error("Not found: {0}")]
    NotFound(String),

    /// Key holds a record of another entity kind
    #[error("Key {key} holds a {found} record, expected {expected}")]
    KindMismatch {
        /// Ledger key
        key: String,
        /// Kind the operation needed
        expected: String,
        /// Kind actually stored
        found: String,
    },

    /// Underlying ledger read/write error
    #[error("Ledger failure: {0}")]
    Ledger(#[from] ledger_store::Error),

    /// JSON encoding error
    #[error("Codec error: {0}")]
    Codec(#[from] serde_json::Error),

    /// Metrics registry error
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    /// Concurrency error (actor mailbox closed, etc.)
    #[error("Concurrency error: {0}")]
    Concurrency(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Classify for callers and metrics
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Error::PreconditionFailed(_) | Error::KindMismatch { .. } => {
                ErrorKind::PreconditionFailed
            }
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::Ledger(_) => ErrorKind::LedgerFailure,
            Error::Codec(_)
            | Error::Metrics(_)
            | Error::Concurrency(_)
            | Error::Config(_)
            | Error::Io(_) => ErrorKind::Internal,
        }
    }
}

/// Error class surfaced to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Wrong arity or malformed argument
    InvalidArgument,
    /// Status or role gate not satisfied
    PreconditionFailed,
    /// Required key absent
    NotFound,
    /// Ledger read/write failed
    LedgerFailure,
    /// Anything else (codec, config, runtime)
    Internal,
}

impl ErrorKind {
    /// Stable label
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidArgument => "InvalidArgument",
            ErrorKind::PreconditionFailed => "PreconditionFailed",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::LedgerFailure => "LedgerFailure",
            ErrorKind::Internal => "Internal",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
