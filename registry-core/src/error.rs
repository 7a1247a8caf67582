//! Error types for the registry ledger

use thiserror::Error;

/// Result type for ledger operations
pub type Result<T> = std::result::Result<T, Error>;

/// Ledger errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Registry business rule rejected the call. The message is the revert
    /// reason exactly as a client observes it.
    #[error("{0}")]
    Revert(String),

    /// Transaction rejected before admission (nonce, chain id, target)
    #[error("Invalid transaction: {0}")]
    InvalidTransaction(String),

    /// Signature verification failed
    #[error("Signature verification failed: {0}")]
    SignatureError(String),

    /// Block not found
    #[error("Block not found: {0}")]
    BlockNotFound(u64),

    /// Malformed identifier or encoded value
    #[error("Decode error: {0}")]
    Decode(String),

    /// Concurrency error (actor mailbox closed, etc.)
    #[error("Concurrency error: {0}")]
    Concurrency(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(String),
}

impl Error {
    /// Build a revert error from a reason string
    pub fn revert(reason: impl Into<String>) -> Self {
        Error::Revert(reason.into())
    }

    /// True if this error is a registry revert
    pub fn is_revert(&self) -> bool {
        matches!(self, Error::Revert(_))
    }
}

impl From<bincode::Error> for Error {
    fn from(err: bincode::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(format!("Failed to parse config: {}", err))
    }
}
