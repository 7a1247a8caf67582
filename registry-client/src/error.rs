//! Error types for the registry client

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Result type for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Client errors
///
/// Every failure that can surface from a registry operation lands in one of
/// these variants. Provider and revert strings are mapped here only through
/// [`crate::classify`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// Input rejected locally; nothing was sent to the network
    #[error("Validation error: {0}")]
    Validation(String),

    /// Caller lacks the role required for the operation
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Provider or ledger could not be reached
    #[error("Network unreachable: {0}")]
    NetworkUnreachable(String),

    /// Active connection targets another network and could not be switched
    #[error("Wrong network: {0}")]
    WrongNetwork(String),

    /// No signer connected, or the wallet refused to expose an account
    #[error("Wallet unavailable: {0}")]
    WalletUnavailable(String),

    /// User declined a signature or network switch
    #[error("User rejected: {0}")]
    UserRejected(String),

    /// Registry business rule rejected the call
    #[error("Reverted: {0}")]
    Reverted(String),

    /// Registry has no such record
    #[error("Not found: {0}")]
    NotFound(String),

    /// Client configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Anything not recognized
    #[error("{0}")]
    Unknown(String),
}

impl ClientError {
    /// Failure category
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::Validation(_) => ErrorKind::Validation,
            ClientError::Unauthorized(_) => ErrorKind::Unauthorized,
            ClientError::NetworkUnreachable(_) => ErrorKind::NetworkUnreachable,
            ClientError::WrongNetwork(_) => ErrorKind::WrongNetwork,
            ClientError::WalletUnavailable(_) => ErrorKind::WalletUnavailable,
            ClientError::UserRejected(_) => ErrorKind::UserRejected,
            ClientError::Reverted(_) | ClientError::NotFound(_) => ErrorKind::RevertedBusinessRule,
            ClientError::Config(_) | ClientError::Unknown(_) => ErrorKind::Unknown,
        }
    }

    /// True for a missing-record revert
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::NotFound(_))
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        ClientError::Config(err.to_string())
    }
}

impl From<toml::de::Error> for ClientError {
    fn from(err: toml::de::Error) -> Self {
        ClientError::Config(format!("Failed to parse config: {}", err))
    }
}

/// Actionable failure category reported on outcomes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    /// Bad input
    Validation,
    /// Provider or ledger unreachable
    NetworkUnreachable,
    /// No usable wallet
    WalletUnavailable,
    /// User declined
    UserRejected,
    /// Connected to another network
    WrongNetwork,
    /// Missing role
    Unauthorized,
    /// Registry business rule
    RevertedBusinessRule,
    /// Unrecognized
    Unknown,
}

impl ErrorKind {
    /// Stable name
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::NetworkUnreachable => "network-unreachable",
            ErrorKind::WalletUnavailable => "wallet-unavailable",
            ErrorKind::UserRejected => "user-rejected",
            ErrorKind::WrongNetwork => "wrong-network",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::RevertedBusinessRule => "reverted-business-rule",
            ErrorKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
