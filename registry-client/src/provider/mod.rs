//! Provider seam
//!
//! A [`LedgerProvider`] is the client's only route to a ledger: chain
//! selection, read-only calls, nonce lookup, broadcast and receipt lookup.
//! Failures come back as [`ProviderError`], either a transport failure or an
//! RPC error carrying one of the well-known codes below.

pub mod local;

use crate::config::NetworkParams;
use async_trait::async_trait;
use registry_core::{Address, QueryResult, Receipt, RegistryQuery, Transaction, TxHash};
use thiserror::Error;

/// User rejected the request
pub const USER_REJECTED: i64 = 4001;
/// Wallet has not authorized the requested account or method
pub const UNAUTHORIZED: i64 = 4100;
/// Provider is disconnected from all chains
pub const DISCONNECTED: i64 = 4900;
/// Provider is disconnected from the requested chain
pub const CHAIN_DISCONNECTED: i64 = 4901;
/// Wallet does not know the requested chain
pub const UNRECOGNIZED_CHAIN: i64 = 4902;
/// Call or transaction reverted
pub const EXECUTION_REVERTED: i64 = 3;
/// Transaction rejected by the node (nonce, signature, chain)
pub const TRANSACTION_REJECTED: i64 = -32000;
/// Internal node error
pub const INTERNAL_ERROR: i64 = -32603;

/// Result type for provider requests
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

/// Provider failure
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// Request never reached a node
    #[error("transport error: {0}")]
    Transport(String),

    /// Node or wallet answered with an error
    #[error("rpc error {code}: {message}")]
    Rpc {
        /// Error code
        code: i64,
        /// Error message
        message: String,
    },
}

impl ProviderError {
    /// Build an RPC error
    pub fn rpc(code: i64, message: impl Into<String>) -> Self {
        ProviderError::Rpc {
            code,
            message: message.into(),
        }
    }

    /// RPC error code, if any
    pub fn code(&self) -> Option<i64> {
        match self {
            ProviderError::Rpc { code, .. } => Some(*code),
            ProviderError::Transport(_) => None,
        }
    }

    /// Error message without the code
    pub fn message(&self) -> &str {
        match self {
            ProviderError::Rpc { message, .. } => message,
            ProviderError::Transport(message) => message,
        }
    }
}

/// Connection to a ledger through a wallet
#[async_trait]
pub trait LedgerProvider: Send + Sync {
    /// Active chain
    async fn chain_id(&self) -> ProviderResult<u64>;

    /// Ask the wallet to switch chains; `UNRECOGNIZED_CHAIN` if it does not know it
    async fn switch_chain(&self, chain_id: u64) -> ProviderResult<()>;

    /// Register a chain with the wallet
    async fn add_chain(&self, params: &NetworkParams) -> ProviderResult<()>;

    /// Read-only registry call on the active chain
    async fn call(&self, to: Address, query: &RegistryQuery) -> ProviderResult<QueryResult>;

    /// Pending nonce of `address` on the active chain
    async fn transaction_count(&self, address: Address) -> ProviderResult<u64>;

    /// Broadcast a signed transaction
    async fn send_transaction(&self, tx: Transaction) -> ProviderResult<TxHash>;

    /// Receipt of a transaction; `None` while it is pending
    async fn transaction_receipt(&self, tx_hash: &TxHash) -> ProviderResult<Option<Receipt>>;
}
