//! Failure classification
//!
//! Providers, wallets and the registry report failures as codes and free
//! text. This module is the one place that inspects those strings and maps
//! them onto [`ClientError`] variants.

use crate::error::ClientError;
use crate::provider::{
    ProviderError, CHAIN_DISCONNECTED, DISCONNECTED, EXECUTION_REVERTED, UNAUTHORIZED,
    UNRECOGNIZED_CHAIN, USER_REJECTED,
};
use crate::signer::SignerError;

const REVERT_PREFIXES: [&str; 2] = ["execution reverted: ", "reverted with reason string "];

const UNAUTHORIZED_PATTERNS: [&str; 6] = [
    "is missing role",
    "not an issuer",
    "not authorized",
    "accesscontrol",
    "unauthorized",
    "caller is not",
];

const NOT_FOUND_PATTERNS: [&str; 3] = ["does not exist", "not found", "no certificate found"];

const USER_REJECTED_PATTERNS: [&str; 3] = ["user rejected", "user denied", "rejected by user"];

const NETWORK_PATTERNS: [&str; 5] = [
    "network error",
    "connection refused",
    "could not detect network",
    "timeout",
    "disconnected",
];

/// Classify a provider failure
pub fn classify_provider_error(err: &ProviderError) -> ClientError {
    match err {
        ProviderError::Transport(message) => ClientError::NetworkUnreachable(message.clone()),
        ProviderError::Rpc { code, message } => match *code {
            USER_REJECTED => ClientError::UserRejected(message.clone()),
            UNAUTHORIZED => ClientError::WalletUnavailable(message.clone()),
            DISCONNECTED | CHAIN_DISCONNECTED => ClientError::NetworkUnreachable(message.clone()),
            UNRECOGNIZED_CHAIN => ClientError::WrongNetwork(message.clone()),
            EXECUTION_REVERTED => classify_revert_reason(revert_reason(message)),
            _ => classify_message(message),
        },
    }
}

/// Classify a registry revert reason
pub fn classify_revert_reason(reason: &str) -> ClientError {
    let lower = reason.to_lowercase();

    if UNAUTHORIZED_PATTERNS.iter().any(|p| lower.contains(p)) {
        ClientError::Unauthorized(reason.to_string())
    } else if NOT_FOUND_PATTERNS.iter().any(|p| lower.contains(p)) {
        ClientError::NotFound(reason.to_string())
    } else {
        ClientError::Reverted(reason.to_string())
    }
}

/// Classify a signing failure
pub fn classify_signer_error(err: &SignerError) -> ClientError {
    match err {
        SignerError::Rejected(message) => ClientError::UserRejected(message.clone()),
        SignerError::Unavailable(message) => ClientError::WalletUnavailable(message.clone()),
    }
}

/// True if the node rejected a transaction for its nonce
pub fn is_nonce_rejection(err: &ProviderError) -> bool {
    match err {
        ProviderError::Rpc { message, .. } => {
            let lower = message.to_lowercase();
            lower.contains("nonce too low") || lower.contains("nonce too high")
        }
        ProviderError::Transport(_) => false,
    }
}

/// Strip the node's revert prefix, leaving the registry's reason
pub fn revert_reason(message: &str) -> &str {
    REVERT_PREFIXES
        .iter()
        .find_map(|prefix| message.strip_prefix(prefix))
        .unwrap_or(message)
        .trim_matches('\'')
}

/// Messages without a recognized code
fn classify_message(message: &str) -> ClientError {
    let lower = message.to_lowercase();

    if USER_REJECTED_PATTERNS.iter().any(|p| lower.contains(p)) {
        return ClientError::UserRejected(message.to_string());
    }
    if REVERT_PREFIXES.iter().any(|p| lower.starts_with(p)) {
        return classify_revert_reason(revert_reason(message));
    }
    if lower.contains("invalid chain id") {
        return ClientError::WrongNetwork(message.to_string());
    }
    if NETWORK_PATTERNS.iter().any(|p| lower.contains(p)) {
        return ClientError::NetworkUnreachable(message.to_string());
    }

    ClientError::Unknown(message.to_string())
}
