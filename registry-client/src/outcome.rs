//! Mutation outcomes

use crate::error::{ClientError, ErrorKind};
use registry_core::{CertificateId, TxHash};
use serde::{Deserialize, Serialize};

/// Identifier reported when an issuance confirmed but its id could not be read
pub const SENTINEL_ID: u64 = 0;

/// Final state of an orchestrated mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    /// Included and decoded
    Confirmed,
    /// Included, but the assigned id could not be recovered
    PartialSuccess,
    /// Broadcast, not yet included within the confirmation timeout
    Pending,
    /// Rejected before broadcast, or reverted at inclusion
    Failed,
}

impl OutcomeStatus {
    /// Stable name, used as a metric label
    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeStatus::Confirmed => "confirmed",
            OutcomeStatus::PartialSuccess => "partial_success",
            OutcomeStatus::Pending => "pending",
            OutcomeStatus::Failed => "failed",
        }
    }
}

/// Result of an orchestrated mutation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOutcome {
    /// Status
    pub status: OutcomeStatus,

    /// True for `Confirmed` and `PartialSuccess`
    pub success: bool,

    /// Certificate id for issuance and revocation
    pub identifier: Option<u64>,

    /// Broadcast transaction, if any
    pub transaction_reference: Option<TxHash>,

    /// Failure category
    pub error_kind: Option<ErrorKind>,

    /// Error or warning text
    pub message: Option<String>,

    /// Including block
    pub block_number: Option<u64>,
}

impl TxOutcome {
    /// Included and decoded
    pub fn confirmed(tx_hash: TxHash, block_number: u64, identifier: Option<CertificateId>) -> Self {
        Self {
            status: OutcomeStatus::Confirmed,
            success: true,
            identifier: identifier.map(|id| id.value()),
            transaction_reference: Some(tx_hash),
            error_kind: None,
            message: None,
            block_number: Some(block_number),
        }
    }

    /// Included without a recoverable id
    pub fn partial_success(tx_hash: TxHash, block_number: u64, warning: impl Into<String>) -> Self {
        Self {
            status: OutcomeStatus::PartialSuccess,
            success: true,
            identifier: Some(SENTINEL_ID),
            transaction_reference: Some(tx_hash),
            error_kind: None,
            message: Some(warning.into()),
            block_number: Some(block_number),
        }
    }

    /// Broadcast but unconfirmed
    pub fn pending(tx_hash: TxHash) -> Self {
        Self {
            status: OutcomeStatus::Pending,
            success: false,
            identifier: None,
            transaction_reference: Some(tx_hash),
            error_kind: None,
            message: Some("Transaction submitted; confirmation still pending".to_string()),
            block_number: None,
        }
    }

    /// Failed, with the transaction if it was broadcast
    pub fn failed(err: &ClientError, tx_hash: Option<TxHash>) -> Self {
        Self {
            status: OutcomeStatus::Failed,
            success: false,
            identifier: None,
            transaction_reference: tx_hash,
            error_kind: Some(err.kind()),
            message: Some(err.to_string()),
            block_number: None,
        }
    }

    /// Included block, for failures that reverted on chain
    pub fn in_block(mut self, block_number: u64) -> Self {
        self.block_number = Some(block_number);
        self
    }

    /// Certificate id, if one was recovered
    pub fn certificate_id(&self) -> Option<CertificateId> {
        self.identifier
            .filter(|id| *id != SENTINEL_ID)
            .map(CertificateId)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_success_is_success() {
        let outcome = TxOutcome::partial_success(TxHash::from_bytes([1u8; 32]), 3, "no mint log");
        assert!(outcome.success);
        assert_eq!(outcome.identifier, Some(SENTINEL_ID));
        assert_eq!(outcome.certificate_id(), None);
        assert!(outcome.error_kind.is_none());
    }

    #[test]
    fn test_failed_carries_kind() {
        let err = ClientError::Unauthorized("Caller is not an issuer".to_string());
        let outcome = TxOutcome::failed(&err, None);
        assert!(!outcome.success);
        assert_eq!(outcome.error_kind, Some(ErrorKind::Unauthorized));
        assert_eq!(outcome.message.as_deref(), Some("Unauthorized: Caller is not an issuer"));
    }

    #[test]
    fn test_serialized_shape() {
        let outcome = TxOutcome::confirmed(TxHash::from_bytes([1u8; 32]), 2, Some(CertificateId(1)));
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "confirmed");
        assert_eq!(json["identifier"], 1);
        assert!(json["transaction_reference"].as_str().unwrap().starts_with("0x"));
    }
}
