//! Receipt decoding
//!
//! The registry reports a new certificate id only through the mint
//! `Transfer` log of the issuance receipt. Decoding is a single step with an
//! explicit result instead of a scan that silently falls back.

use registry_core::events::{transfer_topic, u64_from_topic};
use registry_core::{Address, CertificateId, Receipt};

/// Result of recovering an assigned id from a receipt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdRecovery {
    /// Id read from the mint log
    Recovered(CertificateId),
    /// No mint log in the receipt
    Missing,
    /// Mint log present but not decodable
    Malformed,
}

/// Id assigned by an issuance, from the first `Transfer` log with a zero `from`
/// emitted by the receipt's target contract
pub fn decode_assigned_id(receipt: &Receipt) -> IdRecovery {
    let topic = transfer_topic();

    let mints = receipt
        .logs
        .iter()
        .filter(|log| log.address == receipt.to && log.topics.first() == Some(&topic));

    for log in mints {
        if log.topics.len() < 4 {
            return IdRecovery::Malformed;
        }
        match Address::from_topic(&log.topics[1]) {
            Some(from) if from.is_zero() => {}
            Some(_) => continue,
            None => return IdRecovery::Malformed,
        }
        return match u64_from_topic(&log.topics[3]) {
            Some(id) if id > 0 => IdRecovery::Recovered(CertificateId(id)),
            _ => IdRecovery::Malformed,
        };
    }

    IdRecovery::Missing
}
